//! Shader programs.
//!
//! A [`Program`] is an append-only sequence of [`Stage`]s linked together. Its link state follows a
//! small state machine:
//!
//! - A new program is linked right away and is either [`LinkState::Linked`] or the construction
//!   fails.
//! - Appending a stage puts the program back to [`LinkState::Unlinked`]. If the program was bound,
//!   it is relinked and rebound immediately so that the context keeps using an up-to-date program.
//! - A failed relink puts the program in [`LinkState::Failed`] and unbinds it. Nothing is retried
//!   automatically; the next bind is a fresh attempt.
//!
//! Every successful link rebuilds the uniform table out of the stages’ sources, joined in
//! attachment order.

use std::cell::Cell;
use std::fmt;
use std::iter::FromIterator;
use std::rc::Rc;
use std::slice;

use log::{debug, warn};
use thiserror::Error;

use crate::backend::shader::Shader;
use crate::context::{Context, ProgramId};
use crate::shader::declaration::{self, DeclarationError, UniformTable};
use crate::shader::stage::{Stage, StageError, StageType};
use crate::shader::types::UniformDescriptor;

/// Errors that a [`Program`] can generate.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ProgramError {
  /// A shader stage failed to compile.
  #[error("shader program has stage error: {0}")]
  Stage(#[from] StageError),
  /// Program link failed. You can inspect the reason by looking at the contained `String`.
  #[error("shader program failed to link: {0}")]
  LinkFailed(String),
  /// The program linked but its uniform declarations could not be understood.
  #[error("shader program has invalid uniform declarations: {0}")]
  Declaration(#[from] DeclarationError),
  /// A program needs at least one stage.
  #[error("shader program has no stage")]
  NoStage,
}

/// Link state of a [`Program`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LinkState {
  /// Never linked, or a stage was appended since the last link.
  Unlinked,
  /// Linked; the uniform table is valid.
  Linked,
  /// The last link attempt failed.
  Failed,
}

/// Append-only sequence of stages.
///
/// Stages can be added at the end and inspected, but never removed nor reordered.
pub struct Stages<B>
where
  B: Shader,
{
  stages: Vec<Stage<B>>,
}

impl<B> Stages<B>
where
  B: Shader,
{
  /// Create an empty sequence.
  pub fn new() -> Self {
    Stages { stages: Vec::new() }
  }

  /// Add a stage at the end of the sequence.
  pub fn push(&mut self, stage: Stage<B>) {
    self.stages.push(stage);
  }

  /// Number of stages.
  pub fn len(&self) -> usize {
    self.stages.len()
  }

  /// Whether the sequence has no stage.
  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  /// Stage at `index`, in attachment order.
  pub fn get(&self, index: usize) -> Option<&Stage<B>> {
    self.stages.get(index)
  }

  /// Iterate over the stages in attachment order.
  pub fn iter(&self) -> slice::Iter<Stage<B>> {
    self.stages.iter()
  }

  /// Types of the stages, in attachment order.
  pub fn types(&self) -> impl Iterator<Item = StageType> + '_ {
    self.stages.iter().map(Stage::ty)
  }
}

impl<B> Default for Stages<B>
where
  B: Shader,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<B> From<Stage<B>> for Stages<B>
where
  B: Shader,
{
  fn from(stage: Stage<B>) -> Self {
    Stages {
      stages: vec![stage],
    }
  }
}

impl<B> From<Vec<Stage<B>>> for Stages<B>
where
  B: Shader,
{
  fn from(stages: Vec<Stage<B>>) -> Self {
    Stages { stages }
  }
}

impl<B, const N: usize> From<[Stage<B>; N]> for Stages<B>
where
  B: Shader,
{
  fn from(stages: [Stage<B>; N]) -> Self {
    stages.into_iter().collect()
  }
}

impl<B> FromIterator<Stage<B>> for Stages<B>
where
  B: Shader,
{
  fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = Stage<B>>,
  {
    Stages {
      stages: iter.into_iter().collect(),
    }
  }
}

impl<'a, B> IntoIterator for &'a Stages<B>
where
  B: Shader,
{
  type Item = &'a Stage<B>;

  type IntoIter = slice::Iter<'a, Stage<B>>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<B> fmt::Debug for Stages<B>
where
  B: Shader,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.debug_list().entries(self.stages.iter()).finish()
  }
}

/// A shader program.
///
/// Prefer [`Program::destroy`] to release a program. Dropping a program that is still current
/// clears the context’s current program and lets the backend stop using it, but logs a warning.
pub struct Program<B>
where
  B: Shader,
{
  id: ProgramId,
  repr: B::ProgramRepr,
  stages: Stages<B>,
  // number of stages already attached to repr
  attached: usize,
  link_state: LinkState,
  bound: bool,
  uniforms: UniformTable,
  // context slot of the current program
  current: Rc<Cell<Option<ProgramId>>>,
}

impl<B> Program<B>
where
  B: Shader,
{
  /// Create and link a program out of one stage or a sequence of stages.
  ///
  /// ```ignore
  /// let single = Program::new(&mut ctx, fs)?;
  /// let pair = Program::new(&mut ctx, vec![vs, fs])?;
  /// ```
  pub fn new<S>(ctx: &mut Context<B>, stages: S) -> Result<Self, ProgramError>
  where
    S: Into<Stages<B>>,
  {
    let stages = stages.into();

    if stages.is_empty() {
      return Err(ProgramError::NoStage);
    }

    let repr = unsafe { ctx.backend().new_program() };

    let mut program = Program {
      id: ctx.new_program_id(),
      repr,
      stages,
      attached: 0,
      link_state: LinkState::Unlinked,
      bound: false,
      uniforms: UniformTable::new(),
      current: ctx.program_slot(),
    };

    program.link(ctx)?;

    Ok(program)
  }

  /// Compile a vertex and a fragment stage and link them.
  pub fn from_strings<V, F>(ctx: &mut Context<B>, vertex: V, fragment: F) -> Result<Self, ProgramError>
  where
    V: AsRef<str>,
    F: AsRef<str>,
  {
    let vs = Stage::vertex(ctx, vertex)?;
    let fs = Stage::fragment(ctx, fragment)?;

    Self::new(ctx, vec![vs, fs])
  }

  /// Append a stage.
  ///
  /// The program becomes unlinked. If it was bound, it is relinked and rebound before returning.
  pub fn append(&mut self, ctx: &mut Context<B>, stage: Stage<B>) -> Result<(), ProgramError> {
    debug!("appending {} to program {:?}", stage.ty(), self.id);

    self.stages.push(stage);
    self.link_state = LinkState::Unlinked;

    if self.bound {
      ctx.bind_program(self)?;
    }

    Ok(())
  }

  /// Bind the program, linking it first if needed.
  ///
  /// See [`Context::bind_program`].
  pub fn bind(&mut self, ctx: &mut Context<B>) -> Result<(), ProgramError> {
    ctx.bind_program(self)
  }

  /// Clear the context’s current program.
  ///
  /// See [`Context::unbind_program`].
  pub fn unbind(&mut self, ctx: &mut Context<B>) {
    ctx.unbind_program(self)
  }

  /// Release the program, unbinding it first if it is the current program.
  pub fn destroy(mut self, ctx: &mut Context<B>) {
    if ctx.is_current(&self) {
      ctx.unbind_program(&mut self);
    }

    debug!("destroying program {:?}", self.id);
  }

  /// Ask the driver whether the program is linked.
  pub fn is_linked(&self, ctx: &mut Context<B>) -> bool {
    unsafe { ctx.backend().is_linked(&self.repr) }
  }

  /// Names of the uniforms the driver reports as active.
  pub fn active_uniforms(&self, ctx: &mut Context<B>) -> Vec<String> {
    unsafe { ctx.backend().active_uniforms(&self.repr) }
  }

  /// Identifier of the program in its context.
  pub fn id(&self) -> ProgramId {
    self.id
  }

  /// Current link state.
  pub fn link_state(&self) -> LinkState {
    self.link_state
  }

  /// Local bound flag.
  ///
  /// This flag is only updated when this very program is bound or unbound; binding another
  /// program leaves it untouched. Use [`Context::is_current`] for the context’s view.
  pub fn is_bound(&self) -> bool {
    self.bound
  }

  /// Stages of the program, in attachment order.
  pub fn stages(&self) -> &Stages<B> {
    &self.stages
  }

  /// Number of stages.
  pub fn len(&self) -> usize {
    self.stages.len()
  }

  /// Whether the program has no stage. Never true for a program built with [`Program::new`].
  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  /// Uniform declarations parsed at the last successful link.
  ///
  /// Empty unless the program is linked.
  pub fn uniforms(&self) -> &UniformTable {
    &self.uniforms
  }

  /// Descriptor of a declared uniform.
  pub fn descriptor(&self, name: &str) -> Option<&UniformDescriptor> {
    self.uniforms.get(name)
  }

  pub(crate) fn repr(&self) -> &B::ProgramRepr {
    &self.repr
  }

  pub(crate) fn set_bound(&mut self, bound: bool) {
    self.bound = bound;
  }

  pub(crate) fn link(&mut self, ctx: &mut Context<B>) -> Result<(), ProgramError> {
    let backend = ctx.backend();

    for stage in self.stages.iter().skip(self.attached) {
      unsafe { backend.attach_stage(&mut self.repr, stage.repr()) };
    }

    self.attached = self.stages.len();

    if let Err(e) = unsafe { backend.link_program(&mut self.repr) } {
      warn!("program {:?}: {}", self.id, e);
      return Err(self.fail(e));
    }

    let source = self
      .stages
      .iter()
      .map(Stage::source)
      .collect::<Vec<_>>()
      .join(";");

    match declaration::parse(&source) {
      Ok(uniforms) => {
        debug!(
          "program {:?} linked with {} uniform declaration(s)",
          self.id,
          uniforms.len()
        );

        self.uniforms = uniforms;
        self.link_state = LinkState::Linked;
        Ok(())
      }

      Err(e) => {
        warn!("program {:?}: {}", self.id, e);
        Err(self.fail(e.into()))
      }
    }
  }

  fn fail(&mut self, e: ProgramError) -> ProgramError {
    self.link_state = LinkState::Failed;
    self.uniforms.clear();
    e
  }
}

impl<B> Drop for Program<B>
where
  B: Shader,
{
  fn drop(&mut self) {
    if self.current.get() == Some(self.id) {
      warn!("program {:?} dropped while in use; releasing it anyway", self.id);
      self.current.set(None);
    }

    unsafe { B::destroy_program(&mut self.repr) }
  }
}

impl<B> fmt::Debug for Program<B>
where
  B: Shader,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.debug_struct("Program")
      .field("id", &self.id)
      .field("stages", &self.stages)
      .field("link_state", &self.link_state)
      .field("bound", &self.bound)
      .field("uniforms", &self.uniforms)
      .finish()
  }
}
