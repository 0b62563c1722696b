//! Shader stages.
//!
//! A stage is a single unit of shader code, compiled on its own and combined with others when a
//! [`Program`] is linked. Stages keep the source they were compiled from, which is what the
//! program reads its uniform declarations from.
//!
//! [`Program`]: crate::shader::Program

use std::fmt;

use log::{debug, warn};
use thiserror::Error;

use crate::backend::shader::Shader;
use crate::context::Context;

/// Source of the pass-through vertex stage built by [`default_vertex_shader`].
pub const DEFAULT_VERTEX_SHADER: &str = "void main(void) { gl_Position = ftransform(); }";

/// A shader stage type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StageType {
  /// Vertex shader.
  VertexShader,
  /// Fragment shader.
  FragmentShader,
}

impl fmt::Display for StageType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageType::VertexShader => f.write_str("vertex shader"),
      StageType::FragmentShader => f.write_str("fragment shader"),
    }
  }
}

/// Errors that shader stages can emit.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StageError {
  /// Occurs when a shader fails to compile. The `String` is the driver’s log.
  #[error("{0} compilation error: {1}")]
  CompilationFailed(StageType, String),
  /// Occurs when no source string at all was provided.
  #[error("no GLSL source provided for {0}")]
  NoSource(StageType),
}

/// A compiled shader stage.
pub struct Stage<B>
where
  B: Shader,
{
  ty: StageType,
  source: String,
  repr: B::StageRepr,
}

impl<B> Stage<B>
where
  B: Shader,
{
  /// Compile a stage from a single source string.
  pub fn new<S>(ctx: &mut Context<B>, ty: StageType, src: S) -> Result<Self, StageError>
  where
    S: AsRef<str>,
  {
    Self::from_sources(ctx, ty, std::iter::once(src))
  }

  /// Compile a stage from several source strings, handed to the driver in order.
  ///
  /// The stored source is the strings joined with newlines.
  pub fn from_sources<I, S>(ctx: &mut Context<B>, ty: StageType, sources: I) -> Result<Self, StageError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let sources = sources.into_iter().collect::<Vec<_>>();
    let sources = sources.iter().map(|s| s.as_ref()).collect::<Vec<&str>>();

    if sources.is_empty() {
      return Err(StageError::NoSource(ty));
    }

    let repr = unsafe { ctx.backend().new_stage(ty, &sources) }.map_err(|e| {
      warn!("{}", e);
      e
    })?;

    debug!("compiled {} from {} source string(s)", ty, sources.len());

    Ok(Stage {
      ty,
      source: sources.join("\n"),
      repr,
    })
  }

  /// Compile a vertex stage.
  pub fn vertex<S>(ctx: &mut Context<B>, src: S) -> Result<Self, StageError>
  where
    S: AsRef<str>,
  {
    Self::new(ctx, StageType::VertexShader, src)
  }

  /// Compile a fragment stage.
  pub fn fragment<S>(ctx: &mut Context<B>, src: S) -> Result<Self, StageError>
  where
    S: AsRef<str>,
  {
    Self::new(ctx, StageType::FragmentShader, src)
  }

  /// Type of the stage.
  pub fn ty(&self) -> StageType {
    self.ty
  }

  /// Source the stage was compiled from.
  pub fn source(&self) -> &str {
    &self.source
  }

  pub(crate) fn repr(&self) -> &B::StageRepr {
    &self.repr
  }
}

impl<B> Drop for Stage<B>
where
  B: Shader,
{
  fn drop(&mut self) {
    unsafe { B::destroy_stage(&mut self.repr) }
  }
}

impl<B> fmt::Debug for Stage<B>
where
  B: Shader,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.debug_struct("Stage")
      .field("ty", &self.ty)
      .field("source", &self.source)
      .finish()
  }
}

/// Compile a pass-through vertex stage.
pub fn default_vertex_shader<B>(ctx: &mut Context<B>) -> Result<Stage<B>, StageError>
where
  B: Shader,
{
  Stage::vertex(ctx, DEFAULT_VERTEX_SHADER)
}
