//! Graphics context.
//!
//! A graphics context is an object that abstracts all the low-level operations that happen on a
//! graphics device (it can be a GPU or a software implementation, for instance).
//!
//! This crate doesn’t provide you with creating such contexts. Instead, you must do it yourself
//! or rely on crates doing it for you, then wrap a backend value into a [`Context`].
//!
//! # On context and threads
//!
//! A [`Context`] is `!Send` and `!Sync`: it cannot be moved nor shared between threads. If your
//! application uses several threads, all of the shader work must be funneled through the thread
//! owning the context.
//!
//! # The bound program
//!
//! The context has exactly one slot for the program currently in use. Binding a program replaces
//! whatever was in it, and unbinding *any* program clears it. Programs also carry a local `bound`
//! flag that is only updated for the program being acted upon, which means it can go stale:
//!
//! ```ignore
//! ctx.bind_program(&mut a)?;
//! ctx.bind_program(&mut b)?;
//!
//! assert!(a.is_bound()); // a’s flag is stale…
//! assert!(!ctx.is_current(&a)); // …the context knows b is the current program
//! ```
//!
//! Use [`Context::is_current`] when you need the authoritative answer. Uniform access goes through
//! it, so a program with a stale flag gets [`UniformError::Unbound`].
//!
//! [`UniformError::Unbound`]: crate::shader::UniformError::Unbound

use std::cell::Cell;
use std::marker::PhantomData;
use std::rc::Rc;

use log::debug;

use crate::backend::shader::Shader;
use crate::shader::{LinkState, Program, ProgramError};

/// Identifier of a program, unique within the context that created it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ProgramId(u64);

/// A graphics context wrapping a backend.
#[derive(Debug)]
pub struct Context<B> {
  _a: PhantomData<*const ()>, // !Send and !Sync
  backend: B,
  // shared with the programs, so that dropping a bound program clears it
  current_program: Rc<Cell<Option<ProgramId>>>,
  next_program_id: u64,
}

impl<B> Context<B> {
  /// Wrap a backend into a new context.
  ///
  /// The context starts with no program in use.
  pub fn new(backend: B) -> Self {
    Context {
      _a: PhantomData,
      backend,
      current_program: Rc::new(Cell::new(None)),
      next_program_id: 0,
    }
  }

  /// Access the backend.
  pub fn backend(&mut self) -> &mut B {
    &mut self.backend
  }

  /// Program currently in use, if any.
  pub fn current_program(&self) -> Option<ProgramId> {
    self.current_program.get()
  }

  pub(crate) fn new_program_id(&mut self) -> ProgramId {
    let id = ProgramId(self.next_program_id);
    self.next_program_id += 1;
    id
  }

  pub(crate) fn program_slot(&self) -> Rc<Cell<Option<ProgramId>>> {
    self.current_program.clone()
  }
}

impl<B> Context<B>
where
  B: Shader,
{
  /// Whether `program` is the program currently in use in this context.
  pub fn is_current(&self, program: &Program<B>) -> bool {
    self.current_program.get() == Some(program.id())
  }

  /// Make `program` the current program.
  ///
  /// If the program is not linked, it is linked first and any link error is returned without
  /// using it. A program that fails to link loses its bound flag, and is unbound if it was the
  /// current program. The program previously in use, if any, is superseded without its local flag
  /// being updated.
  pub fn bind_program(&mut self, program: &mut Program<B>) -> Result<(), ProgramError> {
    if program.link_state() != LinkState::Linked {
      if let Err(e) = program.link(self) {
        if self.is_current(program) {
          self.unbind_program(program);
        } else {
          program.set_bound(false);
        }

        return Err(e);
      }
    }

    unsafe { self.backend.use_program(Some(program.repr())) };

    if let Some(previous) = self.current_program.replace(Some(program.id())) {
      if previous != program.id() {
        debug!("program {:?} supersedes program {:?}", program.id(), previous);
      }
    }

    program.set_bound(true);
    Ok(())
  }

  /// Clear the current program.
  ///
  /// This resets the context slot whichever program was in use, and clears `program`’s local
  /// flag.
  pub fn unbind_program(&mut self, program: &mut Program<B>) {
    unsafe { self.backend.use_program(None) };

    if let Some(current) = self.current_program.take() {
      if current != program.id() {
        debug!("unbinding through program {:?} clears program {:?}", program.id(), current);
      }
    }

    program.set_bound(false);
  }
}
