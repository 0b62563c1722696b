//! Graphics state.

use gl::types::*;
use std::cell::RefCell;
use std::marker::PhantomData;
use thiserror::Error;

// TLS synchronization barrier for `GLState`.
thread_local!(static TLS_ACQUIRE_GFX_STATE: RefCell<Option<()>> = RefCell::new(Some(())));

/// Cached value.
///
/// A cached value is used to prevent issuing costy GPU commands if we know the target value is
/// already set to what the command tries to set. For instance, if you ask to use the program `34`
/// once, that value will be set on the GPU and cached on our side. Later, if no other program has
/// been used in between, asking to use `34` again doesn’t have to perform anything GPU-wise.
#[derive(Debug)]
struct Cached<T>(Option<T>)
where
  T: PartialEq;

impl<T> Cached<T>
where
  T: PartialEq,
{
  /// Cache a value.
  fn new(initial: T) -> Self {
    Cached(Some(initial))
  }

  /// Explicitly invalidate a value.
  ///
  /// This is necessary when we want to be able to force a GPU command to run.
  fn invalidate(&mut self) {
    self.0 = None;
  }

  fn set(&mut self, value: T) {
    self.0 = Some(value);
  }

  /// Check if the cached value is invalid regarding a value.
  ///
  /// A non-cached value (i.e. empty) is always invalid whatever compared value. If a value is
  /// already cached, then it’s invalid if it’s not equal ([`PartialEq`]) to the input value.
  fn is_invalid(&self, new_val: &T) -> bool {
    match &self.0 {
      Some(ref t) => t != new_val,
      _ => true,
    }
  }
}

/// The graphics state.
///
/// This type represents the current state of a given graphics context. It forwards the program
/// switches to the driver and caches the program in use, so that using the same program twice in a
/// row only issues one call.
#[derive(Debug)]
pub struct GLState {
  _a: PhantomData<*const ()>, // !Send and !Sync

  // shader program
  current_program: Cached<GLuint>,
}

impl GLState {
  /// Create a new `GLState`.
  ///
  /// > Note: keep in mind you can create only one per thread.
  pub(crate) fn new() -> Result<Self, StateQueryError> {
    TLS_ACQUIRE_GFX_STATE.with(|rc| {
      let mut inner = rc.borrow_mut();

      match *inner {
        Some(_) => {
          inner.take();
          Self::get_from_context()
        }

        None => Err(StateQueryError::UnavailableGLState),
      }
    })
  }

  /// Get a `GLState` from the current OpenGL context.
  fn get_from_context() -> Result<Self, StateQueryError> {
    unsafe {
      let current_program = Cached::new(get_ctx_current_program()?);

      Ok(GLState {
        _a: PhantomData,
        current_program,
      })
    }
  }

  /// Forget the cached program in use.
  ///
  /// Call this if the current program was changed behind lumen’s back, for instance by another
  /// library sharing the OpenGL context.
  pub fn invalidate_shader_program(&mut self) {
    self.current_program.invalidate();
  }

  pub(crate) unsafe fn use_program(&mut self, handle: GLuint) {
    if self.current_program.is_invalid(&handle) {
      gl::UseProgram(handle);
      self.current_program.set(handle);
    }
  }

  /// Stop using `handle` if it is the program in use.
  pub(crate) unsafe fn unuse_program(&mut self, handle: GLuint) {
    if !self.current_program.is_invalid(&handle) {
      gl::UseProgram(0);
      self.current_program.set(0);
    }
  }
}

/// An error that might happen when the context is queried.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StateQueryError {
  /// The [`GLState`] object is unavailable.
  ///
  /// That might occur if the current thread doesn’t support allocating a new graphics state. It
  /// might happen if you try to have more than one state on the same thread, for instance.
  #[error("unavailable graphics state")]
  UnavailableGLState,
}

unsafe fn get_ctx_current_program() -> Result<GLuint, StateQueryError> {
  let mut used = 0 as GLint;
  gl::GetIntegerv(gl::CURRENT_PROGRAM, &mut used);
  Ok(used as GLuint)
}
