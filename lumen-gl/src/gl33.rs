//! OpenGL 3.3 backend.
//!
//! This module implements an OpenGL 3.3 backend for lumen. The backend type is [`GL33`].

mod shader;
mod state;

pub use self::shader::{Program, Stage};
pub use self::state::GLState;
pub use self::state::StateQueryError;
use std::cell::RefCell;
use std::rc::Rc;

/// An OpenGL 3.3 backend.
///
/// This type is to be used as a lumen backend type. It implements [`Shader`] and
/// [`UniformStorage`].
///
/// The OpenGL function pointers must have been loaded (with [`gl::load_with`]) and a context must
/// be current on the calling thread before creating it.
///
/// [`Shader`]: lumen::backend::shader::Shader
/// [`UniformStorage`]: lumen::backend::shader::UniformStorage
#[derive(Debug)]
pub struct GL33 {
  pub(crate) state: Rc<RefCell<GLState>>,
}

impl GL33 {
  /// Create a new OpenGL 3.3 backend.
  ///
  /// Fails with [`StateQueryError::UnavailableGLState`] if a backend was already created on this
  /// thread.
  pub fn new() -> Result<Self, StateQueryError> {
    GLState::new().map(|state| GL33 {
      state: Rc::new(RefCell::new(state)),
    })
  }

  /// Internal access to the backend state.
  ///
  /// # Unsafety
  ///
  /// This method is **highly unsafe** as it exposes the internals of the backend. Playing with it
  /// should be done with extreme caution.
  pub unsafe fn state(&self) -> &Rc<RefCell<GLState>> {
    &self.state
  }
}
