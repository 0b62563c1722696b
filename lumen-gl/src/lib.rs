//! OpenGL backends.
//!
//! This crate exports [OpenGL](https://www.khronos.org/opengl/) backends for lumen. Pick a
//! _backend type_, create it once the OpenGL context is current and wrap it in a
//! [`lumen::context::Context`]:
//!
//! ```ignore
//! gl::load_with(|s| window.get_proc_address(s) as _);
//!
//! let mut ctx = Context::new(GL33::new()?);
//! let mut program = Program::from_strings(&mut ctx, VS, FS)?;
//! ```

#[cfg(feature = "gl33")]
pub mod gl33;

#[cfg(feature = "gl33")]
pub use gl33::GL33;
