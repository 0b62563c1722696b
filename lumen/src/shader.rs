//! Shader stages, programs and uniforms.
//!
//! A shader [`Program`] is made of one or several [`Stage`]s linked together. Once linked, the
//! program knows about every uniform its stages declare: the declarations are read from the
//! stages’ sources by the [`declaration`] parser and stored as [`UniformDescriptor`]s. Those
//! descriptors drive [`Program::set`] and [`Program::get`].
//!
//! ```ignore
//! let vs = Stage::vertex(&mut ctx, VS_SRC)?;
//! let fs = Stage::fragment(&mut ctx, FS_SRC)?;
//! let mut program = Program::new(&mut ctx, vec![vs, fs])?;
//!
//! program.bind(&mut ctx)?;
//! program.set(&mut ctx, "color", &[1., 0.5, 0.5])?;
//! program.set(&mut ctx, "view", &[[1., 0.], [0., 1.]])?;
//! ```

pub mod declaration;
pub mod program;
pub mod stage;
pub mod types;
pub mod uniform;

pub use self::declaration::{DeclarationError, UniformTable};
pub use self::program::{LinkState, Program, ProgramError, Stages};
pub use self::stage::{default_vertex_shader, Stage, StageError, StageType, DEFAULT_VERTEX_SHADER};
pub use self::types::{BaseType, UniformDescriptor, UniformKind, Width};
pub use self::uniform::{AsUniformData, Component, Flatten, UniformData, UniformError, UniformValue};
