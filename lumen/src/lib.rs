//! # Shader programs with inferred uniform interfaces
//!
//! lumen manages GPU shader programs: it compiles shader stages, links them into programs,
//! discovers the uniforms a program declares and moves typed values in and out of the program’s
//! uniform storage.
//!
//! Instead of asking you to describe the uniform interface of a program in the type system, lumen
//! reads it from the GLSL sources you hand it. Every flat declaration of the form
//! `uniform <type> <name>;` or `uniform <type> <name>[<n>];` is turned into a
//! [`UniformDescriptor`], which is later used to pick the right upload and query calls, to check
//! how many values you pass and to reshape what is read back.
//!
//! > lumen is not a GLSL compiler. Only flat uniform declarations are understood; nested
//! > structures, preprocessor macros and user-defined types are not.
//!
//! # What’s included?
//!
//! - **Stages**: a [`Stage`] is a single compiled unit of shader code (vertex or fragment) along
//!   with the source it was compiled from.
//! - **Programs**: a [`Program`] is an append-only sequence of stages linked together. It owns
//!   its link state and the uniform table parsed from its stages.
//! - **Uniforms**: [`Program::set`] and [`Program::get`] marshal host values to and from the
//!   program, checking activity, arity and base type before any upload happens.
//! - **Context**: a [`Context`] wraps a backend and tracks which program is currently bound.
//!
//! # Implementation and architecture
//!
//! The core crate, lumen, is written against the traits of the [`backend`] module. Backend
//! implementation crates, such as lumen-gl, provide a type implementing those traits by talking
//! to an actual graphics API. The graphics context itself (window, surface, function loading) is
//! never created by lumen; it must exist and be current on the calling thread.
//!
//! [`UniformDescriptor`]: crate::shader::UniformDescriptor
//! [`Stage`]: crate::shader::Stage
//! [`Program`]: crate::shader::Program
//! [`Program::set`]: crate::shader::Program::set
//! [`Program::get`]: crate::shader::Program::get
//! [`Context`]: crate::context::Context

pub mod backend;
pub mod context;
pub mod shader;
