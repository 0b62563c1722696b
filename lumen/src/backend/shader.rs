//! Shader backend interface.
//!
//! This interface defines the low-level API shader stages and programs must implement to be usable,
//! as well as the upload and query calls used to marshal uniform values.

use std::fmt;

use crate::shader::{ProgramError, StageError, StageType};

/// Shader stages and programs.
///
/// # Unsafety
///
/// Every method forwards to the driver without any validation. The core crate guarantees that the
/// representations passed back are the ones this backend created, and that programs are linked
/// before being used or queried.
pub unsafe trait Shader {
  /// Backend representation of a compiled shader stage.
  type StageRepr;

  /// Backend representation of a shader program.
  type ProgramRepr;

  /// Location of a uniform inside a linked program.
  type UniformLocation: Copy + fmt::Debug;

  /// Compile a new stage out of one or several source strings.
  ///
  /// On failure, the driver log is returned verbatim in [`StageError::CompilationFailed`].
  unsafe fn new_stage(
    &mut self,
    ty: StageType,
    sources: &[&str],
  ) -> Result<Self::StageRepr, StageError>;

  /// Release a stage.
  unsafe fn destroy_stage(stage: &mut Self::StageRepr);

  /// Create a new, empty program.
  unsafe fn new_program(&mut self) -> Self::ProgramRepr;

  /// Attach a compiled stage to a program.
  unsafe fn attach_stage(&mut self, program: &mut Self::ProgramRepr, stage: &Self::StageRepr);

  /// Link a program with all the stages attached so far.
  ///
  /// On failure, the driver log is returned verbatim in [`ProgramError::LinkFailed`].
  unsafe fn link_program(&mut self, program: &mut Self::ProgramRepr) -> Result<(), ProgramError>;

  /// Ask the driver whether the last link of a program succeeded.
  unsafe fn is_linked(&mut self, program: &Self::ProgramRepr) -> bool;

  /// Release a program.
  ///
  /// The program might still be the one in use; the backend must then stop using it before
  /// releasing it.
  unsafe fn destroy_program(program: &mut Self::ProgramRepr);

  /// Make a program the current one of the context, or clear the current program with `None`.
  unsafe fn use_program(&mut self, program: Option<&Self::ProgramRepr>);

  /// Names of the uniforms that survived compilation of a linked program.
  ///
  /// Array uniforms are reported by their bare name (`lights`, not `lights[0]`).
  unsafe fn active_uniforms(&mut self, program: &Self::ProgramRepr) -> Vec<String>;

  /// Location of a uniform, or of a single array element when `name` is of the form `name[i]`.
  unsafe fn uniform_location(
    &mut self,
    program: &Self::ProgramRepr,
    name: &str,
  ) -> Option<Self::UniformLocation>;
}

/// Uniform upload and query calls.
///
/// Uploads act on the program currently in use in the context; `count` is the number of array
/// elements to write, starting at `location`, and `values` always holds exactly
/// `count × components` items.
///
/// # Unsafety
///
/// Same as [`Shader`]: locations are the ones returned by [`Shader::uniform_location`] for the
/// program currently in use.
pub unsafe trait UniformStorage: Shader {
  /// Upload `int` / `int[count]`.
  unsafe fn uniform1iv(&mut self, location: Self::UniformLocation, count: usize, values: &[i32]);

  /// Upload `ivec2` / `ivec2[count]`.
  unsafe fn uniform2iv(&mut self, location: Self::UniformLocation, count: usize, values: &[i32]);

  /// Upload `ivec3` / `ivec3[count]`.
  unsafe fn uniform3iv(&mut self, location: Self::UniformLocation, count: usize, values: &[i32]);

  /// Upload `ivec4` / `ivec4[count]`.
  unsafe fn uniform4iv(&mut self, location: Self::UniformLocation, count: usize, values: &[i32]);

  /// Upload `float` / `float[count]`.
  unsafe fn uniform1fv(&mut self, location: Self::UniformLocation, count: usize, values: &[f32]);

  /// Upload `vec2` / `vec2[count]`.
  unsafe fn uniform2fv(&mut self, location: Self::UniformLocation, count: usize, values: &[f32]);

  /// Upload `vec3` / `vec3[count]`.
  unsafe fn uniform3fv(&mut self, location: Self::UniformLocation, count: usize, values: &[f32]);

  /// Upload `vec4` / `vec4[count]`.
  unsafe fn uniform4fv(&mut self, location: Self::UniformLocation, count: usize, values: &[f32]);

  /// Upload `mat2` / `mat2[count]`.
  unsafe fn uniform_matrix2fv(
    &mut self,
    location: Self::UniformLocation,
    count: usize,
    transpose: bool,
    values: &[f32],
  );

  /// Upload `mat3` / `mat3[count]`.
  unsafe fn uniform_matrix3fv(
    &mut self,
    location: Self::UniformLocation,
    count: usize,
    transpose: bool,
    values: &[f32],
  );

  /// Upload `mat4` / `mat4[count]`.
  unsafe fn uniform_matrix4fv(
    &mut self,
    location: Self::UniformLocation,
    count: usize,
    transpose: bool,
    values: &[f32],
  );

  /// Read the integral components stored at `location` into `out`.
  unsafe fn get_uniformiv(
    &mut self,
    program: &Self::ProgramRepr,
    location: Self::UniformLocation,
    out: &mut [i32],
  );

  /// Read the floating-point components stored at `location` into `out`.
  ///
  /// Matrices are read back in the driver’s native column-major order.
  unsafe fn get_uniformfv(
    &mut self,
    program: &Self::ProgramRepr,
    location: Self::UniformLocation,
    out: &mut [f32],
  );
}
