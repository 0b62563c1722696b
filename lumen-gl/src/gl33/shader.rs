use crate::gl33::{GLState, GL33};
use gl::{self, types::*};
use log::trace;
use lumen::{
  backend::shader::{Shader, UniformStorage},
  shader::{ProgramError, StageError, StageType},
};
use std::{
  cell::RefCell,
  ffi::CString,
  ptr::{null, null_mut},
  rc::Rc,
};

/// OpenGL shader stage.
#[derive(Debug)]
pub struct Stage {
  handle: GLuint,
  ty: StageType,
}

/// OpenGL shader program.
#[derive(Debug)]
pub struct Program {
  pub(crate) handle: GLuint,
  state: Rc<RefCell<GLState>>,
}

// upload calls
macro_rules! impl_upload {
  // matrix notation
  ($(mat $method:ident => $f:ident;)*) => {
    $(
      unsafe fn $method(
        &mut self,
        location: Self::UniformLocation,
        count: usize,
        transpose: bool,
        values: &[f32],
      ) {
        let transpose = if transpose { gl::TRUE } else { gl::FALSE };
        gl::$f(location, count as GLsizei, transpose, values.as_ptr());
      }
    )*
  };

  ($($method:ident => $f:ident, $t:ty;)*) => {
    $(
      unsafe fn $method(&mut self, location: Self::UniformLocation, count: usize, values: &[$t]) {
        gl::$f(location, count as GLsizei, values.as_ptr());
      }
    )*
  };
}

unsafe impl Shader for GL33 {
  type StageRepr = Stage;

  type ProgramRepr = Program;

  type UniformLocation = GLint;

  unsafe fn new_stage(
    &mut self,
    ty: StageType,
    sources: &[&str],
  ) -> Result<Self::StageRepr, StageError> {
    let c_sources = sources
      .iter()
      .map(|src| CString::new(src.as_bytes()))
      .collect::<Result<Vec<_>, _>>()
      .map_err(|_| StageError::CompilationFailed(ty, "source contains a NUL byte".to_owned()))?;

    let handle = gl::CreateShader(opengl_shader_type(ty));

    if handle == 0 {
      return Err(StageError::CompilationFailed(
        ty,
        "unable to create shader stage".to_owned(),
      ));
    }

    let ptrs = c_sources.iter().map(|s| s.as_ptr()).collect::<Vec<_>>();
    gl::ShaderSource(handle, ptrs.len() as GLsizei, ptrs.as_ptr(), null());
    gl::CompileShader(handle);

    let mut compiled: GLint = gl::FALSE.into();
    gl::GetShaderiv(handle, gl::COMPILE_STATUS, &mut compiled);

    if compiled == gl::TRUE.into() {
      Ok(Stage { handle, ty })
    } else {
      let mut log_len: GLint = 0;
      gl::GetShaderiv(handle, gl::INFO_LOG_LENGTH, &mut log_len);

      let mut log = vec![0u8; log_len.max(0) as usize];
      gl::GetShaderInfoLog(handle, log_len, null_mut(), log.as_mut_ptr() as *mut GLchar);

      gl::DeleteShader(handle);

      Err(StageError::CompilationFailed(ty, info_log(&log)))
    }
  }

  unsafe fn destroy_stage(stage: &mut Self::StageRepr) {
    gl::DeleteShader(stage.handle);
  }

  unsafe fn new_program(&mut self) -> Self::ProgramRepr {
    Program {
      handle: gl::CreateProgram(),
      state: self.state.clone(),
    }
  }

  unsafe fn attach_stage(&mut self, program: &mut Self::ProgramRepr, stage: &Self::StageRepr) {
    trace!("attaching {} to program {}", stage.ty, program.handle);
    gl::AttachShader(program.handle, stage.handle);
  }

  unsafe fn link_program(&mut self, program: &mut Self::ProgramRepr) -> Result<(), ProgramError> {
    let handle = program.handle;

    gl::LinkProgram(handle);

    if self.is_linked(program) {
      Ok(())
    } else {
      let mut log_len: GLint = 0;
      gl::GetProgramiv(handle, gl::INFO_LOG_LENGTH, &mut log_len);

      let mut log = vec![0u8; log_len.max(0) as usize];
      gl::GetProgramInfoLog(handle, log_len, null_mut(), log.as_mut_ptr() as *mut GLchar);

      Err(ProgramError::LinkFailed(info_log(&log)))
    }
  }

  unsafe fn is_linked(&mut self, program: &Self::ProgramRepr) -> bool {
    let mut linked: GLint = gl::FALSE.into();
    gl::GetProgramiv(program.handle, gl::LINK_STATUS, &mut linked);

    linked == gl::TRUE.into()
  }

  unsafe fn destroy_program(program: &mut Self::ProgramRepr) {
    if let Ok(mut state) = program.state.try_borrow_mut() {
      state.unuse_program(program.handle);
    }

    gl::DeleteProgram(program.handle);
  }

  unsafe fn use_program(&mut self, program: Option<&Self::ProgramRepr>) {
    let handle = program.map_or(0, |program| program.handle);
    self.state.borrow_mut().use_program(handle);
  }

  unsafe fn active_uniforms(&mut self, program: &Self::ProgramRepr) -> Vec<String> {
    let handle = program.handle;

    let mut count: GLint = 0;
    gl::GetProgramiv(handle, gl::ACTIVE_UNIFORMS, &mut count);

    // get the max length of the returned names
    let mut max_len: GLint = 0;
    gl::GetProgramiv(handle, gl::ACTIVE_UNIFORM_MAX_LENGTH, &mut max_len);

    let mut names = Vec::with_capacity(count.max(0) as usize);
    let mut name = vec![0u8; max_len.max(1) as usize];

    for index in 0..count.max(0) as GLuint {
      let mut len: GLsizei = 0;
      let mut size: GLint = 0;
      let mut ty: GLenum = 0;

      gl::GetActiveUniform(
        handle,
        index,
        name.len() as GLsizei,
        &mut len,
        &mut size,
        &mut ty,
        name.as_mut_ptr() as *mut GLchar,
      );

      let raw = String::from_utf8_lossy(&name[..len.max(0) as usize]);
      names.push(normalize_uniform_name(&raw).to_owned());
    }

    trace!("program {} has {} active uniform(s)", handle, names.len());

    names
  }

  unsafe fn uniform_location(
    &mut self,
    program: &Self::ProgramRepr,
    name: &str,
  ) -> Option<Self::UniformLocation> {
    let c_name = CString::new(name.as_bytes()).ok()?;
    let location = gl::GetUniformLocation(program.handle, c_name.as_ptr() as *const GLchar);

    // ensure the location smells good
    if location < 0 {
      None
    } else {
      Some(location)
    }
  }
}

unsafe impl UniformStorage for GL33 {
  impl_upload! {
    uniform1iv => Uniform1iv, i32;
    uniform2iv => Uniform2iv, i32;
    uniform3iv => Uniform3iv, i32;
    uniform4iv => Uniform4iv, i32;
    uniform1fv => Uniform1fv, f32;
    uniform2fv => Uniform2fv, f32;
    uniform3fv => Uniform3fv, f32;
    uniform4fv => Uniform4fv, f32;
  }

  impl_upload! {
    mat uniform_matrix2fv => UniformMatrix2fv;
    mat uniform_matrix3fv => UniformMatrix3fv;
    mat uniform_matrix4fv => UniformMatrix4fv;
  }

  unsafe fn get_uniformiv(
    &mut self,
    program: &Self::ProgramRepr,
    location: Self::UniformLocation,
    out: &mut [i32],
  ) {
    gl::GetUniformiv(program.handle, location, out.as_mut_ptr());
  }

  unsafe fn get_uniformfv(
    &mut self,
    program: &Self::ProgramRepr,
    location: Self::UniformLocation,
    out: &mut [f32],
  ) {
    gl::GetUniformfv(program.handle, location, out.as_mut_ptr());
  }
}

fn opengl_shader_type(t: StageType) -> GLenum {
  match t {
    StageType::VertexShader => gl::VERTEX_SHADER,
    StageType::FragmentShader => gl::FRAGMENT_SHADER,
  }
}

// Drivers report array uniforms by their first element.
fn normalize_uniform_name(name: &str) -> &str {
  name.strip_suffix("[0]").unwrap_or(name)
}

fn info_log(log: &[u8]) -> String {
  String::from_utf8_lossy(log)
    .trim_end_matches('\0')
    .to_owned()
}
