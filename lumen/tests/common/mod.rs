//! In-memory backend.
//!
//! The mock “driver” compiles anything, except sources containing `COMPILE_ERROR`, and links
//! anything, except programs with a stage containing `LINK_ERROR`. Uniforms are found by parsing
//! the attached sources; they can be hidden from the active list with
//! [`MockState::optimized_out`], made active without a declaration with [`MockState::ghosts`] or
//! stripped of their location with [`MockState::no_location`]. Matrices are stored column-major,
//! as a real driver does.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lumen::backend::shader::{Shader, UniformStorage};
use lumen::context::Context;
use lumen::shader::declaration;
use lumen::shader::{ProgramError, StageError, StageType, UniformKind};

pub const VS: &str = r#"
  #version 120
  uniform mat4 proj;

  void main() {
    gl_Position = proj * gl_Vertex;
  }
"#;

pub const FS: &str = r#"
  #version 120
  uniform float t;
  uniform vec3 color;

  void main() {
    gl_FragColor = vec4(color * t, 1.);
  }
"#;

/// Backend calls, in the order they were issued.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
  NewStage(StageType),
  DeleteStage(u32),
  NewProgram(u32),
  Attach { program: u32, stage: u32 },
  Link(u32),
  IsLinked(u32),
  DeleteProgram(u32),
  UseProgram(Option<u32>),
  ActiveUniforms(u32),
  UniformLocation(String),
  Upload {
    call: &'static str,
    location: i32,
    count: usize,
  },
  Query(i32),
}

impl Call {
  pub fn is_upload(&self) -> bool {
    matches!(*self, Call::Upload { .. })
  }
}

#[derive(Debug, Default)]
pub struct MockState {
  pub calls: Vec<Call>,
  pub optimized_out: Vec<String>,
  pub ghosts: Vec<String>,
  pub no_location: Vec<String>,
  pub current: Option<u32>,
  next_handle: u32,
  programs: HashMap<u32, MockProgram>,
}

impl MockState {
  pub fn uploads(&self) -> Vec<Call> {
    self.calls.iter().filter(|c| c.is_upload()).cloned().collect()
  }

  pub fn count<F>(&self, f: F) -> usize
  where
    F: Fn(&Call) -> bool,
  {
    self.calls.iter().filter(|c| f(c)).count()
  }

  fn handle(&mut self) -> u32 {
    self.next_handle += 1;
    self.next_handle
  }
}

#[derive(Debug, Default)]
struct MockProgram {
  sources: Vec<String>,
  linked: bool,
  active: Vec<String>,
  locations: HashMap<String, i32>,
  // per-location element shape: (kind, side or width)
  shapes: HashMap<i32, (UniformKind, usize)>,
  storage: HashMap<i32, Vec<f64>>,
}

#[derive(Debug)]
pub struct MockStage {
  handle: u32,
  source: String,
  state: Rc<RefCell<MockState>>,
}

#[derive(Debug)]
pub struct MockProgramRepr {
  handle: u32,
  state: Rc<RefCell<MockState>>,
}

#[derive(Debug)]
pub struct Mock {
  state: Rc<RefCell<MockState>>,
}

/// Create a context over a fresh mock backend, along with a handle to inspect the mock.
pub fn context() -> (Context<Mock>, Rc<RefCell<MockState>>) {
  init_logger();

  let state = Rc::new(RefCell::new(MockState::default()));
  let mock = Mock {
    state: state.clone(),
  };

  (Context::new(mock), state)
}

pub fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

unsafe impl Shader for Mock {
  type StageRepr = MockStage;

  type ProgramRepr = MockProgramRepr;

  type UniformLocation = i32;

  unsafe fn new_stage(
    &mut self,
    ty: StageType,
    sources: &[&str],
  ) -> Result<Self::StageRepr, StageError> {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::NewStage(ty));

    if sources.iter().any(|src| src.contains("COMPILE_ERROR")) {
      return Err(StageError::CompilationFailed(
        ty,
        "0:1(1): error: COMPILE_ERROR".to_owned(),
      ));
    }

    Ok(MockStage {
      handle: state.handle(),
      source: sources.join("\n"),
      state: self.state.clone(),
    })
  }

  unsafe fn destroy_stage(stage: &mut Self::StageRepr) {
    stage
      .state
      .borrow_mut()
      .calls
      .push(Call::DeleteStage(stage.handle));
  }

  unsafe fn new_program(&mut self) -> Self::ProgramRepr {
    let mut state = self.state.borrow_mut();
    let handle = state.handle();

    state.calls.push(Call::NewProgram(handle));
    state.programs.insert(handle, MockProgram::default());

    MockProgramRepr {
      handle,
      state: self.state.clone(),
    }
  }

  unsafe fn attach_stage(&mut self, program: &mut Self::ProgramRepr, stage: &Self::StageRepr) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::Attach {
      program: program.handle,
      stage: stage.handle,
    });

    if let Some(p) = state.programs.get_mut(&program.handle) {
      p.sources.push(stage.source.clone());
    }
  }

  unsafe fn link_program(&mut self, program: &mut Self::ProgramRepr) -> Result<(), ProgramError> {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::Link(program.handle));

    let optimized_out = state.optimized_out.clone();
    let ghosts = state.ghosts.clone();

    let p = state
      .programs
      .get_mut(&program.handle)
      .expect("unknown program");

    if p.sources.iter().any(|src| src.contains("LINK_ERROR")) {
      p.linked = false;
      return Err(ProgramError::LinkFailed("error: LINK_ERROR".to_owned()));
    }

    let table = declaration::parse(&p.sources.join(";")).unwrap_or_default();
    let mut names = table.keys().cloned().collect::<Vec<_>>();
    names.sort();

    p.active.clear();
    p.locations.clear();
    p.shapes.clear();
    p.storage.clear();

    let mut next_location = 0;

    for name in names {
      if optimized_out.contains(&name) {
        continue;
      }

      let desc = table[&name];
      let shape = (desc.kind, desc.width.get());

      p.locations.insert(name.clone(), next_location);

      for i in 0..desc.array_length {
        let location = next_location + i as i32;

        p.locations.insert(format!("{}[{}]", name, i), location);
        p.shapes.insert(location, shape);
        p.storage.insert(location, vec![0.; desc.element_len()]);
      }

      next_location += desc.array_length as i32;
      p.active.push(name);
    }

    p.active.extend(ghosts);
    p.linked = true;

    Ok(())
  }

  unsafe fn is_linked(&mut self, program: &Self::ProgramRepr) -> bool {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::IsLinked(program.handle));
    state
      .programs
      .get(&program.handle)
      .map_or(false, |p| p.linked)
  }

  unsafe fn destroy_program(program: &mut Self::ProgramRepr) {
    let mut state = program.state.borrow_mut();

    if state.current == Some(program.handle) {
      state.calls.push(Call::UseProgram(None));
      state.current = None;
    }

    state.calls.push(Call::DeleteProgram(program.handle));
    state.programs.remove(&program.handle);
  }

  unsafe fn use_program(&mut self, program: Option<&Self::ProgramRepr>) {
    let mut state = self.state.borrow_mut();
    let handle = program.map(|p| p.handle);

    state.calls.push(Call::UseProgram(handle));
    state.current = handle;
  }

  unsafe fn active_uniforms(&mut self, program: &Self::ProgramRepr) -> Vec<String> {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::ActiveUniforms(program.handle));
    state
      .programs
      .get(&program.handle)
      .map(|p| p.active.clone())
      .unwrap_or_default()
  }

  unsafe fn uniform_location(
    &mut self,
    program: &Self::ProgramRepr,
    name: &str,
  ) -> Option<Self::UniformLocation> {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::UniformLocation(name.to_owned()));

    let bare = name.split('[').next().unwrap_or(name);

    if state.no_location.iter().any(|n| n == bare) {
      return None;
    }

    state
      .programs
      .get(&program.handle)
      .and_then(|p| p.locations.get(name).copied())
  }
}

impl Mock {
  fn upload(
    &mut self,
    call: &'static str,
    location: i32,
    count: usize,
    transpose: bool,
    values: Vec<f64>,
  ) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::Upload {
      call,
      location,
      count,
    });

    let current = match state.current {
      Some(current) => current,
      None => return,
    };

    let p = match state.programs.get_mut(&current) {
      Some(p) => p,
      None => return,
    };

    let element_len = values.len() / count;

    for (i, element) in values.chunks(element_len).enumerate() {
      let location = location + i as i32;

      let element = match p.shapes.get(&location) {
        Some(&(UniformKind::Matrix, side)) if transpose => transposed(element, side),
        _ => element.to_vec(),
      };

      p.storage.insert(location, element);
    }
  }

  fn query(&mut self, program: &MockProgramRepr, location: i32) -> Vec<f64> {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::Query(location));
    state
      .programs
      .get(&program.handle)
      .and_then(|p| p.storage.get(&location).cloned())
      .unwrap_or_default()
  }
}

fn transposed(m: &[f64], side: usize) -> Vec<f64> {
  (0..side * side)
    .map(|i| m[(i % side) * side + i / side])
    .collect()
}

macro_rules! mock_upload {
  ($($method:ident, $t:ty;)*) => {
    $(
      unsafe fn $method(&mut self, location: i32, count: usize, values: &[$t]) {
        let values = values.iter().map(|&x| x as f64).collect();
        self.upload(stringify!($method), location, count, false, values);
      }
    )*
  };
}

unsafe impl UniformStorage for Mock {
  mock_upload! {
    uniform1iv, i32;
    uniform2iv, i32;
    uniform3iv, i32;
    uniform4iv, i32;
    uniform1fv, f32;
    uniform2fv, f32;
    uniform3fv, f32;
    uniform4fv, f32;
  }

  unsafe fn uniform_matrix2fv(&mut self, location: i32, count: usize, transpose: bool, values: &[f32]) {
    let values = values.iter().map(|&x| x as f64).collect();
    self.upload("uniform_matrix2fv", location, count, transpose, values);
  }

  unsafe fn uniform_matrix3fv(&mut self, location: i32, count: usize, transpose: bool, values: &[f32]) {
    let values = values.iter().map(|&x| x as f64).collect();
    self.upload("uniform_matrix3fv", location, count, transpose, values);
  }

  unsafe fn uniform_matrix4fv(&mut self, location: i32, count: usize, transpose: bool, values: &[f32]) {
    let values = values.iter().map(|&x| x as f64).collect();
    self.upload("uniform_matrix4fv", location, count, transpose, values);
  }

  unsafe fn get_uniformiv(&mut self, program: &Self::ProgramRepr, location: i32, out: &mut [i32]) {
    for (o, v) in out.iter_mut().zip(self.query(program, location)) {
      *o = v as i32;
    }
  }

  unsafe fn get_uniformfv(&mut self, program: &Self::ProgramRepr, location: i32, out: &mut [f32]) {
    for (o, v) in out.iter_mut().zip(self.query(program, location)) {
      *o = v as f32;
    }
  }
}
