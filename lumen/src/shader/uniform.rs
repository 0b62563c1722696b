//! Uniform marshalling.
//!
//! Values travel between the host and a program as flat sequences of components. On the way in,
//! anything implementing [`AsUniformData`] is flattened (scalars, arrays, nested arrays, slices,
//! vectors…) and checked against the [`UniformDescriptor`] of the target uniform before a single
//! upload call is issued. On the way out, components are read element by element and reshaped
//! into a [`UniformValue`].
//!
//! Matrices are given in row-major order, as nested arrays of rows:
//!
//! ```ignore
//! program.set(&mut ctx, "rot", &[[0f32, -1.], [1., 0.]])?;
//! ```
//!
//! They are uploaded with the driver’s transpose flag set, since its native layout is
//! column-major, and transposed back when read.

use log::trace;
use thiserror::Error;

use crate::backend::shader::{Shader, UniformStorage};
use crate::context::Context;
use crate::shader::program::{LinkState, Program};
use crate::shader::types::{BaseType, UniformDescriptor, UniformKind, Width};

/// Errors that can occur while setting or getting a uniform.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum UniformError {
  /// The program is not the current program, or is not linked.
  #[error("shader program is not bound; cannot access uniforms")]
  Unbound,
  /// The uniform is not active: it is not declared, or it was optimized away.
  #[error("uniform {0} is not active; make sure the variable is used in the source code")]
  NotActive(String),
  /// The driver reports the uniform as active, but no declaration of it was parsed.
  #[error("uniform {0} is active but its declaration was not found in the shader sources")]
  Undeclared(String),
  /// The number of components passed doesn’t match the uniform’s shape.
  #[error("uniform {name} expects {expected} values, got {actual}")]
  ArityMismatch {
    /// Name of the uniform.
    name: String,
    /// Number of components the uniform holds.
    expected: usize,
    /// Number of components that were passed.
    actual: usize,
  },
  /// Floating-point values were passed for an integral uniform.
  #[error("uniform {name} expects {expected} values")]
  TypeMismatch {
    /// Name of the uniform.
    name: String,
    /// Base type of the uniform.
    expected: BaseType,
  },
  /// The driver has no location for the uniform (or one of its array elements).
  #[error("cannot query the location of uniform {0}")]
  LocationNotFound(String),
}

/// Flattened host values.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformData {
  /// Integral components.
  Int(Vec<i32>),
  /// Floating-point components.
  Float(Vec<f32>),
}

impl UniformData {
  /// Number of components.
  pub fn len(&self) -> usize {
    match *self {
      UniformData::Int(ref v) => v.len(),
      UniformData::Float(ref v) => v.len(),
    }
  }

  /// Whether there is no component at all.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn base_type(&self) -> BaseType {
    match *self {
      UniformData::Int(_) => BaseType::Int,
      UniformData::Float(_) => BaseType::Float,
    }
  }
}

/// Single components values are made of.
pub trait Component: Copy {
  /// Wrap flattened components.
  fn into_data(components: Vec<Self>) -> UniformData;
}

impl Component for i32 {
  fn into_data(components: Vec<Self>) -> UniformData {
    UniformData::Int(components)
  }
}

impl Component for f32 {
  fn into_data(components: Vec<Self>) -> UniformData {
    UniformData::Float(components)
  }
}

impl Component for bool {
  fn into_data(components: Vec<Self>) -> UniformData {
    UniformData::Int(components.into_iter().map(i32::from).collect())
  }
}

/// Values that can be flattened into a linear sequence of components.
pub trait Flatten {
  /// Type of the components.
  type Component: Component;

  /// Push the components of `self` to `out`, in order.
  fn flatten_into(&self, out: &mut Vec<Self::Component>);
}

macro_rules! impl_Flatten_component {
  ($($t:ty),*) => {
    $(
      impl Flatten for $t {
        type Component = $t;

        fn flatten_into(&self, out: &mut Vec<Self::Component>) {
          out.push(*self);
        }
      }
    )*
  };
}

impl_Flatten_component!(i32, f32, bool);

impl<T, const N: usize> Flatten for [T; N]
where
  T: Flatten,
{
  type Component = T::Component;

  fn flatten_into(&self, out: &mut Vec<Self::Component>) {
    self[..].flatten_into(out)
  }
}

impl<T> Flatten for [T]
where
  T: Flatten,
{
  type Component = T::Component;

  fn flatten_into(&self, out: &mut Vec<Self::Component>) {
    for x in self {
      x.flatten_into(out);
    }
  }
}

impl<T> Flatten for Vec<T>
where
  T: Flatten,
{
  type Component = T::Component;

  fn flatten_into(&self, out: &mut Vec<Self::Component>) {
    self.as_slice().flatten_into(out)
  }
}

impl<'a, T> Flatten for &'a T
where
  T: ?Sized + Flatten,
{
  type Component = T::Component;

  fn flatten_into(&self, out: &mut Vec<Self::Component>) {
    (**self).flatten_into(out)
  }
}

/// Host values that can be set to a uniform.
pub trait AsUniformData {
  /// Flatten into components.
  fn as_uniform_data(&self) -> UniformData;
}

impl<T> AsUniformData for T
where
  T: ?Sized + Flatten,
{
  fn as_uniform_data(&self) -> UniformData {
    let mut out = Vec::new();
    self.flatten_into(&mut out);
    T::Component::into_data(out)
  }
}

impl AsUniformData for UniformData {
  fn as_uniform_data(&self) -> UniformData {
    self.clone()
  }
}

/// Values read back from a uniform.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
  /// A single integral scalar.
  Int(i32),
  /// A single floating-point scalar.
  Float(f32),
  /// Integral vector or array, flattened.
  Ints(Vec<i32>),
  /// Floating-point vector or array, flattened.
  Floats(Vec<f32>),
  /// Matrices, as `[element][row][column]`.
  Matrices(Vec<Vec<Vec<f32>>>),
}

impl<B> Program<B>
where
  B: Shader + UniformStorage,
{
  /// Set the value of a uniform.
  ///
  /// The program must be the current program of `ctx`. Every check (activity, declaration, arity, base type, location)
  /// happens before the upload, so a failed call leaves the uniform untouched.
  pub fn set<V>(&self, ctx: &mut Context<B>, name: &str, value: &V) -> Result<(), UniformError>
  where
    V: ?Sized + AsUniformData,
  {
    let descriptor = self.checked_descriptor(ctx, name)?;
    let data = value.as_uniform_data();

    if data.len() != descriptor.len() {
      return Err(UniformError::ArityMismatch {
        name: name.to_owned(),
        expected: descriptor.len(),
        actual: data.len(),
      });
    }

    let data = coerce(name, &descriptor, data)?;
    let location = self.location(ctx, name)?;
    let count = descriptor.array_length;

    trace!("uploading {} as {} ({} component(s))", name, descriptor, data.len());

    let backend = ctx.backend();

    unsafe {
      match (descriptor.kind, data) {
        (UniformKind::Matrix, UniformData::Float(ref v)) => match descriptor.width {
          // mat1 is not a GLSL type and never gets out of the declaration parser
          Width::One => unreachable!("one-wide matrix uniform {}", name),
          Width::Two => backend.uniform_matrix2fv(location, count, true, v),
          Width::Three => backend.uniform_matrix3fv(location, count, true, v),
          Width::Four => backend.uniform_matrix4fv(location, count, true, v),
        },

        (_, UniformData::Int(ref v)) => match descriptor.width {
          Width::One => backend.uniform1iv(location, count, v),
          Width::Two => backend.uniform2iv(location, count, v),
          Width::Three => backend.uniform3iv(location, count, v),
          Width::Four => backend.uniform4iv(location, count, v),
        },

        (_, UniformData::Float(ref v)) => match descriptor.width {
          Width::One => backend.uniform1fv(location, count, v),
          Width::Two => backend.uniform2fv(location, count, v),
          Width::Three => backend.uniform3fv(location, count, v),
          Width::Four => backend.uniform4fv(location, count, v),
        },
      }
    }

    Ok(())
  }

  /// Get the value of a uniform.
  ///
  /// The program must be the current program of `ctx`. Scalars come back as [`UniformValue::Int`] or
  /// [`UniformValue::Float`], vectors and arrays flattened, and matrices row-major.
  pub fn get(&self, ctx: &mut Context<B>, name: &str) -> Result<UniformValue, UniformError> {
    let descriptor = self.checked_descriptor(ctx, name)?;

    // the driver has no single location for a whole array
    let mut locations = Vec::with_capacity(descriptor.array_length);
    locations.push(self.location(ctx, name)?);

    for i in 1..descriptor.array_length {
      locations.push(self.location(ctx, &format!("{}[{}]", name, i))?);
    }

    trace!("querying {} as {}", name, descriptor);

    let element_len = descriptor.element_len();
    let backend = ctx.backend();

    let value = match descriptor.storage_type() {
      BaseType::Int => {
        let mut components = vec![0; descriptor.len()];

        for (element, location) in components.chunks_mut(element_len).zip(locations) {
          unsafe { backend.get_uniformiv(self.repr(), location, element) };
        }

        reshape_ints(components)
      }

      BaseType::Float => {
        let mut components = vec![0.; descriptor.len()];

        for (element, location) in components.chunks_mut(element_len).zip(locations) {
          unsafe { backend.get_uniformfv(self.repr(), location, element) };
        }

        reshape_floats(&descriptor, components)
      }
    };

    Ok(value)
  }

  fn checked_descriptor(
    &self,
    ctx: &mut Context<B>,
    name: &str,
  ) -> Result<UniformDescriptor, UniformError> {
    // the local flag goes stale when another program is bound over this one
    if !self.is_bound() || !ctx.is_current(self) || self.link_state() != LinkState::Linked {
      return Err(UniformError::Unbound);
    }

    if !self.active_uniforms(ctx).iter().any(|active| active == name) {
      return Err(UniformError::NotActive(name.to_owned()));
    }

    self
      .descriptor(name)
      .copied()
      .ok_or_else(|| UniformError::Undeclared(name.to_owned()))
  }

  fn location(&self, ctx: &mut Context<B>, name: &str) -> Result<B::UniformLocation, UniformError> {
    let location = unsafe { ctx.backend().uniform_location(self.repr(), name) };
    location.ok_or_else(|| UniformError::LocationNotFound(name.to_owned()))
  }
}

// Integral values widen to floating-point uniforms; the other way around is refused.
fn coerce(
  name: &str,
  descriptor: &UniformDescriptor,
  data: UniformData,
) -> Result<UniformData, UniformError> {
  match (descriptor.storage_type(), data) {
    (BaseType::Float, UniformData::Int(v)) => Ok(UniformData::Float(
      v.into_iter().map(|x| x as f32).collect(),
    )),

    (expected, data) if expected != data.base_type() => Err(UniformError::TypeMismatch {
      name: name.to_owned(),
      expected,
    }),

    (_, data) => Ok(data),
  }
}

fn reshape_ints(components: Vec<i32>) -> UniformValue {
  if components.len() == 1 {
    UniformValue::Int(components[0])
  } else {
    UniformValue::Ints(components)
  }
}

fn reshape_floats(descriptor: &UniformDescriptor, components: Vec<f32>) -> UniformValue {
  match descriptor.kind {
    UniformKind::Matrix => {
      let side = descriptor.width.get();

      UniformValue::Matrices(
        components
          .chunks(side * side)
          .map(|m| rows_from_column_major(m, side))
          .collect(),
      )
    }

    UniformKind::Scalar | UniformKind::Vector if components.len() == 1 => {
      UniformValue::Float(components[0])
    }

    UniformKind::Scalar | UniformKind::Vector => UniformValue::Floats(components),
  }
}

fn rows_from_column_major(m: &[f32], side: usize) -> Vec<Vec<f32>> {
  (0..side)
    .map(|row| (0..side).map(|col| m[col * side + row]).collect())
    .collect()
}
