//! Uniform type descriptions.
//!
//! These types are decided once, when the uniform declarations of a program are parsed, and then
//! carried around as data to pick upload and query calls.

use std::fmt;

/// Shape family of a uniform.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UniformKind {
  /// A single component, such as `float` or `int`.
  Scalar,
  /// A vector, such as `vec3` or `ivec2`.
  Vector,
  /// A square matrix, such as `mat4`.
  Matrix,
}

impl fmt::Display for UniformKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      UniformKind::Scalar => f.write_str("scalar"),
      UniformKind::Vector => f.write_str("vector"),
      UniformKind::Matrix => f.write_str("matrix"),
    }
  }
}

/// Type of the components of a uniform.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BaseType {
  /// 32-bit signed integer components.
  Int,
  /// 32-bit floating-point components.
  Float,
}

impl fmt::Display for BaseType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      BaseType::Int => f.write_str("int"),
      BaseType::Float => f.write_str("float"),
    }
  }
}

/// Component width of a uniform.
///
/// For vectors, this is the number of components; for matrices, the side length (a `mat3` has a
/// width of three and nine components).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Width {
  /// One component.
  One,
  /// Two components.
  Two,
  /// Three components.
  Three,
  /// Four components.
  Four,
}

impl Width {
  /// Width out of a type suffix digit; `None` if not in `1..=4`.
  pub fn from_digit(digit: u32) -> Option<Self> {
    match digit {
      1 => Some(Width::One),
      2 => Some(Width::Two),
      3 => Some(Width::Three),
      4 => Some(Width::Four),
      _ => None,
    }
  }

  /// Numeric value of the width.
  pub fn get(self) -> usize {
    match self {
      Width::One => 1,
      Width::Two => 2,
      Width::Three => 3,
      Width::Four => 4,
    }
  }
}

/// Everything lumen knows about a declared uniform.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct UniformDescriptor {
  /// Shape family.
  pub kind: UniformKind,
  /// Component type.
  pub base_type: BaseType,
  /// Vector width or matrix side.
  pub width: Width,
  /// Number of array elements; a uniform declared without brackets has one element.
  pub array_length: usize,
}

impl UniformDescriptor {
  /// Create a new descriptor.
  pub fn new(kind: UniformKind, base_type: BaseType, width: Width, array_length: usize) -> Self {
    UniformDescriptor {
      kind,
      base_type,
      width,
      array_length,
    }
  }

  /// Number of components of a single array element.
  pub fn element_len(&self) -> usize {
    let width = self.width.get();

    match self.kind {
      UniformKind::Matrix => width * width,
      UniformKind::Scalar | UniformKind::Vector => width,
    }
  }

  /// Number of components of the whole uniform, all array elements included.
  pub fn len(&self) -> usize {
    self.element_len() * self.array_length
  }

  /// Base type the values travel as.
  ///
  /// Matrices only have floating-point upload calls.
  pub fn storage_type(&self) -> BaseType {
    match self.kind {
      UniformKind::Matrix => BaseType::Float,
      UniformKind::Scalar | UniformKind::Vector => self.base_type,
    }
  }
}

impl fmt::Display for UniformDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    let width = self.width.get();

    match (self.kind, self.base_type) {
      (UniformKind::Scalar, base) => write!(f, "{}", base)?,
      (UniformKind::Vector, BaseType::Int) => write!(f, "ivec{}", width)?,
      (UniformKind::Vector, BaseType::Float) => write!(f, "vec{}", width)?,
      (UniformKind::Matrix, _) => write!(f, "mat{}", width)?,
    }

    if self.array_length > 1 {
      write!(f, "[{}]", self.array_length)?;
    }

    Ok(())
  }
}
