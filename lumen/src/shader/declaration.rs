//! Uniform declarations.
//!
//! Recover the uniform interface of a program out of its GLSL sources. The parser only looks at
//! statements of the form:
//!
//! ```glsl
//! uniform <type> <name>;
//! uniform <type> <name>[<n>];
//! ```
//!
//! The type is read from its trailing digit: `vec3` is a three-wide vector, `mat4` a 4×4 matrix,
//! `float` a scalar. `int`-based types (`int`, `ivec*`, `bool`, `bvec*` and samplers) are
//! integral, everything else is floating-point. A declaration without brackets is an array of
//! length one.
//!
//! Line comments and preprocessor lines are dropped before parsing, so that a uniform following
//! `#version` or a comment is still found.

use std::collections::HashMap;

use thiserror::Error;

use crate::shader::types::{BaseType, UniformDescriptor, UniformKind, Width};

/// Uniform declarations of a program, by name.
pub type UniformTable = HashMap<String, UniformDescriptor>;

/// Errors that can occur while parsing uniform declarations.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DeclarationError {
  /// The same uniform is declared several times with different types.
  #[error("inconsistent declarations of uniform {0}")]
  InconsistentRedeclaration(String),
  /// An array uniform is declared without a size, as in `uniform float x[];`.
  #[error("array declaration without size is not supported (uniform {0})")]
  UnsizedArrayDeclaration(String),
  /// The statement starts with `uniform` but is not a flat declaration.
  #[error("malformed uniform declaration: {0}")]
  MalformedDeclaration(String),
}

impl DeclarationError {
  fn malformed<S>(statement: S) -> Self
  where
    S: Into<String>,
  {
    DeclarationError::MalformedDeclaration(statement.into())
  }
}

/// Parse every uniform declaration in `source`.
pub fn parse(source: &str) -> Result<UniformTable, DeclarationError> {
  let mut table = UniformTable::new();
  parse_into(source, &mut table)?;
  Ok(table)
}

/// Parse every uniform declaration in `source` and add it to `table`.
///
/// Declarations already in `table` are accepted if they are identical. On error, `table` may have
/// received the declarations preceding the faulty one.
pub fn parse_into(source: &str, table: &mut UniformTable) -> Result<(), DeclarationError> {
  let source = strip_comments_and_directives(source);

  for statement in source.split(';').map(str::trim) {
    let declaration = match strip_uniform_keyword(statement) {
      Some(declaration) => declaration,
      None => continue,
    };

    let (name, descriptor) = parse_declaration(statement, declaration)?;

    match table.get(name) {
      Some(existing) if *existing != descriptor => {
        return Err(DeclarationError::InconsistentRedeclaration(name.to_owned()));
      }

      Some(_) => (),

      None => {
        table.insert(name.to_owned(), descriptor);
      }
    }
  }

  Ok(())
}

fn strip_comments_and_directives(source: &str) -> String {
  source
    .lines()
    .map(|line| {
      let line = match line.find("//") {
        Some(comment) => &line[..comment],
        None => line,
      };

      if line.trim_start().starts_with('#') {
        ""
      } else {
        line
      }
    })
    .collect::<Vec<_>>()
    .join("\n")
}

// `uniform` must be a whole token: `uniformity x` is not a declaration.
fn strip_uniform_keyword(statement: &str) -> Option<&str> {
  let rest = statement.strip_prefix("uniform")?;

  if rest.starts_with(char::is_whitespace) {
    Some(rest)
  } else {
    None
  }
}

fn parse_declaration<'a>(
  statement: &str,
  declaration: &'a str,
) -> Result<(&'a str, UniformDescriptor), DeclarationError> {
  let mut tokens = declaration.split_whitespace();

  let (ty, name) = match (tokens.next(), tokens.next(), tokens.next()) {
    (Some(ty), Some(name), None) => (ty, name),
    _ => return Err(DeclarationError::malformed(statement)),
  };

  let (name, array_length) = parse_name(statement, name)?;
  let (kind, base_type, width) = parse_type(statement, ty)?;

  Ok((
    name,
    UniformDescriptor::new(kind, base_type, width, array_length),
  ))
}

fn parse_name<'a>(statement: &str, token: &'a str) -> Result<(&'a str, usize), DeclarationError> {
  let (name, suffix) = match token.split_once('[') {
    Some(split) => split,
    None => return Ok((token, 1)),
  };

  if name.is_empty() {
    return Err(DeclarationError::malformed(statement));
  }

  let size = suffix
    .strip_suffix(']')
    .ok_or_else(|| DeclarationError::malformed(statement))?
    .trim();

  if size.is_empty() {
    return Err(DeclarationError::UnsizedArrayDeclaration(name.to_owned()));
  }

  match size.parse::<usize>() {
    Ok(size) if size > 0 => Ok((name, size)),
    _ => Err(DeclarationError::malformed(statement)),
  }
}

fn parse_type(
  statement: &str,
  token: &str,
) -> Result<(UniformKind, BaseType, Width), DeclarationError> {
  let digit = token.chars().last().and_then(|c| c.to_digit(10));

  let (kind, family, width) = match digit {
    Some(digit) => {
      let family = &token[..token.len() - 1];
      let width = Width::from_digit(digit).ok_or_else(|| DeclarationError::malformed(statement))?;

      let kind = match family {
        "mat" if width != Width::One => UniformKind::Matrix,
        // mat1, non-square matrices (mat2x3) and friends
        f if f.starts_with("mat") => return Err(DeclarationError::malformed(statement)),
        _ => UniformKind::Vector,
      };

      (kind, family, width)
    }

    None => (UniformKind::Scalar, token, Width::One),
  };

  Ok((kind, base_type(family), width))
}

fn base_type(family: &str) -> BaseType {
  match family {
    "int" | "ivec" | "bool" | "bvec" => BaseType::Int,
    f if f.contains("sampler") => BaseType::Int,
    _ => BaseType::Float,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn desc(kind: UniformKind, base_type: BaseType, width: Width, len: usize) -> UniformDescriptor {
    UniformDescriptor::new(kind, base_type, width, len)
  }

  #[test]
  fn scalar_vector_matrix_and_array() {
    let table = parse("uniform vec3 x; uniform mat4 m; uniform int n[5];").unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(
      table["x"],
      desc(UniformKind::Vector, BaseType::Float, Width::Three, 1)
    );
    assert_eq!(
      table["m"],
      desc(UniformKind::Matrix, BaseType::Float, Width::Four, 1)
    );
    assert_eq!(
      table["n"],
      desc(UniformKind::Scalar, BaseType::Int, Width::One, 5)
    );
  }

  #[test]
  fn inconsistent_redeclaration() {
    let err = parse("uniform vec3 x; uniform vec4 x;").unwrap_err();
    assert_eq!(err, DeclarationError::InconsistentRedeclaration("x".to_owned()));
  }

  #[test]
  fn identical_redeclaration_is_idempotent() {
    let table = parse("uniform vec3 x; uniform vec3 x;").unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(
      table["x"],
      desc(UniformKind::Vector, BaseType::Float, Width::Three, 1)
    );
  }

  #[test]
  fn redeclaring_an_array_with_another_length_is_inconsistent() {
    let err = parse("uniform float w[3]; uniform float w[4];").unwrap_err();
    assert_eq!(err, DeclarationError::InconsistentRedeclaration("w".to_owned()));
  }

  #[test]
  fn unsized_array() {
    let err = parse("uniform float y[];").unwrap_err();
    assert_eq!(err, DeclarationError::UnsizedArrayDeclaration("y".to_owned()));
  }

  #[test]
  fn token_count_must_be_two() {
    assert_eq!(
      parse("uniform highp float t;").unwrap_err(),
      DeclarationError::MalformedDeclaration("uniform highp float t".to_owned())
    );
    assert_eq!(
      parse("uniform float;").unwrap_err(),
      DeclarationError::MalformedDeclaration("uniform float".to_owned())
    );
  }

  #[test]
  fn bad_array_sizes() {
    assert!(matches!(
      parse("uniform float y[0];"),
      Err(DeclarationError::MalformedDeclaration(_))
    ));
    assert!(matches!(
      parse("uniform float y[two];"),
      Err(DeclarationError::MalformedDeclaration(_))
    ));
    assert!(matches!(
      parse("uniform float y[2;"),
      Err(DeclarationError::MalformedDeclaration(_))
    ));
  }

  #[test]
  fn unsupported_widths_and_matrices() {
    assert!(matches!(
      parse("uniform vec5 v;"),
      Err(DeclarationError::MalformedDeclaration(_))
    ));
    assert!(matches!(
      parse("uniform mat2x3 m;"),
      Err(DeclarationError::MalformedDeclaration(_))
    ));
    assert!(matches!(
      parse("uniform mat1 m;"),
      Err(DeclarationError::MalformedDeclaration(_))
    ));
  }

  #[test]
  fn integral_families() {
    let table = parse(
      "uniform ivec2 a; uniform bool b; uniform sampler2D tex; uniform isampler3D itex; uniform bvec3 c;",
    )
    .unwrap();

    assert_eq!(
      table["a"],
      desc(UniformKind::Vector, BaseType::Int, Width::Two, 1)
    );
    assert_eq!(
      table["b"],
      desc(UniformKind::Scalar, BaseType::Int, Width::One, 1)
    );
    assert_eq!(
      table["tex"],
      desc(UniformKind::Scalar, BaseType::Int, Width::One, 1)
    );
    assert_eq!(
      table["itex"],
      desc(UniformKind::Scalar, BaseType::Int, Width::One, 1)
    );
    assert_eq!(
      table["c"],
      desc(UniformKind::Vector, BaseType::Int, Width::Three, 1)
    );
  }

  #[test]
  fn other_statements_are_ignored() {
    let src = r#"
      #version 120
      // the time, in seconds
      uniform float t;
      varying vec2 uv;
      uniformity x;

      void main() {
        vec4 c = vec4(uv, t, 1.);
        gl_FragColor = c;
      }
    "#;

    let table = parse(src).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(
      table["t"],
      desc(UniformKind::Scalar, BaseType::Float, Width::One, 1)
    );
  }

  #[test]
  fn whitespace_around_declarations() {
    let table = parse("  uniform\tmat2   rot ;\n\nuniform vec2 offsets[3];").unwrap();

    assert_eq!(
      table["rot"],
      desc(UniformKind::Matrix, BaseType::Float, Width::Two, 1)
    );
    assert_eq!(
      table["offsets"],
      desc(UniformKind::Vector, BaseType::Float, Width::Two, 3)
    );
  }

  #[test]
  fn parse_into_accumulates() {
    let mut table = parse("uniform vec3 color;").unwrap();
    parse_into("uniform vec3 color; uniform float alpha;", &mut table).unwrap();

    assert_eq!(table.len(), 2);
    assert!(parse_into("uniform vec4 color;", &mut table).is_err());
  }

  #[test]
  fn empty_source() {
    assert!(parse("").unwrap().is_empty());
  }
}
