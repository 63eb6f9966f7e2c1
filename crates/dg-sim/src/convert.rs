//! Conversion of YAML arguments to command values.
//!
//! YAML has no notion of the closed value set, so an argument is converted by
//! the kind the command declares for it:
//! - numbers become any numeric kind (integers must be whole and in range)
//! - a list of numbers becomes a vector
//! - a list of equally long lists becomes a matrix (rows first)
//! - text becomes a string, or is parsed with the stream text format for
//!   any other kind

use nalgebra::{DMatrix, DVector, Matrix4};

use dg_core::{DgError, DgResult, Value, ValueKind};

use crate::schema::ArgDef;

/// Convert `arg` to a value of `kind`.
pub fn to_value(arg: &ArgDef, kind: ValueKind) -> DgResult<Value> {
    if let ArgDef::Text(text) = arg {
        return match kind {
            ValueKind::String => Ok(Value::String(text.clone())),
            _ => Value::parse(kind, text),
        };
    }

    let value = match kind {
        ValueKind::Bool => match arg {
            ArgDef::Bool(b) => Value::Bool(*b),
            _ => return Err(mismatch(arg, kind)),
        },
        ValueKind::Unsigned => Value::Unsigned(integer(number(arg, kind)?, kind)?),
        ValueKind::UnsignedLong => Value::UnsignedLong(integer(number(arg, kind)?, kind)?),
        ValueKind::Int => Value::Int(integer(number(arg, kind)?, kind)?),
        ValueKind::Long => Value::Long(integer(number(arg, kind)?, kind)?),
        ValueKind::Float => Value::Float(number(arg, kind)? as f32),
        ValueKind::Double => Value::Double(number(arg, kind)?),
        ValueKind::String => return Err(mismatch(arg, kind)),
        ValueKind::Vector => Value::Vector(DVector::from_vec(numbers(arg, kind)?)),
        ValueKind::Matrix => {
            let (rows, cols, data) = matrix(arg, kind)?;
            Value::Matrix(DMatrix::from_row_slice(rows, cols, &data))
        }
        ValueKind::Matrix4 => {
            let (rows, cols, data) = matrix(arg, kind)?;
            if (rows, cols) != (4, 4) {
                return Err(DgError::InvalidArg {
                    what: format!("expected a 4x4 matrix, got {rows}x{cols}"),
                });
            }
            Value::Matrix4(Matrix4::from_row_slice(&data))
        }
        ValueKind::Values => match arg {
            ArgDef::List(items) => Value::Values(items.iter().map(infer).collect()),
            _ => return Err(mismatch(arg, kind)),
        },
    };
    Ok(value)
}

/// Best-guess value of an argument without a declared kind.
pub fn infer(arg: &ArgDef) -> Value {
    match arg {
        ArgDef::Bool(b) => Value::Bool(*b),
        ArgDef::Number(x) => Value::Double(*x),
        ArgDef::Text(s) => Value::String(s.clone()),
        ArgDef::List(items) => Value::Values(items.iter().map(infer).collect()),
    }
}

fn describe(arg: &ArgDef) -> &'static str {
    match arg {
        ArgDef::Bool(_) => "a boolean",
        ArgDef::Number(_) => "a number",
        ArgDef::Text(_) => "a string",
        ArgDef::List(_) => "a list",
    }
}

fn mismatch(arg: &ArgDef, kind: ValueKind) -> DgError {
    DgError::InvalidArg {
        what: format!("expected {kind}, got {}", describe(arg)),
    }
}

fn number(arg: &ArgDef, kind: ValueKind) -> DgResult<f64> {
    match arg {
        ArgDef::Number(x) => Ok(*x),
        _ => Err(mismatch(arg, kind)),
    }
}

fn integer<T: TryFrom<i64>>(x: f64, kind: ValueKind) -> DgResult<T> {
    let out_of_range = || DgError::InvalidArg {
        what: format!("{x} is not a valid {kind}"),
    };
    if x.fract() != 0.0 || !x.is_finite() || x.abs() >= 9.0e18 {
        return Err(out_of_range());
    }
    T::try_from(x as i64).map_err(|_| out_of_range())
}

fn numbers(arg: &ArgDef, kind: ValueKind) -> DgResult<Vec<f64>> {
    match arg {
        ArgDef::List(items) => items.iter().map(|item| number(item, kind)).collect(),
        _ => Err(mismatch(arg, kind)),
    }
}

/// Rows of numbers flattened row by row, with the shape.
fn matrix(arg: &ArgDef, kind: ValueKind) -> DgResult<(usize, usize, Vec<f64>)> {
    let ArgDef::List(rows) = arg else {
        return Err(mismatch(arg, kind));
    };
    let mut data = Vec::new();
    let mut cols = None;
    for row in rows {
        let row = numbers(row, kind)?;
        match cols {
            None => cols = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(DgError::InvalidArg {
                    what: format!("matrix rows have {n} and {} entries", row.len()),
                });
            }
            Some(_) => {}
        }
        data.extend(row);
    }
    Ok((rows.len(), cols.unwrap_or(0), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(xs: &[f64]) -> ArgDef {
        ArgDef::List(xs.iter().copied().map(ArgDef::Number).collect())
    }

    #[test]
    fn numbers_follow_the_declared_kind() {
        let n = ArgDef::Number(3.0);
        assert_eq!(to_value(&n, ValueKind::Double).unwrap(), Value::Double(3.0));
        assert_eq!(to_value(&n, ValueKind::Int).unwrap(), Value::Int(3));
        assert_eq!(to_value(&n, ValueKind::Unsigned).unwrap(), Value::Unsigned(3));
        assert_eq!(to_value(&n, ValueKind::Float).unwrap(), Value::Float(3.0));
        assert!(to_value(&ArgDef::Number(2.5), ValueKind::Int).is_err());
        assert!(to_value(&ArgDef::Number(-1.0), ValueKind::Unsigned).is_err());
        assert!(to_value(&n, ValueKind::String).is_err());
    }

    #[test]
    fn lists_become_vectors_and_matrices() {
        assert_eq!(
            to_value(&list(&[1.0, 2.0]), ValueKind::Vector).unwrap(),
            Value::Vector(DVector::from_vec(vec![1.0, 2.0]))
        );
        let gain = ArgDef::List(vec![list(&[-1.0, -50.0, -2.0, -10.0])]);
        assert_eq!(
            to_value(&gain, ValueKind::Matrix).unwrap(),
            Value::Matrix(DMatrix::from_row_slice(1, 4, &[-1.0, -50.0, -2.0, -10.0]))
        );
        let ragged = ArgDef::List(vec![list(&[1.0]), list(&[1.0, 2.0])]);
        assert!(to_value(&ragged, ValueKind::Matrix).is_err());
        assert!(to_value(&gain, ValueKind::Matrix4).is_err());
    }

    #[test]
    fn identity_as_matrix4() {
        let rows = (0..4)
            .map(|i| list(&(0..4).map(|j| if i == j { 1.0 } else { 0.0 }).collect::<Vec<_>>()))
            .collect();
        assert_eq!(
            to_value(&ArgDef::List(rows), ValueKind::Matrix4).unwrap(),
            Value::Matrix4(Matrix4::identity())
        );
    }

    #[test]
    fn text_is_parsed_by_kind() {
        let text = ArgDef::Text("[2](1,2)".into());
        assert_eq!(
            to_value(&text, ValueKind::Vector).unwrap(),
            Value::Vector(DVector::from_vec(vec![1.0, 2.0]))
        );
        assert_eq!(
            to_value(&text, ValueKind::String).unwrap(),
            Value::String("[2](1,2)".into())
        );
        assert!(to_value(&ArgDef::Text("x".into()), ValueKind::Double).is_err());
    }

    #[test]
    fn value_lists_are_inferred() {
        let args = ArgDef::List(vec![ArgDef::Bool(true), ArgDef::Number(1.0)]);
        assert_eq!(
            to_value(&args, ValueKind::Values).unwrap(),
            Value::Values(vec![Value::Bool(true), Value::Double(1.0)])
        );
    }
}
