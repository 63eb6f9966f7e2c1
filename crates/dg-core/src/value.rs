//! The closed set of values that cross command boundaries.
//!
//! Signals may carry any payload type, but command arguments and results are
//! always one of the [`Value`] variants below. [`ValueType`] maps the Rust
//! types behind each variant to and from a `Value`.

use core::fmt;
use std::any::Any;

use nalgebra::{DMatrix, DVector, Matrix4};

use crate::codec;
use crate::error::{DgError, DgResult};

/// Kind tag of a [`Value`], used to declare command signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Unsigned,
    UnsignedLong,
    Int,
    Long,
    Float,
    Double,
    String,
    Vector,
    Matrix,
    Matrix4,
    Values,
}

impl ValueKind {
    /// Stable type name, as printed in signal names and error messages.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Unsigned => "unsigned",
            ValueKind::UnsignedLong => "unsigned long",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Vector => "vector",
            ValueKind::Matrix => "matrix",
            ValueKind::Matrix4 => "matrix4d",
            ValueKind::Values => "values",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueKind::Unsigned
                | ValueKind::UnsignedLong
                | ValueKind::Int
                | ValueKind::Long
                | ValueKind::Float
                | ValueKind::Double
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A dynamically typed command argument or result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Unsigned(u32),
    UnsignedLong(u64),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Vector(DVector<f64>),
    Matrix(DMatrix<f64>),
    Matrix4(Matrix4<f64>),
    Values(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Unsigned(_) => ValueKind::Unsigned,
            Value::UnsignedLong(_) => ValueKind::UnsignedLong,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Vector(_) => ValueKind::Vector,
            Value::Matrix(_) => ValueKind::Matrix,
            Value::Matrix4(_) => ValueKind::Matrix4,
            Value::Values(_) => ValueKind::Values,
        }
    }

    /// Extract the Rust value behind this variant, if the kinds agree.
    pub fn get<T: ValueType>(&self) -> Option<T> {
        T::from_value(self)
    }

    /// Parse the text form of a value of the given kind.
    ///
    /// The accepted syntax is the one produced by `Display`. Lists of values
    /// have no text form and cannot be parsed. Strings are taken verbatim,
    /// every other kind ignores surrounding whitespace.
    pub fn parse(kind: ValueKind, text: &str) -> DgResult<Value> {
        let value = match kind {
            ValueKind::Bool => Value::Bool(codec::parse_bool(text)?),
            ValueKind::Unsigned => Value::Unsigned(codec::parse_scalar(text, "unsigned")?),
            ValueKind::UnsignedLong => {
                Value::UnsignedLong(codec::parse_scalar(text, "unsigned long")?)
            }
            ValueKind::Int => Value::Int(codec::parse_scalar(text, "int")?),
            ValueKind::Long => Value::Long(codec::parse_scalar(text, "long")?),
            ValueKind::Float => Value::Float(codec::parse_scalar(text, "float")?),
            ValueKind::Double => Value::Double(codec::parse_scalar(text, "double")?),
            ValueKind::String => Value::String(text.to_string()),
            ValueKind::Vector => Value::Vector(codec::parse_vector(text)?),
            ValueKind::Matrix => Value::Matrix(codec::parse_matrix(text)?),
            ValueKind::Matrix4 => Value::Matrix4(codec::parse_matrix4(text)?),
            ValueKind::Values => {
                return Err(DgError::parse("values", "lists have no text form"));
            }
        };
        Ok(value)
    }

    /// Convert a payload of unknown static type, if it is one of the closed set.
    pub fn from_any(payload: &dyn Any) -> Option<Value> {
        macro_rules! try_kind {
            ($($ty:ty),* $(,)?) => {
                $(
                    if let Some(v) = payload.downcast_ref::<$ty>() {
                        return Some(v.clone().into_value());
                    }
                )*
            };
        }
        try_kind!(
            f64,
            f32,
            i32,
            i64,
            u32,
            u64,
            bool,
            String,
            DVector<f64>,
            DMatrix<f64>,
            Matrix4<f64>,
            Vec<Value>,
        );
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::UnsignedLong(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Vector(v) => codec::write_vector(f, v),
            Value::Matrix(m) => codec::write_matrix(f, m),
            Value::Matrix4(m) => {
                codec::write_matrix(f, &DMatrix::from_iterator(4, 4, m.iter().copied()))
            }
            Value::Values(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Rust types that correspond to exactly one [`ValueKind`].
pub trait ValueType: Sized + Clone + 'static {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

macro_rules! impl_value_type {
    ($ty:ty, $variant:ident) => {
        impl ValueType for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_value_type!(bool, Bool);
impl_value_type!(u32, Unsigned);
impl_value_type!(u64, UnsignedLong);
impl_value_type!(i32, Int);
impl_value_type!(i64, Long);
impl_value_type!(f32, Float);
impl_value_type!(f64, Double);
impl_value_type!(String, String);
impl_value_type!(DVector<f64>, Vector);
impl_value_type!(DMatrix<f64>, Matrix);
impl_value_type!(Matrix4<f64>, Matrix4);
impl_value_type!(Vec<Value>, Values);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
