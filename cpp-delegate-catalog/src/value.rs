//! Host-side values exchanged with the remote context

use crate::codec::ScalarType;
use crate::error::CodecError;
use serde::Serialize;
use std::fmt;

/// A single fixed-width value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Bool(_) => ScalarType::Bool,
            Scalar::I8(_) => ScalarType::I8,
            Scalar::U8(_) => ScalarType::U8,
            Scalar::I16(_) => ScalarType::I16,
            Scalar::U16(_) => ScalarType::U16,
            Scalar::I32(_) => ScalarType::I32,
            Scalar::U32(_) => ScalarType::U32,
            Scalar::I64(_) => ScalarType::I64,
            Scalar::U64(_) => ScalarType::U64,
            Scalar::F32(_) => ScalarType::F32,
            Scalar::F64(_) => ScalarType::F64,
        }
    }

    fn is_float(&self) -> bool {
        matches!(self, Scalar::F32(_) | Scalar::F64(_))
    }

    /// Integer view; floats truncate toward zero, bools become 0/1.
    pub fn as_i128(&self) -> i128 {
        match *self {
            Scalar::Bool(v) => v as i128,
            Scalar::I8(v) => v as i128,
            Scalar::U8(v) => v as i128,
            Scalar::I16(v) => v as i128,
            Scalar::U16(v) => v as i128,
            Scalar::I32(v) => v as i128,
            Scalar::U32(v) => v as i128,
            Scalar::I64(v) => v as i128,
            Scalar::U64(v) => v as i128,
            Scalar::F32(v) => v as i128,
            Scalar::F64(v) => v as i128,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
            other => other.as_i128() as f64,
        }
    }

    /// Convert to the native representation of `target` with `as` semantics.
    pub fn cast(self, target: ScalarType) -> Scalar {
        if self.scalar_type() == target {
            return self;
        }
        if self.is_float() {
            let v = self.as_f64();
            return match target {
                ScalarType::Bool => Scalar::Bool(v != 0.0),
                ScalarType::I8 => Scalar::I8(v as i8),
                ScalarType::U8 => Scalar::U8(v as u8),
                ScalarType::I16 => Scalar::I16(v as i16),
                ScalarType::U16 => Scalar::U16(v as u16),
                ScalarType::I32 => Scalar::I32(v as i32),
                ScalarType::U32 => Scalar::U32(v as u32),
                ScalarType::I64 => Scalar::I64(v as i64),
                ScalarType::U64 => Scalar::U64(v as u64),
                ScalarType::F32 => Scalar::F32(v as f32),
                ScalarType::F64 => Scalar::F64(v),
            };
        }
        let v = self.as_i128();
        match target {
            ScalarType::Bool => Scalar::Bool(v != 0),
            ScalarType::I8 => Scalar::I8(v as i8),
            ScalarType::U8 => Scalar::U8(v as u8),
            ScalarType::I16 => Scalar::I16(v as i16),
            ScalarType::U16 => Scalar::U16(v as u16),
            ScalarType::I32 => Scalar::I32(v as i32),
            ScalarType::U32 => Scalar::U32(v as u32),
            ScalarType::I64 => Scalar::I64(v as i64),
            ScalarType::U64 => Scalar::U64(v as u64),
            ScalarType::F32 => Scalar::F32(v as f32),
            ScalarType::F64 => Scalar::F64(v as f64),
        }
    }

    /// Parse a command-line literal as a value of type `ty`.
    pub fn parse(text: &str, ty: ScalarType) -> Result<Scalar, CodecError> {
        let invalid = || CodecError::InvalidLiteral {
            text: text.to_string(),
            type_name: ty.rust_name(),
        };
        let text = text.trim();
        let scalar = match ty {
            ScalarType::Bool => match text {
                "true" | "1" => Scalar::Bool(true),
                "false" | "0" => Scalar::Bool(false),
                _ => return Err(invalid()),
            },
            ScalarType::F32 => Scalar::F32(text.parse().map_err(|_| invalid())?),
            ScalarType::F64 => Scalar::F64(text.parse().map_err(|_| invalid())?),
            _ => {
                let parsed = match text.strip_prefix("0x") {
                    Some(hex) => i128::from_str_radix(hex, 16),
                    None => text.parse::<i128>(),
                }
                .map_err(|_| invalid())?;
                Scalar::I64(parsed as i64).cast(ty)
            }
        };
        Ok(scalar)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::I8(v) => write!(f, "{}", v),
            Scalar::U8(v) => write!(f, "{}", v),
            Scalar::I16(v) => write!(f, "{}", v),
            Scalar::U16(v) => write!(f, "{}", v),
            Scalar::I32(v) => write!(f, "{}", v),
            Scalar::U32(v) => write!(f, "{}", v),
            Scalar::I64(v) => write!(f, "{}", v),
            Scalar::U64(v) => write!(f, "{}", v),
            Scalar::F32(v) => write!(f, "{}", v),
            Scalar::F64(v) => write!(f, "{}", v),
        }
    }
}

/// The value of one remote attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Value::Array(items) => Some(items),
            Value::Scalar(_) => None,
        }
    }

    /// Element count; a scalar counts as one element.
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_scalars(self) -> Vec<Scalar> {
        match self {
            Value::Scalar(s) => vec![s],
            Value::Array(items) => items,
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<Scalar>> for Value {
    fn from(values: Vec<Scalar>) -> Self {
        Value::Array(values)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// Outcome of a remote function call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallResult {
    /// Result type absent or not resolvable: the raw response buffer.
    Raw(Vec<u8>),
    Scalar(Scalar),
}
