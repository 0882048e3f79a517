//! Binary layouts for declared C types
//!
//! Resolution order for a type name:
//! 1. `"float"` is always the 4-byte IEEE-754 layout.
//! 2. The name itself, looked up in the scalar table.
//! 3. The name with its last two characters removed (`uint8_t` -> `uint8`).
//!
//! Anything else is [`CodecError::UnsupportedType`]. Callers that want to
//! degrade gracefully substitute their own default.

use crate::catalog::{AttributeDescriptor, AttributeKind};
use crate::error::CodecError;
use crate::value::Scalar;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

/// Every spelling [`ScalarType::from_name`] accepts.
pub const SCALAR_NAMES: &[(&str, ScalarType)] = &[
    ("bool", ScalarType::Bool),
    ("_Bool", ScalarType::Bool),
    ("int8", ScalarType::I8),
    ("signed char", ScalarType::I8),
    ("uint8", ScalarType::U8),
    // Plain char is unsigned on the ARM targets this runs against.
    ("char", ScalarType::U8),
    ("unsigned char", ScalarType::U8),
    ("int16", ScalarType::I16),
    ("short", ScalarType::I16),
    ("short int", ScalarType::I16),
    ("signed short", ScalarType::I16),
    ("uint16", ScalarType::U16),
    ("unsigned short", ScalarType::U16),
    ("unsigned short int", ScalarType::U16),
    ("int32", ScalarType::I32),
    ("int", ScalarType::I32),
    ("signed", ScalarType::I32),
    ("signed int", ScalarType::I32),
    ("long", ScalarType::I32),
    ("long int", ScalarType::I32),
    ("signed long", ScalarType::I32),
    ("uint32", ScalarType::U32),
    ("unsigned", ScalarType::U32),
    ("unsigned int", ScalarType::U32),
    ("unsigned long", ScalarType::U32),
    ("unsigned long int", ScalarType::U32),
    ("int64", ScalarType::I64),
    ("long long", ScalarType::I64),
    ("long long int", ScalarType::I64),
    ("signed long long", ScalarType::I64),
    ("uint64", ScalarType::U64),
    ("unsigned long long", ScalarType::U64),
    ("unsigned long long int", ScalarType::U64),
    ("float32", ScalarType::F32),
    ("float64", ScalarType::F64),
    ("double", ScalarType::F64),
    ("long double", ScalarType::F64),
];

impl ScalarType {
    pub const fn size(self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    /// Scalar table lookup, without the `float` special case or suffix stripping.
    pub fn from_name(name: &str) -> Option<ScalarType> {
        SCALAR_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, ty)| *ty)
    }

    pub fn rust_name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::I8 => "i8",
            ScalarType::U8 => "u8",
            ScalarType::I16 => "i16",
            ScalarType::U16 => "u16",
            ScalarType::I32 => "i32",
            ScalarType::U32 => "u32",
            ScalarType::I64 => "i64",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }

    /// Decode one value from the start of `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Result<Scalar, CodecError> {
        let size = self.size();
        let raw = bytes.get(..size).ok_or(CodecError::Truncated {
            expected: size,
            actual: bytes.len(),
        })?;
        let scalar = match self {
            ScalarType::Bool => Scalar::Bool(raw[0] != 0),
            ScalarType::I8 => Scalar::I8(raw[0] as i8),
            ScalarType::U8 => Scalar::U8(raw[0]),
            ScalarType::I16 => Scalar::I16(i16::from_le_bytes([raw[0], raw[1]])),
            ScalarType::U16 => Scalar::U16(u16::from_le_bytes([raw[0], raw[1]])),
            ScalarType::I32 => Scalar::I32(i32::from_le_bytes(word(raw))),
            ScalarType::U32 => Scalar::U32(u32::from_le_bytes(word(raw))),
            ScalarType::F32 => Scalar::F32(f32::from_le_bytes(word(raw))),
            ScalarType::I64 => Scalar::I64(i64::from_le_bytes(dword(raw))),
            ScalarType::U64 => Scalar::U64(u64::from_le_bytes(dword(raw))),
            ScalarType::F64 => Scalar::F64(f64::from_le_bytes(dword(raw))),
        };
        Ok(scalar)
    }

    /// Decode `count` consecutive values.
    pub fn decode_array(self, bytes: &[u8], count: usize) -> Result<Vec<Scalar>, CodecError> {
        let expected = count * self.size();
        if bytes.len() < expected {
            return Err(CodecError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        bytes[..expected]
            .chunks_exact(self.size())
            .map(|chunk| self.decode(chunk))
            .collect()
    }

    /// Append `value`, converted to this type, in little-endian order.
    pub fn encode(self, value: Scalar, out: &mut Vec<u8>) {
        match value.cast(self) {
            Scalar::Bool(v) => out.push(v as u8),
            Scalar::I8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::U8(v) => out.push(v),
            Scalar::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    pub fn encode_all(self, values: &[Scalar]) -> Vec<u8> {
        let mut out = Vec::with_capacity(values.len() * self.size());
        for value in values {
            self.encode(*value, &mut out);
        }
        out
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_name())
    }
}

fn word(raw: &[u8]) -> [u8; 4] {
    [raw[0], raw[1], raw[2], raw[3]]
}

fn dword(raw: &[u8]) -> [u8; 8] {
    [raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7]]
}

/// Wire shape of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum BinaryLayout {
    Scalar { element: ScalarType },
    FixedArray { element: ScalarType, length: u32 },
    DynamicArray { element: ScalarType },
}

impl BinaryLayout {
    pub fn element(&self) -> ScalarType {
        match *self {
            BinaryLayout::Scalar { element }
            | BinaryLayout::FixedArray { element, .. }
            | BinaryLayout::DynamicArray { element } => element,
        }
    }
}

/// Width of a remote data pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerWidth {
    #[default]
    Bits32,
    Bits64,
}

impl PointerWidth {
    pub fn bytes(self) -> usize {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodecConfig {
    pub pointer_width: PointerWidth,
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pointer_width(mut self, width: PointerWidth) -> Self {
        self.pointer_width = width;
        self
    }
}

/// `{length: u32, data: pointer}` header of a runtime-sized remote array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicArrayView {
    pub length: u32,
    pub data: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Map a C type name to its wire scalar. Qualifiers are dropped, then
    /// the name is looked up as is and again with a `_t`-style suffix cut.
    pub fn resolve(&self, type_name: &str) -> Result<ScalarType, CodecError> {
        let name = strip_qualifiers(type_name);
        if name == "float" {
            return Ok(ScalarType::F32);
        }
        if let Some(ty) = ScalarType::from_name(name) {
            return Ok(ty);
        }
        name.char_indices()
            .rev()
            .nth(1)
            .and_then(|(cut, _)| ScalarType::from_name(&name[..cut]))
            .ok_or_else(|| CodecError::UnsupportedType(type_name.to_string()))
    }

    /// Like [`Codec::resolve`], falling back to `default` instead of failing.
    pub fn resolve_or(&self, type_name: &str, default: ScalarType) -> ScalarType {
        self.resolve(type_name).unwrap_or(default)
    }

    /// Binary layout of an attribute; arrays resolve their element type.
    pub fn attribute_layout(
        &self,
        attribute: &AttributeDescriptor,
    ) -> Result<BinaryLayout, CodecError> {
        let element_of = |attr: &AttributeDescriptor| {
            attr.element_type
                .as_deref()
                .ok_or_else(|| CodecError::UnsupportedType(attr.type_name.clone()))
                .and_then(|name| self.resolve(name))
        };
        match attribute.kind {
            AttributeKind::Scalar => Ok(BinaryLayout::Scalar {
                element: self.resolve(&attribute.type_name)?,
            }),
            AttributeKind::FixedArray => Ok(BinaryLayout::FixedArray {
                element: element_of(attribute)?,
                length: attribute.array_length.unwrap_or(0),
            }),
            AttributeKind::DynamicArray => Ok(BinaryLayout::DynamicArray {
                element: element_of(attribute)?,
            }),
        }
    }

    pub fn view_size(&self) -> usize {
        4 + self.config.pointer_width.bytes()
    }

    pub fn encode_view(&self, view: DynamicArrayView) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.view_size());
        out.extend_from_slice(&view.length.to_le_bytes());
        match self.config.pointer_width {
            PointerWidth::Bits32 => out.extend_from_slice(&(view.data as u32).to_le_bytes()),
            PointerWidth::Bits64 => out.extend_from_slice(&view.data.to_le_bytes()),
        }
        out
    }

    pub fn decode_view(&self, bytes: &[u8]) -> Result<DynamicArrayView, CodecError> {
        if bytes.len() < self.view_size() {
            return Err(CodecError::Truncated {
                expected: self.view_size(),
                actual: bytes.len(),
            });
        }
        let length = u32::from_le_bytes(word(bytes));
        let data = match self.config.pointer_width {
            PointerWidth::Bits32 => u32::from_le_bytes(word(&bytes[4..])) as u64,
            PointerWidth::Bits64 => u64::from_le_bytes(dword(&bytes[4..])),
        };
        Ok(DynamicArrayView { length, data })
    }
}

/// Drop leading `const`/`volatile` qualifiers.
pub fn strip_qualifiers(type_name: &str) -> &str {
    let mut name = type_name.trim();
    loop {
        if let Some(rest) = name.strip_prefix("const ") {
            name = rest.trim_start();
        } else if let Some(rest) = name.strip_prefix("volatile ") {
            name = rest.trim_start();
        } else {
            return name;
        }
    }
}
