//! Helpers used by generated `RemoteFunctions` bindings.
//!
//! Generated methods pack arguments with [`put`] and decode results with
//! [`take`], so they share the codec used by [`crate::RemoteContext::call`].

use crate::error::DelegateError;
use cpp_delegate_catalog::{Scalar, ScalarType};

/// A Rust primitive with a fixed wire layout.
pub trait WireScalar: Copy + Into<Scalar> {
    const SCALAR: ScalarType;

    fn from_scalar(value: Scalar) -> Option<Self>;
}

macro_rules! impl_wire_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl WireScalar for $ty {
                const SCALAR: ScalarType = ScalarType::$variant;

                fn from_scalar(value: Scalar) -> Option<Self> {
                    match value {
                        Scalar::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_wire_scalar! {
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

pub fn put<T: WireScalar>(packed: &mut Vec<u8>, value: T) {
    T::SCALAR.encode(value.into(), packed);
}

pub fn take<T: WireScalar>(response: &[u8]) -> Result<T, DelegateError> {
    let scalar = T::SCALAR.decode(response)?;
    T::from_scalar(scalar).ok_or_else(|| DelegateError::UnsupportedType(T::SCALAR.to_string()))
}
