//! This module defines the canonical, type-safe representation of array
//! element types used throughout the grainpipe data structure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical, internal representation of an array element type.
///
/// This enum replaces fragile string-based type tags, enabling compile-time
/// checks and eliminating an entire class of runtime errors when filters
/// resolve their prerequisite arrays.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
}

impl ScalarType {
    /// The size in bytes of a single element of this type.
    pub fn size_of(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::Boolean => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }
}

/// Provides the canonical string representation for a `ScalarType`.
impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These string representations are part of the public contract.
        write!(f, "{:?}", self)
    }
}

/// The element trait every typed data array is generic over.
///
/// `bytemuck::Pod` gives us safe byte-level views for persistence, and the
/// associated `SCALAR_TYPE` constant lets the data structure verify a typed
/// downcast without comparing type-name strings.
pub trait Primitive: bytemuck::Pod + PartialEq + fmt::Debug + Default + 'static {
    const SCALAR_TYPE: ScalarType;
}

macro_rules! impl_primitive {
    ($($rust_ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Primitive for $rust_ty {
                const SCALAR_TYPE: ScalarType = ScalarType::$variant;
            }
        )+
    };
}

impl_primitive!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
);

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_sizes() {
        assert_eq!(ScalarType::Int8.size_of(), 1);
        assert_eq!(ScalarType::UInt16.size_of(), 2);
        assert_eq!(ScalarType::Float32.size_of(), 4);
        assert_eq!(ScalarType::Int64.size_of(), 8);
        assert_eq!(ScalarType::Boolean.size_of(), 1);
    }

    #[test]
    fn test_primitive_scalar_type_mapping() {
        assert_eq!(<f32 as Primitive>::SCALAR_TYPE, ScalarType::Float32);
        assert_eq!(<i32 as Primitive>::SCALAR_TYPE, ScalarType::Int32);
        assert_eq!(<u64 as Primitive>::SCALAR_TYPE, ScalarType::UInt64);
    }

    #[test]
    fn test_display_matches_debug() {
        assert_eq!(ScalarType::Float64.to_string(), "Float64");
        assert_eq!(ScalarType::Boolean.to_string(), "Boolean");
    }
}
