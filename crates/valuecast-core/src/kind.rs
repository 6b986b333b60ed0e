//! Runtime type kinds.
//!
//! [`Kind`] is the closed set of type categories a [`TypeDescriptor`](crate::TypeDescriptor)
//! can describe. [`KindFlags`] classifies kinds into the numeric domains used by the
//! coercion and comparison layers.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Classification flags for a [`Kind`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindFlags: u8 {
        /// Signed integer kinds.
        const SIGNED = 1 << 0;
        /// Unsigned integer kinds.
        const UNSIGNED = 1 << 1;
        /// Floating point kinds.
        const FLOAT = 1 << 2;
        /// Kinds carrying a scalar payload (bool, numbers, string).
        const SCALAR = 1 << 3;
        /// Kinds whose value may be nil (pointer, interface).
        const NULLABLE = 1 << 4;
        /// Struct, map, slice.
        const COMPOSITE = 1 << 5;

        /// Any integer kind.
        const INTEGER = Self::SIGNED.bits() | Self::UNSIGNED.bits();
        /// Any numeric kind.
        const NUMERIC = Self::INTEGER.bits() | Self::FLOAT.bits();
    }
}

/// The kind of a runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// The absent value. Only [`DynamicValue::invalid`](crate::DynamicValue::invalid) has it.
    Invalid,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Struct,
    Map,
    Slice,
    Pointer,
    Interface,
}

impl Kind {
    /// All scalar kinds, in declaration order.
    pub const SCALARS: [Kind; 12] = [
        Kind::Bool,
        Kind::Int8,
        Kind::Int16,
        Kind::Int32,
        Kind::Int64,
        Kind::Uint8,
        Kind::Uint16,
        Kind::Uint32,
        Kind::Uint64,
        Kind::Float32,
        Kind::Float64,
        Kind::String,
    ];

    /// Get the classification flags for this kind.
    pub const fn flags(self) -> KindFlags {
        match self {
            Kind::Invalid => KindFlags::empty(),
            Kind::Bool | Kind::String => KindFlags::SCALAR,
            Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 => {
                KindFlags::SIGNED.union(KindFlags::SCALAR)
            }
            Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64 => {
                KindFlags::UNSIGNED.union(KindFlags::SCALAR)
            }
            Kind::Float32 | Kind::Float64 => KindFlags::FLOAT.union(KindFlags::SCALAR),
            Kind::Struct | Kind::Map | Kind::Slice => KindFlags::COMPOSITE,
            Kind::Pointer | Kind::Interface => KindFlags::NULLABLE,
        }
    }

    /// Get the canonical type name for this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Invalid => "invalid",
            Kind::Bool => "bool",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::String => "string",
            Kind::Struct => "struct",
            Kind::Map => "map",
            Kind::Slice => "slice",
            Kind::Pointer => "ptr",
            Kind::Interface => "interface",
        }
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        self.flags().contains(KindFlags::SIGNED)
    }

    #[inline]
    pub const fn is_unsigned(self) -> bool {
        self.flags().contains(KindFlags::UNSIGNED)
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        self.flags().intersects(KindFlags::INTEGER)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        self.flags().contains(KindFlags::FLOAT)
    }

    #[inline]
    pub const fn is_numeric(self) -> bool {
        self.flags().intersects(KindFlags::NUMERIC)
    }

    #[inline]
    pub const fn is_scalar(self) -> bool {
        self.flags().contains(KindFlags::SCALAR)
    }

    #[inline]
    pub const fn is_nullable(self) -> bool {
        self.flags().contains(KindFlags::NULLABLE)
    }

    /// Inclusive range of a signed integer kind.
    pub const fn signed_range(self) -> Option<(i64, i64)> {
        match self {
            Kind::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            Kind::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Kind::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            Kind::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Maximum value of an unsigned integer kind.
    pub const fn unsigned_max(self) -> Option<u64> {
        match self {
            Kind::Uint8 => Some(u8::MAX as u64),
            Kind::Uint16 => Some(u16::MAX as u64),
            Kind::Uint32 => Some(u32::MAX as u64),
            Kind::Uint64 => Some(u64::MAX),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
