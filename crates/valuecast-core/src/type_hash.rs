//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash that identifies a runtime type. Named types hash
//! their package-qualified name; unnamed composite types hash their structure
//! (component kinds and element hashes), so two independently built descriptors
//! for `map[string]int64` share one identity.
//!
//! # Examples
//!
//! ```
//! use valuecast_core::TypeHash;
//!
//! let a = TypeHash::from_name("main.Person");
//! let b = TypeHash::from_name("main.Person");
//! assert_eq!(a, b);
//!
//! let map_a = TypeHash::from_composite(TypeHash::MAP, &[TypeHash::from_name("string")]);
//! let map_b = TypeHash::from_composite(TypeHash::SLICE, &[TypeHash::from_name("string")]);
//! assert_ne!(map_a, map_b);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for component mixing.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for named type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for struct field names.
    pub const FIELD: u64 = 0x1a095090689d4647;

    /// Position mixing constants so component order matters.
    pub const POSITION_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying a runtime type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Composite domain marker for structs.
    pub const STRUCT: TypeHash = TypeHash(0x5ea77ffbcdf5f302);
    /// Composite domain marker for maps.
    pub const MAP: TypeHash = TypeHash(0x7d3c8b4a92e15f6d);
    /// Composite domain marker for slices.
    pub const SLICE: TypeHash = TypeHash(0x3e9f5d2a8c7b1403);
    /// Composite domain marker for pointers.
    pub const POINTER: TypeHash = TypeHash(0x9a7f3d5e2b8c4601);

    /// Create a type hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a hash for a struct field name, distinct from any type name hash.
    #[inline]
    pub fn from_field(name: &str) -> Self {
        TypeHash(hash_constants::FIELD ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a structural hash from a composite domain marker and component hashes.
    ///
    /// Component order matters: `map[string]int64` and `map[int64]string` differ.
    #[inline]
    pub fn from_composite(domain: TypeHash, components: &[TypeHash]) -> Self {
        let mut hash = domain.0;
        for (i, component) in components.iter().enumerate() {
            let marker = hash_constants::POSITION_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::POSITION_MARKERS[0].wrapping_add(i as u64));
            // wrapping_mul keeps the mix non-commutative
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(marker ^ component.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
