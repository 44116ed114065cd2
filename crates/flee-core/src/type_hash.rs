//! Deterministic hash-based type identity.
//!
//! Every type the compiler can see (primitives, `string`, `object`, host
//! classes, enums, interfaces, array types) is identified by a [`TypeHash`]
//! computed from its name. Array types hash their element type so that
//! `int[]` has the same identity no matter who asks for it first.
//!
//! # Examples
//!
//! ```
//! use flee_core::{TypeHash, primitives};
//!
//! assert_eq!(TypeHash::from_name("int"), primitives::INT32);
//! assert_ne!(TypeHash::array_of(primitives::INT32), primitives::INT32);
//! ```

use std::fmt;
use xxhash_rust::const_xxh64::xxh64 as const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
///
/// Keeps the type domain apart from function identities that share a name.
pub mod hash_constants {
    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for function hashes.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for array types, mixed with the element hash.
    pub const ARRAY: u64 = 0x6b1f0e3d92c4a857;

    /// Separator used when folding parameter hashes.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Per-position markers so `(int, long)` and `(long, int)` differ.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a type or function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a (case-sensitive) type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Const form of [`from_name`](Self::from_name), used for the well-known
    /// primitive hashes.
    #[inline]
    pub const fn from_name_const(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ const_xxh64(name.as_bytes(), 0))
    }

    /// The hash of the single-dimension array type with the given element.
    #[inline]
    pub const fn array_of(element: TypeHash) -> Self {
        TypeHash(
            (element.0 ^ hash_constants::ARRAY)
                .rotate_left(17)
                .wrapping_mul(hash_constants::SEP),
        )
    }

    /// Create a function identity from owner, name and parameter types.
    ///
    /// Parameter order matters.
    pub fn from_function(owner: TypeHash, name: &str, params: &[TypeHash]) -> Self {
        let mut hash = hash_constants::FUNCTION ^ owner.0 ^ xxh64(name.as_bytes(), 0);
        for (i, param) in params.iter().enumerate() {
            let marker = hash_constants::PARAM_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
            hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ param.0);
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

/// Well-known hashes for the built-in types.
pub mod primitives {
    use super::TypeHash;

    /// `void`, the return type of functions with no result.
    pub const VOID: TypeHash = TypeHash::from_name_const("void");
    /// `bool`
    pub const BOOL: TypeHash = TypeHash::from_name_const("bool");
    /// `char`
    pub const CHAR: TypeHash = TypeHash::from_name_const("char");
    /// `sbyte`
    pub const SBYTE: TypeHash = TypeHash::from_name_const("sbyte");
    /// `byte`
    pub const BYTE: TypeHash = TypeHash::from_name_const("byte");
    /// `short`
    pub const INT16: TypeHash = TypeHash::from_name_const("short");
    /// `ushort`
    pub const UINT16: TypeHash = TypeHash::from_name_const("ushort");
    /// `int`
    pub const INT32: TypeHash = TypeHash::from_name_const("int");
    /// `uint`
    pub const UINT32: TypeHash = TypeHash::from_name_const("uint");
    /// `long`
    pub const INT64: TypeHash = TypeHash::from_name_const("long");
    /// `ulong`
    pub const UINT64: TypeHash = TypeHash::from_name_const("ulong");
    /// `float`
    pub const FLOAT: TypeHash = TypeHash::from_name_const("float");
    /// `double`
    pub const DOUBLE: TypeHash = TypeHash::from_name_const("double");
    /// `string`
    pub const STRING: TypeHash = TypeHash::from_name_const("string");
    /// `object`, the root of every reference type.
    pub const OBJECT: TypeHash = TypeHash::from_name_const("object");
    /// The type of the `null` literal. Converts to any reference type.
    pub const NULL: TypeHash = TypeHash::from_name_const("<null>");
}
