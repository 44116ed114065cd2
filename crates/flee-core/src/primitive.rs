//! Built-in value types.
//!
//! [`PrimitiveKind`] names the numeric, boolean and character types and knows
//! their position on the implicit numeric promotion ladder. The byte value of
//! each kind is also used as the operand of conversion instructions.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::TypeHash;
use crate::primitives;

/// A built-in value type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool = 0,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
}

impl PrimitiveKind {
    /// Every primitive kind, in declaration order.
    pub const ALL: [PrimitiveKind; 12] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::SByte,
        PrimitiveKind::Byte,
        PrimitiveKind::Int16,
        PrimitiveKind::UInt16,
        PrimitiveKind::Int32,
        PrimitiveKind::UInt32,
        PrimitiveKind::Int64,
        PrimitiveKind::UInt64,
        PrimitiveKind::Single,
        PrimitiveKind::Double,
    ];

    /// The name used in expressions (`cast(x, long)`).
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::SByte => "sbyte",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Int16 => "short",
            PrimitiveKind::UInt16 => "ushort",
            PrimitiveKind::Int32 => "int",
            PrimitiveKind::UInt32 => "uint",
            PrimitiveKind::Int64 => "long",
            PrimitiveKind::UInt64 => "ulong",
            PrimitiveKind::Single => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// The type identity of this kind.
    pub const fn type_hash(self) -> TypeHash {
        match self {
            PrimitiveKind::Bool => primitives::BOOL,
            PrimitiveKind::Char => primitives::CHAR,
            PrimitiveKind::SByte => primitives::SBYTE,
            PrimitiveKind::Byte => primitives::BYTE,
            PrimitiveKind::Int16 => primitives::INT16,
            PrimitiveKind::UInt16 => primitives::UINT16,
            PrimitiveKind::Int32 => primitives::INT32,
            PrimitiveKind::UInt32 => primitives::UINT32,
            PrimitiveKind::Int64 => primitives::INT64,
            PrimitiveKind::UInt64 => primitives::UINT64,
            PrimitiveKind::Single => primitives::FLOAT,
            PrimitiveKind::Double => primitives::DOUBLE,
        }
    }

    /// Look up the kind for a type identity.
    pub fn from_hash(hash: TypeHash) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_hash() == hash)
    }

    /// Integer types usable with bitwise and shift operators.
    ///
    /// `char` and `bool` are not integral.
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::SByte
                | PrimitiveKind::Byte
                | PrimitiveKind::Int16
                | PrimitiveKind::UInt16
                | PrimitiveKind::Int32
                | PrimitiveKind::UInt32
                | PrimitiveKind::Int64
                | PrimitiveKind::UInt64
        )
    }

    /// Unsigned integer types (`char` counts as unsigned for conversions).
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::UInt16
                | PrimitiveKind::UInt32
                | PrimitiveKind::UInt64
                | PrimitiveKind::Char
        )
    }

    /// Floating point types.
    pub const fn is_real(self) -> bool {
        matches!(self, PrimitiveKind::Single | PrimitiveKind::Double)
    }

    /// Numeric types: integral, real and `char`.
    pub const fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Bool)
    }

    /// Position on the numeric promotion ladder.
    ///
    /// `char` shares the `ushort` rung. `bool` has no rank.
    pub const fn rank(self) -> Option<u32> {
        match self {
            PrimitiveKind::Bool => None,
            PrimitiveKind::SByte => Some(0),
            PrimitiveKind::Byte => Some(1),
            PrimitiveKind::Int16 => Some(2),
            PrimitiveKind::UInt16 | PrimitiveKind::Char => Some(3),
            PrimitiveKind::Int32 => Some(4),
            PrimitiveKind::UInt32 => Some(5),
            PrimitiveKind::Int64 => Some(6),
            PrimitiveKind::UInt64 => Some(7),
            PrimitiveKind::Single => Some(8),
            PrimitiveKind::Double => Some(9),
        }
    }

    /// Size of the value in bytes.
    pub const fn size(self) -> u32 {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::SByte | PrimitiveKind::Byte => 1,
            PrimitiveKind::Char | PrimitiveKind::Int16 | PrimitiveKind::UInt16 => 2,
            PrimitiveKind::Int32 | PrimitiveKind::UInt32 | PrimitiveKind::Single => 4,
            PrimitiveKind::Int64 | PrimitiveKind::UInt64 | PrimitiveKind::Double => 8,
        }
    }
}
