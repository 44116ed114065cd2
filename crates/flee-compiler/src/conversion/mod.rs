//! Type conversion system.
//!
//! This module decides whether one type converts to another, at what cost,
//! and which instructions perform the conversion. It is used for:
//!
//! - Type checking (can argument X be passed to parameter Y?)
//! - Overload resolution (which function is the best match?)
//! - Operand promotion in arithmetic and comparisons
//! - Explicit `cast(expr, type)`
//!
//! ## Conversion Priority
//!
//! Implicit conversions are checked in this order:
//! 1. Identity (exact match)
//! 2. Primitive widening (the implicit numeric table)
//! 3. Reference conversions (null, upcasts, boxing to `object`)
//! 4. User-defined (`op_Implicit`)
//!
//! Costs keep that order: exact < widening < user-defined. A pair with no
//! conversion has no cost at all.

use flee_core::{PrimitiveKind, SymbolResolver, TypeEntry, TypeHash, primitives};

use crate::bytecode::{CallTarget, OpCode};
use crate::emit::Emitter;

mod primitive;
mod reference;
mod user_defined;

pub use primitive::{
    find_explicit_primitive_conversion, find_primitive_conversion, is_implicit_numeric,
    is_primitive_numeric,
};
pub use reference::{find_downcast, find_reference_conversion};
pub use user_defined::{OP_IMPLICIT, find_user_conversion};

/// A type conversion with its cost for overload resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// The kind of conversion being performed.
    pub kind: ConversionKind,
    /// The cost of this conversion (lower is better).
    pub cost: u32,
    /// Whether this conversion can be applied implicitly.
    pub is_implicit: bool,
}

/// The kind of conversion being performed.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionKind {
    /// No conversion needed (exact match).
    Identity,

    /// Numeric or `char` conversion.
    Primitive {
        from: PrimitiveKind,
        to: PrimitiveKind,
    },

    /// The null literal to a reference type.
    NullToReference,

    /// Derived to base class or implemented interface.
    Upcast { target: TypeHash },

    /// Value type to `object`.
    Boxing,

    /// Base to derived, interface to class, or unboxing. Checked at run time.
    Downcast { target: TypeHash },

    /// Enum value to an integral type.
    EnumToInt { to: PrimitiveKind },

    /// Integral value (or another enum) to an enum.
    IntToEnum {
        enum_type: TypeHash,
        underlying: PrimitiveKind,
    },

    /// Call to an `op_Implicit` operator, with a standard conversion on each
    /// side.
    User {
        function: CallTarget,
        pre: Box<Conversion>,
        post: Box<Conversion>,
    },
}

impl Conversion {
    /// Cost for exact match (identity conversion).
    pub const COST_EXACT: u32 = 0;
    /// Cost for the null literal to a reference type.
    pub const COST_NULL_TO_REFERENCE: u32 = 1;
    /// Cost for a value type to `object`.
    pub const COST_BOXING: u32 = 10;
    /// Base cost of a user-defined conversion. Higher than any standard
    /// conversion.
    pub const COST_USER_CONVERSION: u32 = 100;
    /// Cost marker for explicit-only conversions (not usable implicitly).
    pub const COST_EXPLICIT_ONLY: u32 = 1000;

    /// Create an identity conversion (no conversion needed).
    pub(crate) fn identity() -> Self {
        Self {
            kind: ConversionKind::Identity,
            cost: Self::COST_EXACT,
            is_implicit: true,
        }
    }

    /// Check if this conversion can be used implicitly.
    pub fn is_implicit(&self) -> bool {
        self.is_implicit
    }

    /// Check if this is an exact match (no conversion).
    pub fn is_exact(&self) -> bool {
        matches!(self.kind, ConversionKind::Identity)
    }

    /// Emit the instructions converting the value on top of the stack.
    pub fn emit(&self, em: &mut Emitter, checked: bool) {
        match &self.kind {
            ConversionKind::Identity
            | ConversionKind::NullToReference
            | ConversionKind::Upcast { .. }
            | ConversionKind::Boxing => {}
            ConversionKind::Primitive { to, .. } | ConversionKind::EnumToInt { to } => {
                em.emit_convert(*to, checked);
            }
            ConversionKind::Downcast { target } => em.emit_type_op(OpCode::CastCheck, *target),
            ConversionKind::IntToEnum {
                enum_type,
                underlying,
            } => {
                em.emit_convert(*underlying, checked);
                em.emit_type_op(OpCode::ToEnum, *enum_type);
            }
            ConversionKind::User {
                function,
                pre,
                post,
            } => {
                pre.emit(em, checked);
                em.emit_call(function);
                post.emit(em, checked);
            }
        }
    }
}

/// Find an implicit conversion without user-defined operators.
pub fn find_standard_conversion(
    from: TypeHash,
    to: TypeHash,
    resolver: &dyn SymbolResolver,
) -> Option<Conversion> {
    if from == to {
        return Some(Conversion::identity());
    }
    if let Some(conv) = find_primitive_conversion(from, to) {
        return Some(conv);
    }
    find_reference_conversion(from, to, resolver)
}

/// Find an implicit conversion from `from` to `to`.
pub fn find_conversion(
    from: TypeHash,
    to: TypeHash,
    resolver: &dyn SymbolResolver,
) -> Option<Conversion> {
    find_standard_conversion(from, to, resolver)
        .or_else(|| find_user_conversion(from, to, resolver))
}

/// Find a conversion usable by `cast(expr, type)`.
pub fn find_explicit_conversion(
    from: TypeHash,
    to: TypeHash,
    resolver: &dyn SymbolResolver,
) -> Option<Conversion> {
    if let Some(conv) = find_conversion(from, to, resolver) {
        return Some(conv);
    }
    if let Some(conv) = find_explicit_primitive_conversion(from, to) {
        return Some(conv);
    }
    if let Some(conv) = find_enum_conversion(from, to, resolver) {
        return Some(conv);
    }
    find_downcast(from, to, resolver)
}

/// Enum to integral, integral to enum, and enum to enum.
fn find_enum_conversion(
    from: TypeHash,
    to: TypeHash,
    resolver: &dyn SymbolResolver,
) -> Option<Conversion> {
    let from_enum = resolver.get_type(from).and_then(TypeEntry::as_enum);
    let to_enum = resolver.get_type(to).and_then(TypeEntry::as_enum);

    let kind = match (from_enum, to_enum) {
        (Some(_), None) => {
            let target = PrimitiveKind::from_hash(to).filter(|k| k.is_numeric())?;
            ConversionKind::EnumToInt { to: target }
        }
        (None, Some(target)) => {
            PrimitiveKind::from_hash(from).filter(|k| k.is_integral() || *k == PrimitiveKind::Char)?;
            ConversionKind::IntToEnum {
                enum_type: target.type_hash,
                underlying: target.underlying,
            }
        }
        (Some(_), Some(target)) => ConversionKind::IntToEnum {
            enum_type: target.type_hash,
            underlying: target.underlying,
        },
        (None, None) => return None,
    };

    Some(Conversion {
        kind,
        cost: Conversion::COST_EXPLICIT_ONLY,
        is_implicit: false,
    })
}

/// Whether `from` implicitly converts to `to`.
pub fn can_convert(from: TypeHash, to: TypeHash, resolver: &dyn SymbolResolver) -> bool {
    find_conversion(from, to, resolver).is_some()
}

/// Whether `cast(from-typed value, to)` compiles.
pub fn explicit_convertible(from: TypeHash, to: TypeHash, resolver: &dyn SymbolResolver) -> bool {
    find_explicit_conversion(from, to, resolver).is_some()
}

/// Cost of the implicit conversion, `None` when there is none.
pub fn convert_score(from: TypeHash, to: TypeHash, resolver: &dyn SymbolResolver) -> Option<u32> {
    find_conversion(from, to, resolver).map(|conv| conv.cost)
}

/// Emit the implicit conversion from `from` to `to`.
///
/// Returns `false`, emitting nothing, when there is none.
pub fn emit_implicit_convert(
    from: TypeHash,
    to: TypeHash,
    resolver: &dyn SymbolResolver,
    em: &mut Emitter,
) -> bool {
    match find_conversion(from, to, resolver) {
        Some(conv) => {
            conv.emit(em, false);
            true
        }
        None => false,
    }
}

// ============================================================================
// Operand Types
// ============================================================================

/// Integral promotion: the small integral types and `char` compute as `int`.
pub fn promote(kind: PrimitiveKind) -> PrimitiveKind {
    use PrimitiveKind::*;
    match kind {
        SByte | Byte | Int16 | UInt16 | Char => Int32,
        other => other,
    }
}

const RESULT_LADDER: [PrimitiveKind; 6] = [
    PrimitiveKind::Int32,
    PrimitiveKind::UInt32,
    PrimitiveKind::Int64,
    PrimitiveKind::UInt64,
    PrimitiveKind::Single,
    PrimitiveKind::Double,
];

/// Common type of a binary numeric operation: the first of int, uint, long,
/// ulong, float, double both promoted operands convert to.
pub fn binary_result_type(left: TypeHash, right: TypeHash) -> Option<TypeHash> {
    let a = numeric_kind(left)?;
    let b = numeric_kind(right)?;
    let (a, b) = (promote(a), promote(b));

    RESULT_LADDER
        .into_iter()
        .find(|&target| {
            (a == target || is_implicit_numeric(a, target))
                && (b == target || is_implicit_numeric(b, target))
        })
        .map(PrimitiveKind::type_hash)
}

/// Common type of a bitwise operation on two integral operands.
pub fn bitwise_op_type(left: TypeHash, right: TypeHash) -> Option<TypeHash> {
    if !is_integral(left) || !is_integral(right) {
        return None;
    }
    binary_result_type(left, right).filter(|&ty| is_integral(ty))
}

fn numeric_kind(ty: TypeHash) -> Option<PrimitiveKind> {
    PrimitiveKind::from_hash(ty).filter(|k| k.is_numeric())
}

/// Whether the type is an integral primitive (not `char` or `bool`).
pub fn is_integral(ty: TypeHash) -> bool {
    PrimitiveKind::from_hash(ty).is_some_and(PrimitiveKind::is_integral)
}

/// Whether the type is an unsigned integral primitive.
pub fn is_unsigned(ty: TypeHash) -> bool {
    is_integral(ty) && PrimitiveKind::from_hash(ty).is_some_and(PrimitiveKind::is_unsigned)
}

/// Whether the type is `float` or `double`.
pub fn is_real(ty: TypeHash) -> bool {
    ty == primitives::FLOAT || ty == primitives::DOUBLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::{CallContext, EnumEntry, NativeError};
    use flee_registry::SymbolRegistry;

    fn registry_with_money() -> (SymbolRegistry, TypeHash) {
        let mut registry = SymbolRegistry::with_builtins();
        let money = registry
            .register_class("Money")
            .implicit_conversion(
                primitives::DOUBLE,
                TypeHash::from_name("Money"),
                |ctx: &mut CallContext<'_>| -> Result<(), NativeError> {
                    let v: f64 = ctx.arg_as(0)?;
                    ctx.set_return(v);
                    Ok(())
                },
            )
            .build()
            .unwrap();
        (registry, money)
    }

    #[test]
    fn cost_ordering() {
        let (registry, money) = registry_with_money();
        let exact = convert_score(primitives::INT32, primitives::INT32, &registry).unwrap();
        let widening = convert_score(primitives::INT32, primitives::DOUBLE, &registry).unwrap();
        let user = convert_score(primitives::INT32, money, &registry).unwrap();
        assert!(exact < widening);
        assert!(widening < user);
        assert_eq!(convert_score(primitives::STRING, money, &registry), None);
        assert!(!can_convert(primitives::DOUBLE, primitives::INT32, &registry));
    }

    #[test]
    fn binary_result_types() {
        use primitives::*;
        assert_eq!(binary_result_type(INT32, INT32), Some(INT32));
        assert_eq!(binary_result_type(INT16, BYTE), Some(INT32));
        assert_eq!(binary_result_type(INT32, UINT32), Some(INT64));
        assert_eq!(binary_result_type(INT32, DOUBLE), Some(DOUBLE));
        assert_eq!(binary_result_type(FLOAT, INT64), Some(FLOAT));
        assert_eq!(binary_result_type(UINT64, UINT32), Some(UINT64));
        assert_eq!(binary_result_type(CHAR, CHAR), Some(INT32));
        assert_eq!(binary_result_type(BOOL, INT32), None);
        assert_eq!(binary_result_type(STRING, INT32), None);
    }

    #[test]
    fn bitwise_types_are_integral() {
        use primitives::*;
        assert_eq!(bitwise_op_type(INT32, INT64), Some(INT64));
        assert_eq!(bitwise_op_type(BYTE, BYTE), Some(INT32));
        assert_eq!(bitwise_op_type(INT32, DOUBLE), None);
        assert_eq!(bitwise_op_type(UINT64, INT64), None);
    }

    #[test]
    fn explicit_enum_conversions() {
        let mut registry = SymbolRegistry::with_builtins();
        let color = registry
            .register_type(EnumEntry::new("Color", "Color").with_value("Red", 0))
            .unwrap();

        assert!(find_conversion(color, primitives::INT32, &registry).is_none());
        let to_int = find_explicit_conversion(color, primitives::INT32, &registry).unwrap();
        assert_eq!(
            to_int.kind,
            ConversionKind::EnumToInt {
                to: PrimitiveKind::Int32
            }
        );
        let to_enum = find_explicit_conversion(primitives::INT64, color, &registry).unwrap();
        assert!(matches!(to_enum.kind, ConversionKind::IntToEnum { .. }));
        assert!(find_explicit_conversion(primitives::STRING, color, &registry).is_none());
        assert!(explicit_convertible(primitives::DOUBLE, primitives::BYTE, &registry));
        assert!(!explicit_convertible(primitives::STRING, primitives::INT32, &registry));
    }

    #[test]
    fn user_conversion_emits_a_call() {
        let (registry, money) = registry_with_money();
        let mut em = Emitter::new();
        assert!(emit_implicit_convert(primitives::INT32, money, &registry, &mut em));
        em.chunk()
            .assert_opcodes(&[OpCode::Convert, OpCode::Call]);

        let mut em = Emitter::new();
        assert!(!emit_implicit_convert(primitives::STRING, money, &registry, &mut em));
        assert!(em.is_empty());
    }

    #[test]
    fn checked_explicit_conversion() {
        let registry = SymbolRegistry::with_builtins();
        let conv = find_explicit_conversion(primitives::INT64, primitives::INT32, &registry).unwrap();
        let mut em = Emitter::new();
        conv.emit(&mut em, true);
        em.chunk().assert_opcodes(&[OpCode::ConvertChecked]);
    }
}
