//! Primitive type conversions.
//!
//! This module handles conversions between the numeric primitives and
//! `char`. `bool` converts to nothing but itself.

use flee_core::{PrimitiveKind, TypeHash};

use super::{Conversion, ConversionKind};

/// Find an implicit primitive conversion.
pub fn find_primitive_conversion(from: TypeHash, to: TypeHash) -> Option<Conversion> {
    let source = PrimitiveKind::from_hash(from)?;
    let target = PrimitiveKind::from_hash(to)?;

    if source == target {
        return Some(Conversion::identity());
    }

    if is_implicit_numeric(source, target) {
        return Some(Conversion {
            kind: ConversionKind::Primitive {
                from: source,
                to: target,
            },
            cost: widening_cost(source, target),
            is_implicit: true,
        });
    }

    None
}

/// Find an explicit primitive conversion (`cast`). Any numeric or `char`
/// pair converts; `bool` only to itself.
pub fn find_explicit_primitive_conversion(from: TypeHash, to: TypeHash) -> Option<Conversion> {
    if let Some(conv) = find_primitive_conversion(from, to) {
        return Some(conv);
    }

    let source = PrimitiveKind::from_hash(from)?;
    let target = PrimitiveKind::from_hash(to)?;
    if source == PrimitiveKind::Bool || target == PrimitiveKind::Bool {
        return None;
    }

    Some(Conversion {
        kind: ConversionKind::Primitive {
            from: source,
            to: target,
        },
        cost: Conversion::COST_EXPLICIT_ONLY,
        is_implicit: false,
    })
}

/// The implicit numeric conversion table.
pub fn is_implicit_numeric(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::*;

    match from {
        SByte => matches!(to, Int16 | Int32 | Int64 | Single | Double),
        Byte => matches!(
            to,
            Int16 | UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double
        ),
        Int16 => matches!(to, Int32 | Int64 | Single | Double),
        UInt16 => matches!(to, Int32 | UInt32 | Int64 | UInt64 | Single | Double),
        Int32 => matches!(to, Int64 | Single | Double),
        UInt32 => matches!(to, Int64 | UInt64 | Single | Double),
        Int64 | UInt64 => matches!(to, Single | Double),
        Char => matches!(to, UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double),
        Single => to == Double,
        Bool | Double => false,
    }
}

/// Rank distance on the promotion ladder, at least 1.
fn widening_cost(from: PrimitiveKind, to: PrimitiveKind) -> u32 {
    match (from.rank(), to.rank()) {
        (Some(a), Some(b)) if b > a => b - a,
        _ => 1,
    }
}

/// Whether the type is one of the numeric primitives or `char`.
pub fn is_primitive_numeric(ty: TypeHash) -> bool {
    PrimitiveKind::from_hash(ty).is_some_and(PrimitiveKind::is_numeric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::primitives;

    #[test]
    fn identity() {
        let conv = find_primitive_conversion(primitives::INT32, primitives::INT32).unwrap();
        assert!(conv.is_exact());
        assert_eq!(conv.cost, 0);
    }

    #[test]
    fn widening_scores_by_rank_distance() {
        let int_to_long = find_primitive_conversion(primitives::INT32, primitives::INT64).unwrap();
        let int_to_double =
            find_primitive_conversion(primitives::INT32, primitives::DOUBLE).unwrap();
        assert_eq!(int_to_long.cost, 2);
        assert_eq!(int_to_double.cost, 5);
        assert!(int_to_long.cost < int_to_double.cost);

        let char_to_ushort =
            find_primitive_conversion(primitives::CHAR, primitives::UINT16).unwrap();
        assert_eq!(char_to_ushort.cost, 1);
    }

    #[test]
    fn narrowing_is_not_implicit() {
        assert!(find_primitive_conversion(primitives::INT64, primitives::INT32).is_none());
        assert!(find_primitive_conversion(primitives::INT32, primitives::UINT32).is_none());
        assert!(find_primitive_conversion(primitives::DOUBLE, primitives::FLOAT).is_none());
        assert!(find_primitive_conversion(primitives::INT32, primitives::CHAR).is_none());
        assert!(find_primitive_conversion(primitives::BOOL, primitives::INT32).is_none());
    }

    #[test]
    fn explicit_allows_any_numeric_pair() {
        let conv =
            find_explicit_primitive_conversion(primitives::DOUBLE, primitives::SBYTE).unwrap();
        assert!(!conv.is_implicit());
        assert!(matches!(
            conv.kind,
            ConversionKind::Primitive {
                to: PrimitiveKind::SByte,
                ..
            }
        ));
        assert!(find_explicit_primitive_conversion(primitives::INT32, primitives::CHAR).is_some());
        assert!(find_explicit_primitive_conversion(primitives::BOOL, primitives::INT32).is_none());
        assert!(
            find_explicit_primitive_conversion(primitives::STRING, primitives::INT32).is_none()
        );
    }
}
