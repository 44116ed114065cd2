//! Reference conversions.
//!
//! Null to any reference type, derived to base, class to implemented
//! interface, anything to `object`, and the explicit reverse (checked
//! down casts and unboxing).

use flee_core::{SymbolResolver, TypeEntry, TypeHash, primitives};

use super::{Conversion, ConversionKind};

/// Find an implicit reference conversion.
pub fn find_reference_conversion(
    from: TypeHash,
    to: TypeHash,
    resolver: &dyn SymbolResolver,
) -> Option<Conversion> {
    if from == primitives::NULL {
        return resolver.is_reference_type(to).then(|| Conversion {
            kind: ConversionKind::NullToReference,
            cost: Conversion::COST_NULL_TO_REFERENCE,
            is_implicit: true,
        });
    }

    if to == primitives::OBJECT && !resolver.is_reference_type(from) {
        // Value types box; the evaluator's values already carry their type.
        resolver.get_type(from)?;
        return Some(Conversion {
            kind: ConversionKind::Boxing,
            cost: Conversion::COST_BOXING,
            is_implicit: true,
        });
    }

    if !resolver.is_reference_type(from) || !resolver.is_reference_type(to) {
        return None;
    }

    let distance = resolver.inheritance_distance(from, to)?;
    Some(Conversion {
        kind: ConversionKind::Upcast { target: to },
        cost: distance.max(1),
        is_implicit: true,
    })
}

/// Find an explicit reference conversion, checked at run time.
pub fn find_downcast(
    from: TypeHash,
    to: TypeHash,
    resolver: &dyn SymbolResolver,
) -> Option<Conversion> {
    let target = resolver.get_type(to)?;

    // Unboxing.
    if from == primitives::OBJECT && !target.is_reference() {
        return Some(downcast(to));
    }

    if !resolver.is_reference_type(from) || !target.is_reference() {
        return None;
    }

    let source_is_interface = resolver
        .get_type(from)
        .is_some_and(|entry| matches!(entry, TypeEntry::Interface(_)));
    let target_is_interface = matches!(target, TypeEntry::Interface(_));

    let related = from == primitives::OBJECT
        || resolver.inheritance_distance(to, from).is_some()
        || source_is_interface
        || target_is_interface;
    related.then(|| downcast(to))
}

fn downcast(target: TypeHash) -> Conversion {
    Conversion {
        kind: ConversionKind::Downcast { target },
        cost: Conversion::COST_EXPLICIT_ONLY,
        is_implicit: false,
    }
}
