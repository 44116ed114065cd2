//! `cast(expr, Type)`.
//!
//! Any implicit conversion is a valid cast. On top of those a cast can
//! narrow numbers, convert between enums and integers, and downcast
//! references. Narrowing is overflow checked when the expression is
//! compiled with `checked`.

use flee_core::{CompileErrorReason, MessageKey, TypeHash};
use flee_parser::ast::{CastExpr, TypeName};

use super::{ExprCompiler, Result};
use crate::conversion::find_explicit_conversion;
use crate::elements::Element;

pub(super) fn build_cast(compiler: &mut ExprCompiler<'_, '_>, cast: &CastExpr<'_>) -> Result<Element> {
    let operand = compiler.build(cast.expr)?;
    let target = resolve_type_name(compiler, &cast.target)?;
    let from = operand.result_type();

    let Some(conversion) = find_explicit_conversion(from, target, compiler.resolver()) else {
        return Err(compiler.error(
            CompileErrorReason::InvalidExplicitCast,
            cast.span,
            MessageKey::InvalidExplicitCast,
            &[&compiler.type_name(from), &compiler.type_name(target)],
        ));
    };

    Ok(operand.converted(conversion, compiler.options().checked, target))
}

/// Resolve the target of a cast through the registry and the imports.
fn resolve_type_name(compiler: &ExprCompiler<'_, '_>, name: &TypeName<'_>) -> Result<TypeHash> {
    let scope = compiler.scope();
    let parts: Vec<&str> = name.parts.iter().map(|part| part.name).collect();
    let unresolved = || {
        let mut text = name.qualified();
        if name.is_array {
            text.push_str("[]");
        }
        compiler.error(
            CompileErrorReason::UndefinedName,
            name.span,
            MessageKey::CouldNotResolveType,
            &[&text],
        )
    };

    let element = scope
        .imports
        .find_type(&parts, scope.case_sensitive(), compiler.resolver())
        .ok_or_else(unresolved)?
        .type_hash();
    if !name.is_array {
        return Ok(element);
    }

    let array = TypeHash::array_of(element);
    compiler
        .resolver()
        .get_type(array)
        .map(|_| array)
        .ok_or_else(unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::ConversionKind;
    use crate::expr::testing::Fixture;
    use flee_core::{EnumEntry, Value, primitives};
    use flee_registry::SymbolRegistry;

    #[test]
    fn numeric_casts() {
        let fixture = Fixture::new().variable("d", primitives::DOUBLE);
        assert_eq!(fixture.result_type("cast(d, int)"), primitives::INT32);
        assert_eq!(fixture.result_type("cast(300, byte)"), primitives::BYTE);
        assert_eq!(fixture.result_type("cast(1, double)"), primitives::DOUBLE);
        assert_eq!(fixture.result_type("cast(d, Int64)"), primitives::INT64);
    }

    #[test]
    fn checked_follows_options() {
        let mut fixture = Fixture::new().variable("d", primitives::DOUBLE);
        let checked_flag = |fixture: &Fixture| match fixture.build("cast(d, int)").unwrap() {
            Element::Convert { checked, .. } => checked,
            other => panic!("unexpected {other:?}"),
        };
        assert!(!checked_flag(&fixture));
        fixture.options.checked = true;
        assert!(checked_flag(&fixture));
    }

    #[test]
    fn identity_cast_adds_nothing() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture.build("cast(5, int)").unwrap(),
            Element::literal(Value::Int32(5), primitives::INT32)
        );
    }

    #[test]
    fn invalid_casts() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture.reason("cast(\"a\", int)"),
            CompileErrorReason::InvalidExplicitCast
        );
        assert_eq!(fixture.reason("cast(1, Nope)"), CompileErrorReason::UndefinedName);
        assert_eq!(
            fixture.reason("cast(1, Nope[])"),
            CompileErrorReason::UndefinedName
        );
    }

    #[test]
    fn enum_casts() {
        let mut registry = SymbolRegistry::with_builtins();
        registry
            .register_type(
                EnumEntry::new("Color", "Color")
                    .with_value("Red", 0)
                    .with_value("Green", 1),
            )
            .unwrap();
        let color = TypeHash::from_name("Color");
        let fixture = Fixture::with_registry(registry).variable("c", color);

        assert_eq!(fixture.result_type("cast(c, int)"), primitives::INT32);
        match fixture.build("cast(1, Color)").unwrap() {
            Element::Convert { conversion, ty, .. } => {
                assert_eq!(ty, color);
                assert!(matches!(conversion.kind, ConversionKind::IntToEnum { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn array_casts() {
        let mut registry = SymbolRegistry::with_builtins();
        let ints = registry.ensure_array(primitives::INT32);
        let fixture = Fixture::with_registry(registry).variable("o", primitives::OBJECT);
        assert_eq!(fixture.result_type("cast(o, int[])"), ints);
    }
}
