//! `not` and unary minus.

use flee_core::{CompileErrorReason, MessageKey, PrimitiveKind, TypeHash, primitives};
use flee_parser::ast::{Expr, UnaryExpr, UnaryOp};

use super::{ExprCompiler, Result, literals};
use crate::conversion::promote;
use crate::elements::Element;
use crate::overload::unary_operator_name;

pub(super) fn build_unary(compiler: &mut ExprCompiler<'_, '_>, un: &UnaryExpr<'_>) -> Result<Element> {
    if un.op == UnaryOp::Neg
        && let Expr::Literal(lit) = un.operand
        && literals::folds_negation(lit)
    {
        return literals::build_literal(compiler, lit, true);
    }

    let operand = compiler.build(un.operand)?;
    let ty = operand.result_type();
    let operator = unary_operator_name(un.op);

    // Host types may overload negation ahead of the builtin rules; `not`
    // only falls back to an overload.
    if un.op == UnaryOp::Neg
        && let Some(candidate) = compiler.find_unary_operator(operator, ty, un.span)?
    {
        return compiler.bind_call(candidate, None, vec![operand], un.span);
    }

    let result = match un.op {
        UnaryOp::Not => not_type(ty),
        UnaryOp::Neg => negate_type(ty),
    };
    if let Some(result) = result
        && let Some(converted) = compiler.convert(operand.clone(), result)
    {
        let operand = Box::new(converted);
        return Ok(match un.op {
            UnaryOp::Not => Element::Not {
                operand,
                ty: result,
            },
            UnaryOp::Neg => Element::Negate {
                operand,
                ty: result,
            },
        });
    }

    if un.op == UnaryOp::Not
        && let Some(candidate) = compiler.find_unary_operator(operator, ty, un.span)?
    {
        return compiler.bind_call(candidate, None, vec![operand], un.span);
    }

    Err(compiler.error(
        CompileErrorReason::TypeMismatch,
        un.span,
        MessageKey::OperationNotDefinedForType,
        &[&un.op, &compiler.type_name(ty)],
    ))
}

/// `not bool` is logical, `not` of an integer its complement.
fn not_type(ty: TypeHash) -> Option<TypeHash> {
    if ty == primitives::BOOL {
        return Some(ty);
    }
    PrimitiveKind::from_hash(ty)
        .filter(|k| k.is_integral())
        .map(|k| promote(k).type_hash())
}

fn negate_type(ty: TypeHash) -> Option<TypeHash> {
    if ty == primitives::FLOAT
        || ty == primitives::DOUBLE
        || ty == primitives::INT32
        || ty == primitives::INT64
    {
        Some(ty)
    } else if ty == primitives::UINT32 {
        Some(primitives::INT64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::testing::Fixture;
    use flee_core::{CallContext, NativeError, Value};
    use flee_registry::SymbolRegistry;

    #[test]
    fn logical_and_bitwise_not() {
        let fixture = Fixture::new().variable("b", primitives::BYTE);
        assert_eq!(fixture.result_type("not true"), primitives::BOOL);
        assert_eq!(fixture.result_type("not 5"), primitives::INT32);
        assert_eq!(fixture.result_type("not b"), primitives::INT32);
        assert_eq!(fixture.result_type("not 5ul"), primitives::UINT64);
        assert_eq!(fixture.reason("not 1.5"), CompileErrorReason::TypeMismatch);
        assert_eq!(fixture.reason("not \"a\""), CompileErrorReason::TypeMismatch);
    }

    #[test]
    fn negation_types() {
        let fixture = Fixture::new()
            .variable("i", primitives::INT32)
            .variable("u", primitives::UINT32)
            .variable("s", primitives::INT16)
            .variable("f", primitives::FLOAT);
        assert_eq!(fixture.result_type("-i"), primitives::INT32);
        assert_eq!(fixture.result_type("-f"), primitives::FLOAT);
        assert_eq!(fixture.result_type("-u"), primitives::INT64);
        assert_eq!(fixture.result_type("-5u"), primitives::INT64);
        assert_eq!(fixture.reason("-s"), CompileErrorReason::TypeMismatch);
        assert_eq!(fixture.reason("-true"), CompileErrorReason::TypeMismatch);
    }

    #[test]
    fn parenthesized_literal_is_not_folded() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.build("-(5)").unwrap(),
            Element::Negate { .. }
        ));
        assert_eq!(
            fixture.build("-5").unwrap(),
            Element::literal(Value::Int32(-5), primitives::INT32)
        );
        assert_eq!(fixture.result_type("-1.5"), primitives::DOUBLE);
    }

    #[test]
    fn overloaded_negation() {
        let mut registry = SymbolRegistry::with_builtins();
        let vector = TypeHash::from_name("Vector");
        registry
            .register_class("Vector")
            .operator(
                "op_UnaryNegation",
                vector,
                &[vector],
                |ctx: &mut CallContext<'_>| -> std::result::Result<(), NativeError> {
                    ctx.set_return(ctx.arg(0)?.clone());
                    Ok(())
                },
            )
            .build()
            .unwrap();
        let fixture = Fixture::with_registry(registry).variable("v", vector);
        match fixture.build("-v").unwrap() {
            Element::Call { target, ty, .. } => {
                assert_eq!(target.name, "op_UnaryNegation");
                assert_eq!(ty, vector);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
