//! `if(condition, when_true, when_false)`.
//!
//! Only one branch runs. The result type is the type of the first branch
//! when the second converts to it, otherwise the type of the second.

use flee_core::{CompileErrorReason, MessageKey, primitives};
use flee_parser::ast::ConditionalExpr;

use super::{ExprCompiler, Result};
use crate::elements::Element;

pub(super) fn build_conditional(
    compiler: &mut ExprCompiler<'_, '_>,
    cond: &ConditionalExpr<'_>,
) -> Result<Element> {
    let condition = compiler.build(cond.condition)?;
    if condition.result_type() != primitives::BOOL {
        return Err(compiler.error(
            CompileErrorReason::TypeMismatch,
            cond.condition.span(),
            MessageKey::FirstArgNotBoolean,
            &[&"if"],
        ));
    }

    let when_true = compiler.build(cond.when_true)?;
    let when_false = compiler.build(cond.when_false)?;
    let (a, b) = (when_true.result_type(), when_false.result_type());

    let (when_true, when_false, ty) = match compiler.convert(when_false.clone(), a) {
        Some(when_false) => (when_true, when_false, a),
        None => match compiler.convert(when_true, b) {
            Some(when_true) => (when_true, when_false, b),
            None => {
                return Err(compiler.error(
                    CompileErrorReason::TypeMismatch,
                    cond.span,
                    MessageKey::NeitherArgIsConvertibleToTheOther,
                    &[&"if", &compiler.type_name(a), &compiler.type_name(b)],
                ));
            }
        },
    };

    Ok(Element::Conditional {
        condition: Box::new(condition),
        when_true: Box::new(when_true),
        when_false: Box::new(when_false),
        ty,
    })
}
