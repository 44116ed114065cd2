//! Binary operators and `in`.
//!
//! Each operator family resolves in a fixed order, first match wins:
//!
//! - Arithmetic: overloaded operator, common numeric type, string
//!   concatenation (`+` only).
//! - Comparison: string equality, overloaded operator, common numeric
//!   type, `bool` equality, reference equality, same enum.
//! - `and`/`or`/`xor`: `bool` logic, integral bitwise, overloaded operator.
//! - Shifts: overloaded operator, then an integral left operand shifted by
//!   an `int` count.

use flee_core::{
    CompileError, CompileErrorReason, MemberKinds, MessageKey, PrimitiveKind, Span, TypeEntry,
    TypeHash, Visibility, primitives,
};
use flee_parser::ast::{BinaryExpr, BinaryOp, InExpr, InTarget};

use super::{ExprCompiler, Result};
use crate::conversion::{binary_result_type, bitwise_op_type, is_integral, is_real, promote};
use crate::elements::{
    ArithmeticOp, BitwiseOp, CompareKind, CompareOp, Element, Exponent, LogicalOp, ShiftOp,
};
use crate::overload::{Candidate, binary_operator_name, resolve_overload};

pub(super) fn build_binary(
    compiler: &mut ExprCompiler<'_, '_>,
    bin: &BinaryExpr<'_>,
) -> Result<Element> {
    let left = compiler.build(bin.left)?;
    let right = compiler.build(bin.right)?;
    combine(compiler, bin.op, left, right, bin.span)
}

/// Combine two built operands with a binary operator.
fn combine(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: Element,
    right: Element,
    span: Span,
) -> Result<Element> {
    match op {
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Pow => build_arithmetic(compiler, op, left, right, span),
        BinaryOp::Equal
        | BinaryOp::NotEqual
        | BinaryOp::Less
        | BinaryOp::Greater
        | BinaryOp::LessEqual
        | BinaryOp::GreaterEqual => build_compare(compiler, op, left, right, span),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
            build_logical(compiler, op, left, right, span)
        }
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => build_shift(compiler, op, left, right, span),
    }
}

fn not_defined(
    compiler: &ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: TypeHash,
    right: TypeHash,
    span: Span,
) -> CompileError {
    compiler.error(
        CompileErrorReason::TypeMismatch,
        span,
        MessageKey::OperationNotDefinedForTypes,
        &[&op, &compiler.type_name(left), &compiler.type_name(right)],
    )
}

/// Call an overloaded operator if either operand type defines one.
fn try_overload(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: Element,
    right: Element,
    span: Span,
) -> Result<std::result::Result<Element, (Element, Element)>> {
    let (lt, rt) = (left.result_type(), right.result_type());
    match compiler.find_binary_operator(binary_operator_name(op), lt, rt, &op, span)? {
        Some(candidate) => compiler
            .bind_call(candidate, None, vec![left, right], span)
            .map(Ok),
        None => Ok(Err((left, right))),
    }
}

/// Convert both operands to `ty`; both are known to convert.
fn both_to(
    compiler: &ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: Element,
    right: Element,
    ty: TypeHash,
    span: Span,
) -> Result<(Element, Element)> {
    let (lt, rt) = (left.result_type(), right.result_type());
    match (compiler.convert(left, ty), compiler.convert(right, ty)) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(not_defined(compiler, op, lt, rt, span)),
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

fn build_arithmetic(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: Element,
    right: Element,
    span: Span,
) -> Result<Element> {
    let (left, right) = match try_overload(compiler, op, left, right, span)? {
        Ok(call) => return Ok(call),
        Err(operands) => operands,
    };
    let (lt, rt) = (left.result_type(), right.result_type());
    let checked = compiler.options().checked && is_integral(lt) && is_integral(rt);

    if let Some(ty) = binary_result_type(lt, rt) {
        if op == BinaryOp::Pow {
            return build_power(compiler, left, right, checked, span);
        }
        let (left, right) = both_to(compiler, op, left, right, ty, span)?;
        let op = match op {
            BinaryOp::Add => ArithmeticOp::Add,
            BinaryOp::Sub => ArithmeticOp::Sub,
            BinaryOp::Mul => ArithmeticOp::Mul,
            BinaryOp::Div => ArithmeticOp::Div,
            _ => ArithmeticOp::Mod,
        };
        return Ok(Element::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
            checked,
            ty,
        });
    }

    if op == BinaryOp::Add && (lt == primitives::STRING || rt == primitives::STRING) {
        return Ok(Element::Concat {
            left: Box::new(left),
            right: Box::new(right),
        });
    }

    Err(not_defined(compiler, op, lt, rt, span))
}

/// `base ^ exponent`.
///
/// A non-negative `int` literal exponent keeps the base's (promoted) type
/// and multiplies; anything else computes in `double`.
fn build_power(
    compiler: &ExprCompiler<'_, '_>,
    base: Element,
    exponent: Element,
    checked: bool,
    span: Span,
) -> Result<Element> {
    let base_kind = PrimitiveKind::from_hash(base.result_type()).map(promote);
    let repeated = exponent
        .as_int_literal()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|_| base_kind.is_some_and(|k| k.is_integral() || is_real(k.type_hash())));

    if let (Some(n), Some(kind)) = (repeated, base_kind) {
        let ty = kind.type_hash();
        let (bt, et) = (base.result_type(), exponent.result_type());
        let base = compiler
            .convert(base, ty)
            .ok_or_else(|| not_defined(compiler, BinaryOp::Pow, bt, et, span))?;
        return Ok(Element::Power {
            base: Box::new(base),
            exponent: Exponent::Repeated(n),
            checked,
            ty,
        });
    }

    let (base, exponent) = both_to(compiler, BinaryOp::Pow, base, exponent, primitives::DOUBLE, span)?;
    Ok(Element::Power {
        base: Box::new(base),
        exponent: Exponent::Computed(Box::new(exponent)),
        checked: false,
        ty: primitives::DOUBLE,
    })
}

// ============================================================================
// Comparison
// ============================================================================

fn compare_op(op: BinaryOp) -> CompareOp {
    match op {
        BinaryOp::Equal => CompareOp::Equal,
        BinaryOp::NotEqual => CompareOp::NotEqual,
        BinaryOp::Less => CompareOp::Less,
        BinaryOp::Greater => CompareOp::Greater,
        BinaryOp::LessEqual => CompareOp::LessEqual,
        _ => CompareOp::GreaterEqual,
    }
}

pub(super) fn build_compare(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: Element,
    right: Element,
    span: Span,
) -> Result<Element> {
    let compare = compare_op(op);
    let (lt, rt) = (left.result_type(), right.result_type());
    let element = |kind, left: Element, right: Element| Element::Compare {
        op: compare,
        kind,
        left: Box::new(left),
        right: Box::new(right),
    };

    if lt == primitives::STRING && rt == primitives::STRING && compare.is_equality() {
        let kind = CompareKind::String(compiler.options().string_comparison);
        return Ok(element(kind, left, right));
    }

    let (left, right) = match try_overload(compiler, op, left, right, span)? {
        Ok(call) => return Ok(call),
        Err(operands) => operands,
    };

    if let Some(ty) = binary_result_type(lt, rt) {
        let (left, right) = both_to(compiler, op, left, right, ty, span)?;
        return Ok(element(CompareKind::Numeric, left, right));
    }

    if !compare.is_equality() {
        return same_enum(compiler, lt, rt)
            .then(|| element(CompareKind::Enum, left, right))
            .ok_or_else(|| not_defined(compiler, op, lt, rt, span));
    }

    let resolver = compiler.resolver();
    if lt == primitives::BOOL && rt == primitives::BOOL {
        Ok(element(CompareKind::Bool, left, right))
    } else if same_enum(compiler, lt, rt) {
        Ok(element(CompareKind::Enum, left, right))
    } else if resolver.is_reference_type(lt) && resolver.is_reference_type(rt) {
        Ok(element(CompareKind::Reference, left, right))
    } else {
        Err(not_defined(compiler, op, lt, rt, span))
    }
}

fn same_enum(compiler: &ExprCompiler<'_, '_>, left: TypeHash, right: TypeHash) -> bool {
    left == right && compiler.resolver().get_type(left).is_some_and(TypeEntry::is_enum)
}

// ============================================================================
// And / Or / Xor
// ============================================================================

fn build_logical(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: Element,
    right: Element,
    span: Span,
) -> Result<Element> {
    let (lt, rt) = (left.result_type(), right.result_type());

    if lt == primitives::BOOL && rt == primitives::BOOL {
        let logical = match op {
            BinaryOp::And => Some(LogicalOp::And),
            BinaryOp::Or => Some(LogicalOp::Or),
            _ => None,
        };
        return Ok(match logical {
            Some(op) => Element::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            None => Element::Bitwise {
                op: BitwiseOp::Xor,
                left: Box::new(left),
                right: Box::new(right),
                ty: primitives::BOOL,
            },
        });
    }

    if let Some(ty) = bitwise_op_type(lt, rt) {
        let (left, right) = both_to(compiler, op, left, right, ty, span)?;
        let op = match op {
            BinaryOp::And => BitwiseOp::And,
            BinaryOp::Or => BitwiseOp::Or,
            _ => BitwiseOp::Xor,
        };
        return Ok(Element::Bitwise {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        });
    }

    match try_overload(compiler, op, left, right, span)? {
        Ok(call) => Ok(call),
        Err(_) => Err(not_defined(compiler, op, lt, rt, span)),
    }
}

// ============================================================================
// Shifts
// ============================================================================

fn build_shift(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: Element,
    right: Element,
    span: Span,
) -> Result<Element> {
    let (left, right) = match try_overload(compiler, op, left, right, span)? {
        Ok(call) => return Ok(call),
        Err(operands) => operands,
    };
    let (lt, rt) = (left.result_type(), right.result_type());

    let shifted = PrimitiveKind::from_hash(lt)
        .filter(|k| k.is_integral())
        .map(|k| promote(k).type_hash());
    let Some(ty) = shifted else {
        return Err(not_defined(compiler, op, lt, rt, span));
    };

    let left = compiler.convert(left, ty);
    let right = compiler.convert(right, primitives::INT32);
    let (Some(left), Some(right)) = (left, right) else {
        return Err(not_defined(compiler, op, lt, rt, span));
    };
    Ok(Element::Shift {
        op: if op == BinaryOp::ShiftLeft {
            ShiftOp::Left
        } else {
            ShiftOp::Right
        },
        left: Box::new(left),
        right: Box::new(right),
        ty,
    })
}

// ============================================================================
// In
// ============================================================================

pub(super) fn build_in(compiler: &mut ExprCompiler<'_, '_>, in_expr: &InExpr<'_>) -> Result<Element> {
    let operand = compiler.build(in_expr.operand)?;
    match in_expr.target {
        InTarget::List(items) => {
            let ty = operand.result_type();
            let slot = compiler.alloc_temp(in_expr.span)?;
            let mut comparisons = Vec::with_capacity(items.len());
            for item in items {
                let value = compiler.build(item)?;
                let cached = Element::Temp { slot, ty };
                comparisons.push(build_compare(
                    compiler,
                    BinaryOp::Equal,
                    cached,
                    value,
                    item.span(),
                )?);
            }
            Ok(Element::InList {
                operand: Box::new(operand),
                slot,
                comparisons,
            })
        }
        InTarget::Collection(target) => {
            let collection = compiler.build(target)?;
            build_contains(compiler, operand, collection, in_expr.span)
        }
    }
}

/// `operand in collection`: call `Contains`/`ContainsKey` on the first
/// collection interface of the collection's type.
fn build_contains(
    compiler: &mut ExprCompiler<'_, '_>,
    operand: Element,
    collection: Element,
    span: Span,
) -> Result<Element> {
    let resolver = compiler.resolver();
    let ty = collection.result_type();
    let operand_type = operand.result_type();

    let mut interfaces = resolver.all_interfaces(ty);
    interfaces.insert(0, ty);
    let found = interfaces
        .into_iter()
        .filter_map(|iface| {
            let kind = resolver.get_type(iface)?.as_interface()?.collection?;
            Some((kind, iface))
        })
        .min_by_key(|(kind, _)| kind.priority());
    let Some((kind, iface)) = found else {
        return Err(compiler.error(
            CompileErrorReason::TypeMismatch,
            span,
            MessageKey::SearchArgIsNotKnownCollectionType,
            &[&compiler.type_name(ty)],
        ));
    };

    let candidates = resolver
        .find_members(iface, kind.contains_method(), MemberKinds::METHOD)
        .into_iter()
        .filter_map(|m| m.as_method())
        .filter(|f| !f.is_static && f.params.len() == 1 && f.native.is_some())
        .map(|f| Candidate::new(f, f.visibility == Visibility::Public));
    let Ok(candidate) = resolve_overload(candidates, &[operand_type], resolver) else {
        let element = resolver
            .find_members(iface, kind.contains_method(), MemberKinds::METHOD)
            .first()
            .and_then(|m| m.as_method())
            .and_then(|f| f.params.first())
            .map(|p| p.ty)
            .unwrap_or(primitives::OBJECT);
        return Err(compiler.error(
            CompileErrorReason::TypeMismatch,
            span,
            MessageKey::OperandNotConvertibleToCollectionType,
            &[&compiler.type_name(operand_type), &compiler.type_name(element)],
        ));
    };

    compiler.bind_call(candidate, Some(collection), vec![operand], span)
}
