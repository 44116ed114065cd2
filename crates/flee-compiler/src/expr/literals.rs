//! Literal typing.
//!
//! The parser keeps literal text; the type depends on the value and the
//! compile options. Unsuffixed integers take the first of `int`, `uint`,
//! `long`, `ulong` that holds the value. A leading minus sign is folded
//! into decimal literals so that `-2147483648` is an `int`.

use flee_core::{CompileErrorReason, MessageKey, Span, Value, primitives};
use flee_parser::ast::{IntegerSuffix, LiteralExpr, LiteralKind, RealSuffix};

use super::{ExprCompiler, Result};
use crate::elements::Element;
use crate::options::{ExpressionOptions, RealLiteralType};

/// Why a literal has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralError {
    Overflow,
    /// Parsed but of an unsupported type.
    Unsupported,
}

/// Build a literal, negated when `negated` is set.
pub(super) fn build_literal(
    compiler: &mut ExprCompiler<'_, '_>,
    lit: &LiteralExpr<'_>,
    negated: bool,
) -> Result<Element> {
    let value = match lit.kind {
        LiteralKind::Integer { digits, suffix } => {
            integer_value(digits, 10, suffix, negated, compiler.options())
        }
        LiteralKind::Hex { digits, suffix } => {
            integer_value(digits, 16, suffix, negated, compiler.options())
        }
        LiteralKind::Real { text, suffix } => real_value(text, suffix, compiler.options()),
        LiteralKind::String(text) => Ok(Value::string(text)),
        LiteralKind::Char(c) => Ok(Value::Char(c)),
        LiteralKind::Bool(b) => Ok(Value::Bool(b)),
        LiteralKind::Null => return Ok(Element::literal(Value::Null, primitives::NULL)),
    };

    match value {
        Ok(value) => {
            let ty = value.type_hash();
            Ok(Element::literal(value, ty))
        }
        Err(err) => Err(literal_error(compiler, lit, negated, err, lit.span)),
    }
}

/// Whether a minus sign in front of this literal is folded into it.
pub(super) fn folds_negation(lit: &LiteralExpr<'_>) -> bool {
    matches!(
        lit.kind,
        LiteralKind::Integer {
            suffix: IntegerSuffix::None | IntegerSuffix::Long,
            ..
        }
    )
}

fn literal_error(
    compiler: &ExprCompiler<'_, '_>,
    lit: &LiteralExpr<'_>,
    negated: bool,
    err: LiteralError,
    span: Span,
) -> flee_core::CompileError {
    let sign = if negated { "-" } else { "" };
    let (text, type_name) = match lit.kind {
        LiteralKind::Integer { digits, .. } => (format!("{sign}{digits}"), "ulong"),
        LiteralKind::Hex { digits, .. } => (format!("0x{digits}"), "ulong"),
        LiteralKind::Real { text, suffix } => (
            text.to_string(),
            match suffix {
                RealSuffix::Decimal => "decimal",
                RealSuffix::Float => "float",
                _ => "double",
            },
        ),
        _ => (String::new(), "object"),
    };
    let reason = match err {
        LiteralError::Overflow => CompileErrorReason::ConstantOverflow,
        LiteralError::Unsupported => CompileErrorReason::InvalidFormat,
    };
    compiler.error(
        reason,
        span,
        MessageKey::ValueNotRepresentableInType,
        &[&text, &type_name],
    )
}

fn integer_value(
    digits: &str,
    radix: u32,
    suffix: IntegerSuffix,
    negated: bool,
    options: &ExpressionOptions,
) -> std::result::Result<Value, LiteralError> {
    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| LiteralError::Overflow)?;

    if options.integers_as_doubles && suffix == IntegerSuffix::None {
        let value = magnitude as f64;
        return Ok(Value::Double(if negated { -value } else { value }));
    }

    if negated {
        let value = -i128::from(magnitude);
        if suffix == IntegerSuffix::None
            && let Ok(v) = i32::try_from(value)
        {
            return Ok(Value::Int32(v));
        }
        return i64::try_from(value)
            .map(Value::Int64)
            .map_err(|_| LiteralError::Overflow);
    }

    let value = match suffix {
        IntegerSuffix::None => i32::try_from(magnitude)
            .map(Value::Int32)
            .or_else(|_| u32::try_from(magnitude).map(Value::UInt32))
            .or_else(|_| i64::try_from(magnitude).map(Value::Int64))
            .unwrap_or(Value::UInt64(magnitude)),
        IntegerSuffix::Unsigned => u32::try_from(magnitude)
            .map(Value::UInt32)
            .unwrap_or(Value::UInt64(magnitude)),
        IntegerSuffix::Long => i64::try_from(magnitude)
            .map(Value::Int64)
            .unwrap_or(Value::UInt64(magnitude)),
        IntegerSuffix::UnsignedLong => Value::UInt64(magnitude),
    };
    Ok(value)
}

fn real_value(
    text: &str,
    suffix: RealSuffix,
    options: &ExpressionOptions,
) -> std::result::Result<Value, LiteralError> {
    let single = match suffix {
        RealSuffix::Float => true,
        RealSuffix::Double => false,
        RealSuffix::Decimal => return Err(LiteralError::Unsupported),
        RealSuffix::None => options.real_literal_type == RealLiteralType::Single,
    };

    if single {
        let value: f32 = text.parse().map_err(|_| LiteralError::Unsupported)?;
        if value.is_infinite() {
            return Err(LiteralError::Overflow);
        }
        Ok(Value::Single(value))
    } else {
        let value: f64 = text.parse().map_err(|_| LiteralError::Unsupported)?;
        if value.is_infinite() {
            return Err(LiteralError::Overflow);
        }
        Ok(Value::Double(value))
    }
}
