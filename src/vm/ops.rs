//! Value-level operations behind the arithmetic, logical and comparison
//! instructions.
//!
//! The compiler converts both operands to one type before it emits a binary
//! instruction, so each operation only handles pairs of the same kind.

use std::cmp::Ordering;

use flee_core::Value;

use super::EvalError;

/// Integral and real arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Arith {
    fn symbol(self) -> &'static str {
        match self {
            Arith::Add => "+",
            Arith::Sub => "-",
            Arith::Mul => "*",
            Arith::Div => "/",
            Arith::Mod => "%",
        }
    }
}

fn operand_error(op: &'static str, left: &Value, right: &Value) -> EvalError {
    EvalError::OperandTypes {
        op,
        left: left.type_name(),
        right: right.type_name(),
    }
}

macro_rules! integral {
    ($variant:ident, $op:expr, $checked:expr, $a:expr, $b:expr) => {{
        let (a, b) = ($a, $b);
        let result = match $op {
            Arith::Add if $checked => a.checked_add(b),
            Arith::Sub if $checked => a.checked_sub(b),
            Arith::Mul if $checked => a.checked_mul(b),
            Arith::Add => Some(a.wrapping_add(b)),
            Arith::Sub => Some(a.wrapping_sub(b)),
            Arith::Mul => Some(a.wrapping_mul(b)),
            Arith::Div | Arith::Mod if b == 0 => return Err(EvalError::DivideByZero),
            Arith::Div => Some(a.wrapping_div(b)),
            Arith::Mod => Some(a.wrapping_rem(b)),
        };
        result
            .map(Value::$variant)
            .ok_or(EvalError::Overflow { op: $op.symbol() })
    }};
}

macro_rules! real {
    ($variant:ident, $op:expr, $a:expr, $b:expr) => {{
        let (a, b) = ($a, $b);
        Ok(Value::$variant(match $op {
            Arith::Add => a + b,
            Arith::Sub => a - b,
            Arith::Mul => a * b,
            Arith::Div => a / b,
            Arith::Mod => a % b,
        }))
    }};
}

pub(crate) fn arithmetic(op: Arith, left: Value, right: Value, checked: bool) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::SByte(a), Value::SByte(b)) => integral!(SByte, op, checked, *a, *b),
        (Value::Byte(a), Value::Byte(b)) => integral!(Byte, op, checked, *a, *b),
        (Value::Int16(a), Value::Int16(b)) => integral!(Int16, op, checked, *a, *b),
        (Value::UInt16(a), Value::UInt16(b)) => integral!(UInt16, op, checked, *a, *b),
        (Value::Int32(a), Value::Int32(b)) => integral!(Int32, op, checked, *a, *b),
        (Value::UInt32(a), Value::UInt32(b)) => integral!(UInt32, op, checked, *a, *b),
        (Value::Int64(a), Value::Int64(b)) => integral!(Int64, op, checked, *a, *b),
        (Value::UInt64(a), Value::UInt64(b)) => integral!(UInt64, op, checked, *a, *b),
        (Value::Single(a), Value::Single(b)) => real!(Single, op, *a, *b),
        (Value::Double(a), Value::Double(b)) => real!(Double, op, *a, *b),
        _ => Err(operand_error(op.symbol(), &left, &right)),
    }
}

pub(crate) fn power(base: Value, exponent: Value) -> Result<Value, EvalError> {
    match (base.as_f64(), exponent.as_f64()) {
        (Some(b), Some(e)) => Ok(Value::Double(b.powf(e))),
        _ => Err(operand_error("^", &base, &exponent)),
    }
}

pub(crate) fn negate(value: Value) -> Result<Value, EvalError> {
    Ok(match value {
        Value::Int32(v) => Value::Int32(v.wrapping_neg()),
        Value::Int64(v) => Value::Int64(v.wrapping_neg()),
        Value::Single(v) => Value::Single(-v),
        Value::Double(v) => Value::Double(-v),
        other => return Err(operand_error("-", &other, &Value::Null)),
    })
}

/// `and`, `or` and `xor` of booleans or integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bitwise {
    And,
    Or,
    Xor,
}

macro_rules! bitwise {
    ($variant:ident, $op:expr, $a:expr, $b:expr) => {
        Value::$variant(match $op {
            Bitwise::And => $a & $b,
            Bitwise::Or => $a | $b,
            Bitwise::Xor => $a ^ $b,
        })
    };
}

pub(crate) fn bitwise(op: Bitwise, left: Value, right: Value) -> Result<Value, EvalError> {
    Ok(match (&left, &right) {
        (Value::Bool(a), Value::Bool(b)) => bitwise!(Bool, op, *a, *b),
        (Value::Int32(a), Value::Int32(b)) => bitwise!(Int32, op, *a, *b),
        (Value::UInt32(a), Value::UInt32(b)) => bitwise!(UInt32, op, *a, *b),
        (Value::Int64(a), Value::Int64(b)) => bitwise!(Int64, op, *a, *b),
        (Value::UInt64(a), Value::UInt64(b)) => bitwise!(UInt64, op, *a, *b),
        _ => {
            let symbol = match op {
                Bitwise::And => "and",
                Bitwise::Or => "or",
                Bitwise::Xor => "xor",
            };
            return Err(operand_error(symbol, &left, &right));
        }
    })
}

pub(crate) fn not(value: Value) -> Result<Value, EvalError> {
    Ok(match value {
        Value::Bool(v) => Value::Bool(!v),
        Value::Int32(v) => Value::Int32(!v),
        Value::UInt32(v) => Value::UInt32(!v),
        Value::Int64(v) => Value::Int64(!v),
        Value::UInt64(v) => Value::UInt64(!v),
        other => return Err(operand_error("not", &other, &Value::Null)),
    })
}

/// Shift `value` by `count` bits. The count is masked to the operand width.
pub(crate) fn shift(left: bool, value: Value, count: Value) -> Result<Value, EvalError> {
    let symbol = if left { "<<" } else { ">>" };
    let Value::Int32(bits) = count else {
        return Err(operand_error(symbol, &value, &count));
    };
    let bits = bits as u32;
    macro_rules! shifted {
        ($variant:ident, $v:expr) => {
            Value::$variant(if left {
                $v.wrapping_shl(bits)
            } else {
                $v.wrapping_shr(bits)
            })
        };
    }
    Ok(match value {
        Value::Int32(v) => shifted!(Int32, v),
        Value::UInt32(v) => shifted!(UInt32, v),
        Value::Int64(v) => shifted!(Int64, v),
        Value::UInt64(v) => shifted!(UInt64, v),
        other => return Err(operand_error(symbol, &other, &count)),
    })
}

/// Ordering of two values of the same primitive or enum kind.
///
/// `Ok(None)` means unordered (a NaN operand).
pub(crate) fn compare(op: &'static str, left: &Value, right: &Value) -> Result<Option<Ordering>, EvalError> {
    Ok(match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Single(a), Value::Single(b)) => a.partial_cmp(b),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::Enum { ty: ta, value: a }, Value::Enum { ty: tb, value: b }) if ta == tb => Some(a.cmp(b)),
        (a, b) => match (a.as_i128(), b.as_i128()) {
            (Some(a), Some(b)) if left.primitive_kind().is_some() && right.primitive_kind().is_some() => {
                Some(a.cmp(&b))
            }
            _ => return Err(operand_error(op, left, right)),
        },
    })
}

/// String equality. Null equals only null.
pub(crate) fn string_equals(left: &Value, right: &Value, ignore_case: bool) -> Result<bool, EvalError> {
    match (left, right) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, Value::String(_)) | (Value::String(_), Value::Null) => Ok(false),
        (Value::String(a), Value::String(b)) if ignore_case => Ok(a.to_lowercase() == b.to_lowercase()),
        (Value::String(a), Value::String(b)) => Ok(a == b),
        _ => Err(operand_error("=", left, right)),
    }
}

/// Reference identity. Values without identity compare by value.
pub(crate) fn reference_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
        (Value::Array(a), Value::Array(b)) => std::sync::Arc::ptr_eq(a, b),
        (Value::String(a), Value::String(b)) => std::sync::Arc::ptr_eq(a, b),
        (a, b) => a == b,
    }
}

/// Text of two values joined; null contributes nothing.
pub(crate) fn concat(left: &Value, right: &Value) -> Value {
    Value::string(format!("{left}{right}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_arithmetic_wraps_unless_checked() {
        let max = Value::Int32(i32::MAX);
        assert_eq!(
            arithmetic(Arith::Add, max.clone(), Value::Int32(1), false).unwrap(),
            Value::Int32(i32::MIN)
        );
        assert_eq!(
            arithmetic(Arith::Add, max, Value::Int32(1), true),
            Err(EvalError::Overflow { op: "+" })
        );
        assert_eq!(
            arithmetic(Arith::Mul, Value::UInt64(3), Value::UInt64(4), true).unwrap(),
            Value::UInt64(12)
        );
    }

    #[test]
    fn division() {
        assert_eq!(
            arithmetic(Arith::Div, Value::Int32(7), Value::Int32(2), false).unwrap(),
            Value::Int32(3)
        );
        assert_eq!(
            arithmetic(Arith::Mod, Value::Int32(-7), Value::Int32(2), false).unwrap(),
            Value::Int32(-1)
        );
        assert_eq!(
            arithmetic(Arith::Div, Value::Int64(1), Value::Int64(0), false),
            Err(EvalError::DivideByZero)
        );
        assert_eq!(
            arithmetic(Arith::Div, Value::Double(1.0), Value::Double(0.0), false).unwrap(),
            Value::Double(f64::INFINITY)
        );
    }

    #[test]
    fn mismatched_operands_fail() {
        assert!(matches!(
            arithmetic(Arith::Add, Value::Int32(1), Value::Double(1.0), false),
            Err(EvalError::OperandTypes { op: "+", .. })
        ));
    }

    #[test]
    fn logic_and_bits() {
        assert_eq!(
            bitwise(Bitwise::And, Value::Bool(true), Value::Bool(false)).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            bitwise(Bitwise::Xor, Value::Int32(6), Value::Int32(3)).unwrap(),
            Value::Int32(5)
        );
        assert_eq!(not(Value::Int32(0)).unwrap(), Value::Int32(-1));
        assert_eq!(not(Value::Bool(false)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn shifts_mask_the_count() {
        assert_eq!(shift(true, Value::Int32(1), Value::Int32(4)).unwrap(), Value::Int32(16));
        assert_eq!(shift(true, Value::Int32(1), Value::Int32(33)).unwrap(), Value::Int32(2));
        assert_eq!(shift(false, Value::Int32(-8), Value::Int32(1)).unwrap(), Value::Int32(-4));
        assert_eq!(shift(false, Value::UInt64(8), Value::Int32(3)).unwrap(), Value::UInt64(1));
    }

    #[test]
    fn comparisons() {
        assert_eq!(
            compare("<", &Value::Int32(1), &Value::Int32(2)).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(compare("=", &Value::Double(f64::NAN), &Value::Double(1.0)).unwrap(), None);
        assert_eq!(
            compare("=", &Value::Char('a'), &Value::Char('a')).unwrap(),
            Some(Ordering::Equal)
        );
        assert!(compare("<", &Value::string("a"), &Value::Int32(1)).is_err());
    }

    #[test]
    fn strings() {
        assert!(string_equals(&Value::string("Abc"), &Value::string("aBC"), true).unwrap());
        assert!(!string_equals(&Value::string("Abc"), &Value::string("aBC"), false).unwrap());
        assert!(string_equals(&Value::Null, &Value::Null, false).unwrap());
        assert!(!string_equals(&Value::Null, &Value::string(""), false).unwrap());
        assert_eq!(concat(&Value::string("n = "), &Value::Int32(3)), Value::string("n = 3"));
        assert_eq!(concat(&Value::Null, &Value::Bool(true)), Value::string("True"));
    }

    #[test]
    fn references() {
        let array = Value::array(flee_core::primitives::INT32, vec![Value::Int32(1)]);
        let same = array.clone();
        let other = Value::array(flee_core::primitives::INT32, vec![Value::Int32(1)]);
        assert!(reference_equals(&array, &same));
        assert!(!reference_equals(&array, &other));
        assert!(reference_equals(&Value::Null, &Value::Null));
    }
}
