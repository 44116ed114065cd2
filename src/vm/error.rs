//! Evaluation errors.

use flee_core::{ConversionError, NativeError};
use thiserror::Error;

/// Failure while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The instruction stream is malformed.
    #[error("invalid bytecode at offset {offset}")]
    InvalidBytecode { offset: usize },

    /// Integral division or remainder by zero.
    #[error("attempted to divide by zero")]
    DivideByZero,

    /// Checked arithmetic overflowed.
    #[error("arithmetic operation '{op}' resulted in an overflow")]
    Overflow { op: &'static str },

    /// The operands reaching an instruction have types it cannot handle.
    #[error("operator '{op}' cannot be applied to operands of type '{left}' and '{right}'")]
    OperandTypes {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A downcast found a value of an unrelated type.
    #[error("unable to cast value of type '{from}' to '{to}'")]
    InvalidCast { from: String, to: String },

    /// A member was read through a null reference.
    #[error("object reference not set to an instance of an object (reading '{member}')")]
    NullReference { member: String },

    /// Array index outside the array.
    #[error("index {index} was outside the bounds of the array (length {len})")]
    IndexOutOfRange { index: i64, len: usize },

    /// A host function failed.
    #[error("call to '{function}' failed: {source}")]
    Native {
        function: String,
        #[source]
        source: NativeError,
    },

    /// A variable read at evaluation time is not defined and no resolver
    /// supplied it.
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    /// A supplied value does not match the declared variable type.
    #[error("value of type '{actual}' is not assignable to variable '{name}' of type '{expected}'")]
    VariableType {
        name: String,
        expected: String,
        actual: String,
    },

    /// An on-demand function was not supplied at evaluation time.
    #[error("no implementation was supplied for function '{0}'")]
    UndefinedFunction(String),

    /// A calculation engine entry referenced by the expression is gone.
    #[error("the calculation engine does not contain '{0}'")]
    UnknownCalcEntry(String),

    /// An owner was assigned whose type differs from the one the
    /// expression was compiled against.
    #[error("owner of type '{actual}' cannot replace an owner of type '{expected}'")]
    OwnerType { expected: String, actual: String },

    /// A typed evaluation asked for a type the result does not have.
    #[error("result of type '{actual}' cannot be read as '{expected}'")]
    ResultType { expected: String, actual: String },
}
