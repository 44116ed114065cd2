//! Top-level error type.

use flee_core::{CompileError, RegistrationError};
use thiserror::Error;

use crate::calc::CalcError;
use crate::imports::ImportError;
use crate::variables::VariableError;
use crate::vm::EvalError;

/// Any failure the crate reports, for callers that do not need to tell
/// them apart.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FleeError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Variable(#[from] VariableError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

pub type Result<T, E = FleeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    fn undefined() -> Result<()> {
        Err(VariableError::Undefined("x".to_string()))?;
        Ok(())
    }

    #[test]
    fn errors_convert_and_keep_their_message() {
        let err = undefined().unwrap_err();
        assert!(matches!(err, FleeError::Variable(_)));
        assert_eq!(err.to_string(), "no variable named 'x' is defined");
    }
}
