use flee_core::CompileError;
use thiserror::Error;

use crate::variables::VariableError;
use crate::vm::EvalError;

/// Failure managing or recalculating a calculation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Entries read each other, directly or not.
    #[error("circular reference detected in calculation engine{}", .at.as_ref().map(|n| format!(" at '{n}'")).unwrap_or_default())]
    CircularReference { at: Option<String> },

    #[error("an entry named '{0}' already exists in the calculation engine")]
    DuplicateName(String),

    #[error("the calculation engine does not contain an entry named '{0}'")]
    UnknownName(String),

    /// A typed result was read with the wrong type.
    #[error("the result of '{name}' has type '{actual}', not the requested '{requested}'")]
    ResultTypeMismatch {
        name: String,
        actual: String,
        requested: String,
    },

    #[error("the expression for '{name}' could not be compiled: {source}")]
    Compile {
        name: String,
        #[source]
        source: CompileError,
    },

    /// An entry of a batch failed to compile; the engine was left empty.
    #[error("batch load: the expression for atom '{atom}' could not be compiled")]
    BatchLoadCompile {
        atom: String,
        text: String,
        #[source]
        source: CompileError,
    },

    #[error("evaluating '{name}' failed: {source}")]
    Eval {
        name: String,
        #[source]
        source: EvalError,
    },

    /// An expression of a simple engine reads a name no other expression
    /// has.
    #[error("expression '{expression}' references unknown name '{name}'")]
    UnknownReference { expression: String, name: String },

    /// A referenced expression could not be linked in as a variable.
    #[error("expression '{expression}' could not link '{name}': {source}")]
    Link {
        expression: String,
        name: String,
        #[source]
        source: VariableError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_reference_messages() {
        assert_eq!(
            CalcError::CircularReference { at: None }.to_string(),
            "circular reference detected in calculation engine"
        );
        assert_eq!(
            CalcError::CircularReference {
                at: Some("x".to_string())
            }
            .to_string(),
            "circular reference detected in calculation engine at 'x'"
        );
    }

    #[test]
    fn link_failures_name_both_expressions() {
        let err = CalcError::Link {
            expression: "total".to_string(),
            name: "rate".to_string(),
            source: VariableError::Undefined("rate".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "expression 'total' could not link 'rate': no variable named 'rate' is defined"
        );
    }
}
