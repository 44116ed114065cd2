//! Bytecode interpreter.
//!
//! A compiled expression is a [`Chunk`](flee_compiler::Chunk) of stack
//! machine instructions. [`execute`] runs one chunk to its `Return` against
//! an [`Environment`] that supplies everything the chunk reads from outside:
//! the owner, variables, calculation engine results and on-demand functions.

mod error;
mod machine;
mod ops;

pub use error::EvalError;
pub use machine::execute;

use flee_core::{SymbolResolver, Value};

/// What a running expression can read from its surroundings.
pub trait Environment {
    /// The expression owner, null when the expression has none.
    fn owner(&self) -> &Value;

    /// Current value of a variable.
    fn variable(&self, name: &str) -> Result<Value, EvalError>;

    /// Last computed value of a calculation engine entry.
    fn calc_result(&self, name: &str) -> Result<Value, EvalError>;

    /// Invoke a function supplied at evaluation time.
    fn call_function(&self, name: &str, args: &[Value]) -> Result<Value, EvalError>;

    /// Type information, used by runtime cast checks.
    fn resolver(&self) -> &dyn SymbolResolver;
}
