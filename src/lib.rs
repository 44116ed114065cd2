//! Flee: a compiler and evaluator for small typed expressions, and a
//! calculation engine built on top of it.
//!
//! Expressions such as `price * qty * (1 + rate)` or
//! `if(x > 0, Math.Sqrt(x), 0.0)` are parsed, type checked against host
//! types registered in a [`SymbolRegistry`], and compiled to bytecode that a
//! small stack machine evaluates.
//!
//! ```ignore
//! use std::sync::Arc;
//! use flee::{ExpressionContext, SymbolRegistry, Value};
//!
//! let mut ctx = ExpressionContext::new(Arc::new(SymbolRegistry::with_builtins()));
//! ctx.imports_mut().add_type("Math")?;
//! ctx.variables().add("x", 16.0)?;
//!
//! let expr = ctx.compile_dynamic("Sqrt(x) + 1")?;
//! assert_eq!(expr.evaluate()?, Value::Double(5.0));
//! ```
//!
//! ## Modules
//!
//! - [`context`]: Compile-time environment ([`ExpressionContext`])
//! - [`expression`]: Compiled [`Expression`]s and typed [`GenericExpression`]s
//! - [`imports`]: Making host types visible to expressions
//! - [`variables`]: Typed, shared variable storage
//! - [`vm`]: The bytecode interpreter
//! - [`calc`]: The dependency tracking [`CalculationEngine`]
//!
//! The compiler itself lives in `flee-compiler`, the parser in
//! `flee-parser` and the host registry in `flee-registry`; the types most
//! callers need are re-exported here.

pub mod calc;
pub mod context;
pub mod error;
pub mod expression;
pub mod imports;
pub mod variables;
pub mod vm;

pub use calc::{BatchLoader, CalcError, CalculationEngine, DependencyManager, NodeEvent, SimpleCalcEngine};
pub use context::ExpressionContext;
pub use error::{FleeError, Result};
pub use expression::{Expression, GenericExpression};
pub use imports::{ExpressionImports, ImportError, NamespaceBuilder};
pub use variables::{OnDemandResolver, VariableCollection, VariableError};
pub use vm::EvalError;

pub use flee_compiler::{ExpressionOptions, RealLiteralType, StringComparison};
pub use flee_core::{
    CallContext, CompileError, CompileErrorReason, FromValue, HostObject, MemberAccess, MessageCatalog, MessageKey,
    NativeError, ObjectRef, PrimitiveKind, TypeHash, Value, primitives,
};
pub use flee_parser::ParserOptions;
pub use flee_registry::{ClassBuilder, SymbolRegistry};
