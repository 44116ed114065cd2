//! Abstract Syntax Tree (AST) for expressions.
//!
//! This module provides:
//! - AST node definitions
//! - The Pratt parser that builds them
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use flee_parser::ast::{BinaryOp, Expr};
//! use flee_parser::{Parser, ParserOptions};
//!
//! let arena = Bump::new();
//! let expr = Parser::parse_expression("1 + 2 * 3", &arena, &ParserOptions::default()).unwrap();
//! match expr {
//!     Expr::Binary(b) => assert_eq!(b.op, BinaryOp::Add),
//!     _ => unreachable!(),
//! }
//! ```

pub mod ops;

mod parser;

pub mod expr;
mod expr_parser;

// Re-export error types from core
pub use flee_core::{ParseError, ParseErrorKind};

pub use expr::*;
pub use ops::*;
pub use parser::Parser;
