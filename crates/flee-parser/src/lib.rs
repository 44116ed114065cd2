//! Flee expression parser crate.
//!
//! This crate provides the lexer and parser for Flee expressions:
//! - Lexical analysis (tokenization) with configurable separators
//! - Abstract Syntax Tree (AST) definitions
//! - Pratt parser for transforming tokens into the AST
//! - Identifier analysis for dependency discovery
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use flee_parser::{IdentifierAnalyzer, Parser, ParserOptions};
//!
//! let arena = Bump::new();
//! let expr = Parser::parse_expression("a.Length + max(b, 2)", &arena, &ParserOptions::default())
//!     .unwrap();
//! assert_eq!(IdentifierAnalyzer::analyze(expr), vec!["a", "b"]);
//! ```

pub mod analyzer;
pub mod ast;
pub mod lexer;
pub mod options;

// Re-export commonly used types at crate root
pub use analyzer::IdentifierAnalyzer;
pub use ast::{Expr, Parser};
pub use flee_core::{ParseError, ParseErrorKind, Span};
pub use lexer::{Lexer, Token, TokenKind};
pub use options::ParserOptions;
