//! Error types shared by the parser, registry and compiler.
//!
//! ## Error Hierarchy
//!
//! ```text
//! LexError            - tokenizer errors
//! ParseError          - grammar errors (with ParseErrorKind)
//! RegistrationError   - host type/function registration errors
//! CompileError        - every failure surfaced by compiling an expression,
//!                       classified by CompileErrorReason
//! ```
//!
//! Lex and parse errors convert into a [`CompileError`] with the
//! [`CompileErrorReason::SyntaxError`] reason, so compile entry points only
//! ever return one error type.

use std::fmt;

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur while tokenizing expression text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal was not terminated.
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    /// A character literal was not terminated or holds more than one character.
    #[error("invalid character literal at {span}")]
    InvalidChar { span: Span },

    /// An unknown escape sequence.
    #[error("invalid escape sequence '\\{escape}' at {span}")]
    InvalidEscape { escape: String, span: Span },

    /// A numeric literal could not be parsed.
    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::InvalidChar { span } => *span,
            LexError::InvalidEscape { span, .. } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// The expression ended early.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A type name was expected (in `cast`).
    ExpectedType,
    /// An identifier was expected after `.`.
    ExpectedIdentifier,
    /// A literal could not be represented in any allowed type.
    ConstantOverflow,
    /// A literal used a suffix or format that is not supported.
    InvalidLiteral,
    /// The tokenizer rejected the input.
    InvalidToken,
}

impl ParseErrorKind {
    /// Human readable description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of expression",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ConstantOverflow => "constant overflow",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::InvalidToken => "invalid token",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A parse error with location.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// Category.
    pub kind: ParseErrorKind,
    /// Location in the expression text.
    pub span: Span,
    /// Detail message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::InvalidToken, err.span(), err.to_string())
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while registering host types and functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A referenced type is not registered.
    #[error("type not found: {0}")]
    TypeNotFound(String),

    /// A type with this name already exists.
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    /// A member with the same name and signature already exists.
    #[error("duplicate member '{member}' on type '{type_name}'")]
    DuplicateMember { type_name: String, member: String },

    /// Two enum members share a name.
    #[error("duplicate enum value: '{value_name}' in enum '{enum_name}'")]
    DuplicateEnumValue {
        enum_name: String,
        value_name: String,
    },

    /// Registration data is inconsistent.
    #[error("invalid registration for '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

// ============================================================================
// Compile Errors
// ============================================================================

/// Classification of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorReason {
    /// The text is not a valid expression.
    SyntaxError,
    /// A literal does not fit any allowed type.
    ConstantOverflow,
    /// Operand or result types are incompatible.
    TypeMismatch,
    /// An identifier or function could not be found.
    UndefinedName,
    /// A called function returns nothing.
    FunctionHasNoReturnValue,
    /// A `cast` between unrelated types.
    InvalidExplicitCast,
    /// More than one candidate matched equally well.
    AmbiguousMatch,
    /// Every matching candidate is inaccessible.
    AccessDenied,
    /// A literal or type name is malformed.
    InvalidFormat,
}

impl fmt::Display for CompileErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CompileErrorReason::SyntaxError => "syntax error",
            CompileErrorReason::ConstantOverflow => "constant overflow",
            CompileErrorReason::TypeMismatch => "type mismatch",
            CompileErrorReason::UndefinedName => "undefined name",
            CompileErrorReason::FunctionHasNoReturnValue => "function has no return value",
            CompileErrorReason::InvalidExplicitCast => "invalid explicit cast",
            CompileErrorReason::AmbiguousMatch => "ambiguous match",
            CompileErrorReason::AccessDenied => "access denied",
            CompileErrorReason::InvalidFormat => "invalid format",
        };
        f.write_str(text)
    }
}

/// A failure compiling an expression.
///
/// Raised at the point of detection; no partial result is produced.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason} at {span}: {message}")]
pub struct CompileError {
    /// Classification.
    pub reason: CompileErrorReason,
    /// Location of the offending element.
    pub span: Span,
    /// Formatted message.
    pub message: String,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(reason: CompileErrorReason, span: Span, message: impl Into<String>) -> Self {
        Self {
            reason,
            span,
            message: message.into(),
        }
    }

    /// Classification of this error.
    pub fn reason(&self) -> CompileErrorReason {
        self.reason
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        let reason = match err.kind {
            ParseErrorKind::ConstantOverflow => CompileErrorReason::ConstantOverflow,
            ParseErrorKind::InvalidLiteral => CompileErrorReason::InvalidFormat,
            _ => CompileErrorReason::SyntaxError,
        };
        CompileError::new(reason, err.span, err.message)
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        ParseError::from(err).into()
    }
}
