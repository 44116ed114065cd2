//! Parser infrastructure.
//!
//! Provides the main [`Parser`] struct with token navigation. The whole
//! expression is tokenized up front and parsing stops at the first error.

use bumpalo::Bump;
use flee_core::{ParseError, ParseErrorKind};

use crate::ast::expr::Expr;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::options::ParserOptions;

/// The expression parser.
///
/// The `'ast` lifetime refers to the arena where AST nodes and token
/// lexemes are allocated. The source string only needs to live during
/// the call to [`Parser::new`].
pub struct Parser<'ast> {
    /// Buffered tokens, always terminated by `Eof`
    pub(super) buffer: Vec<Token<'ast>>,
    /// Current position in the buffer
    pub(super) position: usize,
    /// Arena allocator for AST nodes
    pub(super) arena: &'ast Bump,
}

impl<'ast> Parser<'ast> {
    /// Tokenize `source` and create a parser over it.
    pub fn new(
        source: &str,
        arena: &'ast Bump,
        options: &ParserOptions,
    ) -> Result<Self, ParseError> {
        let buffer = Lexer::new(source, arena, options).tokenize()?;
        Ok(Self {
            buffer,
            position: 0,
            arena,
        })
    }

    /// Parse a complete expression.
    ///
    /// # Example
    ///
    /// ```
    /// use bumpalo::Bump;
    /// use flee_parser::{Parser, ParserOptions};
    ///
    /// let arena = Bump::new();
    /// let expr = Parser::parse_expression("a + 1", &arena, &ParserOptions::default()).unwrap();
    /// assert_eq!(expr.span().len(), 5);
    /// ```
    pub fn parse_expression(
        source: &str,
        arena: &'ast Bump,
        options: &ParserOptions,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        #[cfg(feature = "profiling")]
        profiling::scope!("Parser::parse_expression");

        let mut parser = Self::new(source, arena, options)?;
        if parser.is_eof() {
            let span = parser.peek().span;
            return Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                span,
                "empty expression",
            ));
        }
        let expr = parser.parse_expr(0)?;
        if !parser.is_eof() {
            let token = *parser.peek();
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                token.span,
                format!("unexpected {} after end of expression", token.kind),
            ));
        }
        Ok(expr)
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> &Token<'ast> {
        &self.buffer[self.position.min(self.buffer.len() - 1)]
    }

    /// Peek ahead n tokens without consuming.
    pub fn peek_nth(&self, n: usize) -> &Token<'ast> {
        &self.buffer[(self.position + n).min(self.buffer.len() - 1)]
    }

    /// Get the current token and advance to the next. Stays on `Eof`.
    pub fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// Check if the current token matches the given kind.
    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Check if the current token is EOF.
    pub fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expect the current token to be of the given kind.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = *self.peek();
        let error_kind = if token.kind == TokenKind::Eof {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::ExpectedToken
        };
        Err(ParseError::new(
            error_kind,
            token.span,
            format!("expected {}, found {}", kind, token.kind),
        ))
    }
}
