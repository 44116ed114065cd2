//! Token types and definitions for the expression lexer.

use flee_core::Span;
use std::fmt;

/// A token from the expression text.
///
/// The `'ast` lifetime refers to the arena where the lexeme string is allocated.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    /// The type of token.
    pub kind: TokenKind,
    /// The text of this token (allocated in arena). String and character
    /// literals hold their unescaped content.
    pub lexeme: &'ast str,
    /// Location in the expression text.
    pub span: Span,
}

impl<'ast> Token<'ast> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types of the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// Integer literal with optional suffix: `42`, `7u`, `9ul`, `3f`
    IntegerLiteral,
    /// Real literal with optional suffix: `1.5`, `.5`, `2.5e-3f`
    RealLiteral,
    /// Hex literal: `0xFF`, `0x10L`
    HexLiteral,
    /// String literal: `"hello"`
    StringLiteral,
    /// Character literal: `'a'`
    CharLiteral,

    /// Identifier
    Identifier,

    // =========================================
    // Keywords (case-insensitive)
    // =========================================
    And,
    Or,
    Xor,
    Not,
    In,
    If,
    Cast,
    True,
    False,
    Null,

    // =========================================
    // Operators
    // =========================================
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `^`
    Caret,
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,

    // =========================================
    // Delimiters
    // =========================================
    /// `.`
    Dot,
    /// Function argument separator (`,` by default)
    ArgumentSeparator,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `[]` array marker in cast types
    ArrayBraces,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Check if this token is a keyword.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            And | Or | Xor | Not | In | If | Cast | True | False | Null
        )
    }

    /// Check if this token is a literal.
    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntegerLiteral | RealLiteral | HexLiteral | StringLiteral | CharLiteral | True | False
                | Null
        )
    }

    /// Human readable description, for error messages.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntegerLiteral => "integer literal",
            RealLiteral => "real literal",
            HexLiteral => "hex literal",
            StringLiteral => "string literal",
            CharLiteral => "character literal",
            Identifier => "identifier",
            And => "'and'",
            Or => "'or'",
            Xor => "'xor'",
            Not => "'not'",
            In => "'in'",
            If => "'if'",
            Cast => "'cast'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Caret => "'^'",
            Equal => "'='",
            NotEqual => "'<>'",
            Less => "'<'",
            Greater => "'>'",
            LessEqual => "'<='",
            GreaterEqual => "'>='",
            ShiftLeft => "'<<'",
            ShiftRight => "'>>'",
            Dot => "'.'",
            ArgumentSeparator => "argument separator",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            ArrayBraces => "'[]'",
            Eof => "end of expression",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Look up a keyword, ignoring ASCII case.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    const KEYWORDS: [(&str, TokenKind); 10] = [
        ("and", TokenKind::And),
        ("or", TokenKind::Or),
        ("xor", TokenKind::Xor),
        ("not", TokenKind::Not),
        ("in", TokenKind::In),
        ("if", TokenKind::If),
        ("cast", TokenKind::Cast),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
        ("null", TokenKind::Null),
    ];
    KEYWORDS
        .iter()
        .find(|(text, _)| text.eq_ignore_ascii_case(ident))
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(lookup_keyword("AND"), Some(TokenKind::And));
        assert_eq!(lookup_keyword("True"), Some(TokenKind::True));
        assert_eq!(lookup_keyword("nUlL"), Some(TokenKind::Null));
        assert_eq!(lookup_keyword("android"), None);
    }

    #[test]
    fn classification() {
        assert!(TokenKind::Cast.is_keyword());
        assert!(!TokenKind::Identifier.is_keyword());
        assert!(TokenKind::HexLiteral.is_literal());
        assert!(TokenKind::Null.is_literal());
        assert_eq!(TokenKind::NotEqual.to_string(), "'<>'");
    }
}
