//! Main lexer implementation.
//!
//! The [`Lexer`] converts expression text into [`Token`]s. It dispatches on
//! the first character of each token. Lexemes are copied into the arena;
//! real literals are normalised to use `.` as the decimal separator and
//! string/char literals hold their unescaped content.

use bumpalo::Bump;
use flee_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};
use crate::options::ParserOptions;

/// Lexer for expression text.
pub struct Lexer<'src, 'ast, 'opt> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    options: &'opt ParserOptions,
}

impl<'src, 'ast, 'opt> Lexer<'src, 'ast, 'opt> {
    /// Create a new lexer for the given text.
    pub fn new(source: &'src str, arena: &'ast Bump, options: &'opt ParserOptions) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            options,
        }
    }

    /// Tokenize the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token<'ast>>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Result<Token<'ast>, LexError> {
        self.skip_whitespace();

        let start = self.cursor.offset();
        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", Span::point(start)));
        };

        match c {
            '"' => self.scan_string(start),
            '\'' => self.scan_char(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            c if c == self.options.decimal_separator
                && !self.options.require_digits_before_decimal_point
                && self.cursor.peek_nth(1).is_some_and(|n| n.is_ascii_digit()) =>
            {
                self.scan_number(start)
            }
            c if is_ident_start(c) => Ok(self.scan_identifier(start)),
            _ => self.scan_operator(start),
        }
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn skip_whitespace(&mut self) {
        self.cursor.eat_while(char::is_whitespace);
    }

    /// Create a token from `start` to the current position, copying the
    /// source text into the arena.
    fn make_token(&self, kind: TokenKind, start: u32) -> Token<'ast> {
        let text = self.cursor.slice_from(start);
        self.make_token_with(kind, start, text)
    }

    fn make_token_with(&self, kind: TokenKind, start: u32, lexeme: &str) -> Token<'ast> {
        let span = Span::new(start, self.cursor.offset() - start);
        Token::new(kind, self.arena.alloc_str(lexeme), span)
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.cursor.offset() - start)
    }

    fn scan_identifier(&mut self, start: u32) -> Token<'ast> {
        let text = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    fn scan_number(&mut self, start: u32) -> Result<Token<'ast>, LexError> {
        if self.cursor.check_str("0x") || self.cursor.check_str("0X") {
            if self.cursor.peek_nth(2).is_some_and(|c| c.is_ascii_hexdigit()) {
                return self.scan_hex(start);
            }
        }

        let separator = self.options.decimal_separator;
        let integer = self.cursor.eat_while(|c| c.is_ascii_digit());
        let has_fraction = self.cursor.peek() == Some(separator)
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit());

        let mut normalised = integer.to_string();
        if has_fraction {
            self.cursor.advance();
            normalised.push('.');
            normalised.push_str(self.cursor.eat_while(|c| c.is_ascii_digit()));
        }
        let has_exponent = self.eat_exponent(&mut normalised);

        if !has_fraction && !has_exponent {
            self.eat_integer_suffix();
            self.reject_trailing_identifier(start)?;
            return Ok(self.make_token(TokenKind::IntegerLiteral, start));
        }

        if let Some(suffix) = self
            .cursor
            .peek()
            .filter(|c| matches!(c, 'd' | 'D' | 'f' | 'F' | 'm' | 'M'))
        {
            self.cursor.advance();
            normalised.push(suffix);
        }
        self.reject_trailing_identifier(start)?;
        Ok(self.make_token_with(TokenKind::RealLiteral, start, &normalised))
    }

    /// Consume an exponent (`e5`, `E-3`) if one follows.
    fn eat_exponent(&mut self, normalised: &mut String) -> bool {
        if !self.cursor.check(|c| c == 'e' || c == 'E') {
            return false;
        }
        let has_sign = matches!(self.cursor.peek_nth(1), Some('+') | Some('-'));
        let digit_at = if has_sign { 2 } else { 1 };
        if !self.cursor.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
        self.cursor.advance();
        normalised.push('e');
        if has_sign {
            if let Some(sign) = self.cursor.advance() {
                normalised.push(sign);
            }
        }
        normalised.push_str(self.cursor.eat_while(|c| c.is_ascii_digit()));
        true
    }

    fn scan_hex(&mut self, start: u32) -> Result<Token<'ast>, LexError> {
        self.cursor.advance();
        self.cursor.advance();
        self.cursor.eat_while(|c| c.is_ascii_hexdigit());
        if self.cursor.eat_ignore_case('u') {
            self.cursor.eat_ignore_case('l');
        } else if self.cursor.eat_ignore_case('l') {
            self.cursor.eat_ignore_case('u');
        }
        self.reject_trailing_identifier(start)?;
        Ok(self.make_token(TokenKind::HexLiteral, start))
    }

    /// Integer suffixes: `u`, `l`, `ul`, `lu`, and the real suffixes `f`,
    /// `d`, `m`.
    fn eat_integer_suffix(&mut self) {
        if self.cursor.eat_ignore_case('u') {
            self.cursor.eat_ignore_case('l');
        } else if self.cursor.eat_ignore_case('l') {
            self.cursor.eat_ignore_case('u');
        } else if self
            .cursor
            .check(|c| matches!(c, 'f' | 'F' | 'd' | 'D' | 'm' | 'M'))
        {
            self.cursor.advance();
        }
    }

    fn reject_trailing_identifier(&mut self, start: u32) -> Result<(), LexError> {
        if self.cursor.check(is_ident_continue) {
            self.cursor.eat_while(is_ident_continue);
            return Err(LexError::InvalidNumber {
                span: self.span_from(start),
                detail: format!("'{}' is not a valid number", self.cursor.slice_from(start)),
            });
        }
        Ok(())
    }

    fn scan_string(&mut self, start: u32) -> Result<Token<'ast>, LexError> {
        self.cursor.advance();
        let mut content = String::new();
        loop {
            match self.cursor.peek() {
                None | Some('\r') | Some('\n') => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => content.push(self.scan_escape()?),
                Some(c) => {
                    self.cursor.advance();
                    content.push(c);
                }
            }
        }
        Ok(self.make_token_with(TokenKind::StringLiteral, start, &content))
    }

    fn scan_char(&mut self, start: u32) -> Result<Token<'ast>, LexError> {
        self.cursor.advance();
        let ch = match self.cursor.peek() {
            Some('\\') => self.scan_escape()?,
            Some(c) if c != '\'' && c != '\r' && c != '\n' => {
                self.cursor.advance();
                c
            }
            _ => {
                return Err(LexError::InvalidChar {
                    span: self.span_from(start),
                });
            }
        };
        if !self.cursor.eat('\'') {
            self.cursor.eat_while(|c| c != '\'' && c != '\n');
            self.cursor.eat('\'');
            return Err(LexError::InvalidChar {
                span: self.span_from(start),
            });
        }
        let mut buf = [0u8; 4];
        Ok(self.make_token_with(TokenKind::CharLiteral, start, ch.encode_utf8(&mut buf)))
    }

    /// Decode one escape sequence; the cursor is on the backslash.
    fn scan_escape(&mut self) -> Result<char, LexError> {
        let start = self.cursor.offset();
        self.cursor.advance();
        let escaped = match self.cursor.advance() {
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('n') => '\n',
            Some('u') => {
                let digits_start = self.cursor.offset();
                for _ in 0..4 {
                    if !self.cursor.check(|c| c.is_ascii_hexdigit()) {
                        break;
                    }
                    self.cursor.advance();
                }
                let digits = self.cursor.slice_from(digits_start);
                let code = if digits.len() == 4 {
                    u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                return code.ok_or_else(|| LexError::InvalidEscape {
                    escape: format!("u{digits}"),
                    span: self.span_from(start),
                });
            }
            other => {
                return Err(LexError::InvalidEscape {
                    escape: other.map(String::from).unwrap_or_default(),
                    span: self.span_from(start),
                });
            }
        };
        Ok(escaped)
    }

    fn scan_operator(&mut self, start: u32) -> Result<Token<'ast>, LexError> {
        let Some(c) = self.cursor.advance() else {
            return Ok(Token::new(TokenKind::Eof, "", Span::point(start)));
        };

        let kind = match c {
            c if c == self.options.argument_separator => TokenKind::ArgumentSeparator,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '=' => TokenKind::Equal,
            '<' => {
                if self.cursor.eat('>') {
                    TokenKind::NotEqual
                } else if self.cursor.eat('=') {
                    TokenKind::LessEqual
                } else if self.cursor.eat('<') {
                    TokenKind::ShiftLeft
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.cursor.eat('=') {
                    TokenKind::GreaterEqual
                } else if self.cursor.eat('>') {
                    TokenKind::ShiftRight
                } else {
                    TokenKind::Greater
                }
            }
            '.' => TokenKind::Dot,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => {
                if self.cursor.eat(']') {
                    TokenKind::ArrayBraces
                } else {
                    TokenKind::LeftBracket
                }
            }
            ']' => TokenKind::RightBracket,
            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    span: self.span_from(start),
                });
            }
        };
        Ok(self.make_token(kind, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let arena = Bump::new();
        let options = ParserOptions::default();
        Lexer::new(source, &arena, &options)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lexemes(source: &str, options: &ParserOptions) -> Vec<String> {
        let arena = Bump::new();
        Lexer::new(source, &arena, options)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.lexeme.to_string())
            .collect()
    }

    #[test]
    fn operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("+ - * / % ^ = <> < > <= >= << >> . , ( ) [ ] []"),
            vec![
                Plus, Minus, Star, Slash, Percent, Caret, Equal, NotEqual, Less, Greater,
                LessEqual, GreaterEqual, ShiftLeft, ShiftRight, Dot, ArgumentSeparator,
                LeftParen, RightParen, LeftBracket, RightBracket, ArrayBraces, Eof
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("a AND b Or not_x NOT In IF cast TRUE false Null"),
            vec![
                Identifier, And, Identifier, Or, Identifier, Not, In, If, Cast, True, False,
                Null, Eof
            ]
        );
    }

    #[test]
    fn numbers() {
        use TokenKind::*;
        assert_eq!(
            kinds("1 100u 7L 9ul 3lu 2f 1.5 .5 1.5e10 2.5e-3f 1e5 0xFF 0x10L"),
            vec![
                IntegerLiteral, IntegerLiteral, IntegerLiteral, IntegerLiteral, IntegerLiteral,
                IntegerLiteral, RealLiteral, RealLiteral, RealLiteral, RealLiteral, RealLiteral,
                HexLiteral, HexLiteral, Eof
            ]
        );
    }

    #[test]
    fn member_access_on_integer_is_not_real() {
        use TokenKind::*;
        assert_eq!(kinds("1.ToString"), vec![IntegerLiteral, Dot, Identifier, Eof]);
    }

    #[test]
    fn custom_separators() {
        let options = ParserOptions::default()
            .with_decimal_separator(',')
            .with_argument_separator(';');
        assert_eq!(lexemes("f(1,5;2)", &options), vec!["f", "(", "1.5", ";", "2", ")", ""]);
    }

    #[test]
    fn leading_decimal_point_can_be_required() {
        let options = ParserOptions::default().with_require_digits_before_decimal_point(true);
        let arena = Bump::new();
        let tokens = Lexer::new(".5", &arena, &options).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Dot);
        assert_eq!(tokens[1].kind, TokenKind::IntegerLiteral);
    }

    #[test]
    fn strings_are_unescaped() {
        let options = ParserOptions::default();
        let texts = lexemes(r#""a\tb\"c\u0041" 'x' '\n'"#, &options);
        assert_eq!(texts[0], "a\tb\"cA");
        assert_eq!(texts[1], "x");
        assert_eq!(texts[2], "\n");
    }

    #[test]
    fn spans_track_offsets() {
        let arena = Bump::new();
        let options = ParserOptions::default();
        let tokens = Lexer::new("ab + 12", &arena, &options).tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(3, 1));
        assert_eq!(tokens[2].span, Span::new(5, 2));
        assert_eq!(tokens[3].span, Span::point(7));
    }

    #[test]
    fn errors() {
        let arena = Bump::new();
        let options = ParserOptions::default();
        let lex = |s: &str| Lexer::new(s, &arena, &options).tokenize();
        assert!(matches!(lex("\"abc"), Err(LexError::UnterminatedString { .. })));
        assert!(matches!(lex("'ab'"), Err(LexError::InvalidChar { .. })));
        assert!(matches!(lex("\"\\q\""), Err(LexError::InvalidEscape { .. })));
        assert!(matches!(lex("12abc"), Err(LexError::InvalidNumber { .. })));
        assert!(matches!(lex("a # b"), Err(LexError::UnexpectedChar { ch: '#', .. })));
    }
}
