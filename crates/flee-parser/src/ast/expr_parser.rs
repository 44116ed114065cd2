//! Expression parsing using Pratt parsing (precedence climbing).
//!
//! Binary operators are consumed while their left binding power is at least
//! the current minimum. `in` and the postfix forms (member access, method
//! calls, indexing) are handled directly in the loop.

use flee_core::{ParseError, ParseErrorKind, Span};

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::ops::{IN_BINDING_POWER, POSTFIX_BINDING_POWER};
use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Token, TokenKind};

impl<'ast> Parser<'ast> {
    /// Parse an expression with a minimum binding power.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.peek().kind;

            if matches!(kind, TokenKind::Dot | TokenKind::LeftBracket) {
                if POSTFIX_BINDING_POWER < min_bp {
                    break;
                }
                lhs = if kind == TokenKind::Dot {
                    self.parse_member_access(lhs)?
                } else {
                    self.parse_index(lhs)?
                };
                continue;
            }

            if kind == TokenKind::In {
                if IN_BINDING_POWER.0 < min_bp {
                    break;
                }
                lhs = self.parse_in(lhs)?;
                continue;
            }

            if let Some(op) = BinaryOp::from_token(kind) {
                let (l_bp, r_bp) = op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr(r_bp)?;
                let span = lhs.span().merge(rhs.span());
                lhs = self.arena.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
                    left: lhs,
                    op,
                    right: rhs,
                    span,
                })));
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    /// Parse a prefix expression: unary operators and primaries.
    fn parse_prefix(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        if let Some(op) = UnaryOp::from_token(self.peek().kind) {
            let op_token = self.advance();
            let operand = self.parse_expr(op.binding_power())?;
            let span = op_token.span.merge(operand.span());
            return Ok(self.arena.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
                op,
                operand,
                span,
            }))));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = *self.peek();
        match token.kind {
            TokenKind::IntegerLiteral
            | TokenKind::HexLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => {
                self.advance();
                let literal = Self::literal_from_token(&token)?;
                Ok(self.arena.alloc(Expr::Literal(literal)))
            }
            TokenKind::Identifier => {
                self.advance();
                let name = Ident::new(token.lexeme, token.span);
                if self.check(TokenKind::LeftParen) {
                    self.parse_call(None, name)
                } else {
                    Ok(self.arena.alloc(Expr::Ident(name)))
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                let close = self.expect(TokenKind::RightParen)?;
                Ok(self.arena.alloc(Expr::Paren(self.arena.alloc(ParenExpr {
                    expr: inner,
                    span: token.span.merge(close.span),
                }))))
            }
            TokenKind::If => self.parse_conditional(),
            TokenKind::Cast => self.parse_cast(),
            TokenKind::Eof => Err(ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                "expected expression, found end of input",
            )),
            other => Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                token.span,
                format!("expected expression, found {other}"),
            )),
        }
    }

    /// Build a literal node from its token. The type is decided later.
    fn literal_from_token(token: &Token<'ast>) -> Result<LiteralExpr<'ast>, ParseError> {
        let lexeme = token.lexeme;
        let kind = match token.kind {
            TokenKind::IntegerLiteral => {
                let digits_end = lexeme
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(lexeme.len());
                let (digits, suffix) = lexeme.split_at(digits_end);
                match suffix.to_ascii_lowercase().as_str() {
                    "f" => LiteralKind::Real {
                        text: digits,
                        suffix: RealSuffix::Float,
                    },
                    "d" => LiteralKind::Real {
                        text: digits,
                        suffix: RealSuffix::Double,
                    },
                    "m" => LiteralKind::Real {
                        text: digits,
                        suffix: RealSuffix::Decimal,
                    },
                    other => LiteralKind::Integer {
                        digits,
                        suffix: Self::integer_suffix(other, token.span)?,
                    },
                }
            }
            TokenKind::HexLiteral => {
                let body = &lexeme[2..];
                let digits_end = body
                    .find(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'))
                    .unwrap_or(body.len());
                let (digits, suffix) = body.split_at(digits_end);
                LiteralKind::Hex {
                    digits,
                    suffix: Self::integer_suffix(&suffix.to_ascii_lowercase(), token.span)?,
                }
            }
            TokenKind::RealLiteral => {
                let (text, suffix) = match lexeme.chars().last() {
                    Some('f' | 'F') => (&lexeme[..lexeme.len() - 1], RealSuffix::Float),
                    Some('d' | 'D') => (&lexeme[..lexeme.len() - 1], RealSuffix::Double),
                    Some('m' | 'M') => (&lexeme[..lexeme.len() - 1], RealSuffix::Decimal),
                    _ => (lexeme, RealSuffix::None),
                };
                LiteralKind::Real { text, suffix }
            }
            TokenKind::StringLiteral => LiteralKind::String(lexeme),
            TokenKind::CharLiteral => {
                let mut chars = lexeme.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => LiteralKind::Char(c),
                    _ => {
                        return Err(ParseError::new(
                            ParseErrorKind::InvalidLiteral,
                            token.span,
                            "character literal must contain exactly one character",
                        ));
                    }
                }
            }
            TokenKind::True => LiteralKind::Bool(true),
            TokenKind::False => LiteralKind::Bool(false),
            _ => LiteralKind::Null,
        };
        Ok(LiteralExpr {
            kind,
            span: token.span,
        })
    }

    fn integer_suffix(suffix: &str, span: Span) -> Result<IntegerSuffix, ParseError> {
        match suffix {
            "" => Ok(IntegerSuffix::None),
            "u" => Ok(IntegerSuffix::Unsigned),
            "l" => Ok(IntegerSuffix::Long),
            "ul" | "lu" => Ok(IntegerSuffix::UnsignedLong),
            other => Err(ParseError::new(
                ParseErrorKind::InvalidLiteral,
                span,
                format!("invalid integer suffix '{other}'"),
            )),
        }
    }

    /// Parse `(args)` after a function name.
    fn parse_call(
        &mut self,
        target: Option<&'ast Expr<'ast>>,
        name: Ident<'ast>,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let args = self.parse_separated(TokenKind::RightParen)?;
        let close = self.expect(TokenKind::RightParen)?;
        let start = target.map_or(name.span, |t| t.span());
        Ok(self.arena.alloc(Expr::Call(self.arena.alloc(CallExpr {
            target,
            name,
            args,
            span: start.merge(close.span),
        }))))
    }

    /// Parse a possibly empty list of expressions separated by the argument
    /// separator, stopping before `close`.
    fn parse_separated(&mut self, close: TokenKind) -> Result<&'ast [Expr<'ast>], ParseError> {
        let mut items = Vec::new();
        if self.check(close) {
            return Ok(&[]);
        }
        loop {
            items.push(*self.parse_expr(0)?);
            if self.eat(TokenKind::ArgumentSeparator).is_none() {
                break;
            }
        }
        Ok(self.arena.alloc_slice_copy(&items))
    }

    /// `.name` or `.name(args)`
    fn parse_member_access(
        &mut self,
        object: &'ast Expr<'ast>,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::Dot)?;
        let token = *self.peek();
        if token.kind != TokenKind::Identifier {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier,
                token.span,
                format!("expected member name after '.', found {}", token.kind),
            ));
        }
        self.advance();
        let member = Ident::new(token.lexeme, token.span);

        if self.check(TokenKind::LeftParen) {
            return self.parse_call(Some(object), member);
        }

        Ok(self.arena.alloc(Expr::Member(self.arena.alloc(MemberExpr {
            object,
            member,
            span: object.span().merge(member.span),
        }))))
    }

    /// `[i]` or `[i, j]`
    fn parse_index(&mut self, object: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        let open = self.expect(TokenKind::LeftBracket)?;
        let indices = self.parse_separated(TokenKind::RightBracket)?;
        if indices.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                open.span,
                "expected index expression",
            ));
        }
        let close = self.expect(TokenKind::RightBracket)?;
        Ok(self.arena.alloc(Expr::Index(self.arena.alloc(IndexExpr {
            object,
            indices,
            span: object.span().merge(close.span),
        }))))
    }

    /// `operand in (a, b)` or `operand in collection.member`
    fn parse_in(&mut self, operand: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::In)?;

        let (target, end) = if self.check(TokenKind::LeftParen) {
            let open = self.advance();
            let items = self.parse_separated(TokenKind::RightParen)?;
            if items.is_empty() {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedExpression,
                    open.span,
                    "expected at least one item in list",
                ));
            }
            let close = self.expect(TokenKind::RightParen)?;
            (InTarget::List(items), close.span)
        } else {
            let collection = self.parse_expr(POSTFIX_BINDING_POWER)?;
            (InTarget::Collection(collection), collection.span())
        };

        Ok(self.arena.alloc(Expr::In(self.arena.alloc(InExpr {
            operand,
            target,
            span: operand.span().merge(end),
        }))))
    }

    /// `if(condition, when_true, when_false)`
    fn parse_conditional(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let keyword = self.expect(TokenKind::If)?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::ArgumentSeparator)?;
        let when_true = self.parse_expr(0)?;
        self.expect(TokenKind::ArgumentSeparator)?;
        let when_false = self.parse_expr(0)?;
        let close = self.expect(TokenKind::RightParen)?;
        Ok(self
            .arena
            .alloc(Expr::Conditional(self.arena.alloc(ConditionalExpr {
                condition,
                when_true,
                when_false,
                span: keyword.span.merge(close.span),
            }))))
    }

    /// `cast(expr, Type.Name)` or `cast(expr, Type[])`
    fn parse_cast(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let keyword = self.expect(TokenKind::Cast)?;
        self.expect(TokenKind::LeftParen)?;
        let expr = self.parse_expr(0)?;
        self.expect(TokenKind::ArgumentSeparator)?;
        let target = self.parse_type_name()?;
        let close = self.expect(TokenKind::RightParen)?;
        Ok(self.arena.alloc(Expr::Cast(self.arena.alloc(CastExpr {
            expr,
            target,
            span: keyword.span.merge(close.span),
        }))))
    }

    fn parse_type_name(&mut self) -> Result<TypeName<'ast>, ParseError> {
        let mut parts = Vec::new();
        loop {
            let token = *self.peek();
            if token.kind != TokenKind::Identifier {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedType,
                    token.span,
                    format!("expected type name, found {}", token.kind),
                ));
            }
            self.advance();
            parts.push(Ident::new(token.lexeme, token.span));
            if self.eat(TokenKind::Dot).is_none() {
                break;
            }
        }

        let mut span = parts[0].span.merge(parts[parts.len() - 1].span);
        let is_array = match self.eat(TokenKind::ArrayBraces) {
            Some(braces) => {
                span = span.merge(braces.span);
                true
            }
            None => false,
        };

        Ok(TypeName {
            parts: self.arena.alloc_slice_copy(&parts),
            is_array,
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use super::*;
    use crate::options::ParserOptions;

    fn parse<'ast>(source: &str, arena: &'ast Bump) -> &'ast Expr<'ast> {
        Parser::parse_expression(source, arena, &ParserOptions::default()).unwrap()
    }

    fn parse_err(source: &str) -> ParseErrorKind {
        let arena = Bump::new();
        Parser::parse_expression(source, &arena, &ParserOptions::default())
            .unwrap_err()
            .kind
    }

    fn binary<'a, 'ast>(expr: &'a Expr<'ast>) -> &'a BinaryExpr<'ast> {
        match expr {
            Expr::Binary(b) => *b,
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let arena = Bump::new();
        let expr = parse("1 + 2 * 3", &arena);
        let add = binary(expr);
        assert_eq!(add.op, BinaryOp::Add);
        assert_eq!(binary(add.right).op, BinaryOp::Mul);
    }

    #[test]
    fn power_is_left_associative() {
        let arena = Bump::new();
        let expr = parse("2 ^ 3 ^ 2", &arena);
        let outer = binary(expr);
        assert_eq!(outer.op, BinaryOp::Pow);
        assert_eq!(binary(outer.left).op, BinaryOp::Pow);
        assert!(matches!(outer.right, Expr::Literal(_)));
    }

    #[test]
    fn negation_binds_tighter_than_power() {
        let arena = Bump::new();
        let expr = parse("-2 ^ 2", &arena);
        let pow = binary(expr);
        assert!(matches!(pow.left, Expr::Unary(u) if u.op == UnaryOp::Neg));
    }

    #[test]
    fn not_applies_to_comparison() {
        let arena = Bump::new();
        let expr = parse("not a = b and c", &arena);
        let and = binary(expr);
        assert_eq!(and.op, BinaryOp::And);
        match and.left {
            Expr::Unary(u) => {
                assert_eq!(u.op, UnaryOp::Not);
                assert_eq!(binary(u.operand).op, BinaryOp::Equal);
            }
            other => panic!("expected not, got {other:?}"),
        }
    }

    #[test]
    fn logical_precedence() {
        let arena = Bump::new();
        let expr = parse("a xor b or c and d", &arena);
        let xor = binary(expr);
        assert_eq!(xor.op, BinaryOp::Xor);
        let or = binary(xor.right);
        assert_eq!(or.op, BinaryOp::Or);
        assert_eq!(binary(or.right).op, BinaryOp::And);
    }

    #[test]
    fn in_list_and_collection() {
        let arena = Bump::new();
        match parse("x + 1 in (1, 2, 3)", &arena) {
            Expr::In(e) => {
                assert!(matches!(e.operand, Expr::Binary(_)));
                assert!(matches!(e.target, InTarget::List(items) if items.len() == 3));
            }
            other => panic!("expected in, got {other:?}"),
        }
        match parse("x in owner.items", &arena) {
            Expr::In(e) => assert!(matches!(e.target, InTarget::Collection(Expr::Member(_)))),
            other => panic!("expected in, got {other:?}"),
        }
    }

    #[test]
    fn comparison_binds_tighter_than_in() {
        let arena = Bump::new();
        match parse("a = b in (true)", &arena) {
            Expr::In(e) => assert_eq!(binary(e.operand).op, BinaryOp::Equal),
            other => panic!("expected in, got {other:?}"),
        }
    }

    #[test]
    fn member_chains_and_calls() {
        let arena = Bump::new();
        match parse("a.b.c(1, 2)[0]", &arena) {
            Expr::Index(index) => match index.object {
                Expr::Call(call) => {
                    assert_eq!(call.name.name, "c");
                    assert_eq!(call.args.len(), 2);
                    assert!(matches!(call.target, Some(Expr::Member(m)) if m.member.name == "b"));
                }
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected index, got {other:?}"),
        }
        match parse("f()", &arena) {
            Expr::Call(call) => {
                assert!(call.target.is_none());
                assert!(call.args.is_empty());
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn members_on_literals_and_parens() {
        let arena = Bump::new();
        assert!(matches!(parse("\"abc\".Length", &arena), Expr::Member(_)));
        assert!(matches!(parse("(1 + 2).ToString()", &arena), Expr::Call(_)));
    }

    #[test]
    fn conditional_and_cast() {
        let arena = Bump::new();
        assert!(matches!(parse("if(a > 1, \"x\", \"y\")", &arena), Expr::Conditional(_)));
        match parse("cast(x, System.Int32[])", &arena) {
            Expr::Cast(cast) => {
                assert_eq!(cast.target.qualified(), "System.Int32");
                assert!(cast.target.is_array);
            }
            other => panic!("expected cast, got {other:?}"),
        }
    }

    #[test]
    fn literal_suffixes() {
        let arena = Bump::new();
        let kind = |src: &str| match parse(src, &arena) {
            Expr::Literal(lit) => lit.kind,
            other => panic!("expected literal, got {other:?}"),
        };
        assert_eq!(
            kind("100UL"),
            LiteralKind::Integer {
                digits: "100",
                suffix: IntegerSuffix::UnsignedLong
            }
        );
        assert_eq!(
            kind("2f"),
            LiteralKind::Real {
                text: "2",
                suffix: RealSuffix::Float
            }
        );
        assert_eq!(
            kind("1.5d"),
            LiteralKind::Real {
                text: "1.5",
                suffix: RealSuffix::Double
            }
        );
        assert_eq!(
            kind("0xFFu"),
            LiteralKind::Hex {
                digits: "FF",
                suffix: IntegerSuffix::Unsigned
            }
        );
        assert_eq!(kind("'c'"), LiteralKind::Char('c'));
        assert_eq!(kind("null"), LiteralKind::Null);
        assert_eq!(kind("True"), LiteralKind::Bool(true));
    }

    #[test]
    fn custom_argument_separator() {
        let arena = Bump::new();
        let options = ParserOptions::default()
            .with_decimal_separator(',')
            .with_argument_separator(';');
        match Parser::parse_expression("max(1,5; 2)", &arena, &options).unwrap() {
            Expr::Call(call) => {
                assert_eq!(call.args.len(), 2);
                assert!(matches!(
                    call.args[0],
                    Expr::Literal(LiteralExpr {
                        kind: LiteralKind::Real { text: "1.5", .. },
                        ..
                    })
                ));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(parse_err("1 +"), ParseErrorKind::UnexpectedEof);
        assert_eq!(parse_err("(1"), ParseErrorKind::UnexpectedEof);
        assert_eq!(parse_err("a.+"), ParseErrorKind::ExpectedIdentifier);
        assert_eq!(parse_err("cast(1, 2)"), ParseErrorKind::ExpectedType);
        assert_eq!(parse_err("a[ ]"), ParseErrorKind::ExpectedExpression);
        assert_eq!(parse_err("* 2"), ParseErrorKind::ExpectedExpression);
        assert_eq!(parse_err("x in ()"), ParseErrorKind::ExpectedExpression);
    }

    #[test]
    fn spans_cover_whole_expression() {
        let arena = Bump::new();
        let expr = parse("abc + f(1)", &arena);
        assert_eq!(expr.span(), Span::new(0, 10));
    }
}
