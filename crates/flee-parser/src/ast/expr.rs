//! Expression AST nodes.
//!
//! Nodes are allocated in a `bumpalo` arena and refer to each other with
//! `&'ast` references. Literals keep their source text; the compiler decides
//! their type, since that depends on compile options.
//!
//! # Expression Precedence
//!
//! From lowest to highest:
//! 1. `xor`
//! 2. `or`
//! 3. `and`
//! 4. `not` (prefix)
//! 5. `in`
//! 6. Comparison (`= <> < > <= >=`)
//! 7. Shift (`<< >>`)
//! 8. Additive (`+ -`)
//! 9. Multiplicative (`* / %`)
//! 10. Power (`^`), left associative
//! 11. Negation (prefix `-`)
//! 12. Postfix (member access, call, index)

use flee_core::Span;

use crate::ast::{BinaryOp, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr<'ast>),
    /// Bare identifier
    Ident(Ident<'ast>),
    /// Binary operation
    Binary(&'ast BinaryExpr<'ast>),
    /// Unary prefix operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Function or method call
    Call(&'ast CallExpr<'ast>),
    /// Member access (`a.b`)
    Member(&'ast MemberExpr<'ast>),
    /// Indexing (`a[i]`)
    Index(&'ast IndexExpr<'ast>),
    /// Parenthesized expression
    Paren(&'ast ParenExpr<'ast>),
    /// `if(condition, a, b)`
    Conditional(&'ast ConditionalExpr<'ast>),
    /// `cast(expr, type)`
    Cast(&'ast CastExpr<'ast>),
    /// `operand in (list)` or `operand in collection`
    In(&'ast InExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Call(e) => e.span,
            Self::Member(e) => e.span,
            Self::Index(e) => e.span,
            Self::Paren(e) => e.span,
            Self::Conditional(e) => e.span,
            Self::Cast(e) => e.span,
            Self::In(e) => e.span,
        }
    }

    /// Strip any number of parentheses.
    pub fn unparenthesized(&self) -> &Expr<'ast> {
        let mut expr = self;
        while let Expr::Paren(paren) = expr {
            expr = paren.expr;
        }
        expr
    }
}

/// An identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

/// The kind of literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    /// Decimal integer digits and suffix.
    Integer { digits: &'ast str, suffix: IntegerSuffix },
    /// Hex digits (without `0x`) and suffix.
    Hex { digits: &'ast str, suffix: IntegerSuffix },
    /// Real number text using `.` as separator, and suffix.
    Real { text: &'ast str, suffix: RealSuffix },
    /// Unescaped string content.
    String(&'ast str),
    Char(char),
    Bool(bool),
    Null,
}

/// Integer literal suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerSuffix {
    None,
    /// `u`
    Unsigned,
    /// `l`
    Long,
    /// `ul` / `lu`
    UnsignedLong,
}

/// Real literal suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealSuffix {
    None,
    /// `f`
    Float,
    /// `d`
    Double,
    /// `m`
    Decimal,
}

/// A binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

/// A unary prefix operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

/// A call. `target` is the object for `a.f()`, `None` for `f()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub target: Option<&'ast Expr<'ast>>,
    pub name: Ident<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

/// Member access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub member: Ident<'ast>,
    pub span: Span,
}

/// Indexing. More than one index is syntactically valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub indices: &'ast [Expr<'ast>],
    pub span: Span,
}

/// Parenthesized expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

/// `if(condition, when_true, when_false)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionalExpr<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub when_true: &'ast Expr<'ast>,
    pub when_false: &'ast Expr<'ast>,
    pub span: Span,
}

/// `cast(expr, Type)` or `cast(expr, Type[])`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub target: TypeName<'ast>,
    pub span: Span,
}

/// A possibly qualified type name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeName<'ast> {
    /// Dotted parts, at least one.
    pub parts: &'ast [Ident<'ast>],
    pub is_array: bool,
    pub span: Span,
}

impl TypeName<'_> {
    /// Dotted name without the array marker.
    pub fn qualified(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(part.name);
        }
        out
    }
}

/// Membership test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InExpr<'ast> {
    pub operand: &'ast Expr<'ast>,
    pub target: InTarget<'ast>,
    pub span: Span,
}

/// Right side of `in`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InTarget<'ast> {
    /// `(a, b, c)`
    List(&'ast [Expr<'ast>]),
    /// Any member expression yielding a collection.
    Collection(&'ast Expr<'ast>),
}
