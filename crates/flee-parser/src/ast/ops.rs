//! Operators and their precedence.

use std::fmt;

use crate::lexer::TokenKind;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Logical / bitwise
    /// `xor`
    Xor,
    /// `or`
    Or,
    /// `and`
    And,

    // Comparison
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

    // Shift
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,

    // Arithmetic
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `^`
    Pow,
}

impl BinaryOp {
    /// Pratt binding power `(left, right)`.
    ///
    /// Every binary operator is left associative, including `^`. `not` sits
    /// between `and` and comparisons, `in` between `not` and comparisons.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            Xor => (1, 2),
            Or => (3, 4),
            And => (5, 6),
            Equal | NotEqual | Less | Greater | LessEqual | GreaterEqual => (11, 12),
            ShiftLeft | ShiftRight => (13, 14),
            Add | Sub => (15, 16),
            Mul | Div | Mod => (17, 18),
            Pow => (19, 20),
        }
    }

    /// Try to convert a token kind to a binary operator.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            TokenKind::Xor => BinaryOp::Xor,
            TokenKind::Or => BinaryOp::Or,
            TokenKind::And => BinaryOp::And,
            TokenKind::Equal => BinaryOp::Equal,
            TokenKind::NotEqual => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            TokenKind::ShiftLeft => BinaryOp::ShiftLeft,
            TokenKind::ShiftRight => BinaryOp::ShiftRight,
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Sub,
            Star => BinaryOp::Mul,
            Slash => BinaryOp::Div,
            Percent => BinaryOp::Mod,
            Caret => BinaryOp::Pow,
            _ => return None,
        })
    }

    /// `+ - * / % ^`
    pub fn is_arithmetic(&self) -> bool {
        use BinaryOp::*;
        matches!(self, Add | Sub | Mul | Div | Mod | Pow)
    }

    /// `= <> < > <= >=`
    pub fn is_comparison(&self) -> bool {
        use BinaryOp::*;
        matches!(
            self,
            Equal | NotEqual | Less | Greater | LessEqual | GreaterEqual
        )
    }

    /// `and or xor`
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }

    /// `<< >>`
    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::ShiftLeft | BinaryOp::ShiftRight)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOp::*;
        let s = match self {
            Xor => "xor",
            Or => "or",
            And => "and",
            Equal => "=",
            NotEqual => "<>",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "^",
        };
        f.write_str(s)
    }
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `not`
    Not,
}

impl UnaryOp {
    /// Binding power of the operand.
    pub fn binding_power(&self) -> u8 {
        match self {
            // `not a = b` negates the comparison.
            UnaryOp::Not => 7,
            UnaryOp::Neg => 21,
        }
    }

    /// Try to convert a token kind to a unary operator.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Not => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("not"),
        }
    }
}

/// Binding power of the `in` operator.
pub const IN_BINDING_POWER: (u8, u8) = (9, 10);

/// Binding power of postfix member access, calls and indexing.
pub const POSTFIX_BINDING_POWER: u8 = 23;
