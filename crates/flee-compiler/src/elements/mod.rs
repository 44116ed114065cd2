//! Typed expression elements.
//!
//! The compiler turns the parsed AST into a tree of [`Element`]s, resolving
//! every name, overload and conversion on the way. Each element knows its
//! result type from the moment it is built; nothing about the tree changes
//! afterwards. Emission lives in [`crate::emit`].
//!
//! Conversions are explicit in the tree: an operand that needs widening is
//! wrapped in [`Element::Convert`] when its parent is built.

use flee_core::{TypeHash, Value, primitives};

use crate::bytecode::CallTarget;
use crate::conversion::Conversion;
use crate::options::StringComparison;
use crate::overload::ParamArrayMatch;

/// Arithmetic operators with a direct instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl CompareOp {
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }
}

/// How two operands are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareKind {
    /// Both operands converted to a common numeric type.
    Numeric,
    Bool,
    String(StringComparison),
    /// Identity of two references.
    Reference,
    /// Two members of the same enum.
    Enum,
}

/// Short-circuit boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

/// Bitwise operators; `And`/`Or` on booleans never reach these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftOp {
    Left,
    Right,
}

/// Right side of `^`.
#[derive(Debug, Clone, PartialEq)]
pub enum Exponent {
    /// A non-negative `int` literal, computed by repeated multiplication in
    /// the base's own type.
    Repeated(u32),
    /// Any other exponent; both sides are computed as `double`.
    Computed(Box<Element>),
}

/// A resolved expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A constant.
    Literal { value: Value, ty: TypeHash },
    /// The expression owner.
    Owner { ty: TypeHash },
    /// A variable read at evaluation time.
    Variable { name: String, ty: TypeHash },
    /// The last value of another calculation engine entry.
    CalcReference { name: String, ty: TypeHash },
    /// A value cached earlier in a temporary slot.
    Temp { slot: u8, ty: TypeHash },
    /// A field or property read through its getter.
    MemberRead {
        instance: Option<Box<Element>>,
        getter: CallTarget,
        ty: TypeHash,
    },
    /// A bound host function call.
    Call {
        instance: Option<Box<Element>>,
        target: CallTarget,
        /// Converted arguments; tail arguments of a parameter array match
        /// are already converted to the element type.
        args: Vec<Element>,
        param_array: Option<ParamArrayMatch>,
        ty: TypeHash,
    },
    /// A function supplied at evaluation time by the variable resolver.
    ExternalCall {
        name: String,
        args: Vec<Element>,
        ty: TypeHash,
    },
    /// `array[index]` with an `int` index.
    ArrayIndex {
        array: Box<Element>,
        index: Box<Element>,
        ty: TypeHash,
    },
    /// A conversion of the operand.
    Convert {
        operand: Box<Element>,
        conversion: Conversion,
        checked: bool,
        ty: TypeHash,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Element>,
        right: Box<Element>,
        checked: bool,
        ty: TypeHash,
    },
    Power {
        base: Box<Element>,
        exponent: Exponent,
        checked: bool,
        ty: TypeHash,
    },
    /// String concatenation of the text of both operands.
    Concat {
        left: Box<Element>,
        right: Box<Element>,
    },
    Compare {
        op: CompareOp,
        kind: CompareKind,
        left: Box<Element>,
        right: Box<Element>,
    },
    /// Short-circuit `and` / `or` of booleans.
    Logical {
        op: LogicalOp,
        left: Box<Element>,
        right: Box<Element>,
    },
    Bitwise {
        op: BitwiseOp,
        left: Box<Element>,
        right: Box<Element>,
        ty: TypeHash,
    },
    /// Logical not of a boolean or complement of an integer.
    Not { operand: Box<Element>, ty: TypeHash },
    Negate { operand: Box<Element>, ty: TypeHash },
    Shift {
        op: ShiftOp,
        left: Box<Element>,
        right: Box<Element>,
        ty: TypeHash,
    },
    /// `if(condition, when_true, when_false)`, both branches converted to
    /// the result type.
    Conditional {
        condition: Box<Element>,
        when_true: Box<Element>,
        when_false: Box<Element>,
        ty: TypeHash,
    },
    /// `operand in (a, b, ...)`.
    ///
    /// The operand is stored in `slot` once; every comparison reads it back
    /// through an [`Element::Temp`].
    InList {
        operand: Box<Element>,
        slot: u8,
        comparisons: Vec<Element>,
    },
}

impl Element {
    /// Type of the value this element leaves on the stack.
    pub fn result_type(&self) -> TypeHash {
        match self {
            Element::Literal { ty, .. }
            | Element::Owner { ty }
            | Element::Variable { ty, .. }
            | Element::CalcReference { ty, .. }
            | Element::Temp { ty, .. }
            | Element::MemberRead { ty, .. }
            | Element::Call { ty, .. }
            | Element::ExternalCall { ty, .. }
            | Element::ArrayIndex { ty, .. }
            | Element::Convert { ty, .. }
            | Element::Arithmetic { ty, .. }
            | Element::Power { ty, .. }
            | Element::Bitwise { ty, .. }
            | Element::Not { ty, .. }
            | Element::Negate { ty, .. }
            | Element::Shift { ty, .. }
            | Element::Conditional { ty, .. } => *ty,
            Element::Concat { .. } => primitives::STRING,
            Element::Compare { .. } | Element::Logical { .. } | Element::InList { .. } => {
                primitives::BOOL
            }
        }
    }

    /// A literal constant.
    pub fn literal(value: Value, ty: TypeHash) -> Self {
        Element::Literal { value, ty }
    }

    /// Wrap in a conversion to `ty`, unless the conversion does nothing.
    pub fn converted(self, conversion: Conversion, checked: bool, ty: TypeHash) -> Self {
        if conversion.is_exact() {
            return self;
        }
        Element::Convert {
            operand: Box::new(self),
            conversion,
            checked,
            ty,
        }
    }

    /// The value of an `int` literal.
    pub fn as_int_literal(&self) -> Option<i32> {
        match self {
            Element::Literal {
                value: Value::Int32(v),
                ..
            } => Some(*v),
            _ => None,
        }
    }

    /// Whether the element is a constant.
    pub fn is_literal(&self) -> bool {
        matches!(self, Element::Literal { .. })
    }

    /// Whether emitting this element needs a branch manager.
    pub fn has_branches(&self) -> bool {
        match self {
            Element::Logical { .. } | Element::Conditional { .. } | Element::InList { .. } => true,
            Element::Literal { .. }
            | Element::Owner { .. }
            | Element::Variable { .. }
            | Element::CalcReference { .. }
            | Element::Temp { .. } => false,
            Element::MemberRead { instance, .. } => instance.as_deref().is_some_and(Self::has_branches),
            Element::Call { instance, args, .. } => {
                instance.as_deref().is_some_and(Self::has_branches)
                    || args.iter().any(Self::has_branches)
            }
            Element::ExternalCall { args, .. } => args.iter().any(Self::has_branches),
            Element::ArrayIndex { array: a, index: b, .. }
            | Element::Arithmetic { left: a, right: b, .. }
            | Element::Concat { left: a, right: b }
            | Element::Compare { left: a, right: b, .. }
            | Element::Bitwise { left: a, right: b, .. }
            | Element::Shift { left: a, right: b, .. } => a.has_branches() || b.has_branches(),
            Element::Power { base, exponent, .. } => {
                base.has_branches()
                    || matches!(exponent, Exponent::Computed(e) if e.has_branches())
            }
            Element::Convert { operand, .. }
            | Element::Not { operand, .. }
            | Element::Negate { operand, .. } => operand.has_branches(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::find_primitive_conversion;

    fn int(v: i32) -> Element {
        Element::literal(Value::Int32(v), primitives::INT32)
    }

    #[test]
    fn result_types() {
        let sum = Element::Arithmetic {
            op: ArithmeticOp::Add,
            left: Box::new(int(1)),
            right: Box::new(int(2)),
            checked: false,
            ty: primitives::INT32,
        };
        assert_eq!(sum.result_type(), primitives::INT32);

        let compare = Element::Compare {
            op: CompareOp::Less,
            kind: CompareKind::Numeric,
            left: Box::new(int(1)),
            right: Box::new(sum),
        };
        assert_eq!(compare.result_type(), primitives::BOOL);

        let concat = Element::Concat {
            left: Box::new(int(1)),
            right: Box::new(Element::literal(Value::string("a"), primitives::STRING)),
        };
        assert_eq!(concat.result_type(), primitives::STRING);
    }

    #[test]
    fn identity_conversions_are_dropped() {
        let same = find_primitive_conversion(primitives::INT32, primitives::INT32).unwrap();
        assert_eq!(int(4).converted(same, false, primitives::INT32), int(4));

        let widen = find_primitive_conversion(primitives::INT32, primitives::DOUBLE).unwrap();
        let converted = int(4).converted(widen, false, primitives::DOUBLE);
        assert!(matches!(converted, Element::Convert { .. }));
        assert_eq!(converted.result_type(), primitives::DOUBLE);
    }

    #[test]
    fn branching_elements() {
        let and = Element::Logical {
            op: LogicalOp::And,
            left: Box::new(Element::literal(Value::Bool(true), primitives::BOOL)),
            right: Box::new(Element::literal(Value::Bool(false), primitives::BOOL)),
        };
        assert!(and.has_branches());
        let wrapped = Element::Not {
            operand: Box::new(and),
            ty: primitives::BOOL,
        };
        assert!(wrapped.has_branches());
        assert!(!int(1).has_branches());
        assert_eq!(int(7).as_int_literal(), Some(7));
    }
}
