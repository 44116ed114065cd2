//! Element emission.
//!
//! Every element emits its children left to right, then its own
//! instruction. Elements with control flow (`and`/`or`, conditionals and
//! `in` lists) go through [`BranchManager::run`], so they are emitted twice.
//! Children are therefore emitted twice as well; emission must not have
//! side effects beyond the emitter.

use flee_core::{PrimitiveKind, Value};

use crate::bytecode::{BranchKind, OpCode};
use crate::elements::{
    ArithmeticOp, BitwiseOp, CompareKind, CompareOp, Element, Exponent, LogicalOp, ShiftOp,
};
use crate::options::StringComparison;

use super::{BranchManager, Emitter};

impl Element {
    /// Emit the instructions leaving this element's value on the stack.
    pub fn emit(&self, em: &mut Emitter) {
        match self {
            Element::Literal { value, .. } => em.emit_constant(value.clone()),
            Element::Owner { .. } => em.emit(OpCode::LoadOwner),
            Element::Variable { name, .. } => em.emit_load_variable(name),
            Element::CalcReference { name, .. } => em.emit_load_calc_result(name),
            Element::Temp { slot, .. } => em.emit_load_temp(*slot),
            Element::MemberRead {
                instance, getter, ..
            } => {
                if let Some(instance) = instance {
                    instance.emit(em);
                }
                em.emit_call(getter);
            }
            Element::Call {
                instance,
                target,
                args,
                param_array,
                ..
            } => {
                if let Some(instance) = instance {
                    instance.emit(em);
                }
                args.iter().for_each(|arg| arg.emit(em));
                if let Some(array) = param_array {
                    let packed = args.len() - array.fixed;
                    em.emit_pack_array(array.element, packed as u16);
                }
                em.emit_call(target);
            }
            Element::ExternalCall { name, args, .. } => {
                args.iter().for_each(|arg| arg.emit(em));
                em.emit_call_external(name, args.len() as u16);
            }
            Element::ArrayIndex { array, index, .. } => {
                array.emit(em);
                index.emit(em);
                em.emit(OpCode::LoadElement);
            }
            Element::Convert {
                operand,
                conversion,
                checked,
                ..
            } => {
                operand.emit(em);
                conversion.emit(em, *checked);
            }
            Element::Arithmetic {
                op,
                left,
                right,
                checked,
                ..
            } => {
                left.emit(em);
                right.emit(em);
                em.emit(arithmetic_opcode(*op, *checked));
            }
            Element::Power {
                base,
                exponent,
                checked,
                ty,
            } => {
                base.emit(em);
                match exponent {
                    Exponent::Computed(exponent) => {
                        exponent.emit(em);
                        em.emit(OpCode::Pow);
                    }
                    Exponent::Repeated(0) => {
                        em.emit(OpCode::Pop);
                        em.emit_constant(Value::Int32(1));
                        if let Some(kind) = PrimitiveKind::from_hash(*ty)
                            && kind != PrimitiveKind::Int32
                        {
                            em.emit_convert(kind, false);
                        }
                    }
                    Exponent::Repeated(n) => {
                        let multiply = arithmetic_opcode(ArithmeticOp::Mul, *checked);
                        for _ in 1..*n {
                            em.emit(OpCode::Dup);
                        }
                        for _ in 1..*n {
                            em.emit(multiply);
                        }
                    }
                }
            }
            Element::Concat { left, right } => {
                left.emit(em);
                right.emit(em);
                em.emit(OpCode::Concat);
            }
            Element::Compare {
                op,
                kind,
                left,
                right,
            } => {
                left.emit(em);
                right.emit(em);
                emit_compare(em, *op, *kind);
            }
            Element::Logical { .. } => emit_logical(self, em),
            Element::Bitwise {
                op, left, right, ..
            } => {
                left.emit(em);
                right.emit(em);
                em.emit(match op {
                    BitwiseOp::And => OpCode::And,
                    BitwiseOp::Or => OpCode::Or,
                    BitwiseOp::Xor => OpCode::Xor,
                });
            }
            Element::Not { operand, .. } => {
                operand.emit(em);
                em.emit(OpCode::Not);
            }
            Element::Negate { operand, .. } => {
                operand.emit(em);
                em.emit(OpCode::Neg);
            }
            Element::Shift {
                op, left, right, ..
            } => {
                left.emit(em);
                right.emit(em);
                em.emit(match op {
                    ShiftOp::Left => OpCode::Shl,
                    ShiftOp::Right => OpCode::Shr,
                });
            }
            Element::Conditional {
                condition,
                when_true,
                when_false,
                ..
            } => BranchManager::run(em, |em, bm| {
                let false_label = bm.define_label();
                let end = bm.define_label();
                condition.emit(em);
                bm.emit_branch(em, BranchKind::IfFalse, false_label);
                when_true.emit(em);
                bm.emit_branch(em, BranchKind::Always, end);
                bm.mark_label(em, false_label);
                when_false.emit(em);
                bm.mark_label(em, end);
            }),
            Element::InList {
                operand,
                slot,
                comparisons,
            } => {
                operand.emit(em);
                em.emit_store_temp(*slot);
                BranchManager::run(em, |em, bm| {
                    let true_label = bm.define_label();
                    let end = bm.define_label();
                    for comparison in comparisons {
                        comparison.emit(em);
                        bm.emit_branch(em, BranchKind::IfTrue, true_label);
                    }
                    em.emit_bool(false);
                    bm.emit_branch(em, BranchKind::Always, end);
                    bm.mark_label(em, true_label);
                    em.emit_bool(true);
                    bm.mark_label(em, end);
                });
            }
        }
    }
}

fn arithmetic_opcode(op: ArithmeticOp, checked: bool) -> OpCode {
    match (op, checked) {
        (ArithmeticOp::Add, false) => OpCode::Add,
        (ArithmeticOp::Add, true) => OpCode::AddChecked,
        (ArithmeticOp::Sub, false) => OpCode::Sub,
        (ArithmeticOp::Sub, true) => OpCode::SubChecked,
        (ArithmeticOp::Mul, false) => OpCode::Mul,
        (ArithmeticOp::Mul, true) => OpCode::MulChecked,
        (ArithmeticOp::Div, _) => OpCode::Div,
        (ArithmeticOp::Mod, _) => OpCode::Mod,
    }
}

fn emit_compare(em: &mut Emitter, op: CompareOp, kind: CompareKind) {
    let equality = match kind {
        CompareKind::String(StringComparison::Ordinal) => Some(OpCode::StrEq),
        CompareKind::String(StringComparison::OrdinalIgnoreCase) => Some(OpCode::StrEqIgnoreCase),
        CompareKind::Reference => Some(OpCode::RefEq),
        CompareKind::Numeric | CompareKind::Bool | CompareKind::Enum => None,
    };

    if let Some(eq) = equality {
        em.emit(eq);
        if op == CompareOp::NotEqual {
            em.emit(OpCode::Not);
        }
        return;
    }

    em.emit(match op {
        CompareOp::Equal => OpCode::Eq,
        CompareOp::NotEqual => OpCode::Ne,
        CompareOp::Less => OpCode::Lt,
        CompareOp::Greater => OpCode::Gt,
        CompareOp::LessEqual => OpCode::Le,
        CompareOp::GreaterEqual => OpCode::Ge,
    });
}

// ============================================================================
// Short-circuit and/or
// ============================================================================

/// Where a leaf jumps when it alone decides the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShortCircuitTarget {
    /// Start of another leaf.
    Leaf(usize),
    False,
    True,
}

/// A chain of nested `and`/`or` flattened in source order.
///
/// Leaf `i` is followed by operator `i`; each operator records the last
/// leaf of its right operand.
#[derive(Debug, Default)]
struct ShortCircuit<'e> {
    leaves: Vec<&'e Element>,
    operators: Vec<(LogicalOp, usize)>,
}

impl<'e> ShortCircuit<'e> {
    fn new(root: &'e Element) -> Self {
        let mut chain = Self::default();
        chain.flatten(root);
        chain
    }

    fn flatten(&mut self, element: &'e Element) {
        match element {
            Element::Logical { op, left, right } => {
                self.flatten(left);
                let index = self.operators.len();
                self.operators.push((*op, 0));
                self.flatten(right);
                self.operators[index].1 = self.leaves.len() - 1;
            }
            leaf => self.leaves.push(leaf),
        }
    }

    /// Target of the branch after leaf `i`.
    ///
    /// Skips the right operand of the leaf's operator and every enclosing
    /// operator of the same kind; the first enclosing operator of the other
    /// kind continues with its right operand. With none left, the result is
    /// known.
    fn target(&self, i: usize) -> ShortCircuitTarget {
        let (op, mut next) = self.operators[i];
        while let Some(&(other, right_end)) = self.operators.get(next) {
            if other != op {
                return ShortCircuitTarget::Leaf(next + 1);
            }
            next = right_end;
        }
        match op {
            LogicalOp::And => ShortCircuitTarget::False,
            LogicalOp::Or => ShortCircuitTarget::True,
        }
    }
}

fn emit_logical(root: &Element, em: &mut Emitter) {
    let chain = ShortCircuit::new(root);
    let targets: Vec<ShortCircuitTarget> =
        (0..chain.operators.len()).map(|i| chain.target(i)).collect();
    let uses_false = targets.contains(&ShortCircuitTarget::False);
    let uses_true = targets.contains(&ShortCircuitTarget::True);

    BranchManager::run(em, |em, bm| {
        let leaf_labels: Vec<_> = chain.leaves.iter().map(|_| bm.define_label()).collect();
        let false_label = bm.define_label();
        let true_label = bm.define_label();
        let end = bm.define_label();

        for (i, leaf) in chain.leaves.iter().enumerate() {
            bm.mark_label(em, leaf_labels[i]);
            leaf.emit(em);
            if let Some(target) = targets.get(i) {
                let label = match *target {
                    ShortCircuitTarget::Leaf(j) => leaf_labels[j],
                    ShortCircuitTarget::False => false_label,
                    ShortCircuitTarget::True => true_label,
                };
                let kind = match chain.operators[i].0 {
                    LogicalOp::And => BranchKind::IfFalse,
                    LogicalOp::Or => BranchKind::IfTrue,
                };
                bm.emit_branch(em, kind, label);
            }
        }
        bm.emit_branch(em, BranchKind::Always, end);

        if uses_false {
            bm.mark_label(em, false_label);
            em.emit_bool(false);
            if uses_true {
                bm.emit_branch(em, BranchKind::Always, end);
            }
        }
        if uses_true {
            bm.mark_label(em, true_label);
            em.emit_bool(true);
        }
        bm.mark_label(em, end);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::{TypeHash, primitives};

    fn var(name: &str, ty: TypeHash) -> Element {
        Element::Variable {
            name: name.to_string(),
            ty,
        }
    }

    fn flag(name: &str) -> Element {
        var(name, primitives::BOOL)
    }

    fn logical(op: LogicalOp, left: Element, right: Element) -> Element {
        Element::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn compare(op: CompareOp, left: i32, right: i32) -> Element {
        Element::Compare {
            op,
            kind: CompareKind::Numeric,
            left: Box::new(Element::literal(Value::Int32(left), primitives::INT32)),
            right: Box::new(Element::literal(Value::Int32(right), primitives::INT32)),
        }
    }

    /// `c0 + c1 + ... + c(n-1)` with distinct constants, 6 bytes per term
    /// after the first.
    fn long_sum(n: i32) -> Element {
        let mut sum = Element::literal(Value::Int32(1000), primitives::INT32);
        for i in 1..n {
            sum = Element::Arithmetic {
                op: ArithmeticOp::Add,
                left: Box::new(sum),
                right: Box::new(Element::literal(Value::Int32(1000 + i), primitives::INT32)),
                checked: false,
                ty: primitives::INT32,
            };
        }
        sum
    }

    fn emit(element: &Element) -> crate::bytecode::Chunk {
        let mut em = Emitter::new();
        element.emit(&mut em);
        em.finish()
    }

    fn branch_targets(chunk: &crate::bytecode::Chunk) -> Vec<(OpCode, usize)> {
        chunk
            .instructions()
            .into_iter()
            .filter(|(_, op)| op.is_branch())
            .map(|(offset, op)| (op, chunk.branch_target(offset).unwrap()))
            .collect()
    }

    fn load_offset(chunk: &crate::bytecode::Chunk, name: &str) -> usize {
        chunk
            .instructions()
            .into_iter()
            .find(|&(offset, op)| {
                op == OpCode::LoadVariable
                    && chunk
                        .read_u32(offset + 1)
                        .and_then(|i| chunk.name(i))
                        .is_some_and(|n| &**n == name)
            })
            .map(|(offset, _)| offset)
            .unwrap()
    }

    #[test]
    fn and_emits_each_leaf_once() {
        let element = logical(
            LogicalOp::And,
            compare(CompareOp::Less, 1, 2),
            compare(CompareOp::Greater, 3, 2),
        );
        let chunk = emit(&element);
        chunk.assert_opcodes(&[
            OpCode::Constant,
            OpCode::Constant,
            OpCode::Lt,
            OpCode::JumpIfFalse,
            OpCode::Constant,
            OpCode::Constant,
            OpCode::Gt,
            OpCode::Jump,
            OpCode::PushFalse,
        ]);

        let targets = branch_targets(&chunk);
        let push_false = chunk.len() - 1;
        assert_eq!(targets[0], (OpCode::JumpIfFalse, push_false));
        assert_eq!(targets[1], (OpCode::Jump, chunk.len()));
    }

    #[test]
    fn mixed_chain_targets() {
        // (a and b) or c
        let element = logical(
            LogicalOp::Or,
            logical(LogicalOp::And, flag("a"), flag("b")),
            flag("c"),
        );
        let chain = ShortCircuit::new(&element);
        assert_eq!(chain.leaves.len(), 3);
        assert_eq!(chain.target(0), ShortCircuitTarget::Leaf(2));
        assert_eq!(chain.target(1), ShortCircuitTarget::True);

        let chunk = emit(&element);
        let loads = chunk
            .opcodes()
            .into_iter()
            .filter(|op| *op == OpCode::LoadVariable)
            .count();
        assert_eq!(loads, 3);

        let targets = branch_targets(&chunk);
        assert_eq!(targets[0], (OpCode::JumpIfFalse, load_offset(&chunk, "c")));
        // Only the true terminal is used.
        assert!(!chunk.opcodes().contains(&OpCode::PushFalse));
        assert_eq!(*chunk.opcodes().last().unwrap(), OpCode::PushTrue);
    }

    #[test]
    fn nested_same_operator_skips_to_terminal() {
        // a and (b or c) and d
        let element = logical(
            LogicalOp::And,
            logical(
                LogicalOp::And,
                flag("a"),
                logical(LogicalOp::Or, flag("b"), flag("c")),
            ),
            flag("d"),
        );
        let chain = ShortCircuit::new(&element);
        assert_eq!(chain.leaves.len(), 4);
        assert_eq!(chain.target(0), ShortCircuitTarget::False);
        assert_eq!(chain.target(1), ShortCircuitTarget::Leaf(3));
        assert_eq!(chain.target(2), ShortCircuitTarget::False);
    }

    #[test]
    fn conditional_with_mixed_branch_lengths() {
        let element = Element::Conditional {
            condition: Box::new(flag("c")),
            when_true: Box::new(long_sum(40)),
            when_false: Box::new(Element::literal(Value::Int32(0), primitives::INT32)),
            ty: primitives::INT32,
        };
        let chunk = emit(&element);
        let targets = branch_targets(&chunk);
        assert_eq!(targets.len(), 2);

        // The false branch jumps over the long sum; the exit jump is short.
        let (first, false_target) = targets[0];
        let (second, end_target) = targets[1];
        assert_eq!(first, OpCode::JumpIfFalseLong);
        assert_eq!(second, OpCode::Jump);
        assert_eq!(chunk.read_op(false_target), Some(OpCode::Constant));
        assert_eq!(end_target, chunk.len());
        assert_eq!(false_target, end_target - OpCode::Constant.size());
    }

    #[test]
    fn in_list_compares_against_the_cached_operand() {
        let operand = var("x", primitives::INT32);
        let comparisons = (1..=3)
            .map(|v| Element::Compare {
                op: CompareOp::Equal,
                kind: CompareKind::Numeric,
                left: Box::new(Element::Temp {
                    slot: 0,
                    ty: primitives::INT32,
                }),
                right: Box::new(Element::literal(Value::Int32(v), primitives::INT32)),
            })
            .collect();
        let element = Element::InList {
            operand: Box::new(operand),
            slot: 0,
            comparisons,
        };
        let chunk = emit(&element);
        assert_eq!(chunk.temp_count(), 1);
        let ops = chunk.opcodes();
        assert_eq!(ops.iter().filter(|op| **op == OpCode::LoadVariable).count(), 1);
        assert_eq!(ops.iter().filter(|op| **op == OpCode::JumpIfTrue).count(), 3);

        let push_true = chunk.len() - 1;
        for (op, target) in branch_targets(&chunk) {
            if op == OpCode::JumpIfTrue {
                assert_eq!(target, push_true);
            }
        }
    }

    #[test]
    fn string_inequality_negates_equality() {
        let element = Element::Compare {
            op: CompareOp::NotEqual,
            kind: CompareKind::String(StringComparison::OrdinalIgnoreCase),
            left: Box::new(var("a", primitives::STRING)),
            right: Box::new(var("b", primitives::STRING)),
        };
        emit(&element).assert_opcodes(&[
            OpCode::LoadVariable,
            OpCode::LoadVariable,
            OpCode::StrEqIgnoreCase,
            OpCode::Not,
        ]);
    }

    #[test]
    fn repeated_power() {
        let cube = Element::Power {
            base: Box::new(var("x", primitives::INT64)),
            exponent: Exponent::Repeated(3),
            checked: true,
            ty: primitives::INT64,
        };
        emit(&cube).assert_opcodes(&[
            OpCode::LoadVariable,
            OpCode::Dup,
            OpCode::Dup,
            OpCode::MulChecked,
            OpCode::MulChecked,
        ]);

        let zero = Element::Power {
            base: Box::new(var("x", primitives::INT64)),
            exponent: Exponent::Repeated(0),
            checked: false,
            ty: primitives::INT64,
        };
        emit(&zero).assert_opcodes(&[
            OpCode::LoadVariable,
            OpCode::Pop,
            OpCode::Constant,
            OpCode::Convert,
        ]);
    }
}
