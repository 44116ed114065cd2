//! Overloaded operator lookup.
//!
//! Host types overload operators with static functions named after the
//! operator (`op_Addition`, `op_Equality`, ...). The lookup for a binary
//! operator searches the left operand's type and the right operand's type;
//! an operator found on both sides is ambiguous.
//!
//! [`OperatorCache`] belongs to one compilation and memoises the operator
//! functions found per `(type, name)`.

use rustc_hash::FxHashMap;

use flee_core::{FunctionEntry, MemberKinds, SymbolResolver, TypeHash, Visibility};
use flee_parser::ast::{BinaryOp, UnaryOp};

use super::{Candidate, OverloadError, resolve_overload};

/// Host function name overloading a binary operator.
pub fn binary_operator_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "op_Addition",
        BinaryOp::Sub => "op_Subtraction",
        BinaryOp::Mul => "op_Multiply",
        BinaryOp::Div => "op_Division",
        BinaryOp::Mod => "op_Modulus",
        BinaryOp::Pow => "op_Exponent",
        BinaryOp::Equal => "op_Equality",
        BinaryOp::NotEqual => "op_Inequality",
        BinaryOp::Less => "op_LessThan",
        BinaryOp::Greater => "op_GreaterThan",
        BinaryOp::LessEqual => "op_LessThanOrEqual",
        BinaryOp::GreaterEqual => "op_GreaterThanOrEqual",
        BinaryOp::And => "op_BitwiseAnd",
        BinaryOp::Or => "op_BitwiseOr",
        BinaryOp::Xor => "op_ExclusiveOr",
        BinaryOp::ShiftLeft => "op_LeftShift",
        BinaryOp::ShiftRight => "op_RightShift",
    }
}

/// Host function name overloading a unary operator.
pub fn unary_operator_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "op_UnaryNegation",
        UnaryOp::Not => "op_LogicalNot",
    }
}

/// Operator lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorError {
    /// Two overloads on one type tie.
    Ambiguous,
    /// Both operand types define an applicable operator.
    DefinedOnBothTypes,
}

/// Memoised operator lookups for one compilation.
pub struct OperatorCache<'r> {
    resolver: &'r dyn SymbolResolver,
    entries: FxHashMap<(TypeHash, &'static str), Vec<&'r FunctionEntry>>,
}

impl<'r> OperatorCache<'r> {
    pub fn new(resolver: &'r dyn SymbolResolver) -> Self {
        Self {
            resolver,
            entries: FxHashMap::default(),
        }
    }

    /// Static, callable operator functions named `name` visible on `ty`.
    pub fn operators(&mut self, ty: TypeHash, name: &'static str) -> Vec<&'r FunctionEntry> {
        let resolver = self.resolver;
        self.entries
            .entry((ty, name))
            .or_insert_with(|| {
                resolver
                    .find_members(ty, name, MemberKinds::METHOD)
                    .into_iter()
                    .filter_map(|m| m.as_method())
                    .filter(|f| f.is_static && f.native.is_some())
                    .collect()
            })
            .clone()
    }

    /// Find the operator applying to `left op right`.
    ///
    /// `Ok(None)` means neither type overloads the operator for these
    /// operands.
    pub fn find_binary(
        &mut self,
        name: &'static str,
        left: TypeHash,
        right: TypeHash,
    ) -> Result<Option<Candidate<'r>>, OperatorError> {
        let args = [left, right];
        if left == right {
            return self.resolve(left, name, &args);
        }

        let on_left = self.resolve(left, name, &args)?;
        let on_right = self.resolve(right, name, &args)?;
        match (on_left, on_right) {
            (Some(l), Some(r)) if std::ptr::eq(l.function, r.function) => Ok(Some(l)),
            (Some(_), Some(_)) => Err(OperatorError::DefinedOnBothTypes),
            (l, r) => Ok(l.or(r)),
        }
    }

    /// Find the operator applying to `op operand`.
    pub fn find_unary(
        &mut self,
        name: &'static str,
        operand: TypeHash,
    ) -> Result<Option<Candidate<'r>>, OperatorError> {
        self.resolve(operand, name, &[operand])
    }

    fn resolve(
        &mut self,
        owner: TypeHash,
        name: &'static str,
        args: &[TypeHash],
    ) -> Result<Option<Candidate<'r>>, OperatorError> {
        let operators = self.operators(owner, name);
        if operators.is_empty() {
            return Ok(None);
        }

        let candidates = operators
            .into_iter()
            .map(|f| Candidate::new(f, f.visibility == Visibility::Public));
        match resolve_overload(candidates, args, self.resolver) {
            Ok(candidate) => Ok(Some(candidate)),
            Err(OverloadError::Ambiguous) => Err(OperatorError::Ambiguous),
            Err(OverloadError::NoMatch | OverloadError::NoAccessible) => Ok(None),
        }
    }
}

impl std::fmt::Debug for OperatorCache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
