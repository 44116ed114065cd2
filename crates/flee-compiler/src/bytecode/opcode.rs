//! Bytecode operation codes.
//!
//! This module defines the instruction set executed by the expression
//! evaluator. Each opcode is a single byte, with fixed-width operands
//! following inline. Fixed widths matter: the branch manager measures an
//! element once and expects the second emission to have the same layout.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The evaluator is a stack machine. Most operations pop their operands
/// and push one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    /// Push a constant from the pool.
    /// Operand: u32 constant index (big-endian)
    Constant = 0,
    /// Push the null reference.
    PushNull,
    /// Push boolean true.
    PushTrue,
    /// Push boolean false.
    PushFalse,

    // =========================================================================
    // Stack Operations
    // =========================================================================
    /// Pop top of stack.
    Pop,
    /// Duplicate top of stack.
    Dup,
    /// Push a copy of a temporary slot.
    /// Operand: u8 slot
    LoadTemp,
    /// Pop into a temporary slot.
    /// Operand: u8 slot
    StoreTemp,

    // =========================================================================
    // Environment
    // =========================================================================
    /// Push the expression owner.
    LoadOwner,
    /// Push the current value of a variable.
    /// Operand: u32 name index
    LoadVariable,
    /// Push the last computed value of another calculation engine entry.
    /// Operand: u32 name index
    LoadCalcResult,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Call a bound host function. Pops its arguments, then the instance if
    /// the target has one.
    /// Operand: u32 function table index
    Call,
    /// Call a function supplied by the variable resolver at evaluation time.
    /// Operands: u32 name index, u16 argument count
    CallExternal,

    // =========================================================================
    // Arrays
    // =========================================================================
    /// Pop N values and push them as one array.
    /// Operands: u32 element type index, u16 count
    PackArray,
    /// Pop index and array, push the element.
    LoadElement,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    /// Add top two values.
    Add,
    /// Subtract: second - top.
    Sub,
    /// Multiply top two values.
    Mul,
    /// Divide: second / top.
    Div,
    /// Remainder: second % top.
    Mod,
    /// Raise second to the power of top, as doubles.
    Pow,
    /// Add, failing on integral overflow.
    AddChecked,
    /// Subtract, failing on integral overflow.
    SubChecked,
    /// Multiply, failing on integral overflow.
    MulChecked,
    /// Negate top of stack.
    Neg,
    /// Concatenate the text of the top two values.
    Concat,

    // =========================================================================
    // Bitwise and Logical
    // =========================================================================
    /// Bitwise and of integers, logical and of booleans (not short-circuit).
    And,
    /// Bitwise or of integers, logical or of booleans (not short-circuit).
    Or,
    /// Exclusive or of integers or booleans.
    Xor,
    /// Logical not of a boolean, complement of an integer.
    Not,
    /// Shift second left by top.
    Shl,
    /// Shift second right by top.
    Shr,

    // =========================================================================
    // Comparisons
    // =========================================================================
    /// Value equality of numbers, booleans, characters and enums.
    Eq,
    /// Value inequality.
    Ne,
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// Less than or equal.
    Le,
    /// Greater than or equal.
    Ge,
    /// Ordinal string equality.
    StrEq,
    /// Case-insensitive string equality.
    StrEqIgnoreCase,
    /// Reference identity (null equals null).
    RefEq,

    // =========================================================================
    // Conversions
    // =========================================================================
    /// Convert a numeric value, wrapping on overflow.
    /// Operand: u8 target primitive kind
    Convert,
    /// Convert a numeric value, failing on overflow.
    /// Operand: u8 target primitive kind
    ConvertChecked,
    /// Reinterpret an integer as an enum member.
    /// Operand: u32 enum type index
    ToEnum,
    /// Check that a reference is an instance of a type (null passes).
    /// Operand: u32 type index
    CastCheck,

    // =========================================================================
    // Branches
    // =========================================================================
    // Displacements are relative to the end of the branch instruction.
    /// Unconditional short branch.
    /// Operand: i8 displacement
    Jump,
    /// Pop a boolean, branch if false.
    /// Operand: i8 displacement
    JumpIfFalse,
    /// Pop a boolean, branch if true.
    /// Operand: i8 displacement
    JumpIfTrue,
    /// Unconditional long branch.
    /// Operand: i32 displacement (big-endian)
    JumpLong,
    /// Pop a boolean, long branch if false.
    /// Operand: i32 displacement (big-endian)
    JumpIfFalseLong,
    /// Pop a boolean, long branch if true.
    /// Operand: i32 displacement (big-endian)
    JumpIfTrueLong,

    // =========================================================================
    // Control
    // =========================================================================
    /// Stop and yield the top of stack.
    Return,
}

impl OpCode {
    /// Decode a byte.
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::try_from(byte).ok()
    }

    /// Number of operand bytes following the opcode.
    pub fn operand_size(self) -> usize {
        match self {
            OpCode::LoadTemp
            | OpCode::StoreTemp
            | OpCode::Convert
            | OpCode::ConvertChecked
            | OpCode::Jump
            | OpCode::JumpIfFalse
            | OpCode::JumpIfTrue => 1,

            OpCode::Constant
            | OpCode::LoadVariable
            | OpCode::LoadCalcResult
            | OpCode::Call
            | OpCode::ToEnum
            | OpCode::CastCheck
            | OpCode::JumpLong
            | OpCode::JumpIfFalseLong
            | OpCode::JumpIfTrueLong => 4,

            OpCode::CallExternal | OpCode::PackArray => 6,

            _ => 0,
        }
    }

    /// Total encoded size, opcode included.
    pub fn size(self) -> usize {
        1 + self.operand_size()
    }

    /// Whether this is one of the branch instructions.
    pub fn is_branch(self) -> bool {
        self.branch_kind().is_some()
    }

    /// Whether this branch uses the 32-bit encoding.
    pub fn is_long_branch(self) -> bool {
        matches!(
            self,
            OpCode::JumpLong | OpCode::JumpIfFalseLong | OpCode::JumpIfTrueLong
        )
    }

    /// Condition of a branch instruction.
    pub fn branch_kind(self) -> Option<BranchKind> {
        match self {
            OpCode::Jump | OpCode::JumpLong => Some(BranchKind::Always),
            OpCode::JumpIfFalse | OpCode::JumpIfFalseLong => Some(BranchKind::IfFalse),
            OpCode::JumpIfTrue | OpCode::JumpIfTrueLong => Some(BranchKind::IfTrue),
            _ => None,
        }
    }

    /// Mnemonic used by disassembly and test failures.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Constant => "CONSTANT",
            OpCode::PushNull => "PUSH_NULL",
            OpCode::PushTrue => "PUSH_TRUE",
            OpCode::PushFalse => "PUSH_FALSE",
            OpCode::Pop => "POP",
            OpCode::Dup => "DUP",
            OpCode::LoadTemp => "LOAD_TEMP",
            OpCode::StoreTemp => "STORE_TEMP",
            OpCode::LoadOwner => "LOAD_OWNER",
            OpCode::LoadVariable => "LOAD_VARIABLE",
            OpCode::LoadCalcResult => "LOAD_CALC_RESULT",
            OpCode::Call => "CALL",
            OpCode::CallExternal => "CALL_EXTERNAL",
            OpCode::PackArray => "PACK_ARRAY",
            OpCode::LoadElement => "LOAD_ELEMENT",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",
            OpCode::Pow => "POW",
            OpCode::AddChecked => "ADD_CHECKED",
            OpCode::SubChecked => "SUB_CHECKED",
            OpCode::MulChecked => "MUL_CHECKED",
            OpCode::Neg => "NEG",
            OpCode::Concat => "CONCAT",
            OpCode::And => "AND",
            OpCode::Or => "OR",
            OpCode::Xor => "XOR",
            OpCode::Not => "NOT",
            OpCode::Shl => "SHL",
            OpCode::Shr => "SHR",
            OpCode::Eq => "EQ",
            OpCode::Ne => "NE",
            OpCode::Lt => "LT",
            OpCode::Gt => "GT",
            OpCode::Le => "LE",
            OpCode::Ge => "GE",
            OpCode::StrEq => "STR_EQ",
            OpCode::StrEqIgnoreCase => "STR_EQ_IGNORE_CASE",
            OpCode::RefEq => "REF_EQ",
            OpCode::Convert => "CONVERT",
            OpCode::ConvertChecked => "CONVERT_CHECKED",
            OpCode::ToEnum => "TO_ENUM",
            OpCode::CastCheck => "CAST_CHECK",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::JumpIfTrue => "JUMP_IF_TRUE",
            OpCode::JumpLong => "JUMP_LONG",
            OpCode::JumpIfFalseLong => "JUMP_IF_FALSE_LONG",
            OpCode::JumpIfTrueLong => "JUMP_IF_TRUE_LONG",
            OpCode::Return => "RETURN",
        }
    }
}

/// Condition under which a branch is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Always,
    IfFalse,
    IfTrue,
}

impl BranchKind {
    /// The 2-byte encoding.
    pub fn short_op(self) -> OpCode {
        match self {
            BranchKind::Always => OpCode::Jump,
            BranchKind::IfFalse => OpCode::JumpIfFalse,
            BranchKind::IfTrue => OpCode::JumpIfTrue,
        }
    }

    /// The 5-byte encoding.
    pub fn long_op(self) -> OpCode {
        match self {
            BranchKind::Always => OpCode::JumpLong,
            BranchKind::IfFalse => OpCode::JumpIfFalseLong,
            BranchKind::IfTrue => OpCode::JumpIfTrueLong,
        }
    }
}
