//! Bytecode emitter for the expression compiler.
//!
//! The [`Emitter`] wraps a [`Chunk`] and offers one method per instruction
//! shape, interning operands into the chunk's side tables. Elements that
//! branch emit themselves twice: once into a [`Emitter::scratch`] emitter to
//! measure, once for real (see [`branches`]).
//!
//! # Example
//!
//! ```
//! use flee_compiler::bytecode::OpCode;
//! use flee_compiler::emit::Emitter;
//! use flee_core::Value;
//!
//! let mut emitter = Emitter::new();
//! emitter.emit_constant(Value::Int32(2));
//! emitter.emit_constant(Value::Int32(3));
//! emitter.emit(OpCode::Add);
//! emitter.emit(OpCode::Return);
//!
//! let chunk = emitter.finish();
//! let ops: Vec<OpCode> = chunk.instructions().into_iter().map(|(_, op)| op).collect();
//! assert_eq!(ops, [OpCode::Constant, OpCode::Constant, OpCode::Add, OpCode::Return]);
//! ```

pub mod branches;
mod codegen;

use flee_core::{PrimitiveKind, TypeHash, Value};

use crate::bytecode::{BranchKind, CallTarget, Chunk, OpCode};

pub use branches::{BranchManager, BranchRecord, LONG_BRANCH_ADJUST, Label};

/// Emits bytecode instructions into one chunk.
#[derive(Debug, Default)]
pub struct Emitter {
    /// The chunk being built
    chunk: Chunk,
}

impl Emitter {
    /// Create a new emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// A throwaway emitter for measuring.
    ///
    /// Every instruction has a fixed width, so anything emitted here has the
    /// same length it will have in the real stream.
    pub fn scratch(&self) -> Self {
        Self::new()
    }

    /// Current length of the instruction stream.
    pub fn len(&self) -> usize {
        self.chunk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty()
    }

    /// The chunk built so far.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Finish emission and return the chunk.
    pub fn finish(self) -> Chunk {
        self.chunk
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit a single opcode with no operands.
    pub fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op);
    }

    /// Emit opcode with 8-bit operand.
    pub fn emit_byte(&mut self, op: OpCode, byte: u8) {
        self.chunk.write_op(op);
        self.chunk.write_byte(byte);
    }

    /// Emit opcode with 32-bit operand.
    pub fn emit_u32(&mut self, op: OpCode, value: u32) {
        self.chunk.write_op(op);
        self.chunk.write_u32(value);
    }

    // ==========================================================================
    // Values
    // ==========================================================================

    /// Emit a constant load instruction.
    ///
    /// Booleans and null have dedicated opcodes.
    pub fn emit_constant(&mut self, value: Value) {
        match value {
            Value::Null => self.emit(OpCode::PushNull),
            Value::Bool(b) => self.emit_bool(b),
            other => {
                let index = self.chunk.add_constant(other);
                self.emit_u32(OpCode::Constant, index);
            }
        }
    }

    /// Emit a boolean constant.
    pub fn emit_bool(&mut self, value: bool) {
        self.emit(if value {
            OpCode::PushTrue
        } else {
            OpCode::PushFalse
        });
    }

    /// Emit a null reference.
    pub fn emit_null(&mut self) {
        self.emit(OpCode::PushNull);
    }

    pub fn emit_load_temp(&mut self, slot: u8) {
        self.chunk.reserve_temps(slot + 1);
        self.emit_byte(OpCode::LoadTemp, slot);
    }

    pub fn emit_store_temp(&mut self, slot: u8) {
        self.chunk.reserve_temps(slot + 1);
        self.emit_byte(OpCode::StoreTemp, slot);
    }

    // ==========================================================================
    // Environment and Calls
    // ==========================================================================

    pub fn emit_load_variable(&mut self, name: &str) {
        let index = self.chunk.add_name(name);
        self.emit_u32(OpCode::LoadVariable, index);
    }

    pub fn emit_load_calc_result(&mut self, name: &str) {
        let index = self.chunk.add_name(name);
        self.emit_u32(OpCode::LoadCalcResult, index);
    }

    /// Emit a call to a bound host function.
    pub fn emit_call(&mut self, target: &CallTarget) {
        let index = self.chunk.add_function(target.clone());
        self.emit_u32(OpCode::Call, index);
    }

    /// Emit a call resolved by name at evaluation time.
    pub fn emit_call_external(&mut self, name: &str, arg_count: u16) {
        let index = self.chunk.add_name(name);
        self.emit_u32(OpCode::CallExternal, index);
        self.chunk.write_u16(arg_count);
    }

    /// Pack the top `count` values into an array of `element`.
    pub fn emit_pack_array(&mut self, element: TypeHash, count: u16) {
        let index = self.chunk.add_type(element);
        self.emit_u32(OpCode::PackArray, index);
        self.chunk.write_u16(count);
    }

    // ==========================================================================
    // Conversions
    // ==========================================================================

    /// Emit a numeric conversion.
    pub fn emit_convert(&mut self, to: PrimitiveKind, checked: bool) {
        let op = if checked {
            OpCode::ConvertChecked
        } else {
            OpCode::Convert
        };
        self.emit_byte(op, to.into());
    }

    /// Emit an instruction with a type operand (`ToEnum`, `CastCheck`).
    pub fn emit_type_op(&mut self, op: OpCode, ty: TypeHash) {
        let index = self.chunk.add_type(ty);
        self.emit_u32(op, index);
    }

    // ==========================================================================
    // Branches
    // ==========================================================================

    /// Emit a branch with a zero displacement, returning the operand offset.
    pub(crate) fn emit_branch_placeholder(&mut self, kind: BranchKind, long: bool) -> usize {
        if long {
            self.chunk.write_op(kind.long_op());
            let operand = self.chunk.current_offset();
            self.chunk.write_u32(0);
            operand
        } else {
            self.chunk.write_op(kind.short_op());
            let operand = self.chunk.current_offset();
            self.chunk.write_byte(0);
            operand
        }
    }

    pub(crate) fn patch_i8(&mut self, offset: usize, value: i8) {
        self.chunk.patch_i8(offset, value);
    }

    pub(crate) fn patch_i32(&mut self, offset: usize, value: i32) {
        self.chunk.patch_i32(offset, value);
    }
}
