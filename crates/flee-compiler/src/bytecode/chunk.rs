//! Bytecode chunk for a compiled expression.
//!
//! A `Chunk` holds the instruction stream together with the side tables its
//! operands index into: constants, bound host functions, names resolved at
//! evaluation time and type identities.

use std::sync::Arc;

use flee_core::{NativeFn, TypeHash, Value};

use super::{ConstantPool, OpCode};

/// A host function bound at compile time.
#[derive(Debug, Clone)]
pub struct CallTarget {
    /// Display name, used in evaluation errors.
    pub name: String,
    /// The implementation.
    pub native: NativeFn,
    /// Whether an instance is popped below the arguments.
    pub has_instance: bool,
    /// Number of argument values popped (a parameter array counts as one).
    pub arg_count: u16,
}

impl CallTarget {
    pub fn new(name: impl Into<String>, native: NativeFn, has_instance: bool, arg_count: u16) -> Self {
        Self {
            name: name.into(),
            native,
            has_instance,
            arg_count,
        }
    }
}

/// Targets are equal when they call the same native the same way.
impl PartialEq for CallTarget {
    fn eq(&self, other: &Self) -> bool {
        self.native.ptr_eq(&other.native)
            && self.has_instance == other.has_instance
            && self.arg_count == other.arg_count
    }
}

/// Compiled bytecode for one expression.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// The bytecode instructions.
    code: Vec<u8>,
    /// Literal values.
    constants: ConstantPool,
    /// Bound host functions, indexed by `Call`.
    functions: Vec<CallTarget>,
    /// Variable, calc entry and external function names.
    names: Vec<Arc<str>>,
    /// Types used by `PackArray`, `ToEnum` and `CastCheck`.
    types: Vec<TypeHash>,
    /// Number of temporary slots the evaluator must provide.
    temp_count: u8,
}

impl Chunk {
    /// Create a new empty chunk.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Writing
    // ==========================================================================

    /// Write an opcode.
    pub fn write_op(&mut self, op: OpCode) {
        self.code.push(op.into());
    }

    /// Write a byte operand.
    pub fn write_byte(&mut self, byte: u8) {
        self.code.push(byte);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16) {
        self.code.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a 32-bit operand (big-endian).
    pub fn write_u32(&mut self, value: u32) {
        self.code.extend_from_slice(&value.to_be_bytes());
    }

    /// Overwrite a short branch displacement.
    pub fn patch_i8(&mut self, offset: usize, value: i8) {
        self.code[offset] = value as u8;
    }

    /// Overwrite a long branch displacement.
    pub fn patch_i32(&mut self, offset: usize, value: i32) {
        self.code[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Get current code offset (for branch patching).
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    // ==========================================================================
    // Side tables
    // ==========================================================================

    /// Add a constant, returning its index.
    pub fn add_constant(&mut self, value: Value) -> u32 {
        self.constants.add(value)
    }

    /// Add a call target, reusing an identical entry.
    pub fn add_function(&mut self, target: CallTarget) -> u32 {
        if let Some(idx) = self.functions.iter().position(|f| *f == target) {
            return idx as u32;
        }
        self.functions.push(target);
        (self.functions.len() - 1) as u32
    }

    /// Add a name, reusing an identical entry.
    pub fn add_name(&mut self, name: &str) -> u32 {
        if let Some(idx) = self.names.iter().position(|n| n.as_ref() == name) {
            return idx as u32;
        }
        self.names.push(Arc::from(name));
        (self.names.len() - 1) as u32
    }

    /// Add a type, reusing an identical entry.
    pub fn add_type(&mut self, ty: TypeHash) -> u32 {
        if let Some(idx) = self.types.iter().position(|t| *t == ty) {
            return idx as u32;
        }
        self.types.push(ty);
        (self.types.len() - 1) as u32
    }

    /// Make sure at least `count` temporary slots exist.
    pub fn reserve_temps(&mut self, count: u8) {
        self.temp_count = self.temp_count.max(count);
    }

    pub fn constant(&self, index: u32) -> Option<&Value> {
        self.constants.get(index)
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    pub fn function(&self, index: u32) -> Option<&CallTarget> {
        self.functions.get(index as usize)
    }

    pub fn functions(&self) -> &[CallTarget] {
        &self.functions
    }

    pub fn name(&self, index: u32) -> Option<&Arc<str>> {
        self.names.get(index as usize)
    }

    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    pub fn type_at(&self, index: u32) -> Option<TypeHash> {
        self.types.get(index as usize).copied()
    }

    pub fn temp_count(&self) -> u8 {
        self.temp_count
    }

    // ==========================================================================
    // Reading
    // ==========================================================================

    /// Get the bytecode.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Get the length of the bytecode.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Check if the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Read a byte at the given offset.
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a signed byte at the given offset.
    pub fn read_i8(&self, offset: usize) -> Option<i8> {
        self.read_byte(offset).map(|b| b as i8)
    }

    /// Read a u16 at the given offset (big-endian).
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a u32 at the given offset (big-endian).
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.code.get(offset..offset + 4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read an i32 at the given offset (big-endian).
    pub fn read_i32(&self, offset: usize) -> Option<i32> {
        self.read_u32(offset).map(|v| v as i32)
    }

    /// Read an opcode at the given offset.
    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// Decode the instruction stream into `(offset, opcode)` pairs.
    pub fn instructions(&self) -> Vec<(usize, OpCode)> {
        let mut out = Vec::new();
        let mut offset = 0;
        while offset < self.code.len() {
            match self.read_op(offset) {
                Some(op) => {
                    out.push((offset, op));
                    offset += op.size();
                }
                // Invalid opcode, skip one byte
                None => offset += 1,
            }
        }
        out
    }

    /// Extract all opcodes from the chunk, skipping operands.
    #[cfg(test)]
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.instructions().into_iter().map(|(_, op)| op).collect()
    }

    /// Absolute target of the branch at `offset`.
    pub fn branch_target(&self, offset: usize) -> Option<usize> {
        let op = self.read_op(offset)?;
        let displacement = if op.is_long_branch() {
            self.read_i32(offset + 1)? as isize
        } else if op.is_branch() {
            self.read_i8(offset + 1)? as isize
        } else {
            return None;
        };
        (offset + op.size()).checked_add_signed(displacement)
    }

    /// Check if this chunk contains exactly the given opcode sequence.
    ///
    /// This ignores operand values, only checking the opcodes themselves.
    #[cfg(test)]
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Check if this chunk contains the given opcodes (in order, but not necessarily contiguous).
    #[cfg(test)]
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::{CallContext, NativeError};

    fn noop() -> NativeFn {
        NativeFn::new(|_: &mut CallContext<'_>| Ok::<(), NativeError>(()))
    }

    #[test]
    fn new_chunk_is_empty() {
        let chunk = Chunk::new();
        assert!(chunk.is_empty());
        assert_eq!(chunk.len(), 0);
        assert_eq!(chunk.temp_count(), 0);
    }

    #[test]
    fn write_and_read_operands() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant);
        chunk.write_u32(0x0102_0304);
        chunk.write_op(OpCode::PackArray);
        chunk.write_u32(7);
        chunk.write_u16(0x1234);

        assert_eq!(chunk.len(), 12);
        assert_eq!(chunk.read_op(0), Some(OpCode::Constant));
        assert_eq!(chunk.read_u32(1), Some(0x0102_0304));
        assert_eq!(chunk.read_u16(10), Some(0x1234));
        assert_eq!(chunk.read_u16(11), None);
    }

    #[test]
    fn patch_branches() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::JumpIfFalse);
        chunk.write_byte(0);
        chunk.write_op(OpCode::JumpLong);
        chunk.write_u32(0);
        chunk.write_op(OpCode::PushTrue);

        chunk.patch_i8(1, 6);
        chunk.patch_i32(3, -7);
        assert_eq!(chunk.read_i8(1), Some(6));
        assert_eq!(chunk.read_i32(3), Some(-7));
        assert_eq!(chunk.branch_target(0), Some(8));
        assert_eq!(chunk.branch_target(2), Some(0));
        assert_eq!(chunk.branch_target(7), None);
    }

    #[test]
    fn opcodes_skip_operands() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::CallExternal);
        chunk.write_u32(0);
        chunk.write_u16(2);
        chunk.write_op(OpCode::Convert);
        chunk.write_byte(6);
        chunk.write_op(OpCode::Return);

        chunk.assert_opcodes(&[OpCode::CallExternal, OpCode::Convert, OpCode::Return]);
        chunk.assert_contains_opcodes(&[OpCode::CallExternal, OpCode::Return]);
    }

    #[test]
    #[should_panic(expected = "Bytecode mismatch")]
    fn assert_opcodes_failure() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::PushTrue);
        chunk.assert_opcodes(&[OpCode::PushFalse]);
    }

    #[test]
    fn tables_deduplicate() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.add_name("x"), 0);
        assert_eq!(chunk.add_name("y"), 1);
        assert_eq!(chunk.add_name("x"), 0);

        let ty = TypeHash::from_name("Money");
        assert_eq!(chunk.add_type(ty), chunk.add_type(ty));
        assert_eq!(chunk.type_at(0), Some(ty));

        let f = noop();
        let a = chunk.add_function(CallTarget::new("f", f.clone(), false, 1));
        let b = chunk.add_function(CallTarget::new("f", f.clone(), false, 1));
        let c = chunk.add_function(CallTarget::new("f", f, true, 1));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(chunk.functions().len(), 2);
    }

    #[test]
    fn temps_only_grow() {
        let mut chunk = Chunk::new();
        chunk.reserve_temps(2);
        chunk.reserve_temps(1);
        assert_eq!(chunk.temp_count(), 2);
    }
}
