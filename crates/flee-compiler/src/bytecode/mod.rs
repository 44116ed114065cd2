//! Bytecode types for the expression compiler.
//!
//! - [`OpCode`] - The instruction set of the evaluator
//! - [`Chunk`] - Compiled bytecode plus its side tables
//! - [`ConstantPool`] - Deduplicated literal storage

mod chunk;
mod constant;
mod opcode;

pub use chunk::{CallTarget, Chunk};
pub use constant::ConstantPool;
pub use opcode::{BranchKind, OpCode};
