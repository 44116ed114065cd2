//! Constant pool for compiled expressions.
//!
//! The constant pool stores the literal values an expression pushes. Values
//! with a hashable identity are deduplicated; arrays and host objects coming
//! from literal fields are always appended.

use std::sync::Arc;

use flee_core::{TypeHash, Value};
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

/// Constant storage with deduplication.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    /// The actual constants.
    constants: Vec<Value>,
    /// Deduplication index: maps constant to its index.
    index: FxHashMap<ConstantKey, u32>,
}

/// Hashable identity of a constant.
///
/// Floats compare through `OrderedFloat`, which folds `-0.0` into `0.0`, so
/// the sign is kept alongside.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Null,
    Bool(bool),
    Char(char),
    /// Integral payload plus its exact type.
    Integral(TypeHash, i128),
    Single(OrderedFloat<f32>, bool),
    Double(OrderedFloat<f64>, bool),
    String(Arc<str>),
    Enum(TypeHash, i64),
}

impl ConstantPool {
    /// Create a new empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get existing constant, returns index.
    pub fn add(&mut self, value: Value) -> u32 {
        let Some(key) = Self::to_key(&value) else {
            return self.push(value);
        };
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.push(value);
        self.index.insert(key, idx);
        idx
    }

    fn push(&mut self, value: Value) -> u32 {
        let idx = self.constants.len() as u32;
        self.constants.push(value);
        idx
    }

    /// Get constant by index.
    pub fn get(&self, index: u32) -> Option<&Value> {
        self.constants.get(index as usize)
    }

    /// All constants, in index order.
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Number of constants.
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    fn to_key(value: &Value) -> Option<ConstantKey> {
        Some(match value {
            Value::Null => ConstantKey::Null,
            Value::Bool(b) => ConstantKey::Bool(*b),
            Value::Char(c) => ConstantKey::Char(*c),
            Value::Single(v) => ConstantKey::Single(OrderedFloat(*v), v.is_sign_negative()),
            Value::Double(v) => ConstantKey::Double(OrderedFloat(*v), v.is_sign_negative()),
            Value::String(s) => ConstantKey::String(s.clone()),
            Value::Enum { ty, value } => ConstantKey::Enum(*ty, *value),
            Value::Array(_) | Value::Object(_) => return None,
            integral => ConstantKey::Integral(integral.type_hash(), integral.as_i128()?),
        })
    }
}
