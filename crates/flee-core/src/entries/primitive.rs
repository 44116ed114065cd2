//! Primitive and array type entries.

use crate::primitive::PrimitiveKind;
use crate::TypeHash;

use super::{FunctionEntry, PropertyEntry};

/// Registry entry for a built-in value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveEntry {
    pub kind: PrimitiveKind,
    pub type_hash: TypeHash,
}

impl PrimitiveEntry {
    /// Entry for a primitive kind.
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            type_hash: kind.type_hash(),
        }
    }

    /// Expression name of the type.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Registry entry for a single-dimension array type.
///
/// Arrays implement a generic collection interface over their element, so
/// `x in array` works without special cases.
#[derive(Debug, Clone)]
pub struct ArrayEntry {
    pub element: TypeHash,
    pub type_hash: TypeHash,
    /// Display name, `int[]`.
    pub name: String,
    pub properties: Vec<PropertyEntry>,
    pub methods: Vec<FunctionEntry>,
    pub interfaces: Vec<TypeHash>,
}

impl ArrayEntry {
    /// Entry for the array of `element`.
    pub fn new(element: TypeHash, element_name: &str) -> Self {
        Self {
            element,
            type_hash: TypeHash::array_of(element),
            name: format!("{element_name}[]"),
            properties: Vec::new(),
            methods: Vec::new(),
            interfaces: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    #[test]
    fn array_entry_identity() {
        let ints = ArrayEntry::new(primitives::INT32, "int");
        assert_eq!(ints.type_hash, TypeHash::array_of(primitives::INT32));
        assert_eq!(ints.name, "int[]");
        assert_eq!(PrimitiveEntry::new(PrimitiveKind::Int32).name(), "int");
    }
}
