//! Interface type entry.
//!
//! Interfaces can be tagged with a [`CollectionKind`], which is how the `in`
//! operator finds a membership test on arbitrary host collections.

use crate::TypeHash;

use super::FunctionEntry;

/// Collection protocols understood by the `in` operator, in search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Typed collection with a `Contains(element)` method.
    GenericCollection { element: TypeHash },
    /// Typed map with a `ContainsKey(key)` method.
    GenericMap { key: TypeHash, value: TypeHash },
    /// Untyped list with `Contains(object)`.
    List,
    /// Untyped map with `Contains(object)`.
    Map,
}

impl CollectionKind {
    /// Search priority; lower is tried first.
    pub fn priority(&self) -> u8 {
        match self {
            CollectionKind::GenericCollection { .. } => 0,
            CollectionKind::GenericMap { .. } => 1,
            CollectionKind::List => 2,
            CollectionKind::Map => 3,
        }
    }

    /// Name of the membership method.
    pub fn contains_method(&self) -> &'static str {
        match self {
            CollectionKind::GenericMap { .. } => "ContainsKey",
            _ => "Contains",
        }
    }
}

/// Registry entry for an interface.
#[derive(Debug, Clone)]
pub struct InterfaceEntry {
    pub name: String,
    pub qualified_name: String,
    pub type_hash: TypeHash,
    /// Inherited interfaces.
    pub base_interfaces: Vec<TypeHash>,
    pub methods: Vec<FunctionEntry>,
    /// Collection protocol this interface represents, if any.
    pub collection: Option<CollectionKind>,
}

impl InterfaceEntry {
    /// Create an empty interface.
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        Self {
            name: name.into(),
            type_hash: TypeHash::from_name(&qualified_name),
            qualified_name,
            base_interfaces: Vec::new(),
            methods: Vec::new(),
            collection: None,
        }
    }

    /// Add an inherited interface.
    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.base_interfaces.push(base);
        self
    }

    /// Add a method.
    pub fn with_method(mut self, method: FunctionEntry) -> Self {
        self.methods.push(method);
        self
    }

    /// Tag as a collection protocol.
    pub fn with_collection(mut self, kind: CollectionKind) -> Self {
        self.collection = Some(kind);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    #[test]
    fn collection_priority_order() {
        let mut kinds = [
            CollectionKind::Map,
            CollectionKind::GenericMap {
                key: primitives::STRING,
                value: primitives::INT32,
            },
            CollectionKind::List,
            CollectionKind::GenericCollection {
                element: primitives::INT32,
            },
        ];
        kinds.sort_by_key(CollectionKind::priority);
        assert!(matches!(kinds[0], CollectionKind::GenericCollection { .. }));
        assert!(matches!(kinds[1], CollectionKind::GenericMap { .. }));
        assert_eq!(kinds[2], CollectionKind::List);
        assert_eq!(kinds[3].contains_method(), "Contains");
        assert_eq!(kinds[1].contains_method(), "ContainsKey");
    }
}
