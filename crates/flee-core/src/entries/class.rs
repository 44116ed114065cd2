//! Class type entry.
//!
//! Classes are host reference types. `string` and `object` are registered as
//! classes too, so member lookup treats them like any other type.

use crate::{TypeHash, primitives};

use super::{FieldEntry, FunctionEntry, PropertyEntry};

/// Registry entry for a class type.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    /// Unqualified name.
    pub name: String,
    /// Fully qualified name (with namespace).
    pub qualified_name: String,
    /// Type hash for identity.
    pub type_hash: TypeHash,

    // === Inheritance ===
    /// Base class. Every class except `object` derives from something.
    pub base_class: Option<TypeHash>,
    /// Implemented interfaces.
    pub interfaces: Vec<TypeHash>,

    // === Members ===
    pub methods: Vec<FunctionEntry>,
    pub properties: Vec<PropertyEntry>,
    pub fields: Vec<FieldEntry>,
    /// Default indexer overloads (`obj[i]`).
    pub indexers: Vec<FunctionEntry>,
    /// Properties only found when normal member lookup fails.
    pub virtual_properties: Vec<PropertyEntry>,
}

impl ClassEntry {
    /// Create a class entry deriving from `object`.
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        let name = name.into();
        let qualified_name = qualified_name.into();
        let type_hash = TypeHash::from_name(&qualified_name);
        let base_class = (type_hash != primitives::OBJECT).then_some(primitives::OBJECT);
        Self {
            name,
            qualified_name,
            type_hash,
            base_class,
            interfaces: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            fields: Vec::new(),
            indexers: Vec::new(),
            virtual_properties: Vec::new(),
        }
    }

    /// Create a class in the global namespace.
    pub fn global(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name)
    }

    // === Builder Methods ===

    /// Set the base class.
    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.base_class = Some(base);
        self
    }

    /// Add an implemented interface.
    pub fn with_interface(mut self, interface: TypeHash) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Add a method.
    pub fn with_method(mut self, method: FunctionEntry) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a property.
    pub fn with_property(mut self, property: PropertyEntry) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldEntry) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a default indexer overload.
    pub fn with_indexer(mut self, indexer: FunctionEntry) -> Self {
        self.indexers.push(indexer);
        self
    }

    /// Add a virtual property.
    pub fn with_virtual_property(mut self, property: PropertyEntry) -> Self {
        self.virtual_properties.push(property);
        self
    }
}
