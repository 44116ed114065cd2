//! TypeEntry enum for unified type storage.

use crate::TypeHash;
use crate::primitive::PrimitiveKind;

use super::{
    ArrayEntry, ClassEntry, EnumEntry, FieldEntry, FunctionEntry, InterfaceEntry, PrimitiveEntry,
    PropertyEntry,
};

/// Unified type entry for registry storage.
#[derive(Debug, Clone)]
pub enum TypeEntry {
    /// Primitive type (int, double, bool, ...).
    Primitive(PrimitiveEntry),
    /// Class type, including `string` and `object`.
    Class(ClassEntry),
    Enum(EnumEntry),
    Interface(InterfaceEntry),
    Array(ArrayEntry),
}

impl TypeEntry {
    /// Get the type hash for this entry.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            TypeEntry::Primitive(e) => e.type_hash,
            TypeEntry::Class(e) => e.type_hash,
            TypeEntry::Enum(e) => e.type_hash,
            TypeEntry::Interface(e) => e.type_hash,
            TypeEntry::Array(e) => e.type_hash,
        }
    }

    /// Get the unqualified name.
    pub fn name(&self) -> &str {
        match self {
            TypeEntry::Primitive(e) => e.name(),
            TypeEntry::Class(e) => &e.name,
            TypeEntry::Enum(e) => &e.name,
            TypeEntry::Interface(e) => &e.name,
            TypeEntry::Array(e) => &e.name,
        }
    }

    /// Get the qualified name (with namespace).
    pub fn qualified_name(&self) -> &str {
        match self {
            TypeEntry::Class(e) => &e.qualified_name,
            TypeEntry::Enum(e) => &e.qualified_name,
            TypeEntry::Interface(e) => &e.qualified_name,
            other => other.name(),
        }
    }

    /// Reference types can be null and take part in reference conversions.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            TypeEntry::Class(_) | TypeEntry::Interface(_) | TypeEntry::Array(_)
        )
    }

    /// The primitive kind, for primitive entries.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            TypeEntry::Primitive(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Base class. Interfaces and arrays report `object`.
    pub fn base_class(&self) -> Option<TypeHash> {
        match self {
            TypeEntry::Class(e) => e.base_class,
            TypeEntry::Interface(_) | TypeEntry::Array(_) => Some(crate::primitives::OBJECT),
            _ => None,
        }
    }

    /// Directly implemented (or inherited, for interfaces) interfaces.
    pub fn interfaces(&self) -> &[TypeHash] {
        match self {
            TypeEntry::Class(e) => &e.interfaces,
            TypeEntry::Interface(e) => &e.base_interfaces,
            TypeEntry::Array(e) => &e.interfaces,
            _ => &[],
        }
    }

    /// Methods declared directly on this type.
    pub fn methods(&self) -> &[FunctionEntry] {
        match self {
            TypeEntry::Class(e) => &e.methods,
            TypeEntry::Interface(e) => &e.methods,
            TypeEntry::Array(e) => &e.methods,
            _ => &[],
        }
    }

    /// Properties declared directly on this type.
    pub fn properties(&self) -> &[PropertyEntry] {
        match self {
            TypeEntry::Class(e) => &e.properties,
            TypeEntry::Array(e) => &e.properties,
            _ => &[],
        }
    }

    /// Fields declared directly on this type.
    pub fn fields(&self) -> &[FieldEntry] {
        match self {
            TypeEntry::Class(e) => &e.fields,
            TypeEntry::Enum(e) => &e.fields,
            _ => &[],
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TypeEntry::Enum(_))
    }

    pub fn as_class(&self) -> Option<&ClassEntry> {
        match self {
            TypeEntry::Class(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassEntry> {
        match self {
            TypeEntry::Class(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumEntry> {
        match self {
            TypeEntry::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceEntry> {
        match self {
            TypeEntry::Interface(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayEntry> {
        match self {
            TypeEntry::Array(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PrimitiveEntry> for TypeEntry {
    fn from(entry: PrimitiveEntry) -> Self {
        TypeEntry::Primitive(entry)
    }
}

impl From<ClassEntry> for TypeEntry {
    fn from(entry: ClassEntry) -> Self {
        TypeEntry::Class(entry)
    }
}

impl From<EnumEntry> for TypeEntry {
    fn from(entry: EnumEntry) -> Self {
        TypeEntry::Enum(entry)
    }
}

impl From<InterfaceEntry> for TypeEntry {
    fn from(entry: InterfaceEntry) -> Self {
        TypeEntry::Interface(entry)
    }
}

impl From<ArrayEntry> for TypeEntry {
    fn from(entry: ArrayEntry) -> Self {
        TypeEntry::Array(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    #[test]
    fn reference_classification() {
        let int: TypeEntry = PrimitiveEntry::new(PrimitiveKind::Int32).into();
        let class: TypeEntry = ClassEntry::global("Player").into();
        let array: TypeEntry = ArrayEntry::new(primitives::INT32, "int").into();
        let color: TypeEntry = EnumEntry::new("Color", "Color").into();
        assert!(!int.is_reference());
        assert!(class.is_reference());
        assert!(array.is_reference());
        assert!(!color.is_reference());
        assert!(color.is_enum());
        assert_eq!(int.primitive_kind(), Some(PrimitiveKind::Int32));
        assert_eq!(array.base_class(), Some(primitives::OBJECT));
    }

    #[test]
    fn names() {
        let class: TypeEntry = ClassEntry::new("Vector", "Geometry.Vector").into();
        assert_eq!(class.name(), "Vector");
        assert_eq!(class.qualified_name(), "Geometry.Vector");
        let int: TypeEntry = PrimitiveEntry::new(PrimitiveKind::Int32).into();
        assert_eq!(int.qualified_name(), "int");
    }
}
