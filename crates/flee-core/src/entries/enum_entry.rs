//! Enum type entry.

use crate::primitive::PrimitiveKind;
use crate::value::Value;
use crate::TypeHash;

use super::{EnumValue, FieldEntry};

/// Registry entry for an enumeration.
///
/// Members are exposed to member lookup as literal static fields.
#[derive(Debug, Clone)]
pub struct EnumEntry {
    pub name: String,
    pub qualified_name: String,
    pub type_hash: TypeHash,
    /// Underlying integral type.
    pub underlying: PrimitiveKind,
    pub values: Vec<EnumValue>,
    /// One literal field per value.
    pub fields: Vec<FieldEntry>,
}

impl EnumEntry {
    /// Create an empty enum with an `int` underlying type.
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        Self {
            name: name.into(),
            type_hash: TypeHash::from_name(&qualified_name),
            qualified_name,
            underlying: PrimitiveKind::Int32,
            values: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Set the underlying integral type.
    pub fn with_underlying(mut self, underlying: PrimitiveKind) -> Self {
        self.underlying = underlying;
        self
    }

    /// Add a member.
    pub fn with_value(mut self, name: impl Into<String>, value: i64) -> Self {
        let name = name.into();
        self.fields.push(FieldEntry::literal(
            name.clone(),
            self.type_hash,
            self.type_hash,
            Value::Enum {
                ty: self.type_hash,
                value,
            },
        ));
        self.values.push(EnumValue::new(name, value));
        self
    }

    /// Look up a member value by name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.values.iter().find(|v| v.name == name).map(|v| v.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_become_literal_fields() {
        let color = EnumEntry::new("Color", "Color")
            .with_value("Red", 0)
            .with_value("Green", 1);
        assert_eq!(color.value_of("Green"), Some(1));
        assert_eq!(color.value_of("Blue"), None);
        let green = &color.fields[1];
        assert!(green.is_literal() && green.is_static);
        assert_eq!(green.ty, color.type_hash);
        assert_eq!(
            green.constant,
            Some(Value::Enum {
                ty: color.type_hash,
                value: 1
            })
        );
    }
}
