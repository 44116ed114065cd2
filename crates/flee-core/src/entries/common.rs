//! Data members shared by class and enum entries.

use crate::native_fn::NativeFn;
use crate::resolver::Visibility;
use crate::value::Value;
use crate::TypeHash;

/// A field of a host type.
///
/// A field with a `constant` is a literal: the compiler emits the constant
/// instead of reading the field. Enum members are literal static fields.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    /// Field name.
    pub name: String,
    /// Type declaring the field.
    pub declaring_type: TypeHash,
    /// Field type.
    pub ty: TypeHash,
    pub is_static: bool,
    pub visibility: Visibility,
    /// Explicit owner access override.
    pub owner_access: Option<bool>,
    /// Reads the field. Receives the instance as `this` unless static.
    pub getter: Option<NativeFn>,
    /// Literal value.
    pub constant: Option<Value>,
}

impl FieldEntry {
    /// A public instance field read through `getter`.
    pub fn new(
        name: impl Into<String>,
        declaring_type: TypeHash,
        ty: TypeHash,
        getter: NativeFn,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            ty,
            is_static: false,
            visibility: Visibility::Public,
            owner_access: None,
            getter: Some(getter),
            constant: None,
        }
    }

    /// A public static literal field.
    pub fn literal(
        name: impl Into<String>,
        declaring_type: TypeHash,
        ty: TypeHash,
        value: Value,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            ty,
            is_static: true,
            visibility: Visibility::Public,
            owner_access: None,
            getter: None,
            constant: Some(value),
        }
    }

    /// Make the field static.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Force owner accessibility regardless of the access policy.
    pub fn with_owner_access(mut self, allow: bool) -> Self {
        self.owner_access = Some(allow);
        self
    }

    /// Whether the compiler should emit the constant value.
    pub fn is_literal(&self) -> bool {
        self.constant.is_some()
    }
}

/// A property of a host type, read through a getter.
///
/// The getter's visibility is the property's visibility.
#[derive(Debug, Clone)]
pub struct PropertyEntry {
    /// Property name.
    pub name: String,
    /// Type declaring the property.
    pub declaring_type: TypeHash,
    /// Property type.
    pub ty: TypeHash,
    pub is_static: bool,
    pub visibility: Visibility,
    /// Explicit owner access override.
    pub owner_access: Option<bool>,
    /// Reads the property.
    pub getter: NativeFn,
}

impl PropertyEntry {
    /// A public instance property.
    pub fn new(
        name: impl Into<String>,
        declaring_type: TypeHash,
        ty: TypeHash,
        getter: NativeFn,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            ty,
            is_static: false,
            visibility: Visibility::Public,
            owner_access: None,
            getter,
        }
    }

    /// Make the property static.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Force owner accessibility regardless of the access policy.
    pub fn with_owner_access(mut self, allow: bool) -> Self {
        self.owner_access = Some(allow);
        self
    }
}

/// A named enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Member name.
    pub name: String,
    /// Underlying integer value.
    pub value: i64,
}

impl EnumValue {
    /// Create an enum member.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
