//! Function entries.
//!
//! A [`FunctionEntry`] describes a host method, static function, operator
//! overload, implicit conversion or indexer. The compiler only looks at the
//! signature; the evaluator calls the [`NativeFn`].

use crate::native_fn::NativeFn;
use crate::resolver::Visibility;
use crate::{TypeHash, primitives};

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamEntry {
    /// Parameter name, for messages.
    pub name: String,
    /// Declared type. For a variadic parameter this is the array type.
    pub ty: TypeHash,
    /// Element type of a trailing parameter array (`params T[]`).
    pub variadic_element: Option<TypeHash>,
}

impl ParamEntry {
    /// A plain parameter.
    pub fn new(name: impl Into<String>, ty: TypeHash) -> Self {
        Self {
            name: name.into(),
            ty,
            variadic_element: None,
        }
    }

    /// A trailing parameter array of `element`.
    pub fn variadic(name: impl Into<String>, element: TypeHash) -> Self {
        Self {
            name: name.into(),
            ty: TypeHash::array_of(element),
            variadic_element: Some(element),
        }
    }

    /// Whether this is a parameter array.
    pub fn is_variadic(&self) -> bool {
        self.variadic_element.is_some()
    }
}

/// Registry entry for a function.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    /// Member name (`Max`, `op_Addition`, `get_Item`).
    pub name: String,
    /// Type declaring the function.
    pub declaring_type: TypeHash,
    /// Parameters in order.
    pub params: Vec<ParamEntry>,
    /// Return type, `void` when the function returns nothing.
    pub return_type: TypeHash,
    /// Static functions take no instance.
    pub is_static: bool,
    pub visibility: Visibility,
    /// Explicit owner access override, bypassing the owner access policy.
    pub owner_access: Option<bool>,
    /// Implementation, absent for signature-only entries.
    pub native: Option<NativeFn>,
}

impl FunctionEntry {
    /// Create a public instance method with no parameters.
    pub fn new(name: impl Into<String>, declaring_type: TypeHash, return_type: TypeHash) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            params: Vec::new(),
            return_type,
            is_static: false,
            visibility: Visibility::Public,
            owner_access: None,
            native: None,
        }
    }

    /// Create a public static function.
    pub fn static_fn(
        name: impl Into<String>,
        declaring_type: TypeHash,
        return_type: TypeHash,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::new(name, declaring_type, return_type)
        }
    }

    // === Builder Methods ===

    /// Append a parameter.
    pub fn with_param(mut self, name: impl Into<String>, ty: TypeHash) -> Self {
        self.params.push(ParamEntry::new(name, ty));
        self
    }

    /// Append a trailing parameter array.
    pub fn with_variadic(mut self, name: impl Into<String>, element: TypeHash) -> Self {
        self.params.push(ParamEntry::variadic(name, element));
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

    /// Attach the implementation.
    pub fn with_native(mut self, native: NativeFn) -> Self {
        self.native = Some(native);
        self
    }

    // === Queries ===

    /// Identity derived from owner, name and parameter types.
    pub fn hash(&self) -> TypeHash {
        let params: Vec<TypeHash> = self.params.iter().map(|p| p.ty).collect();
        TypeHash::from_function(self.declaring_type, &self.name, &params)
    }

    /// Parameter types in order.
    pub fn param_types(&self) -> impl Iterator<Item = TypeHash> + '_ {
        self.params.iter().map(|p| p.ty)
    }

    /// Whether the last parameter is a parameter array.
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(ParamEntry::is_variadic)
    }

    /// Whether the function returns a value.
    pub fn has_return_value(&self) -> bool {
        self.return_type != primitives::VOID
    }
}

impl PartialEq for FunctionEntry {
    fn eq(&self, other: &Self) -> bool {
        // NativeFn has no meaningful equality; signatures identify functions.
        self.name == other.name
            && self.declaring_type == other.declaring_type
            && self.params == other.params
            && self.return_type == other.return_type
            && self.is_static == other.is_static
    }
}
