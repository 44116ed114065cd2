//! Importing host types into expressions.
//!
//! Expressions only see the static members of types that were imported.
//! [`ExpressionImports`] builds the [`ImportScope`] handed to the compiler,
//! looking types up by name in the registry.
//!
//! ```ignore
//! imports.add_type("Math")?;                 // Max(1, 2)
//! imports.add_type_as_namespace("Math")?;    // Math.Max(1, 2)
//! imports.add_method("Math", "Sqrt")?;       // Sqrt(4.0), nothing else
//! imports.add_namespace("geo").add_type("Geometry")?.finish();
//! ```

use std::sync::Arc;

use flee_compiler::{Import, ImportScope};
use flee_core::{MemberKinds, MemberRef, SymbolResolver, TypeEntry, TypeHash};
use flee_registry::SymbolRegistry;
use thiserror::Error;

/// Failure resolving an import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("no type named '{0}' is registered")]
    UnknownType(String),

    #[error("type '{ty}' has no static method named '{method}'")]
    UnknownMethod { ty: String, method: String },
}

/// The imports of one expression context.
#[derive(Debug, Clone)]
pub struct ExpressionImports {
    registry: Arc<SymbolRegistry>,
    scope: ImportScope,
    case_sensitive: bool,
}

impl ExpressionImports {
    pub fn new(registry: Arc<SymbolRegistry>) -> Self {
        Self {
            registry,
            scope: ImportScope::new(),
            case_sensitive: false,
        }
    }

    pub(crate) fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
    }

    /// Make the static members of a type visible without qualification.
    pub fn add_type(&mut self, type_name: &str) -> Result<&mut Self, ImportError> {
        let import = self.type_import(type_name, false)?;
        self.scope.add(import);
        Ok(self)
    }

    /// Make the static members of a type visible through the type's name.
    pub fn add_type_as_namespace(&mut self, type_name: &str) -> Result<&mut Self, ImportError> {
        let import = self.type_import(type_name, true)?;
        self.scope.add(import);
        Ok(self)
    }

    /// Make one static method (all of its overloads) visible.
    pub fn add_method(&mut self, type_name: &str, method: &str) -> Result<&mut Self, ImportError> {
        let import = self.method_import(type_name, method)?;
        self.scope.add(import);
        Ok(self)
    }

    /// Start a named group of imports.
    pub fn add_namespace(&mut self, name: &str) -> NamespaceBuilder<'_> {
        NamespaceBuilder {
            name: name.to_string(),
            members: Vec::new(),
            imports: self,
        }
    }

    /// Import every primitive type plus `string` and `object` by its
    /// expression name, so `int.Parse`-style static members resolve.
    pub fn import_builtin_types(&mut self) -> &mut Self {
        const BUILTINS: [&str; 14] = [
            "bool", "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float",
            "double", "char", "string", "object",
        ];
        for name in BUILTINS {
            if let Ok(import) = self.type_import(name, true) {
                self.scope.add(import);
            }
        }
        self
    }

    /// Whether a top-level import is addressable by `name`.
    pub fn has_namespace(&self, name: &str) -> bool {
        self.scope.root().find_import(name, self.case_sensitive).is_some()
    }

    /// Scope handed to the compiler.
    pub fn scope(&self) -> &ImportScope {
        &self.scope
    }

    pub fn clear(&mut self) {
        self.scope = ImportScope::new();
    }

    fn find_type(&self, type_name: &str) -> Result<&TypeEntry, ImportError> {
        self.registry
            .lookup_type(type_name, self.case_sensitive)
            .ok_or_else(|| ImportError::UnknownType(type_name.to_string()))
    }

    fn type_import(&self, type_name: &str, as_namespace: bool) -> Result<Import, ImportError> {
        let entry = self.find_type(type_name)?;
        Ok(Import::Type {
            ty: entry.type_hash(),
            name: entry.name().to_string(),
            as_namespace,
        })
    }

    fn method_import(&self, type_name: &str, method: &str) -> Result<Import, ImportError> {
        let entry = self.find_type(type_name)?;
        let ty: TypeHash = entry.type_hash();
        let kinds = MemberKinds::METHOD.with_case(self.case_sensitive);
        let found = self
            .registry
            .find_members(ty, method, kinds)
            .into_iter()
            .find(MemberRef::is_static);

        match found {
            Some(member) => Ok(Import::Method {
                ty,
                name: member.name().to_string(),
            }),
            None => Err(ImportError::UnknownMethod {
                ty: entry.name().to_string(),
                method: method.to_string(),
            }),
        }
    }
}

/// Collects the members of a named import group.
pub struct NamespaceBuilder<'a> {
    imports: &'a mut ExpressionImports,
    name: String,
    members: Vec<Import>,
}

impl NamespaceBuilder<'_> {
    pub fn add_type(mut self, type_name: &str) -> Result<Self, ImportError> {
        let import = self.imports.type_import(type_name, false)?;
        self.members.push(import);
        Ok(self)
    }

    pub fn add_type_as_namespace(mut self, type_name: &str) -> Result<Self, ImportError> {
        let import = self.imports.type_import(type_name, true)?;
        self.members.push(import);
        Ok(self)
    }

    pub fn add_method(mut self, type_name: &str, method: &str) -> Result<Self, ImportError> {
        let import = self.imports.method_import(type_name, method)?;
        self.members.push(import);
        Ok(self)
    }

    /// Add the group to the imports.
    pub fn finish(self) {
        self.imports.scope.add(Import::Namespace {
            name: self.name,
            members: self.members,
        });
    }
}
