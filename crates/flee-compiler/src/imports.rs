//! Imported host types and functions.
//!
//! Expressions see the static members of imported types as if they were
//! declared globally. An import can also be reached by name: a type imported
//! "as namespace" is addressed as `Math.Max(1, 2)`, and a named
//! [`Import::Namespace`] groups imports under a prefix (`geo.Distance(a, b)`).
//!
//! The [`ImportScope`] is the unnamed root namespace handed to the compiler.

use flee_core::{MemberKinds, MemberRef, SymbolResolver, TypeEntry, TypeHash};

/// One import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// Static members of a type.
    Type {
        ty: TypeHash,
        /// Name the type is addressed by when `as_namespace` is set.
        name: String,
        /// Members are reached through the type name instead of directly.
        as_namespace: bool,
    },
    /// The static overloads of one method.
    Method { ty: TypeHash, name: String },
    /// A named group of imports.
    Namespace { name: String, members: Vec<Import> },
}

impl Import {
    /// Name this import is addressed by, if it can be used as a namespace.
    pub fn namespace_name(&self) -> Option<&str> {
        match self {
            Import::Type {
                name,
                as_namespace: true,
                ..
            } => Some(name),
            Import::Namespace { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Static members named `name` reachable through this import, paired
    /// with the type they were found on.
    pub fn find_members<'r>(
        &self,
        name: &str,
        kinds: MemberKinds,
        resolver: &'r dyn SymbolResolver,
    ) -> Vec<(TypeHash, MemberRef<'r>)> {
        match self {
            Import::Type { ty, .. } => static_members(*ty, name, kinds, resolver),
            Import::Method { ty, name: method } => {
                if !kinds.contains(MemberKinds::METHOD) || !kinds.name_matches(method, name) {
                    return Vec::new();
                }
                static_members(*ty, method, MemberKinds::METHOD | (kinds & MemberKinds::IGNORE_CASE), resolver)
            }
            Import::Namespace { members, .. } => members
                .iter()
                .filter(|import| import.namespace_name().is_none())
                .flat_map(|import| import.find_members(name, kinds, resolver))
                .collect(),
        }
    }

    /// A nested import addressed by `name`.
    pub fn find_import(&self, name: &str, case_sensitive: bool) -> Option<&Import> {
        let Import::Namespace { members, .. } = self else {
            return None;
        };
        members.iter().find(|import| {
            import
                .namespace_name()
                .is_some_and(|n| names_equal(n, name, case_sensitive))
        })
    }

    /// Display name, for messages.
    pub fn name(&self) -> &str {
        match self {
            Import::Type { name, .. } | Import::Method { name, .. } | Import::Namespace { name, .. } => {
                name
            }
        }
    }
}

fn static_members<'r>(
    ty: TypeHash,
    name: &str,
    kinds: MemberKinds,
    resolver: &'r dyn SymbolResolver,
) -> Vec<(TypeHash, MemberRef<'r>)> {
    resolver
        .find_members(ty, name, kinds)
        .into_iter()
        .filter(MemberRef::is_static)
        .map(|member| (ty, member))
        .collect()
}

fn names_equal(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

/// The root of the imports visible to an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportScope {
    root: Import,
}

impl Default for ImportScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportScope {
    pub fn new() -> Self {
        Self {
            root: Import::Namespace {
                name: String::new(),
                members: Vec::new(),
            },
        }
    }

    /// The unnamed root namespace.
    pub fn root(&self) -> &Import {
        &self.root
    }

    /// Add an import to the root namespace.
    pub fn add(&mut self, import: Import) {
        if let Import::Namespace { members, .. } = &mut self.root {
            members.push(import);
        }
    }

    /// Imports in the root namespace.
    pub fn imports(&self) -> &[Import] {
        match &self.root {
            Import::Namespace { members, .. } => members,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.imports().is_empty()
    }

    /// Resolve a possibly dotted type name.
    ///
    /// Registered names win; otherwise the leading parts walk the import
    /// namespaces and the last part names an imported type.
    pub fn find_type<'r>(
        &self,
        parts: &[&str],
        case_sensitive: bool,
        resolver: &'r dyn SymbolResolver,
    ) -> Option<&'r TypeEntry> {
        let qualified = parts.join(".");
        if let Some(entry) = resolver.lookup_type(&qualified, case_sensitive) {
            return Some(entry);
        }

        let (last, namespaces) = parts.split_last()?;
        let mut current = &self.root;
        for part in namespaces {
            current = current.find_import(part, case_sensitive)?;
        }
        let Import::Namespace { members, .. } = current else {
            return None;
        };
        members.iter().find_map(|import| match import {
            Import::Type { ty, name, .. } if names_equal(name, last, case_sensitive) => {
                resolver.get_type(*ty)
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::{CallContext, NativeError, Value, primitives};
    use flee_registry::SymbolRegistry;

    fn noop(ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        ctx.set_return(Value::Int32(0));
        Ok(())
    }

    fn registry() -> (SymbolRegistry, TypeHash) {
        let mut registry = SymbolRegistry::with_builtins();
        let geo = registry
            .register_class("Geo")
            .static_method("Distance", primitives::DOUBLE, &[primitives::DOUBLE], noop)
            .method("Area", primitives::DOUBLE, &[], noop)
            .literal("Origin", primitives::INT32, Value::Int32(0))
            .build()
            .unwrap();
        (registry, geo)
    }

    fn math(registry: &SymbolRegistry) -> TypeHash {
        registry.lookup_type("Math", true).unwrap().type_hash()
    }

    #[test]
    fn type_import_exposes_static_members() {
        let (registry, geo) = registry();
        let import = Import::Type {
            ty: geo,
            name: "Geo".into(),
            as_namespace: false,
        };
        let found = import.find_members("distance", MemberKinds::METHOD.with_case(false), &registry);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, geo);

        // Instance members are not imported.
        assert!(import.find_members("Area", MemberKinds::METHOD, &registry).is_empty());
    }

    #[test]
    fn root_skips_namespaced_imports() {
        let (registry, geo) = registry();
        let mut scope = ImportScope::new();
        scope.add(Import::Type {
            ty: math(&registry),
            name: "Math".into(),
            as_namespace: true,
        });
        scope.add(Import::Type {
            ty: geo,
            name: "Geo".into(),
            as_namespace: false,
        });

        let root = scope.root();
        assert!(root.find_members("Max", MemberKinds::METHOD, &registry).is_empty());
        assert_eq!(root.find_members("Origin", MemberKinds::DATA, &registry).len(), 1);

        let math_import = root.find_import("math", false).unwrap();
        assert!(!math_import.find_members("Max", MemberKinds::METHOD, &registry).is_empty());
        assert!(root.find_import("math", true).is_none());
        assert!(root.find_import("Geo", false).is_none());
    }

    #[test]
    fn method_import() {
        let (registry, _) = registry();
        let import = Import::Method {
            ty: math(&registry),
            name: "Max".into(),
        };
        assert_eq!(import.find_members("Max", MemberKinds::METHOD, &registry).len(), 3);
        assert!(import.find_members("Min", MemberKinds::METHOD, &registry).is_empty());
        assert!(import.find_members("Max", MemberKinds::DATA, &registry).is_empty());
    }

    #[test]
    fn nested_namespaces() {
        let (registry, geo) = registry();
        let mut scope = ImportScope::new();
        scope.add(Import::Namespace {
            name: "shapes".into(),
            members: vec![Import::Type {
                ty: geo,
                name: "Geo".into(),
                as_namespace: false,
            }],
        });

        let shapes = scope.root().find_import("Shapes", false).unwrap();
        assert_eq!(shapes.name(), "shapes");
        assert_eq!(shapes.find_members("Distance", MemberKinds::METHOD, &registry).len(), 1);
        assert!(scope.root().find_members("Distance", MemberKinds::METHOD, &registry).is_empty());
    }

    #[test]
    fn find_type_through_imports() {
        let (registry, geo) = registry();
        let mut scope = ImportScope::new();
        scope.add(Import::Namespace {
            name: "shapes".into(),
            members: vec![Import::Type {
                ty: geo,
                name: "Shape".into(),
                as_namespace: false,
            }],
        });

        assert_eq!(
            scope.find_type(&["int"], false, &registry).map(TypeEntry::type_hash),
            Some(primitives::INT32)
        );
        assert_eq!(
            scope.find_type(&["shapes", "Shape"], false, &registry).map(TypeEntry::type_hash),
            Some(geo)
        );
        assert!(scope.find_type(&["shapes", "Nope"], false, &registry).is_none());
        assert!(!scope.is_empty());
    }
}
