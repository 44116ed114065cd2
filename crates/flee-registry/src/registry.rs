//! SymbolRegistry - the host type system.
//!
//! This module provides [`SymbolRegistry`], the central storage for every host
//! type an expression can see: primitives, `string`, `object`, classes, enums,
//! interfaces and the array type of each of them. It implements
//! [`SymbolResolver`], which is the only view of the host the compiler has.
//!
//! # Storage Model
//!
//! - **Types**: all entries stored in a single map by `TypeHash`
//! - **Names**: qualified name and alias indexes pointing at hashes
//! - **Arrays**: every registered non-array type gets an array type whose
//!   collection interface makes `x in array` work
//!
//! # Thread Safety
//!
//! The registry is populated single-threaded, then shared read-only (usually
//! behind an `Arc`) by every context compiling against it.
//!
//! # Example
//!
//! ```
//! use flee_core::{SymbolResolver, TypeHash, primitives};
//! use flee_registry::SymbolRegistry;
//!
//! let registry = SymbolRegistry::with_builtins();
//! assert!(registry.get_type(primitives::INT32).is_some());
//! assert!(registry.get_type(TypeHash::array_of(primitives::STRING)).is_some());
//! assert_eq!(registry.lookup_type("System.Double", true).unwrap().type_hash(), primitives::DOUBLE);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};

use flee_core::{
    ArrayEntry, CallContext, ClassEntry, CollectionKind, FunctionEntry, InterfaceEntry,
    MemberKinds, MemberRef, NativeError, NativeFn, PrimitiveEntry, PrimitiveKind, PropertyEntry,
    RegistrationError, SymbolResolver, TypeEntry, TypeHash, Value, primitives,
};

use crate::builder::ClassBuilder;

/// Host type registry.
#[derive(Default)]
pub struct SymbolRegistry {
    /// Types by hash (PRIMARY storage).
    types: FxHashMap<TypeHash, TypeEntry>,

    /// Qualified name -> hash.
    names: FxHashMap<String, TypeHash>,

    /// Alternative names, e.g. `System.Int32` -> `int`.
    aliases: FxHashMap<String, TypeHash>,

    /// Namespaces derived from qualified names.
    namespaces: FxHashSet<String>,
}

impl SymbolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with primitives, `object`, `string` and `Math`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_builtins(&mut registry);
        registry
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a type entry, along with its array type.
    pub fn register_type(&mut self, entry: impl Into<TypeEntry>) -> Result<TypeHash, RegistrationError> {
        let entry = entry.into();
        let hash = entry.type_hash();
        let qualified = entry.qualified_name().to_string();

        if self.types.contains_key(&hash) || self.names.contains_key(&qualified) {
            return Err(RegistrationError::DuplicateType(qualified));
        }
        self.validate(&entry)?;

        if let Some((namespace, _)) = qualified.rsplit_once('.') {
            let mut prefix = String::new();
            for part in namespace.split('.') {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(part);
                self.namespaces.insert(prefix.clone());
            }
        }

        let is_array = matches!(entry, TypeEntry::Array(_));
        self.names.insert(qualified, hash);
        self.types.insert(hash, entry);

        if !is_array && hash != primitives::VOID {
            self.ensure_array(hash);
        }
        Ok(hash)
    }

    /// Start registering a class.
    ///
    /// ```
    /// use flee_core::{SymbolResolver, Value, primitives};
    /// use flee_registry::SymbolRegistry;
    ///
    /// let mut registry = SymbolRegistry::with_builtins();
    /// let hash = registry
    ///     .register_class("Geometry.Point")
    ///     .literal("Dimensions", primitives::INT32, Value::Int32(2))
    ///     .build()
    ///     .unwrap();
    /// assert!(registry.has_namespace("Geometry"));
    /// assert_eq!(registry.lookup_type("geometry.point", false).unwrap().type_hash(), hash);
    /// ```
    pub fn register_class(&mut self, qualified_name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder::new(self, qualified_name.into())
    }

    /// Register an alternative name for a type.
    pub fn register_alias(
        &mut self,
        alias: impl Into<String>,
        target: TypeHash,
    ) -> Result<(), RegistrationError> {
        let alias = alias.into();
        if !self.types.contains_key(&target) {
            return Err(RegistrationError::TypeNotFound(target.to_string()));
        }
        if self.names.contains_key(&alias) || self.aliases.contains_key(&alias) {
            return Err(RegistrationError::DuplicateType(alias));
        }
        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Register every primitive kind and `void`.
    pub fn register_all_primitives(&mut self) {
        for kind in PrimitiveKind::ALL {
            if !self.types.contains_key(&kind.type_hash()) {
                let _ = self.register_type(PrimitiveEntry::new(kind));
            }
        }
    }

    /// Make sure the array type of `element` exists and return its hash.
    ///
    /// The array gets a `Length` property and implements a generic collection
    /// interface over its element with a `Contains` method.
    pub fn ensure_array(&mut self, element: TypeHash) -> TypeHash {
        let array_hash = TypeHash::array_of(element);
        if self.types.contains_key(&array_hash) {
            return array_hash;
        }

        let element_name = self.type_name(element);
        let collection = self.collection_interface(element, &element_name);

        let mut array = ArrayEntry::new(element, &element_name);
        array.properties.push(PropertyEntry::new(
            "Length",
            array_hash,
            primitives::INT32,
            NativeFn::new(|ctx: &mut CallContext<'_>| {
                let items = array_items(ctx)?;
                ctx.set_return(items.len() as i32);
                Ok(())
            }),
        ));
        array.interfaces.push(collection);

        self.names.insert(array.name.clone(), array_hash);
        self.types.insert(array_hash, TypeEntry::Array(array));
        array_hash
    }

    /// The `ICollection<T>` interface arrays of `element` implement.
    fn collection_interface(&mut self, element: TypeHash, element_name: &str) -> TypeHash {
        let name = format!("ICollection<{element_name}>");
        let hash = TypeHash::from_name(&name);
        if self.types.contains_key(&hash) {
            return hash;
        }

        let contains = FunctionEntry::new("Contains", hash, primitives::BOOL)
            .with_param("item", element)
            .with_native(NativeFn::new(|ctx: &mut CallContext<'_>| {
                let needle = ctx.arg(0)?;
                let found = array_items(ctx)?.iter().any(|item| item == needle);
                ctx.set_return(found);
                Ok(())
            }));
        let interface = InterfaceEntry::new(name.clone(), name.clone())
            .with_collection(CollectionKind::GenericCollection { element })
            .with_method(contains);

        self.names.insert(name, hash);
        self.types.insert(hash, TypeEntry::Interface(interface));
        hash
    }

    fn validate(&self, entry: &TypeEntry) -> Result<(), RegistrationError> {
        if let Some(base) = entry.base_class() {
            if !self.types.contains_key(&base) && base != entry.type_hash() {
                return Err(RegistrationError::TypeNotFound(base.to_string()));
            }
        }
        for iface in entry.interfaces() {
            if !matches!(self.types.get(iface), Some(TypeEntry::Interface(_))) {
                return Err(RegistrationError::TypeNotFound(iface.to_string()));
            }
        }

        match entry {
            TypeEntry::Class(class) => {
                let mut data = FxHashSet::default();
                for name in class
                    .fields
                    .iter()
                    .map(|f| &f.name)
                    .chain(class.properties.iter().map(|p| &p.name))
                {
                    if !data.insert(name.as_str()) {
                        return Err(RegistrationError::DuplicateMember {
                            type_name: class.qualified_name.clone(),
                            member: name.clone(),
                        });
                    }
                }
                let mut signatures = FxHashSet::default();
                for method in &class.methods {
                    if !signatures.insert(method.hash()) {
                        return Err(RegistrationError::DuplicateMember {
                            type_name: class.qualified_name.clone(),
                            member: method.name.clone(),
                        });
                    }
                }
            }
            TypeEntry::Enum(e) => {
                let mut seen = FxHashSet::default();
                for value in &e.values {
                    if !seen.insert(value.name.as_str()) {
                        return Err(RegistrationError::DuplicateEnumValue {
                            value_name: value.name.clone(),
                            enum_name: e.qualified_name.clone(),
                        });
                    }
                }
                if !e.underlying.is_integral() {
                    return Err(RegistrationError::Invalid {
                        name: e.qualified_name.clone(),
                        reason: format!("'{}' is not an integral type", e.underlying.name()),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// Whether `namespace` prefixes a registered type.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    /// Whether `namespace` prefixes a registered type, ignoring case.
    pub fn find_namespace(&self, namespace: &str, case_sensitive: bool) -> Option<&str> {
        if case_sensitive {
            return self.namespaces.get(namespace).map(String::as_str);
        }
        self.namespaces
            .iter()
            .find(|ns| ns.eq_ignore_ascii_case(namespace))
            .map(String::as_str)
    }

    /// Types declared directly in `namespace`.
    pub fn types_in_namespace<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a TypeEntry> {
        self.types.values().filter(move |entry| {
            entry
                .qualified_name()
                .rsplit_once('.')
                .is_some_and(|(ns, _)| ns == namespace)
        })
    }

    /// All registered types.
    pub fn types(&self) -> impl Iterator<Item = &TypeEntry> {
        self.types.values()
    }

    /// Number of registered types, including arrays and their interfaces.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Types whose members are searched for `owner`, most derived first.
    fn member_search_order(&self, owner: TypeHash) -> Vec<TypeHash> {
        let mut order = Vec::new();
        match self.types.get(&owner) {
            Some(TypeEntry::Interface(_)) => {
                order.push(owner);
                order.extend(self.all_interfaces(owner));
            }
            Some(_) => {
                let mut current = Some(owner);
                while let Some(ty) = current {
                    if order.contains(&ty) {
                        break;
                    }
                    order.push(ty);
                    current = self.types.get(&ty).and_then(TypeEntry::base_class);
                }
            }
            None => return order,
        }
        if !order.contains(&primitives::OBJECT) {
            order.push(primitives::OBJECT);
        }
        order
    }

    /// Walk the class chain of `owner`, most derived first.
    fn class_chain(&self, owner: TypeHash) -> impl Iterator<Item = &ClassEntry> {
        let mut current = Some(owner);
        std::iter::from_fn(move || {
            let class = self.types.get(&current?)?.as_class()?;
            current = class.base_class;
            Some(class)
        })
    }
}

/// Data members hide base data members by name, methods hide base methods
/// with the same signature.
fn is_hidden(derived: &[MemberRef<'_>], candidate: &MemberRef<'_>, kinds: MemberKinds) -> bool {
    derived.iter().any(|member| match (member, candidate) {
        (MemberRef::Method(a), MemberRef::Method(b)) => {
            kinds.name_matches(&a.name, &b.name) && a.param_types().eq(b.param_types())
        }
        (MemberRef::Method(_), _) | (_, MemberRef::Method(_)) => false,
        (a, b) => kinds.name_matches(a.name(), b.name()),
    })
}

fn array_items<'a>(ctx: &CallContext<'a>) -> Result<&'a [Value], NativeError> {
    match ctx.this()? {
        Value::Array(array) => Ok(&array.items),
        _ => Err(NativeError::InvalidThis),
    }
}

impl SymbolResolver for SymbolRegistry {
    fn get_type(&self, hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&hash)
    }

    fn lookup_type(&self, name: &str, case_sensitive: bool) -> Option<&TypeEntry> {
        let exact = self
            .names
            .get(name)
            .or_else(|| self.aliases.get(name))
            .copied();
        let hash = match exact {
            Some(hash) => Some(hash),
            None if !case_sensitive => self
                .names
                .iter()
                .chain(self.aliases.iter())
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
                .map(|(_, hash)| *hash),
            None => None,
        };
        hash.and_then(|h| self.types.get(&h))
    }

    fn find_members(&self, owner: TypeHash, name: &str, kinds: MemberKinds) -> Vec<MemberRef<'_>> {
        let mut found: Vec<MemberRef<'_>> = Vec::new();
        for ty in self.member_search_order(owner) {
            let Some(entry) = self.types.get(&ty) else {
                continue;
            };
            let level_start = found.len();
            let mut level = Vec::new();

            if kinds.contains(MemberKinds::FIELD) {
                level.extend(
                    entry
                        .fields()
                        .iter()
                        .filter(|f| kinds.name_matches(&f.name, name))
                        .map(MemberRef::Field),
                );
            }
            if kinds.contains(MemberKinds::PROPERTY) {
                level.extend(
                    entry
                        .properties()
                        .iter()
                        .filter(|p| kinds.name_matches(&p.name, name))
                        .map(MemberRef::Property),
                );
            }
            if kinds.contains(MemberKinds::METHOD) {
                level.extend(
                    entry
                        .methods()
                        .iter()
                        .filter(|m| kinds.name_matches(&m.name, name))
                        .map(MemberRef::Method),
                );
            }

            for member in level {
                if !is_hidden(&found[..level_start], &member, kinds) {
                    found.push(member);
                }
            }
        }
        found
    }

    fn find_default_indexer_members(&self, ty: TypeHash) -> Vec<&FunctionEntry> {
        let mut found: Vec<&FunctionEntry> = Vec::new();
        for class in self.class_chain(ty) {
            let level_start = found.len();
            for indexer in &class.indexers {
                let hidden = found[..level_start]
                    .iter()
                    .any(|f| f.param_types().eq(indexer.param_types()));
                if !hidden {
                    found.push(indexer);
                }
            }
        }
        found
    }

    fn find_virtual_property(
        &self,
        owner: TypeHash,
        name: &str,
        case_sensitive: bool,
    ) -> Option<&PropertyEntry> {
        let kinds = MemberKinds::PROPERTY.with_case(case_sensitive);
        self.class_chain(owner)
            .flat_map(|class| class.virtual_properties.iter())
            .find(|p| kinds.name_matches(&p.name, name))
    }
}

impl std::fmt::Debug for SymbolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolRegistry")
            .field("type_count", &self.types.len())
            .field("alias_count", &self.aliases.len())
            .field("namespaces", &self.namespaces)
            .finish()
    }
}
