//! ClassBuilder for registering host classes.
//!
//! ClassBuilder provides a fluent API for registering a class with fields,
//! properties, methods, operators, indexers and virtual properties. Members
//! are backed by [`NativeFn`]s; any closure taking a [`CallContext`] works.
//!
//! # Example
//!
//! ```
//! use flee_core::{CallContext, NativeError, primitives};
//! use flee_registry::SymbolRegistry;
//!
//! let mut registry = SymbolRegistry::with_builtins();
//! registry
//!     .register_class("Money")
//!     .static_method("Zero", primitives::DOUBLE, &[], |ctx: &mut CallContext<'_>| {
//!         ctx.set_return(0.0);
//!         Ok::<(), NativeError>(())
//!     })
//!     .build()
//!     .unwrap();
//! ```

use flee_core::{
    CallContext, ClassEntry, FieldEntry, FunctionEntry, NativeCallable, NativeError, NativeFn,
    PropertyEntry, RegistrationError, TypeHash, Value,
};

use crate::SymbolRegistry;

/// Builder for registering a class with a [`SymbolRegistry`].
///
/// Created by calling [`SymbolRegistry::register_class`]. Nothing is
/// registered until [`ClassBuilder::build`].
pub struct ClassBuilder<'r> {
    /// Registry the class is added to
    registry: &'r mut SymbolRegistry,
    /// Entry being assembled
    entry: ClassEntry,
}

impl<'r> ClassBuilder<'r> {
    pub(crate) fn new(registry: &'r mut SymbolRegistry, qualified_name: String) -> Self {
        let name = qualified_name
            .rsplit_once('.')
            .map_or(qualified_name.as_str(), |(_, simple)| simple)
            .to_string();
        Self {
            registry,
            entry: ClassEntry::new(name, qualified_name),
        }
    }

    /// Hash of the class being built.
    pub fn type_hash(&self) -> TypeHash {
        self.entry.type_hash
    }

    // === Type relationships ===

    /// Set the base class. Defaults to `object`.
    pub fn base(mut self, base: TypeHash) -> Self {
        self.entry.base_class = Some(base);
        self
    }

    /// Declare an implemented interface.
    pub fn interface(mut self, interface: TypeHash) -> Self {
        self.entry.interfaces.push(interface);
        self
    }

    // === Data members ===

    /// Public instance field.
    pub fn field<F>(mut self, name: &str, ty: TypeHash, getter: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = self.entry.type_hash;
        self.entry
            .fields
            .push(FieldEntry::new(name, hash, ty, NativeFn::new(getter)));
        self
    }

    /// Public static field, read on every evaluation.
    pub fn static_field<F>(mut self, name: &str, ty: TypeHash, getter: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = self.entry.type_hash;
        self.entry
            .fields
            .push(FieldEntry::new(name, hash, ty, NativeFn::new(getter)).as_static());
        self
    }

    /// Public constant, emitted inline.
    pub fn literal(mut self, name: &str, ty: TypeHash, value: Value) -> Self {
        let hash = self.entry.type_hash;
        self.entry
            .fields
            .push(FieldEntry::literal(name, hash, ty, value));
        self
    }

    /// Public instance property.
    pub fn property<F>(mut self, name: &str, ty: TypeHash, getter: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = self.entry.type_hash;
        self.entry
            .properties
            .push(PropertyEntry::new(name, hash, ty, NativeFn::new(getter)));
        self
    }

    /// Public static property.
    pub fn static_property<F>(mut self, name: &str, ty: TypeHash, getter: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = self.entry.type_hash;
        self.entry
            .properties
            .push(PropertyEntry::new(name, hash, ty, NativeFn::new(getter)).as_static());
        self
    }

    /// Property resolved by name on the instance at run time.
    ///
    /// The value comes from [`flee_core::HostObject::virtual_property`]; `ty`
    /// is the type the compiler assumes.
    pub fn virtual_property(mut self, name: &str, ty: TypeHash) -> Self {
        let hash = self.entry.type_hash;
        let property_name = name.to_string();
        let getter = NativeFn::new(move |ctx: &mut CallContext<'_>| {
            let Value::Object(object) = ctx.this()? else {
                return Err(NativeError::InvalidThis);
            };
            let value = object.inner().virtual_property(&property_name).ok_or_else(|| {
                NativeError::other(format!("virtual property '{property_name}' is not defined"))
            })?;
            ctx.set_return(value);
            Ok(())
        });
        self.entry
            .virtual_properties
            .push(PropertyEntry::new(name, hash, ty, getter));
        self
    }

    /// Add a prepared field entry, e.g. one with restricted visibility.
    pub fn add_field(mut self, field: FieldEntry) -> Self {
        self.entry.fields.push(field);
        self
    }

    /// Add a prepared property entry.
    pub fn add_property(mut self, property: PropertyEntry) -> Self {
        self.entry.properties.push(property);
        self
    }

    // === Functions ===

    /// Public instance method.
    pub fn method<F>(self, name: &str, return_type: TypeHash, params: &[TypeHash], f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = self.entry.type_hash;
        let entry = with_params(FunctionEntry::new(name, hash, return_type), params);
        self.add_method(entry.with_native(NativeFn::new(f)))
    }

    /// Public static method.
    pub fn static_method<F>(
        self,
        name: &str,
        return_type: TypeHash,
        params: &[TypeHash],
        f: F,
    ) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = self.entry.type_hash;
        let entry = with_params(FunctionEntry::static_fn(name, hash, return_type), params);
        self.add_method(entry.with_native(NativeFn::new(f)))
    }

    /// Public static method whose last parameter is a parameter array of
    /// `element`. The native receives the tail packed into one array value.
    pub fn static_variadic<F>(
        self,
        name: &str,
        return_type: TypeHash,
        fixed: &[TypeHash],
        element: TypeHash,
        f: F,
    ) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = self.entry.type_hash;
        let entry = with_params(FunctionEntry::static_fn(name, hash, return_type), fixed)
            .with_variadic("values", element);
        self.add_method(entry.with_native(NativeFn::new(f)))
    }

    /// Overloaded operator, e.g. `op_Addition(left, right)`.
    pub fn operator<F>(self, name: &str, return_type: TypeHash, operands: &[TypeHash], f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        self.static_method(name, return_type, operands, f)
    }

    /// User-defined implicit conversion `from -> to`.
    pub fn implicit_conversion<F>(self, from: TypeHash, to: TypeHash, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        self.static_method("op_Implicit", to, &[from], f)
    }

    /// Default indexer (`value[args]`).
    pub fn indexer<F>(mut self, return_type: TypeHash, params: &[TypeHash], f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let hash = self.entry.type_hash;
        let entry = with_params(FunctionEntry::new("Indexer", hash, return_type), params);
        self.entry.indexers.push(entry.with_native(NativeFn::new(f)));
        self
    }

    /// Add a prepared function entry.
    pub fn add_method(mut self, method: FunctionEntry) -> Self {
        self.entry.methods.push(method);
        self
    }

    /// Register the class.
    pub fn build(self) -> Result<TypeHash, RegistrationError> {
        self.registry.register_type(self.entry)
    }
}

fn with_params(mut entry: FunctionEntry, params: &[TypeHash]) -> FunctionEntry {
    for (i, ty) in params.iter().enumerate() {
        entry = entry.with_param(format!("arg{i}"), *ty);
    }
    entry
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use flee_core::{HostObject, MemberKinds, SymbolResolver, primitives};

    #[derive(Debug)]
    struct Row;

    impl HostObject for Row {
        fn type_hash(&self) -> TypeHash {
            TypeHash::from_name("Row")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn virtual_property(&self, name: &str) -> Option<Value> {
            (name == "Total").then_some(Value::Double(12.5))
        }
    }

    fn noop(ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        ctx.set_return(Value::Null);
        Ok(())
    }

    #[test]
    fn builds_members() {
        let mut registry = SymbolRegistry::with_builtins();
        let hash = registry
            .register_class("Shapes.Circle")
            .field("Radius", primitives::DOUBLE, noop)
            .property("Area", primitives::DOUBLE, noop)
            .method("Scale", primitives::DOUBLE, &[primitives::DOUBLE], noop)
            .operator("op_Addition", hash_of("Shapes.Circle"), &[hash_of("Shapes.Circle"), hash_of("Shapes.Circle")], noop)
            .build()
            .unwrap();

        let class = registry.get_type(hash).and_then(|t| t.as_class()).unwrap();
        assert_eq!(class.name, "Circle");
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.properties.len(), 1);
        assert_eq!(class.methods.len(), 2);
        assert!(class.methods[1].is_static);
        assert_eq!(class.methods[0].params[0].name, "arg0");
        assert_eq!(registry.find_members(hash, "Area", MemberKinds::DATA).len(), 1);
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let mut registry = SymbolRegistry::with_builtins();
        let result = registry
            .register_class("Twice")
            .field("X", primitives::INT32, noop)
            .property("X", primitives::INT32, noop)
            .build();
        assert!(matches!(result, Err(RegistrationError::DuplicateMember { .. })));
    }

    #[test]
    fn variadic_and_conversion_shapes() {
        let mut registry = SymbolRegistry::with_builtins();
        let hash = registry
            .register_class("Stats")
            .static_variadic("Sum", primitives::DOUBLE, &[], primitives::DOUBLE, noop)
            .implicit_conversion(hash_of("Stats"), primitives::DOUBLE, noop)
            .build()
            .unwrap();
        let class = registry.get_type(hash).and_then(|t| t.as_class()).unwrap();
        assert!(class.methods[0].is_variadic());
        assert_eq!(
            class.methods[0].params[0].ty,
            TypeHash::array_of(primitives::DOUBLE)
        );
        assert_eq!(class.methods[1].name, "op_Implicit");
        assert_eq!(class.methods[1].return_type, primitives::DOUBLE);
    }

    #[test]
    fn virtual_property_reads_host_object() {
        let mut registry = SymbolRegistry::with_builtins();
        let hash = registry
            .register_class("Row")
            .virtual_property("Total", primitives::DOUBLE)
            .virtual_property("Missing", primitives::DOUBLE)
            .build()
            .unwrap();

        let row = Value::object(Row);
        let total = registry.find_virtual_property(hash, "Total", true).unwrap();
        assert_eq!(total.getter.invoke(Some(&row), &[]).unwrap(), Value::Double(12.5));

        let missing = registry.find_virtual_property(hash, "Missing", true).unwrap();
        assert!(missing.getter.invoke(Some(&row), &[]).is_err());
    }

    fn hash_of(name: &str) -> TypeHash {
        TypeHash::from_name(name)
    }
}
