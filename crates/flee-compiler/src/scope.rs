//! Everything an expression can see while it compiles.
//!
//! A [`CompileScope`] bundles the host type system, the options, the
//! imports and the expression owner. Names the host type system does not
//! know (variables, calculation engine results, on-demand functions) are
//! answered by an [`ExternalSymbols`] implementation supplied by the caller.

use flee_core::{MessageCatalog, SymbolResolver, TypeHash};

use crate::imports::ImportScope;
use crate::options::ExpressionOptions;

/// Names resolved outside the host type system.
///
/// Only types are needed at compile time; values are looked up by name
/// when the expression is evaluated.
pub trait ExternalSymbols {
    /// Type of the variable `name`, if one is defined.
    fn variable_type(&self, name: &str) -> Option<TypeHash>;

    /// Whether the expression belongs to a calculation engine, making other
    /// engine entries addressable by name.
    fn calc_engine_attached(&self) -> bool {
        false
    }

    /// Result type of the calculation engine entry `name`.
    fn calc_result_type(&self, _name: &str) -> Option<TypeHash> {
        None
    }

    /// Return type of a function supplied at evaluation time.
    fn function_type(&self, _name: &str, _args: &[TypeHash]) -> Option<TypeHash> {
        None
    }
}

/// No variables, no engine, no on-demand functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternals;

impl ExternalSymbols for NoExternals {
    fn variable_type(&self, _name: &str) -> Option<TypeHash> {
        None
    }
}

static NO_EXTERNALS: NoExternals = NoExternals;

/// Read-only inputs of one compilation.
#[derive(Clone, Copy)]
pub struct CompileScope<'a> {
    pub resolver: &'a dyn SymbolResolver,
    pub options: &'a ExpressionOptions,
    pub imports: &'a ImportScope,
    pub messages: &'a MessageCatalog,
    /// Type of the expression owner; `None` for expressions without one.
    pub owner_type: Option<TypeHash>,
    pub externals: &'a dyn ExternalSymbols,
}

impl<'a> CompileScope<'a> {
    pub fn new(
        resolver: &'a dyn SymbolResolver,
        options: &'a ExpressionOptions,
        imports: &'a ImportScope,
        messages: &'a MessageCatalog,
    ) -> Self {
        Self {
            resolver,
            options,
            imports,
            messages,
            owner_type: None,
            externals: &NO_EXTERNALS,
        }
    }

    pub fn with_owner(mut self, owner_type: TypeHash) -> Self {
        self.owner_type = Some(owner_type);
        self
    }

    pub fn with_externals(mut self, externals: &'a dyn ExternalSymbols) -> Self {
        self.externals = externals;
        self
    }

    pub fn case_sensitive(&self) -> bool {
        self.options.case_sensitive
    }

    /// Display name of a type.
    pub fn type_name(&self, ty: TypeHash) -> String {
        self.resolver.type_name(ty)
    }
}

impl std::fmt::Debug for CompileScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileScope")
            .field("options", self.options)
            .field("imports", &self.imports.imports().len())
            .field("owner_type", &self.owner_type)
            .finish()
    }
}
