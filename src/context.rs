//! Expression contexts.
//!
//! An [`ExpressionContext`] holds everything expressions are compiled
//! against: the host registry, the owner, options, imports and variables.
//! Compiling on one context is serialized by a lock around its parse arena;
//! the resulting [`Expression`]s are independent and thread safe.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use bumpalo::Bump;
use flee_compiler::{CompileScope, CompiledExpression, ExpressionOptions, ExternalSymbols};
use flee_core::{CompileError, FromValue, MessageCatalog, TypeHash, Value, primitives};
use flee_parser::{IdentifierAnalyzer, Parser, ParserOptions};
use flee_registry::SymbolRegistry;
use parking_lot::Mutex;
use tracing::debug;

use crate::calc::SharedResults;
use crate::expression::{Expression, GenericExpression};
use crate::imports::ExpressionImports;
use crate::variables::VariableCollection;

/// Compile-time environment for expressions.
pub struct ExpressionContext {
    registry: Arc<SymbolRegistry>,
    owner: Value,
    owner_type: Option<TypeHash>,
    options: ExpressionOptions,
    parser_options: ParserOptions,
    imports: ExpressionImports,
    variables: VariableCollection,
    messages: Arc<MessageCatalog>,
    calc: Option<SharedResults>,
    arena: Arc<Mutex<Bump>>,
}

impl ExpressionContext {
    /// A context without an owner, imports or variables.
    pub fn new(registry: Arc<SymbolRegistry>) -> Self {
        Self {
            owner: Value::Null,
            owner_type: None,
            options: ExpressionOptions::default(),
            parser_options: ParserOptions::default(),
            imports: ExpressionImports::new(Arc::clone(&registry)),
            variables: VariableCollection::new(Arc::clone(&registry)),
            messages: Arc::new(MessageCatalog::new()),
            calc: None,
            arena: Arc::new(Mutex::new(Bump::new())),
            registry,
        }
    }

    /// Set the owner, typed by its runtime value.
    pub fn with_owner(self, owner: impl Into<Value>) -> Self {
        let owner = owner.into();
        let ty = owner.type_hash();
        self.with_typed_owner(owner, ty)
    }

    /// Set the owner with an explicit static type, for null owners or
    /// owners viewed as a base class.
    pub fn with_typed_owner(mut self, owner: impl Into<Value>, owner_type: TypeHash) -> Self {
        self.owner = owner.into();
        self.owner_type = Some(owner_type);
        self
    }

    pub fn with_options(mut self, options: ExpressionOptions) -> Self {
        self.set_options(options);
        self
    }

    pub fn with_parser_options(mut self, parser_options: ParserOptions) -> Self {
        self.parser_options = parser_options;
        self
    }

    /// Replace the message templates used for compile errors.
    pub fn with_messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = Arc::new(messages);
        self
    }

    /// A copy of this context. Variables are shared unless
    /// `clone_variables` is set.
    pub fn clone_context(&self, clone_variables: bool) -> Self {
        let variables = if clone_variables {
            self.variables.deep_clone()
        } else {
            self.variables.clone()
        };
        Self {
            registry: Arc::clone(&self.registry),
            owner: self.owner.clone(),
            owner_type: self.owner_type,
            options: self.options.clone(),
            parser_options: self.parser_options.clone(),
            imports: self.imports.clone(),
            variables,
            messages: Arc::clone(&self.messages),
            calc: self.calc.clone(),
            arena: Arc::new(Mutex::new(Bump::new())),
        }
    }

    /// A copy that can address the entries of a calculation engine.
    pub(crate) fn attach_to_engine(&self, results: SharedResults) -> Self {
        let mut context = self.clone_context(false);
        context.calc = Some(results);
        context
    }

    // ==========================================================================
    // Accessors
    // ==========================================================================

    pub fn registry(&self) -> &Arc<SymbolRegistry> {
        &self.registry
    }

    pub fn owner(&self) -> &Value {
        &self.owner
    }

    pub fn owner_type(&self) -> Option<TypeHash> {
        self.owner_type
    }

    pub(crate) fn set_owner_value(&mut self, owner: Value) {
        self.owner = owner;
    }

    pub fn options(&self) -> &ExpressionOptions {
        &self.options
    }

    /// Replace the options. Variables and imports follow the new case
    /// sensitivity.
    pub fn set_options(&mut self, options: ExpressionOptions) {
        self.variables.set_case_sensitive(options.case_sensitive);
        self.imports.set_case_sensitive(options.case_sensitive);
        self.options = options;
    }

    pub fn parser_options(&self) -> &ParserOptions {
        &self.parser_options
    }

    pub fn imports(&self) -> &ExpressionImports {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut ExpressionImports {
        &mut self.imports
    }

    pub fn variables(&self) -> &VariableCollection {
        &self.variables
    }

    pub(crate) fn calc_results(&self) -> Option<&SharedResults> {
        self.calc.as_ref()
    }

    // ==========================================================================
    // Compilation
    // ==========================================================================

    /// Compile an expression returning a value of whatever type it has.
    pub fn compile_dynamic(&self, text: &str) -> Result<Expression, CompileError> {
        let (compiled, _) = self.compile_tracked(text)?;
        Ok(Expression::new(compiled, text, self.clone_context(false)))
    }

    /// Compile an expression whose result is converted to `T`.
    pub fn compile_generic<T: FromValue>(&self, text: &str) -> Result<GenericExpression<T>, CompileError> {
        let mut context = self.clone_context(false);
        if let Some(ty) = T::type_hash() {
            context.options.result_type = Some(ty);
        }
        let (compiled, _) = context.compile_tracked(text)?;
        Ok(GenericExpression::new(Expression::new(compiled, text, context)))
    }

    /// Compile, also returning the calculation engine entries the
    /// expression reads.
    pub(crate) fn compile_tracked(&self, text: &str) -> Result<(CompiledExpression, Vec<String>), CompileError> {
        let symbols = ContextSymbols {
            context: self,
            references: RefCell::new(Vec::new()),
        };
        let mut scope = CompileScope::new(
            self.registry.as_ref(),
            &self.options,
            self.imports.scope(),
            &self.messages,
        )
        .with_externals(&symbols);
        if let Some(owner_type) = self.owner_type {
            scope = scope.with_owner(owner_type);
        }

        let compiled = {
            let mut arena = self.arena.lock();
            arena.reset();
            let expr = Parser::parse_expression(text, &arena, &self.parser_options)?;
            flee_compiler::compile_expr(expr, &scope)?
        };
        debug!(text, "compiled expression");
        Ok((compiled, symbols.references.into_inner()))
    }

    /// Identifiers an expression reads from its environment, without
    /// compiling it.
    pub fn parse_identifiers(&self, text: &str) -> Result<Vec<String>, CompileError> {
        let mut arena = self.arena.lock();
        arena.reset();
        let expr = Parser::parse_expression(text, &arena, &self.parser_options)?;
        Ok(IdentifierAnalyzer::analyze(expr)
            .into_iter()
            .map(str::to_string)
            .collect())
    }
}

impl fmt::Debug for ExpressionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionContext")
            .field("owner", &self.owner)
            .field("owner_type", &self.owner_type)
            .field("options", &self.options)
            .field("imports", &self.imports.scope().imports().len())
            .field("variables", &self.variables)
            .field("calc_engine", &self.calc.is_some())
            .finish()
    }
}

/// Answers the compiler's questions about variables, engine entries and
/// on-demand functions.
struct ContextSymbols<'a> {
    context: &'a ExpressionContext,
    references: RefCell<Vec<String>>,
}

impl ExternalSymbols for ContextSymbols<'_> {
    fn variable_type(&self, name: &str) -> Option<TypeHash> {
        self.context.variables.variable_type(name)
    }

    fn calc_engine_attached(&self) -> bool {
        self.context.calc.is_some()
    }

    fn calc_result_type(&self, name: &str) -> Option<TypeHash> {
        let results = self.context.calc.as_ref()?.read();
        let slot = results.get(name)?;
        self.references.borrow_mut().push(slot.name.clone());
        // Entries still compiling read as int until their type is known.
        Some(slot.ty.unwrap_or(primitives::INT32))
    }

    fn function_type(&self, name: &str, args: &[TypeHash]) -> Option<TypeHash> {
        self.context.variables.function_type(name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::CompileErrorReason;

    fn context() -> ExpressionContext {
        ExpressionContext::new(Arc::new(SymbolRegistry::with_builtins()))
    }

    #[test]
    fn compiles_against_variables() {
        let ctx = context();
        ctx.variables().add("x", 2.5).unwrap();
        let expr = ctx.compile_dynamic("x * 2").unwrap();
        assert_eq!(expr.result_type(), primitives::DOUBLE);
        assert_eq!(expr.evaluate().unwrap(), Value::Double(5.0));
    }

    #[test]
    fn generic_compilation_converts_the_result() {
        let ctx = context();
        let expr = ctx.compile_generic::<f64>("1 + 2").unwrap();
        assert_eq!(expr.evaluate().unwrap(), 3.0);

        let err = ctx.compile_generic::<bool>("1 + 2").unwrap_err();
        assert_eq!(err.reason(), CompileErrorReason::TypeMismatch);
    }

    #[test]
    fn clones_share_variables_unless_asked() {
        let ctx = context();
        ctx.variables().add("a", 1).unwrap();
        let shared = ctx.clone_context(false);
        let copied = ctx.clone_context(true);
        assert!(shared.variables().shares_storage(ctx.variables()));
        assert!(!copied.variables().shares_storage(ctx.variables()));
    }

    #[test]
    fn options_change_name_matching() {
        let mut ctx = context();
        ctx.variables().add("Rate", 0.5).unwrap();
        assert!(ctx.compile_dynamic("rate").is_ok());

        ctx.set_options(ExpressionOptions::default().with_case_sensitive(true));
        let err = ctx.compile_dynamic("rate").unwrap_err();
        assert_eq!(err.reason(), CompileErrorReason::UndefinedName);
        assert!(ctx.compile_dynamic("Rate").is_ok());
    }

    #[test]
    fn identifiers_are_listed_without_compiling() {
        let ctx = context();
        let names = ctx.parse_identifiers("a + b.Length * max(c, 1)").unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn syntax_errors_surface() {
        let err = context().compile_dynamic("1 +").unwrap_err();
        assert_eq!(err.reason(), CompileErrorReason::SyntaxError);
    }
}
