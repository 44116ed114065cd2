//! Expression compiler: AST to typed element tree.
//!
//! The [`ExprCompiler`] walks the parsed expression bottom-up. Every node
//! is resolved as soon as its children are: names are bound to host
//! members, operators to instructions or overloads, and operands are
//! wrapped in the conversions they need. The result is an [`Element`]
//! tree that only has to be emitted.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use flee_compiler::expr::ExprCompiler;
//! use flee_compiler::imports::ImportScope;
//! use flee_compiler::options::ExpressionOptions;
//! use flee_compiler::scope::CompileScope;
//! use flee_core::{MessageCatalog, primitives};
//! use flee_parser::{Parser, ParserOptions};
//! use flee_registry::SymbolRegistry;
//!
//! let registry = SymbolRegistry::with_builtins();
//! let options = ExpressionOptions::default();
//! let imports = ImportScope::new();
//! let messages = MessageCatalog::new();
//! let scope = CompileScope::new(&registry, &options, &imports, &messages);
//!
//! let arena = Bump::new();
//! let expr = Parser::parse_expression("1 + 2.5", &arena, &ParserOptions::default()).unwrap();
//! let element = ExprCompiler::new(&scope).compile_root(expr).unwrap();
//! assert_eq!(element.result_type(), primitives::DOUBLE);
//! ```

mod binary;
mod cast;
mod literals;
mod member;
mod ternary;
mod unary;

use std::fmt;

use flee_core::{
    CompileError, CompileErrorReason, MessageKey, Span, SymbolResolver, TypeHash,
};
use flee_parser::ast::Expr;

use crate::bytecode::CallTarget;
use crate::conversion::find_conversion;
use crate::elements::Element;
use crate::options::ExpressionOptions;
use crate::overload::{Candidate, OperatorCache, OperatorError};
use crate::scope::CompileScope;

pub(crate) type Result<T> = std::result::Result<T, CompileError>;

/// Builds the element tree of one expression.
pub struct ExprCompiler<'s, 'a> {
    scope: &'s CompileScope<'a>,
    operators: OperatorCache<'a>,
    /// Next free temporary slot.
    temps: u8,
}

impl<'s, 'a> ExprCompiler<'s, 'a> {
    pub fn new(scope: &'s CompileScope<'a>) -> Self {
        Self {
            scope,
            operators: OperatorCache::new(scope.resolver),
            temps: 0,
        }
    }

    /// Build the whole expression, converted to the requested result type.
    pub fn compile_root(&mut self, expr: &Expr<'_>) -> Result<Element> {
        let element = self.build(expr)?;
        let Some(target) = self.options().result_type else {
            return Ok(element);
        };

        let from = element.result_type();
        self.convert(element, target).ok_or_else(|| {
            self.error(
                CompileErrorReason::TypeMismatch,
                expr.span(),
                MessageKey::CannotConvertTypeToExpressionResult,
                &[&self.type_name(from), &self.type_name(target)],
            )
        })
    }

    /// Build one node.
    pub fn build(&mut self, expr: &Expr<'_>) -> Result<Element> {
        match expr {
            Expr::Literal(lit) => literals::build_literal(self, lit, false),
            Expr::Ident(_) | Expr::Member(_) | Expr::Call(_) | Expr::Index(_) => {
                member::build_chain(self, expr)
            }
            Expr::Binary(bin) => binary::build_binary(self, bin),
            Expr::Unary(un) => unary::build_unary(self, un),
            Expr::Paren(paren) => self.build(paren.expr),
            Expr::Conditional(cond) => ternary::build_conditional(self, cond),
            Expr::Cast(cast) => cast::build_cast(self, cast),
            Expr::In(in_expr) => binary::build_in(self, in_expr),
        }
    }

    // ==========================================================================
    // Shared helpers
    // ==========================================================================

    pub(crate) fn scope(&self) -> &'s CompileScope<'a> {
        self.scope
    }

    pub(crate) fn resolver(&self) -> &'a dyn SymbolResolver {
        self.scope.resolver
    }

    pub(crate) fn options(&self) -> &'a ExpressionOptions {
        self.scope.options
    }

    pub(crate) fn type_name(&self, ty: TypeHash) -> String {
        self.scope.type_name(ty)
    }

    /// A compile error with a catalog message.
    pub(crate) fn error(
        &self,
        reason: CompileErrorReason,
        span: Span,
        key: MessageKey,
        args: &[&dyn fmt::Display],
    ) -> CompileError {
        self.scope.messages.error(reason, span, key, args)
    }

    /// Comma separated type names of call arguments, for messages.
    pub(crate) fn argument_list(&self, types: &[TypeHash]) -> String {
        types
            .iter()
            .map(|&ty| self.type_name(ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Wrap `element` in its implicit conversion to `to`.
    pub(crate) fn convert(&self, element: Element, to: TypeHash) -> Option<Element> {
        let conversion = find_conversion(element.result_type(), to, self.resolver())?;
        Some(element.converted(conversion, false, to))
    }

    /// Reserve a temporary slot.
    pub(crate) fn alloc_temp(&mut self, span: Span) -> Result<u8> {
        let slot = self.temps;
        self.temps = slot.checked_add(1).ok_or_else(|| {
            CompileError::new(
                CompileErrorReason::SyntaxError,
                span,
                "too many nested 'in' lists",
            )
        })?;
        Ok(slot)
    }

    /// Find an overloaded binary operator for the operand types.
    pub(crate) fn find_binary_operator(
        &mut self,
        name: &'static str,
        left: TypeHash,
        right: TypeHash,
        symbol: &dyn fmt::Display,
        span: Span,
    ) -> Result<Option<Candidate<'a>>> {
        self.operators
            .find_binary(name, left, right)
            .map_err(|err| match err {
                OperatorError::DefinedOnBothTypes => self.error(
                    CompileErrorReason::AmbiguousMatch,
                    span,
                    MessageKey::AmbiguousOverloadedOperator,
                    &[&self.type_name(left), &self.type_name(right), symbol],
                ),
                OperatorError::Ambiguous => self.error(
                    CompileErrorReason::AmbiguousMatch,
                    span,
                    MessageKey::AmbiguousCallOfFunction,
                    &[&name, &self.argument_list(&[left, right])],
                ),
            })
    }

    /// Find an overloaded unary operator for the operand type.
    pub(crate) fn find_unary_operator(
        &mut self,
        name: &'static str,
        operand: TypeHash,
        span: Span,
    ) -> Result<Option<Candidate<'a>>> {
        self.operators.find_unary(name, operand).map_err(|_| {
            self.error(
                CompileErrorReason::AmbiguousMatch,
                span,
                MessageKey::AmbiguousCallOfFunction,
                &[&name, &self.type_name(operand)],
            )
        })
    }

    /// Bind a resolved call, converting each argument to its parameter.
    pub(crate) fn bind_call(
        &self,
        candidate: Candidate<'a>,
        instance: Option<Element>,
        args: Vec<Element>,
        span: Span,
    ) -> Result<Element> {
        let function = candidate.function;
        if !function.has_return_value() {
            return Err(self.error(
                CompileErrorReason::FunctionHasNoReturnValue,
                span,
                MessageKey::FunctionHasNoReturnValue,
                &[&function.name],
            ));
        }
        let Some(native) = function.native.clone() else {
            let types: Vec<TypeHash> = args.iter().map(Element::result_type).collect();
            return Err(self.error(
                CompileErrorReason::UndefinedName,
                span,
                MessageKey::UndefinedFunction,
                &[&function.name, &self.argument_list(&types)],
            ));
        };

        let param_array = candidate.param_array;
        let args: Vec<Element> = args
            .into_iter()
            .zip(candidate.conversions)
            .enumerate()
            .map(|(i, (arg, conversion))| {
                let target = match param_array {
                    Some(m) if i >= m.fixed => m.element,
                    _ => function.params[i].ty,
                };
                arg.converted(conversion, false, target)
            })
            .collect();

        let arg_count = match param_array {
            Some(m) => m.fixed + 1,
            None => args.len(),
        };
        let target = CallTarget::new(
            function.name.clone(),
            native,
            instance.is_some(),
            arg_count as u16,
        );
        Ok(Element::Call {
            instance: instance.map(Box::new),
            target,
            args,
            param_array,
            ty: function.return_type,
        })
    }
}

impl fmt::Debug for ExprCompiler<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprCompiler")
            .field("scope", self.scope)
            .field("temps", &self.temps)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Compile snippets against a builtin registry.

    use bumpalo::Bump;
    use rustc_hash::FxHashMap;

    use flee_core::{CompileErrorReason, MessageCatalog, SymbolResolver, TypeHash};
    use flee_parser::{Parser, ParserOptions};
    use flee_registry::SymbolRegistry;

    use super::{ExprCompiler, Result};
    use crate::elements::Element;
    use crate::imports::{Import, ImportScope};
    use crate::options::ExpressionOptions;
    use crate::scope::{CompileScope, ExternalSymbols};

    /// Variables, engine entries and on-demand functions by name.
    #[derive(Default)]
    pub struct Externals {
        pub variables: FxHashMap<String, TypeHash>,
        pub calc_results: Option<FxHashMap<String, TypeHash>>,
        pub functions: FxHashMap<String, TypeHash>,
    }

    impl ExternalSymbols for Externals {
        fn variable_type(&self, name: &str) -> Option<TypeHash> {
            self.variables.get(name).copied()
        }

        fn calc_engine_attached(&self) -> bool {
            self.calc_results.is_some()
        }

        fn calc_result_type(&self, name: &str) -> Option<TypeHash> {
            self.calc_results.as_ref()?.get(name).copied()
        }

        fn function_type(&self, name: &str, _args: &[TypeHash]) -> Option<TypeHash> {
            self.functions.get(name).copied()
        }
    }

    pub struct Fixture {
        pub registry: SymbolRegistry,
        pub options: ExpressionOptions,
        pub imports: ImportScope,
        pub messages: MessageCatalog,
        pub owner: Option<TypeHash>,
        pub externals: Externals,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self::with_registry(SymbolRegistry::with_builtins())
        }

        pub fn with_registry(registry: SymbolRegistry) -> Self {
            Self {
                registry,
                options: ExpressionOptions::default(),
                imports: ImportScope::new(),
                messages: MessageCatalog::new(),
                owner: None,
                externals: Externals::default(),
            }
        }

        pub fn variable(mut self, name: &str, ty: TypeHash) -> Self {
            self.externals.variables.insert(name.to_string(), ty);
            self
        }

        pub fn import_type(mut self, name: &str, as_namespace: bool) -> Self {
            let ty = self
                .registry
                .lookup_type(name, true)
                .map(|entry| entry.type_hash())
                .unwrap_or_else(|| panic!("type '{name}' is not registered"));
            self.imports.add(Import::Type {
                ty,
                name: name.to_string(),
                as_namespace,
            });
            self
        }

        pub fn build(&self, src: &str) -> Result<Element> {
            let arena = Bump::new();
            let expr = Parser::parse_expression(src, &arena, &ParserOptions::default())?;
            let mut scope = CompileScope::new(&self.registry, &self.options, &self.imports, &self.messages)
                .with_externals(&self.externals);
            if let Some(owner) = self.owner {
                scope = scope.with_owner(owner);
            }
            ExprCompiler::new(&scope).compile_root(expr)
        }

        pub fn result_type(&self, src: &str) -> TypeHash {
            match self.build(src) {
                Ok(element) => element.result_type(),
                Err(err) => panic!("'{src}' failed to compile: {err}"),
            }
        }

        pub fn reason(&self, src: &str) -> CompileErrorReason {
            match self.build(src) {
                Ok(element) => panic!("'{src}' compiled to {element:?}"),
                Err(err) => err.reason(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Fixture;
    use flee_core::{CompileErrorReason, primitives};

    #[test]
    fn root_converts_to_result_type() {
        let mut fixture = Fixture::new();
        fixture.options.result_type = Some(primitives::DOUBLE);
        assert_eq!(fixture.result_type("1 + 2"), primitives::DOUBLE);

        fixture.options.result_type = Some(primitives::OBJECT);
        assert_eq!(fixture.result_type("true"), primitives::OBJECT);
    }

    #[test]
    fn root_rejects_narrowing_result() {
        let mut fixture = Fixture::new();
        fixture.options.result_type = Some(primitives::INT32);
        assert_eq!(fixture.reason("1.5"), CompileErrorReason::TypeMismatch);
        assert_eq!(fixture.reason("\"a\""), CompileErrorReason::TypeMismatch);
    }

    #[test]
    fn parse_errors_surface_as_syntax_errors() {
        let fixture = Fixture::new();
        assert_eq!(fixture.reason("1 +"), CompileErrorReason::SyntaxError);
        assert_eq!(fixture.reason("(1"), CompileErrorReason::SyntaxError);
    }

    #[test]
    fn parentheses_are_transparent() {
        let fixture = Fixture::new();
        assert_eq!(fixture.build("((3))").unwrap(), fixture.build("3").unwrap());
    }
}
