//! Compiled expressions.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use flee_compiler::CompiledExpression;
use flee_core::{FromValue, SymbolResolver, TypeHash, Value};

use crate::context::ExpressionContext;
use crate::variables::fits;
use crate::vm::{self, Environment, EvalError};

/// A compiled expression bound to its context.
///
/// Evaluation reads the owner, the variables and any calculation engine
/// results as they are at the time of the call. The compiled code is shared
/// between clones; cloning deep copies the variables.
pub struct Expression {
    compiled: Arc<CompiledExpression>,
    text: Arc<str>,
    context: ExpressionContext,
}

impl Expression {
    pub(crate) fn new(compiled: CompiledExpression, text: &str, context: ExpressionContext) -> Self {
        Self {
            compiled: Arc::new(compiled),
            text: Arc::from(text),
            context,
        }
    }

    /// Run the expression.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn evaluate(&self) -> Result<Value, EvalError> {
        vm::execute(&self.compiled.chunk, &Runtime { context: &self.context })
    }

    /// Run the expression and extract a Rust value.
    pub fn evaluate_as<T: FromValue>(&self) -> Result<T, EvalError> {
        let value = self.evaluate()?;
        let actual = value.type_name();
        T::from_value(value).ok_or_else(|| EvalError::ResultType {
            expected: T::type_hash()
                .map(|ty| self.context.registry().type_name(ty))
                .unwrap_or_else(|| std::any::type_name::<T>().to_string()),
            actual,
        })
    }

    /// Source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn result_type(&self) -> TypeHash {
        self.compiled.result_type
    }

    pub fn compiled(&self) -> &CompiledExpression {
        &self.compiled
    }

    pub fn context(&self) -> &ExpressionContext {
        &self.context
    }

    pub fn owner(&self) -> &Value {
        self.context.owner()
    }

    /// Evaluate against a different owner of a compatible type.
    pub fn set_owner(&mut self, owner: impl Into<Value>) -> Result<(), EvalError> {
        let owner = owner.into();
        if let Some(expected) = self.context.owner_type()
            && !fits(self.context.registry().as_ref(), &owner, expected)
        {
            let registry = self.context.registry();
            return Err(EvalError::OwnerType {
                expected: registry.type_name(expected),
                actual: registry.type_name(owner.type_hash()),
            });
        }
        self.context.set_owner_value(owner);
        Ok(())
    }
}

impl Clone for Expression {
    fn clone(&self) -> Self {
        Self {
            compiled: Arc::clone(&self.compiled),
            text: Arc::clone(&self.text),
            context: self.context.clone_context(true),
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("text", &self.text)
            .field("result_type", &self.compiled.result_type)
            .finish_non_exhaustive()
    }
}

/// An [`Expression`] whose result is known to convert to `T`.
pub struct GenericExpression<T> {
    inner: Expression,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromValue> GenericExpression<T> {
    pub(crate) fn new(inner: Expression) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn evaluate(&self) -> Result<T, EvalError> {
        self.inner.evaluate_as()
    }

    pub fn text(&self) -> &str {
        self.inner.text()
    }

    pub fn expression(&self) -> &Expression {
        &self.inner
    }

    pub fn into_expression(self) -> Expression {
        self.inner
    }
}

impl<T> Clone for GenericExpression<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for GenericExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// What a running expression reads through its context.
struct Runtime<'a> {
    context: &'a ExpressionContext,
}

impl Environment for Runtime<'_> {
    fn owner(&self) -> &Value {
        self.context.owner()
    }

    fn variable(&self, name: &str) -> Result<Value, EvalError> {
        self.context.variables().load(name)
    }

    fn calc_result(&self, name: &str) -> Result<Value, EvalError> {
        self.context
            .calc_results()
            .and_then(|results| results.read().get(name).map(|slot| slot.value.clone()))
            .ok_or_else(|| EvalError::UnknownCalcEntry(name.to_string()))
    }

    fn call_function(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        self.context.variables().invoke_function(name, args)
    }

    fn resolver(&self) -> &dyn SymbolResolver {
        self.context.registry().as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::{HostObject, primitives};
    use flee_registry::SymbolRegistry;
    use std::any::Any;

    fn context() -> ExpressionContext {
        ExpressionContext::new(Arc::new(SymbolRegistry::with_builtins()))
    }

    #[test]
    fn typed_results() {
        let expr = context().compile_dynamic("\"abc\".Length").unwrap();
        assert_eq!(expr.evaluate_as::<i32>().unwrap(), 3);
        assert!(matches!(
            expr.evaluate_as::<String>(),
            Err(EvalError::ResultType { .. })
        ));
    }

    #[test]
    fn clones_copy_variables() {
        let ctx = context();
        ctx.variables().add("n", 1).unwrap();
        let expr = ctx.compile_dynamic("n + 1").unwrap();
        let copy = expr.clone();

        ctx.variables().set("n", 10).unwrap();
        assert_eq!(expr.evaluate().unwrap(), Value::Int32(11));
        assert_eq!(copy.evaluate().unwrap(), Value::Int32(2));
        assert_eq!(copy.text(), "n + 1");
    }

    #[test]
    fn expression_variables_evaluate_on_read() {
        let ctx = context();
        ctx.variables().add("base", 2).unwrap();
        let doubled = ctx.compile_dynamic("base * 2").unwrap();
        ctx.variables().add_expression("doubled", doubled).unwrap();

        let expr = ctx.compile_dynamic("doubled + 1").unwrap();
        assert_eq!(expr.evaluate().unwrap(), Value::Int32(5));
        ctx.variables().set("base", 5).unwrap();
        assert_eq!(expr.evaluate().unwrap(), Value::Int32(11));
    }

    #[derive(Debug)]
    struct Counter;

    impl HostObject for Counter {
        fn type_hash(&self) -> TypeHash {
            primitives::OBJECT
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn owners_are_validated() {
        let ctx = context().with_typed_owner(Value::string("a"), primitives::STRING);
        let mut expr = ctx.compile_dynamic("Length").unwrap();
        assert_eq!(expr.evaluate().unwrap(), Value::Int32(1));

        expr.set_owner("four").unwrap();
        assert_eq!(expr.evaluate().unwrap(), Value::Int32(4));

        let err = expr.set_owner(Value::object(Counter)).unwrap_err();
        assert!(matches!(err, EvalError::OwnerType { .. }));
        assert_eq!(expr.owner(), &Value::string("four"));
    }
}
