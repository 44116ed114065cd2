//! A calculation engine without recalculation.

use rustc_hash::FxHashMap;

use flee_core::FromValue;

use super::CalcError;
use crate::context::ExpressionContext;
use crate::expression::{Expression, GenericExpression};
use crate::variables::VariableError;

/// Named expressions linked through expression variables.
///
/// Each new expression sees the previously added ones as variables, so
/// reading an expression evaluates everything it reads, every time.
/// Names are case-insensitive.
#[derive(Debug)]
pub struct SimpleCalcEngine {
    context: ExpressionContext,
    expressions: FxHashMap<String, Expression>,
}

impl SimpleCalcEngine {
    pub fn new(context: ExpressionContext) -> Self {
        Self {
            context,
            expressions: FxHashMap::default(),
        }
    }

    /// Compile and add an expression of any result type.
    pub fn add_dynamic(&mut self, name: &str, text: &str) -> Result<&Expression, CalcError> {
        let context = self.link(name, text)?;
        let expression = context
            .compile_dynamic(text)
            .map_err(|source| CalcError::Compile {
                name: name.to_string(),
                source,
            })?;
        let added = self.expressions.entry(name.to_lowercase()).or_insert(expression);
        Ok(&*added)
    }

    /// Compile and add an expression whose result converts to `T`.
    pub fn add_generic<T: FromValue>(&mut self, name: &str, text: &str) -> Result<GenericExpression<T>, CalcError> {
        let context = self.link(name, text)?;
        let expression = context
            .compile_generic::<T>(text)
            .map_err(|source| CalcError::Compile {
                name: name.to_string(),
                source,
            })?;
        self.expressions
            .insert(name.to_lowercase(), expression.expression().clone());
        Ok(expression)
    }

    /// A context for `text` where every referenced expression is a
    /// variable.
    fn link(&self, name: &str, text: &str) -> Result<ExpressionContext, CalcError> {
        if self.expressions.contains_key(&name.to_lowercase()) {
            return Err(CalcError::DuplicateName(name.to_string()));
        }

        let identifiers = self
            .context
            .parse_identifiers(text)
            .map_err(|source| CalcError::Compile {
                name: name.to_string(),
                source,
            })?;

        let linked = self.context.clone_context(true);
        for identifier in identifiers {
            if linked.variables().contains(&identifier) || linked.imports().has_namespace(&identifier) {
                continue;
            }
            let child = self
                .expressions
                .get(&identifier.to_lowercase())
                .ok_or_else(|| CalcError::UnknownReference {
                    expression: name.to_string(),
                    name: identifier.clone(),
                })?;
            // `a + A` links `a` once.
            match linked.variables().add_expression(&identifier, child.clone()) {
                Ok(()) | Err(VariableError::AlreadyDefined(_)) => {}
                Err(source) => {
                    return Err(CalcError::Link {
                        expression: name.to_string(),
                        name: identifier,
                        source,
                    });
                }
            }
        }
        Ok(linked)
    }

    /// The expression added as `name`.
    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.expressions.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.expressions.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn clear(&mut self) {
        self.expressions.clear();
    }

    pub fn context(&self) -> &ExpressionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExpressionContext {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::Value;
    use flee_registry::SymbolRegistry;
    use std::sync::Arc;

    fn engine() -> SimpleCalcEngine {
        SimpleCalcEngine::new(ExpressionContext::new(Arc::new(SymbolRegistry::with_builtins())))
    }

    #[test]
    fn expressions_read_earlier_expressions() {
        let mut engine = engine();
        engine.add_dynamic("a", "10").unwrap();
        engine.add_dynamic("b", "a * 2").unwrap();
        let c = engine.add_generic::<f64>("c", "A + b").unwrap();

        assert_eq!(c.evaluate().unwrap(), 30.0);
        assert_eq!(engine.get("B").unwrap().evaluate().unwrap(), Value::Int32(20));
        assert_eq!(engine.len(), 3);
    }

    #[test]
    fn unknown_references_and_duplicates() {
        let mut engine = engine();
        assert_eq!(
            engine.add_dynamic("a", "b + 1").unwrap_err(),
            CalcError::UnknownReference {
                expression: "a".to_string(),
                name: "b".to_string()
            }
        );
        engine.add_dynamic("a", "1").unwrap();
        assert_eq!(
            engine.add_dynamic("A", "2").unwrap_err(),
            CalcError::DuplicateName("A".to_string())
        );
    }

    #[test]
    fn repeated_references_link_once() {
        let mut engine = engine();
        engine.add_dynamic("a", "10").unwrap();
        let b = engine.add_dynamic("b", "a + A * a").unwrap();
        assert_eq!(b.evaluate().unwrap(), Value::Int32(110));
        assert_eq!(b.context().variables().len(), 1);
    }

    #[test]
    fn context_variables_are_not_links() {
        let mut engine = engine();
        engine.context().variables().add("x", 3).unwrap();
        engine.add_dynamic("double", "x * 2").unwrap();
        assert_eq!(engine.get("double").unwrap().evaluate().unwrap(), Value::Int32(6));

        engine.clear();
        assert!(engine.is_empty());
    }
}
