//! Variables visible to expressions.
//!
//! A [`VariableCollection`] maps names to typed values. Expressions compile
//! against the declared types and read the current values each time they
//! are evaluated, so changing a variable never requires recompiling.
//!
//! Three kinds of variables exist:
//!
//! - **Plain** variables hold a value of a fixed type
//! - **Expression** variables hold another compiled [`Expression`]; reading
//!   one evaluates it
//! - **On-demand** variables are supplied by an [`OnDemandResolver`] when no
//!   stored variable has the name
//!
//! Collections are shared handles: contexts cloned with
//! [`ExpressionContext::clone_context(false)`](crate::ExpressionContext::clone_context)
//! see the same variables. [`VariableCollection::deep_clone`] makes an
//! independent copy.

use std::fmt;
use std::sync::Arc;

use flee_core::{PrimitiveKind, SymbolResolver, TypeHash, Value, primitives};
use flee_registry::SymbolRegistry;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::expression::Expression;
use crate::vm::EvalError;

/// Failure defining or assigning a variable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariableError {
    #[error("a variable named '{0}' is already defined")]
    AlreadyDefined(String),

    #[error("no variable named '{0}' is defined")]
    Undefined(String),

    #[error("value of type '{actual}' is not assignable to variable '{name}' of type '{expected}'")]
    NotAssignable {
        name: String,
        expected: String,
        actual: String,
    },
}

/// Supplies variables and functions that are not stored in the collection.
///
/// Types are asked for at compile time, values at evaluation time. A
/// resolver that reports a type must also produce a value.
pub trait OnDemandResolver: Send + Sync {
    /// Type of the on-demand variable `name`.
    fn variable_type(&self, _name: &str) -> Option<TypeHash> {
        None
    }

    /// Current value of the on-demand variable `name`.
    fn variable_value(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Return type of the on-demand function `name` for the given argument
    /// types.
    fn function_type(&self, _name: &str, _args: &[TypeHash]) -> Option<TypeHash> {
        None
    }

    /// Invoke the on-demand function `name`.
    fn invoke_function(&self, _name: &str, _args: &[Value]) -> Option<Value> {
        None
    }
}

#[derive(Clone)]
enum Slot {
    Value(Value),
    Expression(Arc<Expression>),
}

#[derive(Clone)]
struct Variable {
    name: String,
    ty: TypeHash,
    slot: Slot,
}

#[derive(Clone)]
struct VariableTable {
    case_sensitive: bool,
    variables: FxHashMap<String, Variable>,
    on_demand: Option<Arc<dyn OnDemandResolver>>,
}

impl VariableTable {
    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(&self.key(name))
    }
}

/// Shared, typed variable storage.
#[derive(Clone)]
pub struct VariableCollection {
    registry: Arc<SymbolRegistry>,
    table: Arc<RwLock<VariableTable>>,
}

impl VariableCollection {
    /// Create an empty, case-insensitive collection.
    pub fn new(registry: Arc<SymbolRegistry>) -> Self {
        Self {
            registry,
            table: Arc::new(RwLock::new(VariableTable {
                case_sensitive: false,
                variables: FxHashMap::default(),
                on_demand: None,
            })),
        }
    }

    /// An independent copy. Expression variables keep sharing their
    /// compiled expressions.
    pub fn deep_clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            table: Arc::new(RwLock::new(self.table.read().clone())),
        }
    }

    /// Whether two handles refer to the same storage.
    pub fn shares_storage(&self, other: &VariableCollection) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }

    /// Switch name matching, re-keying existing variables.
    pub(crate) fn set_case_sensitive(&self, case_sensitive: bool) {
        let mut table = self.table.write();
        if table.case_sensitive == case_sensitive {
            return;
        }
        table.case_sensitive = case_sensitive;
        let variables = std::mem::take(&mut table.variables);
        for (_, variable) in variables {
            let key = table.key(&variable.name);
            table.variables.insert(key, variable);
        }
    }

    /// Install the resolver for on-demand variables and functions.
    pub fn set_resolver(&self, resolver: impl OnDemandResolver + 'static) {
        self.table.write().on_demand = Some(Arc::new(resolver));
    }

    /// Remove the on-demand resolver.
    pub fn clear_resolver(&self) {
        self.table.write().on_demand = None;
    }

    // ==========================================================================
    // Definition
    // ==========================================================================

    /// Declare a variable of type `ty` holding the type's default value.
    pub fn define(&self, name: &str, ty: TypeHash) -> Result<(), VariableError> {
        self.insert(name, ty, Slot::Value(default_value(ty)))
    }

    /// Declare a variable whose type is the type of `value`.
    pub fn add(&self, name: &str, value: impl Into<Value>) -> Result<(), VariableError> {
        let value = value.into();
        let ty = match &value {
            Value::Null => primitives::OBJECT,
            other => other.type_hash(),
        };
        self.insert(name, ty, Slot::Value(value))
    }

    /// Declare a variable whose value is computed by another expression.
    pub fn add_expression(&self, name: &str, expression: Expression) -> Result<(), VariableError> {
        let ty = expression.result_type();
        self.insert(name, ty, Slot::Expression(Arc::new(expression)))
    }

    fn insert(&self, name: &str, ty: TypeHash, slot: Slot) -> Result<(), VariableError> {
        let mut table = self.table.write();
        let key = table.key(name);
        if table.variables.contains_key(&key) {
            return Err(VariableError::AlreadyDefined(name.to_string()));
        }
        table.variables.insert(
            key,
            Variable {
                name: name.to_string(),
                ty,
                slot,
            },
        );
        Ok(())
    }

    /// Assign a new value. The value must fit the declared type.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), VariableError> {
        let value = value.into();
        let mut table = self.table.write();
        let key = table.key(name);
        let variable = table
            .variables
            .get_mut(&key)
            .ok_or_else(|| VariableError::Undefined(name.to_string()))?;

        if !fits(self.registry.as_ref(), &value, variable.ty) {
            return Err(VariableError::NotAssignable {
                name: variable.name.clone(),
                expected: self.registry.type_name(variable.ty),
                actual: self.registry.type_name(value.type_hash()),
            });
        }
        variable.slot = Slot::Value(value);
        Ok(())
    }

    /// Remove a variable, returning whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut table = self.table.write();
        let key = table.key(name);
        table.variables.remove(&key).is_some()
    }

    pub fn clear(&self) {
        self.table.write().variables.clear();
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Whether a stored variable has this name.
    pub fn contains(&self, name: &str) -> bool {
        self.table.read().get(name).is_some()
    }

    /// Declared type of a stored or on-demand variable.
    pub fn variable_type(&self, name: &str) -> Option<TypeHash> {
        let table = self.table.read();
        match table.get(name) {
            Some(variable) => Some(variable.ty),
            None => table.on_demand.as_ref()?.variable_type(name),
        }
    }

    /// Current value of a variable, evaluating expression variables.
    pub fn get(&self, name: &str) -> Result<Value, EvalError> {
        self.load(name)
    }

    /// Names of the stored variables, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.table
            .read()
            .variables
            .values()
            .map(|v| v.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value read by a running expression.
    pub(crate) fn load(&self, name: &str) -> Result<Value, EvalError> {
        let (slot, on_demand) = {
            let table = self.table.read();
            match table.get(name) {
                Some(variable) => (Some(variable.slot.clone()), None),
                None => (None, table.on_demand.clone()),
            }
        };

        match slot {
            Some(Slot::Value(value)) => Ok(value),
            Some(Slot::Expression(expression)) => expression.evaluate(),
            None => {
                let resolver = on_demand.ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))?;
                let value = resolver
                    .variable_value(name)
                    .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))?;
                if let Some(ty) = resolver.variable_type(name)
                    && !fits(self.registry.as_ref(), &value, ty)
                {
                    return Err(EvalError::VariableType {
                        name: name.to_string(),
                        expected: self.registry.type_name(ty),
                        actual: self.registry.type_name(value.type_hash()),
                    });
                }
                Ok(value)
            }
        }
    }

    /// Return type of an on-demand function.
    pub(crate) fn function_type(&self, name: &str, args: &[TypeHash]) -> Option<TypeHash> {
        self.table.read().on_demand.as_ref()?.function_type(name, args)
    }

    /// Call an on-demand function.
    pub(crate) fn invoke_function(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let resolver = self.table.read().on_demand.clone();
        resolver
            .and_then(|r| r.invoke_function(name, args))
            .ok_or_else(|| EvalError::UndefinedFunction(name.to_string()))
    }
}

impl fmt::Debug for VariableCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read();
        f.debug_struct("VariableCollection")
            .field("case_sensitive", &table.case_sensitive)
            .field("count", &table.variables.len())
            .field("on_demand", &table.on_demand.is_some())
            .finish()
    }
}

/// Whether `value` may be stored where `ty` is expected.
pub(crate) fn fits(resolver: &dyn SymbolResolver, value: &Value, ty: TypeHash) -> bool {
    if value.is_null() || ty == primitives::OBJECT {
        return true;
    }
    let actual = value.type_hash();
    actual == ty || resolver.inheritance_distance(actual, ty).is_some()
}

fn default_value(ty: TypeHash) -> Value {
    let Some(kind) = PrimitiveKind::from_hash(ty) else {
        return Value::Null;
    };
    match kind {
        PrimitiveKind::Bool => Value::Bool(false),
        PrimitiveKind::Char => Value::Char('\0'),
        PrimitiveKind::SByte => Value::SByte(0),
        PrimitiveKind::Byte => Value::Byte(0),
        PrimitiveKind::Int16 => Value::Int16(0),
        PrimitiveKind::UInt16 => Value::UInt16(0),
        PrimitiveKind::Int32 => Value::Int32(0),
        PrimitiveKind::UInt32 => Value::UInt32(0),
        PrimitiveKind::Int64 => Value::Int64(0),
        PrimitiveKind::UInt64 => Value::UInt64(0),
        PrimitiveKind::Single => Value::Single(0.0),
        PrimitiveKind::Double => Value::Double(0.0),
    }
}
