//! The dependency tracking calculation engine.

use std::fmt;
use std::sync::Arc;

use flee_core::{FromValue, SymbolResolver, Value};
use rustc_hash::FxHashMap;
use tracing::{debug, info, info_span, warn};

use super::batch::BatchLoader;
use super::dependency::DependencyManager;
use super::results::{ResultTable, SharedResults};
use super::CalcError;
use crate::context::ExpressionContext;
use crate::expression::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct NodeId(u32);

struct CalcNode {
    name: String,
    expression: Expression,
}

/// A node finished recalculating.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvent {
    pub name: String,
    pub result: Value,
}

type Listener = Box<dyn Fn(&NodeEvent) + Send + Sync>;

/// Named expressions that read each other's results.
///
/// Adding an entry compiles it against the given context and records
/// which other entries it reads. Values are only computed by
/// [`recalculate`](Self::recalculate), which evaluates the affected
/// entries, each after everything it reads. Until then an entry's result
/// is [`Value::Null`].
///
/// ```ignore
/// let mut engine = CalculationEngine::new();
/// engine.add("a", "x * 2", &ctx)?;
/// engine.add("b", "a + 1", &ctx)?;
/// ctx.variables().set("x", 10)?;
/// engine.recalculate(&["a"])?;
/// assert_eq!(engine.result("b")?, Value::Int32(21));
/// ```
pub struct CalculationEngine {
    dependencies: DependencyManager<NodeId>,
    nodes: FxHashMap<NodeId, CalcNode>,
    names: FxHashMap<String, NodeId>,
    results: SharedResults,
    next_id: u32,
    case_sensitive: bool,
    listeners: Vec<Listener>,
}

impl Default for CalculationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculationEngine {
    /// An empty engine with case-insensitive names.
    pub fn new() -> Self {
        Self {
            dependencies: DependencyManager::new(),
            nodes: FxHashMap::default(),
            names: FxHashMap::default(),
            results: ResultTable::shared(false),
            next_id: 0,
            case_sensitive: false,
            listeners: Vec::new(),
        }
    }

    /// Match entry names by exact case. Clears the engine.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.clear();
        self.case_sensitive = case_sensitive;
        self.results = ResultTable::shared(case_sensitive);
        self
    }

    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    fn id(&self, name: &str) -> Option<NodeId> {
        self.names.get(&self.key(name)).copied()
    }

    fn node(&self, name: &str) -> Result<&CalcNode, CalcError> {
        self.id(name)
            .and_then(|id| self.nodes.get(&id))
            .ok_or_else(|| CalcError::UnknownName(name.to_string()))
    }

    fn names_of(&self, ids: Vec<NodeId>) -> Vec<String> {
        ids.into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .map(|node| node.name.clone())
            .collect()
    }

    // ==========================================================================
    // Entries
    // ==========================================================================

    /// Compile `text` as the entry `name`.
    ///
    /// Other entries are addressed by name. The entry is not evaluated; its
    /// result stays [`Value::Null`] until the next recalculation reaches it.
    /// On failure nothing is added.
    pub fn add(&mut self, name: &str, text: &str, context: &ExpressionContext) -> Result<(), CalcError> {
        if self.id(name).is_some() {
            return Err(CalcError::DuplicateName(name.to_string()));
        }

        self.results.write().insert_pending(name);
        let context = context.attach_to_engine(Arc::clone(&self.results));
        let (compiled, references) = match context.compile_tracked(text) {
            Ok(compiled) => compiled,
            Err(source) => {
                self.results.write().remove(name);
                return Err(CalcError::Compile {
                    name: name.to_string(),
                    source,
                });
            }
        };

        let key = self.key(name);
        if references.iter().any(|r| self.key(r) == key) {
            self.results.write().remove(name);
            return Err(CalcError::CircularReference {
                at: Some(name.to_string()),
            });
        }

        let expression = Expression::new(compiled, text, context);
        self.results.write().set_type(name, expression.result_type());

        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.dependencies.add_tail(id);
        for reference in &references {
            if let Some(tail) = self.id(reference) {
                self.dependencies.add_dependency(tail, id);
            }
        }
        self.names.insert(key, id);
        self.nodes.insert(
            id,
            CalcNode {
                name: name.to_string(),
                expression,
            },
        );

        debug!(name, text, references = references.len(), "added calculation entry");
        Ok(())
    }

    /// Remove an entry and every entry that reads it.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(id) = self.id(name) else {
            return false;
        };

        let removed = self.dependencies.dependents(id);
        self.dependencies.remove(&removed);
        let mut results = self.results.write();
        for id in removed {
            if let Some(node) = self.nodes.remove(&id) {
                let key = self.key(&node.name);
                self.names.remove(&key);
                results.remove(&node.name);
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.dependencies.clear();
        self.nodes.clear();
        self.names.clear();
        self.results.write().clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.id(name).is_some()
    }

    pub fn count(&self) -> usize {
        self.dependencies.count()
    }

    // ==========================================================================
    // Recalculation
    // ==========================================================================

    /// Register a callback run after each node is recalculated.
    pub fn on_node_recalculated(&mut self, listener: impl Fn(&NodeEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Recompute `roots` and everything that reads them, in dependency
    /// order. With no roots every entry is recomputed.
    ///
    /// Stops at the first evaluation failure; entries not yet reached keep
    /// their previous values.
    pub fn recalculate(&self, roots: &[&str]) -> Result<(), CalcError> {
        let span = info_span!("recalculate", roots = roots.len());
        let _enter = span.enter();

        let roots = if roots.is_empty() {
            self.dependencies.tails()
        } else {
            roots
                .iter()
                .map(|name| self.id(name).ok_or_else(|| CalcError::UnknownName(name.to_string())))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut affected = self.dependencies.clone_dependents(&roots);
        let sources = affected.sources(&roots);
        let order = affected.topological_sort(sources)?;

        for id in order {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let value = node.expression.evaluate().map_err(|source| CalcError::Eval {
                name: node.name.clone(),
                source,
            })?;
            self.results.write().set_value(&node.name, value.clone());
            debug!(name = %node.name, value = %value, "recalculated node");

            let event = NodeEvent {
                name: node.name.clone(),
                result: value,
            };
            for listener in &self.listeners {
                listener(&event);
            }
        }
        Ok(())
    }

    // ==========================================================================
    // Results
    // ==========================================================================

    /// Last computed value of an entry.
    pub fn result(&self, name: &str) -> Result<Value, CalcError> {
        self.results
            .read()
            .get(name)
            .map(|slot| slot.value.clone())
            .ok_or_else(|| CalcError::UnknownName(name.to_string()))
    }

    /// Last computed value of an entry, which must have the type `T`
    /// stands for.
    pub fn result_as<T: FromValue>(&self, name: &str) -> Result<T, CalcError> {
        let node = self.node(name)?;
        let actual = node.expression.result_type();
        let registry = node.expression.context().registry();
        let mismatch = |requested: String| CalcError::ResultTypeMismatch {
            name: node.name.clone(),
            actual: registry.type_name(actual),
            requested,
        };

        if let Some(requested) = T::type_hash()
            && requested != actual
        {
            return Err(mismatch(registry.type_name(requested)));
        }
        T::from_value(self.result(name)?).ok_or_else(|| mismatch(std::any::type_name::<T>().to_string()))
    }

    /// The compiled expression of an entry.
    pub fn expression(&self, name: &str) -> Option<&Expression> {
        self.node(name).ok().map(|node| &node.expression)
    }

    // ==========================================================================
    // Dependencies
    // ==========================================================================

    /// Entries that read `name` directly.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.id(name)
            .map(|id| self.names_of(self.dependencies.direct_dependents(id)))
            .unwrap_or_default()
    }

    /// Entries `name` reads directly.
    pub fn precedents(&self, name: &str) -> Vec<String> {
        self.id(name)
            .map(|id| self.names_of(self.dependencies.direct_precedents(id)))
            .unwrap_or_default()
    }

    pub fn has_dependents(&self, name: &str) -> bool {
        self.id(name).is_some_and(|id| self.dependencies.has_dependents(id))
    }

    pub fn has_precedents(&self, name: &str) -> bool {
        self.id(name).is_some_and(|id| self.dependencies.has_precedents(id))
    }

    /// One line per entry: `name -> dependent,dependent` or
    /// `name -> <empty>`.
    pub fn dependency_graph(&self) -> String {
        self.dependencies.format_graph(|id| {
            self.nodes
                .get(&id)
                .map(|node| node.name.clone())
                .unwrap_or_default()
        })
    }

    // ==========================================================================
    // Batch loading
    // ==========================================================================

    /// A loader matching names the way this engine does.
    pub fn batch_loader(&self) -> BatchLoader {
        BatchLoader::new(self.case_sensitive)
    }

    /// Replace the contents of the engine with the loader's entries, added
    /// so that every entry comes after the entries it reads.
    ///
    /// Any failure leaves the engine empty.
    pub fn batch_load(&mut self, loader: &BatchLoader) -> Result<(), CalcError> {
        self.clear();

        let entries = loader.load_order().inspect_err(|err| {
            warn!(error = %err, "batch load could not order its entries");
        })?;

        for entry in entries {
            if let Err(err) = self.add(&entry.name, &entry.text, &entry.context) {
                self.clear();
                warn!(atom = %entry.name, error = %err, "batch load failed, engine cleared");
                return Err(match err {
                    CalcError::Compile { source, .. } => CalcError::BatchLoadCompile {
                        atom: entry.name.clone(),
                        text: entry.text.clone(),
                        source,
                    },
                    other => other,
                });
            }
        }

        info!(count = self.count(), "batch loaded calculation engine");
        Ok(())
    }
}

impl fmt::Debug for CalculationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculationEngine")
            .field("count", &self.count())
            .field("case_sensitive", &self.case_sensitive)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
