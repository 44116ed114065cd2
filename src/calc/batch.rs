//! Loading many calculation engine entries at once.

use rustc_hash::FxHashMap;

use super::CalcError;
use super::dependency::DependencyManager;
use crate::context::ExpressionContext;

pub(crate) struct BatchEntry {
    pub name: String,
    pub text: String,
    pub context: ExpressionContext,
}

/// Entries waiting to be added to a [`CalculationEngine`](super::CalculationEngine).
///
/// Entries may be added in any order: the engine adds them so that each
/// comes after the entries it reads. References are found by parsing, not
/// compiling, so the loader only needs entries to be syntactically valid.
pub struct BatchLoader {
    case_sensitive: bool,
    ids: FxHashMap<String, u32>,
    entries: Vec<Option<BatchEntry>>,
    dependencies: DependencyManager<u32>,
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new(false)
    }
}

impl BatchLoader {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            ids: FxHashMap::default(),
            entries: Vec::new(),
            dependencies: DependencyManager::new(),
        }
    }

    fn intern(&mut self, name: &str) -> u32 {
        let key = if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        };
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = self.entries.len() as u32;
        self.entries.push(None);
        self.ids.insert(key, id);
        self.dependencies.add_tail(id);
        id
    }

    /// Queue `text` as the entry `name`.
    pub fn add(&mut self, name: &str, text: &str, context: &ExpressionContext) -> Result<(), CalcError> {
        let references = context
            .parse_identifiers(text)
            .map_err(|source| CalcError::BatchLoadCompile {
                atom: name.to_string(),
                text: text.to_string(),
                source,
            })?;

        let id = self.intern(name);
        if self.entries[id as usize].is_some() {
            return Err(CalcError::DuplicateName(name.to_string()));
        }

        for reference in references {
            // Variables and imports shadow engine entries.
            if context.variables().variable_type(&reference).is_some()
                || context.imports().has_namespace(&reference)
            {
                continue;
            }
            let tail = self.intern(&reference);
            self.dependencies.add_dependency(tail, id);
        }

        self.entries[id as usize] = Some(BatchEntry {
            name: name.to_string(),
            text: text.to_string(),
            context: context.clone_context(false),
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        };
        self.ids
            .get(&key)
            .is_some_and(|id| self.entries[*id as usize].is_some())
    }

    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries ordered so that each comes after the entries it reads.
    pub(crate) fn load_order(&self) -> Result<Vec<&BatchEntry>, CalcError> {
        let mut graph = self.dependencies.clone();
        let tails = graph.tails();
        let sources = graph.sources(&tails);
        let order = graph.topological_sort(sources)?;
        Ok(order
            .into_iter()
            .filter_map(|id| self.entries[id as usize].as_ref())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_registry::SymbolRegistry;
    use std::sync::Arc;

    fn context() -> ExpressionContext {
        ExpressionContext::new(Arc::new(SymbolRegistry::with_builtins()))
    }

    fn order(loader: &BatchLoader) -> Vec<String> {
        loader
            .load_order()
            .unwrap()
            .into_iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    #[test]
    fn entries_load_after_what_they_read() {
        let ctx = context();
        let mut loader = BatchLoader::default();
        loader.add("total", "price * qty", &ctx).unwrap();
        loader.add("price", "2.5", &ctx).unwrap();
        loader.add("qty", "4", &ctx).unwrap();

        let order = order(&loader);
        assert_eq!(order.len(), 3);
        assert_eq!(order.last().map(String::as_str), Some("total"));
        assert!(loader.contains("TOTAL"));
        assert_eq!(loader.len(), 3);
    }

    #[test]
    fn variables_are_not_entries() {
        let ctx = context();
        ctx.variables().add("rate", 0.1).unwrap();
        let mut loader = BatchLoader::default();
        loader.add("tax", "rate * 100", &ctx).unwrap();
        assert_eq!(order(&loader), vec!["tax"]);
        assert!(!loader.contains("rate"));
    }

    #[test]
    fn duplicates_and_syntax_errors() {
        let ctx = context();
        let mut loader = BatchLoader::default();
        loader.add("a", "1", &ctx).unwrap();
        assert_eq!(
            loader.add("A", "2", &ctx),
            Err(CalcError::DuplicateName("A".to_string()))
        );
        assert!(matches!(
            loader.add("b", "1 +", &ctx),
            Err(CalcError::BatchLoadCompile { ref atom, .. }) if atom == "b"
        ));
    }

    #[test]
    fn cycles_fail_to_order() {
        let ctx = context();
        let mut loader = BatchLoader::default();
        loader.add("x", "y", &ctx).unwrap();
        loader.add("y", "x", &ctx).unwrap();
        assert!(matches!(
            loader.load_order(),
            Err(CalcError::CircularReference { .. })
        ));
    }
}
