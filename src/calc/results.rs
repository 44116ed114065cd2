//! Last computed values of calculation engine entries.
//!
//! The table is shared between the engine, which writes results, and the
//! contexts of the entries' expressions, which read them.

use std::sync::Arc;

use flee_core::{TypeHash, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

pub(crate) type SharedResults = Arc<RwLock<ResultTable>>;

#[derive(Debug, Clone)]
pub(crate) struct ResultSlot {
    /// Name as first added.
    pub name: String,
    /// Result type; `None` while the entry is still compiling.
    pub ty: Option<TypeHash>,
    pub value: Value,
}

#[derive(Debug, Default)]
pub(crate) struct ResultTable {
    case_sensitive: bool,
    slots: FxHashMap<String, ResultSlot>,
}

impl ResultTable {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            slots: FxHashMap::default(),
        }
    }

    pub fn shared(case_sensitive: bool) -> SharedResults {
        Arc::new(RwLock::new(Self::new(case_sensitive)))
    }

    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResultSlot> {
        self.slots.get(&self.key(name))
    }

    /// Reserve a slot for an entry whose type is not known yet.
    pub fn insert_pending(&mut self, name: &str) {
        let key = self.key(name);
        self.slots.insert(
            key,
            ResultSlot {
                name: name.to_string(),
                ty: None,
                value: Value::Null,
            },
        );
    }

    pub fn set_type(&mut self, name: &str, ty: TypeHash) {
        let key = self.key(name);
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.ty = Some(ty);
        }
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        let key = self.key(name);
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.value = value;
        }
    }

    pub fn remove(&mut self, name: &str) {
        let key = self.key(name);
        self.slots.remove(&key);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::primitives;

    #[test]
    fn pending_slots_fill_in() {
        let mut table = ResultTable::new(false);
        table.insert_pending("Total");
        assert_eq!(table.get("total").unwrap().ty, None);

        table.set_type("TOTAL", primitives::DOUBLE);
        table.set_value("total", Value::Double(2.5));
        let slot = table.get("Total").unwrap();
        assert_eq!(slot.name, "Total");
        assert_eq!(slot.ty, Some(primitives::DOUBLE));
        assert_eq!(slot.value, Value::Double(2.5));

        table.remove("total");
        assert!(table.get("Total").is_none());
    }
}
