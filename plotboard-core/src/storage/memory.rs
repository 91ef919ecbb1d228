use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use super::{BoardStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    boards: HashMap<String, Value>,
    history: HashMap<String, Vec<(String, Value)>>,
    seq: u64,
}

/// In-process store for tests and embedding. History names are sequence
/// numbers so ordering stays stable within a second.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BoardStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().boards.get(key).cloned())
    }

    fn save(&self, key: &str, tree: &Value) -> Result<(), StoreError> {
        self.lock().boards.insert(key.to_string(), tree.clone());
        Ok(())
    }

    fn save_history(&self, key: &str, tree: &Value) -> Result<String, StoreError> {
        let mut inner = self.lock();
        inner.seq += 1;
        let name = format!("{}_{:06}.json", key, inner.seq);
        inner
            .history
            .entry(key.to_string())
            .or_default()
            .push((name.clone(), tree.clone()));
        Ok(name)
    }

    fn list_history(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .history
            .get(key)
            .map(|entries| entries.iter().rev().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    fn load_history(&self, key: &str, name: &str) -> Result<Value, StoreError> {
        let inner = self.lock();
        let found = inner
            .history
            .get(key)
            .and_then(|entries| entries.iter().find(|(n, _)| n == name))
            .map(|(_, tree)| tree.clone());
        Ok(found.unwrap_or_else(|| Value::Object(Map::new())))
    }
}
