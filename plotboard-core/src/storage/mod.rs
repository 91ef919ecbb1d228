pub mod local;
pub mod memory;

use serde_json::Value;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// Store key of the Kanban board tree.
pub const KANBAN_KEY: &str = "kanban";
/// Store key of the timeline card list.
pub const TIMELINE_KEY: &str = "timeline";

/// Persistence backend for board and timeline trees.
/// Implementations: LocalStore (JSON files on disk), MemoryStore (in process).
pub trait BoardStore {
    /// Current tree for `key`, or `None` when nothing was saved yet.
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the current tree for `key`.
    fn save(&self, key: &str, tree: &Value) -> Result<(), StoreError>;

    /// Write an extra timestamped copy of `tree`. Returns the history name.
    fn save_history(&self, key: &str, tree: &Value) -> Result<String, StoreError>;

    /// History names for `key`, newest first.
    fn list_history(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// A history entry by name. An absent entry is an empty object.
    fn load_history(&self, key: &str, name: &str) -> Result<Value, StoreError>;
}

impl<S: BoardStore + ?Sized> BoardStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, tree: &Value) -> Result<(), StoreError> {
        (**self).save(key, tree)
    }

    fn save_history(&self, key: &str, tree: &Value) -> Result<String, StoreError> {
        (**self).save_history(key, tree)
    }

    fn list_history(&self, key: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_history(key)
    }

    fn load_history(&self, key: &str, name: &str) -> Result<Value, StoreError> {
        (**self).load_history(key, name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid history name: {0}")]
    InvalidHistoryName(String),

    #[error("Invalid store key: {0}")]
    InvalidKey(String),
}
