/// Local filesystem store.
///
/// Layout under the data directory:
/// - `<key>_board.json`: the current tree
/// - `<key>_history/<key>_YYYYMMDD_HHMMSS.json`: one copy per save
///
/// Writes are atomic (write to .tmp, fsync, rename, fsync directory). There
/// is a single writer per directory; nothing here locks against other
/// processes.
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{BoardStore, StoreError};

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").unwrap());
static HISTORY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.json$").unwrap());

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn board_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}_board.json", key))
    }

    pub fn history_dir(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}_history", key))
    }

    fn check_key(key: &str) -> Result<(), StoreError> {
        if KEY_RE.is_match(key) {
            Ok(())
        } else {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    fn read_json(path: &Path) -> Result<Option<Value>, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        // fsync directory for rename durability
        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl BoardStore for LocalStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Self::check_key(key)?;
        Self::read_json(&self.board_path(key))
    }

    fn save(&self, key: &str, tree: &Value) -> Result<(), StoreError> {
        Self::check_key(key)?;
        let path = self.board_path(key);
        let content = serde_json::to_string_pretty(tree)?;
        Self::atomic_write(&path, &content)?;
        log::debug!("[plotboard.storage.save] Wrote {:?}", path);
        Ok(())
    }

    fn save_history(&self, key: &str, tree: &Value) -> Result<String, StoreError> {
        Self::check_key(key)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let name = format!("{}_{}.json", key, stamp);
        let content = serde_json::to_string_pretty(tree)?;
        Self::atomic_write(&self.history_dir(key).join(&name), &content)?;
        log::debug!("[plotboard.storage.history] Wrote history entry {}", name);
        Ok(name)
    }

    fn list_history(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Self::check_key(key)?;
        let entries = match fs::read_dir(self.history_dir(key)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().to_string();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    fn load_history(&self, key: &str, name: &str) -> Result<Value, StoreError> {
        Self::check_key(key)?;
        if !HISTORY_NAME_RE.is_match(name) {
            return Err(StoreError::InvalidHistoryName(name.to_string()));
        }
        let value = Self::read_json(&self.history_dir(key).join(name))?;
        Ok(value.unwrap_or_else(|| Value::Object(Map::new())))
    }
}
