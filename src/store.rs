use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// File-backed key-value store, the moral equivalent of browser local
/// storage: one JSON object, synchronous access, and no failure ever
/// escapes the store boundary. Unreadable state degrades to empty and
/// write errors degrade to a logged no-op.
pub struct KvStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl KvStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read_file(&path);
        Self { path, values }
    }

    fn read_file(path: &Path) -> Map<String, Value> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No usable state file at {}: {e}", path.display());
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!("State file {} is not a JSON object", path.display());
                Map::new()
            }
            Err(e) => {
                warn!("State file {} is corrupt: {e}", path.display());
                Map::new()
            }
        }
    }

    fn flush(&self) {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(dir)
        {
            warn!("Cannot create state dir {}: {e}", dir.display());
            return;
        }
        match serde_json::to_string_pretty(&Value::Object(self.values.clone())) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("Cannot write state file {}: {e}", self.path.display());
                }
            }
            Err(e) => warn!("Cannot serialize state: {e}"),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
        self.flush();
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
        self.flush();
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn set_get_roundtrip_and_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = KvStore::open(&path);
        assert_eq!(store.get("theme_mode"), None);

        store.set("theme_mode", json!("dark"));
        assert_eq!(store.get_str("theme_mode").as_deref(), Some("dark"));

        store.remove("theme_mode");
        assert_eq!(store.get("theme_mode"), None);
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let mut store = KvStore::open(&path);
            store.set("auth_session", json!({ "token": "t-1" }));
        }
        let store = KvStore::open(&path);
        assert_eq!(store.get("auth_session"), Some(json!({ "token": "t-1" })));
    }

    #[test]
    fn clear_empties_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = KvStore::open(&path);
        store.set("a", json!(1));
        store.set("b", json!(2));
        store.clear();
        assert_eq!(store.get("a"), None);
        let reopened = KvStore::open(&path);
        assert_eq!(reopened.get("b"), None);
    }

    #[test]
    fn corrupt_state_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let store = KvStore::open(&path);
        assert_eq!(store.get("anything"), None);

        fs::write(&path, "[1, 2, 3]").unwrap();
        let store = KvStore::open(&path);
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn non_string_values_read_as_none_strings() {
        let dir = tempdir().unwrap();
        let mut store = KvStore::open(dir.path().join("state.json"));
        store.set("n", json!(42));
        assert_eq!(store.get_str("n"), None);
        assert_eq!(store.get("n"), Some(json!(42)));
    }
}
