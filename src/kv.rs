use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, RwLock},
};

/// Small durable key-value store: one JSON object on disk, rewritten on every
/// mutation. Cheap to clone; clones share the same backing map.
#[derive(Clone)]
pub struct KvStore {
    path: Option<Arc<PathBuf>>,
    data: Arc<RwLock<Map<String, Value>>>,
}

impl KvStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read key-value store {}", path.display()))?;
            match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                _ => {
                    log::warn!(
                        "Key-value store {} is not a JSON object; starting empty",
                        path.display()
                    );
                    Map::new()
                }
            }
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create key-value directory {}", parent.display())
                })?;
            }
            Map::new()
        };

        Ok(Self {
            path: Some(Arc::new(path)),
            data: Arc::new(RwLock::new(data)),
        })
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Arc::new(RwLock::new(Map::new())),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let guard = self
            .data
            .read()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        match guard.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .with_context(|| format!("Failed to decode key '{key}'")),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_value(value)
            .with_context(|| format!("Failed to encode key '{key}'"))?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        guard.insert(key.to_string(), encoded);
        self.persist(&guard)
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        let existed = guard.remove(key).is_some();
        if existed {
            self.persist(&guard)?;
        }
        Ok(existed)
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string(data)?;
        fs::write(path.as_path(), serialized)
            .with_context(|| format!("Failed to write key-value store {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("kv.json");

        let store = KvStore::open(path.clone()).expect("open");
        store.set("recentApps", &vec!["notes", "calcul"]).expect("set");

        let reopened = KvStore::open(path).expect("reopen");
        let apps: Option<Vec<String>> = reopened.get("recentApps").expect("get");
        assert_eq!(apps, Some(vec!["notes".to_string(), "calcul".to_string()]));
    }

    #[test]
    fn missing_key_is_none_and_remove_reports_absence() {
        let store = KvStore::in_memory();
        let value: Option<u32> = store.get("nothing").expect("get");
        assert!(value.is_none());
        assert!(!store.remove("nothing").expect("remove"));

        store.set("count", &3u32).expect("set");
        assert!(store.remove("count").expect("remove"));
        assert!(store.get::<u32>("count").expect("get").is_none());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("kv.json");
        fs::write(&path, "[1, 2, 3]").expect("write");

        let store = KvStore::open(path).expect("open");
        assert!(store.get::<u32>("anything").expect("get").is_none());
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let store = KvStore::in_memory();
        store.set("recentApps", &"not a list").expect("set");
        assert!(store.get::<Vec<String>>("recentApps").is_err());
    }
}
