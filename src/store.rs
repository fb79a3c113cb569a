use crate::app_dirs::AppDirs;
use crate::error::{DrillError, Result};
use crate::settings::{normalize, Settings};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Slot the drill settings live under.
pub const SETTINGS_KEY: &str = "zetamac_arithmetic_settings_v1";

/// A flat string key-value slot, the only persistence the drill needs.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Keeps every key in one JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::store_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Map<String, Value> {
        fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_entries()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_entries();
        entries.insert(key.to_owned(), Value::String(value.to_owned()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DrillError::io(format!("creating {}", parent.display()), e))?;
        }
        let data = serde_json::to_vec_pretty(&Value::Object(entries))?;
        fs::write(&self.path, data)
            .map_err(|e| DrillError::io(format!("writing {}", self.path.display()), e))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Stored settings, or defaults when nothing usable is stored.
pub fn load_settings<S: KeyValueStore + ?Sized>(store: &S) -> Settings {
    let raw = match store.get(SETTINGS_KEY) {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            debug!("no stored settings, using defaults");
            return Settings::default();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => normalize(&value),
        Err(err) => {
            warn!(%err, "stored settings are malformed, using defaults");
            Settings::default()
        }
    }
}

pub fn save_settings<S: KeyValueStore + ?Sized>(store: &mut S, settings: &Settings) -> Result<()> {
    let encoded = serde_json::to_string(settings)?;
    store.set(SETTINGS_KEY, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Operation;
    use crate::settings::{OperandRange, Operations};
    use tempfile::tempdir;

    fn custom_settings() -> Settings {
        Settings {
            duration: 60,
            reveal_delay: 1.5,
            operations: Operations::only(&[Operation::Add, Operation::Div]),
            add_range: OperandRange::new(0, 99, 5, 50),
            mul_range: OperandRange::new(2, 20, 3, 9),
        }
    }

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::with_path(dir.path().join("store.json"));
        save_settings(&mut store, &Settings::default()).unwrap();
        assert_eq!(load_settings(&store), Settings::default());
    }

    #[test]
    fn save_and_load_custom_settings() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::with_path(dir.path().join("nested").join("store.json"));
        let settings = custom_settings();
        save_settings(&mut store, &settings).unwrap();
        assert_eq!(load_settings(&store), settings);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.get(SETTINGS_KEY), None);
        assert_eq!(load_settings(&store), Settings::default());
    }

    #[test]
    fn corrupt_file_loads_defaults_and_is_overwritten_on_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"{ not json").unwrap();
        let mut store = FileStore::with_path(&path);
        assert_eq!(load_settings(&store), Settings::default());

        save_settings(&mut store, &custom_settings()).unwrap();
        assert_eq!(load_settings(&store), custom_settings());
    }

    #[test]
    fn set_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::with_path(dir.path().join("store.json"));
        store.set("other", "value").unwrap();
        save_settings(&mut store, &Settings::default()).unwrap();
        assert_eq!(store.get("other"), Some("value".to_string()));
    }

    #[test]
    fn malformed_blob_loads_defaults() {
        let mut store = MemoryStore::default();
        store.set(SETTINGS_KEY, "][").unwrap();
        assert_eq!(load_settings(&store), Settings::default());

        store.set(SETTINGS_KEY, "").unwrap();
        assert_eq!(load_settings(&store), Settings::default());
    }

    #[test]
    fn stored_blob_is_normalized_on_load() {
        let mut store = MemoryStore::default();
        store
            .set(
                SETTINGS_KEY,
                r#"{"duration":"45","revealDelay":12,"operations":{"add":false},"mulRange":{"minA":0,"maxA":-3}}"#,
            )
            .unwrap();
        let settings = load_settings(&store);
        assert_eq!(settings.duration, 120);
        assert_eq!(settings.reveal_delay, 5.0);
        assert!(!settings.operations.add);
        assert!(settings.operations.sub);
        assert_eq!(settings.mul_range, OperandRange::new(1, 1, 2, 12));
    }

    #[test]
    fn stored_blob_uses_camel_case_fields() {
        let mut store = MemoryStore::default();
        save_settings(&mut store, &custom_settings()).unwrap();
        let raw: Value = serde_json::from_str(&store.get(SETTINGS_KEY).unwrap()).unwrap();
        assert_eq!(raw["revealDelay"], 1.5);
        assert_eq!(raw["addRange"]["maxA"], 99);
        assert_eq!(raw["operations"]["mul"], false);
    }
}
