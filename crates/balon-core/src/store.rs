// Key-value persistence seam shared by preferences and the award record.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Keys of the display-preference group.
pub const KEY_SORT_FIELD: &str = "prefs.sort_field";
pub const KEY_LIGHT_THEME: &str = "prefs.light_theme";
pub const KEY_SHOW_MEDALS: &str = "prefs.show_medals";

/// Key of the award-state group. The whole record is one JSON document.
pub const KEY_AWARD_RECORD: &str = "award.record";

/// A scoped key-value store holding JSON values that survive across
/// sessions.
pub trait StateStore {
    /// Load the value stored under `key`, or `None` if absent.
    fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_state(&self, key: &str) -> Result<()>;
}

/// Load and decode a typed value. A stored value that does not decode into
/// `T` is an error, not `None`.
pub fn load_typed<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Result<Option<T>> {
    match store.load_state(key)? {
        Some(value) => {
            let decoded = serde_json::from_value(value)
                .with_context(|| format!("stored value under `{key}` has an unexpected shape"))?;
            Ok(Some(decoded))
        }
        None => Ok(None),
    }
}

/// Encode and store a typed value.
pub fn save_typed<T: Serialize>(store: &dyn StateStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_value(value)
        .with_context(|| format!("failed to serialize value for `{key}`"))?;
    store.save_state(key, &json)
}

/// In-process store used by tests and dry runs. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, serde_json::Value>> {
        self.values.lock().expect("memory store mutex poisoned")
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.values().get(key).cloned())
    }

    fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.values().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove_state(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}
