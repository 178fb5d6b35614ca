// Session state: persisted display preferences plus the transient search
// text.

use balon_core::store::{StateStore, KEY_LIGHT_THEME, KEY_SHOW_MEDALS, KEY_SORT_FIELD};
use balon_league::ranking::SortField;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Display preferences that survive across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub sort_field: SortField,
    pub light_theme: bool,
    pub show_medals: bool,
}

impl Preferences {
    /// Read preferences from `store`. Missing or unreadable values fall back
    /// to their defaults; a broken preference never blocks startup.
    pub fn load(store: &dyn StateStore) -> Self {
        let defaults = Preferences::default();

        let sort_field = match read(store, KEY_SORT_FIELD) {
            Some(Value::String(key)) => SortField::from_key(&key).unwrap_or_else(|| {
                warn!("unknown stored sort field '{}', using {}", key, defaults.sort_field);
                defaults.sort_field
            }),
            Some(other) => {
                warn!("stored sort field has unexpected value {}", other);
                defaults.sort_field
            }
            None => defaults.sort_field,
        };

        Self {
            sort_field,
            light_theme: read_flag(store, KEY_LIGHT_THEME, defaults.light_theme),
            show_medals: read_flag(store, KEY_SHOW_MEDALS, defaults.show_medals),
        }
    }

    /// Write every preference to `store`.
    pub fn save(&self, store: &dyn StateStore) -> anyhow::Result<()> {
        store.save_state(KEY_SORT_FIELD, &Value::String(self.sort_field.key().to_string()))?;
        store.save_state(KEY_LIGHT_THEME, &Value::Bool(self.light_theme))?;
        store.save_state(KEY_SHOW_MEDALS, &Value::Bool(self.show_medals))?;
        info!(
            "preferences saved: sort={}, light_theme={}, show_medals={}",
            self.sort_field, self.light_theme, self.show_medals
        );
        Ok(())
    }
}

fn read(store: &dyn StateStore, key: &str) -> Option<Value> {
    match store.load_state(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("failed to read preference `{}`: {:#}", key, e);
            None
        }
    }
}

/// Flags were historically stored as the strings "true"/"false"; both forms
/// are accepted.
fn read_flag(store: &dyn StateStore, key: &str, default: bool) -> bool {
    match read(store, key) {
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(s)) if s == "true" => true,
        Some(Value::String(s)) if s == "false" => false,
        Some(other) => {
            warn!("preference `{}` has unexpected value {}", key, other);
            default
        }
        None => default,
    }
}

/// Everything the view model depends on besides the roster and the award.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub prefs: Preferences,
    /// Case-insensitive name filter. Empty shows everyone.
    pub search: String,
}

impl Session {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs,
            search: String::new(),
        }
    }

    /// True if `name` passes the current search filter.
    pub fn matches(&self, name: &str) -> bool {
        let needle = self.search.trim();
        needle.is_empty() || name.to_lowercase().contains(&needle.to_lowercase())
    }
}
