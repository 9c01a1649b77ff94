//! Viewer settings
//!
//! Stores hold raw strings; `ViewerConfig::from_store` applies typed
//! coercion and falls back to defaults for missing or malformed values.

use crate::search::panel::DEFAULT_MAX_VISIBLE;
use crate::view::render::DEFAULT_SHORT_TEXT_THRESHOLD;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

pub const INIT_DEPTH: &str = "init_depth";
pub const SEARCH_MAX_VISIBLE: &str = "search.max_visible";
pub const DND_XPATH_QUOTE: &str = "dnd.xpath_quote";
pub const DND_CYCLE_MODE: &str = "dnd.cycle_mode";
pub const ONELINE_TEXT_LEN: &str = "render.oneline_text_len";

/// Key-value settings persistence
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MemoryStore {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Typed viewer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Levels rendered on load; negative renders everything
    pub init_depth: i32,
    pub search_max_visible: usize,
    pub xpath_quote: char,
    pub cycle_mode: bool,
    pub oneline_text_len: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            init_depth: 2,
            search_max_visible: DEFAULT_MAX_VISIBLE,
            xpath_quote: '\'',
            cycle_mode: false,
            oneline_text_len: DEFAULT_SHORT_TEXT_THRESHOLD,
        }
    }
}

impl ViewerConfig {
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        ViewerConfig {
            init_depth: coerce(store, INIT_DEPTH, defaults.init_depth),
            search_max_visible: coerce(store, SEARCH_MAX_VISIBLE, defaults.search_max_visible),
            xpath_quote: quote(store).unwrap_or(defaults.xpath_quote),
            cycle_mode: coerce(store, DND_CYCLE_MODE, defaults.cycle_mode),
            oneline_text_len: coerce(store, ONELINE_TEXT_LEN, defaults.oneline_text_len),
        }
    }
}

fn coerce<T: FromStr + Copy>(store: &dyn SettingsStore, key: &str, default: T) -> T {
    let Some(raw) = store.get(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key = key, value = %raw, "ignoring malformed setting");
            default
        }
    }
}

fn quote(store: &dyn SettingsStore) -> Option<char> {
    let raw = store.get(DND_XPATH_QUOTE)?;
    match raw.as_str() {
        "'" => Some('\''),
        "\"" => Some('"'),
        _ => {
            warn!(key = DND_XPATH_QUOTE, value = %raw, "ignoring malformed setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::from_store(&MemoryStore::new());
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.init_depth, 2);
        assert_eq!(config.search_max_visible, 20);
        assert_eq!(config.oneline_text_len, 100);
    }

    #[test]
    fn test_coercion() {
        let store: MemoryStore = [
            (INIT_DEPTH, " 4 "),
            (SEARCH_MAX_VISIBLE, "10"),
            (DND_XPATH_QUOTE, "\""),
            (DND_CYCLE_MODE, "true"),
            (ONELINE_TEXT_LEN, "80"),
        ]
        .into_iter()
        .collect();
        let config = ViewerConfig::from_store(&store);
        assert_eq!(config.init_depth, 4);
        assert_eq!(config.search_max_visible, 10);
        assert_eq!(config.xpath_quote, '"');
        assert!(config.cycle_mode);
        assert_eq!(config.oneline_text_len, 80);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set(INIT_DEPTH, "deep");
        store.set(SEARCH_MAX_VISIBLE, "-3");
        store.set(DND_XPATH_QUOTE, "`");
        store.set(DND_CYCLE_MODE, "yes");
        let config = ViewerConfig::from_store(&store);
        assert_eq!(config, ViewerConfig::default());
    }
}
