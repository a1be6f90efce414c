//! Key/value configuration that freezes on first use
//!
//! Keys are dotted strings (`writer.format`, `writer2.table`), values are plain
//! strings. Entries can be changed until the runtime starts consuming them;
//! afterwards every `set` fails with [`LoggerError::ConfigurationFrozen`] and
//! the stored entries stay as they were.

use super::error::{LoggerError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct Configuration {
    entries: RwLock<BTreeMap<String, String>>,
    frozen: AtomicBool,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value; fails once the configuration is frozen
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let mut entries = self.entries.write();
        // checked under the write lock, so a concurrent freeze cannot interleave
        if self.frozen.load(Ordering::Acquire) {
            return Err(LoggerError::frozen(key));
        }
        entries.insert(key, value.into());
        Ok(())
    }

    /// Remove a value; fails once the configuration is frozen
    pub fn remove(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write();
        if self.frozen.load(Ordering::Acquire) {
            return Err(LoggerError::frozen(key));
        }
        Ok(entries.remove(key))
    }

    /// Make the configuration read-only. Calling it again has no effect.
    pub fn freeze(&self) {
        let _entries = self.entries.write();
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Comma separated list: items trimmed, empty items dropped, order kept
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|value| split_list(&value))
    }

    /// `true`/`false` (case-insensitive); anything else is `None`
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|value| parse_bool(&value))
    }

    /// All entries whose key starts with `prefix`, with the prefix cut off
    pub fn sub_map(&self, prefix: &str) -> BTreeMap<String, String> {
        self.entries
            .read()
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect()
    }

    /// Copy of every entry
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
            frozen: AtomicBool::new(false),
        }
    }
}

pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
