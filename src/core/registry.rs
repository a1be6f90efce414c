//! Name-keyed registry of pluggable implementations
//!
//! Stands in for service discovery: the process entry point registers every
//! backend builder, writer builder, placeholder kind and filter kind it wants
//! to offer, and the runtime only ever asks two questions: "which
//! implementation is called `name`?" and "what is registered at all?".

use std::fmt;
use std::sync::Arc;

/// Anything that can be registered under a name
pub trait Named {
    fn name(&self) -> &str;
}

pub struct Registry<T: ?Sized> {
    entries: Vec<Arc<T>>,
}

impl<T: ?Sized + Named> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an implementation; a later entry with the same name replaces
    /// the earlier one but keeps its position
    pub fn register(&mut self, entry: Arc<T>) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.name() == entry.name())
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Case-sensitive exact lookup
    pub fn lookup(&self, name: &str) -> Option<Arc<T>> {
        self.entries
            .iter()
            .find(|entry| entry.name() == name)
            .cloned()
    }

    /// All registered implementations in registration order
    pub fn all(&self) -> &[Arc<T>] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized + Named> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Named> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(&'static str, u32);

    impl Named for Entry {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut registry: Registry<Entry> = Registry::new();
        registry.register(Arc::new(Entry("native", 1)));

        assert!(registry.lookup("native").is_some());
        assert!(registry.lookup("Native").is_none());
        assert!(registry.lookup(" native").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry: Registry<Entry> = Registry::new();
        registry.register(Arc::new(Entry("a", 1)));
        registry.register(Arc::new(Entry("b", 2)));
        registry.register(Arc::new(Entry("a", 3)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.lookup("a").unwrap().1, 3);
    }
}
