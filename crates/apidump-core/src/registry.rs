use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::entry_point::TableCategory;
use crate::error::LayerError;

/// Identifies the dispatch table that owns a handle.
///
/// Every handle created through the same next-layer negotiation maps to the
/// same key for as long as the handle lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DispatchKey(pub usize);

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Derives a [`DispatchKey`] from a raw handle value without touching any
/// registry. Supplied by the hosting runtime.
pub trait KeyExtractor: Send + Sync {
    fn key_of(&self, raw_handle: u64) -> DispatchKey;
}

/// Concurrent map from dispatch key to the next layer's table.
///
/// Tables are handed out as `Arc` clones so an unregister racing with a
/// lookup never leaves the reader with a dangling table.
pub struct DispatchRegistry<T> {
    category: TableCategory,
    tables: DashMap<DispatchKey, Arc<T>>,
}

impl<T> DispatchRegistry<T> {
    pub fn new(category: TableCategory) -> Self {
        Self {
            category,
            tables: DashMap::new(),
        }
    }

    pub fn category(&self) -> TableCategory {
        self.category
    }

    /// Insert the table for a freshly created object.
    ///
    /// A key that is already present means the next layer handed back an
    /// aliased handle; the existing entry is left untouched.
    pub fn register(&self, key: DispatchKey, table: Arc<T>) -> Result<(), LayerError> {
        match self.tables.entry(key) {
            Entry::Occupied(_) => Err(LayerError::DuplicateDispatchKey {
                category: self.category,
                key,
            }),
            Entry::Vacant(slot) => {
                slot.insert(table);
                Ok(())
            }
        }
    }

    /// Overwrite whatever is registered under `key`.
    pub fn replace(&self, key: DispatchKey, table: Arc<T>) -> Option<Arc<T>> {
        self.tables.insert(key, table)
    }

    pub fn lookup(&self, key: DispatchKey) -> Result<Arc<T>, LayerError> {
        self.tables
            .get(&key)
            .map(|t| Arc::clone(t.value()))
            .ok_or(LayerError::UnknownDispatchKey {
                category: self.category,
                key,
            })
    }

    pub fn unregister(&self, key: DispatchKey) -> Option<Arc<T>> {
        self.tables.remove(&key).map(|(_, t)| t)
    }

    pub fn contains(&self, key: DispatchKey) -> bool {
        self.tables.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_lookup_unregister() {
        let registry = DispatchRegistry::new(TableCategory::Device);
        let key = DispatchKey(0x1000);

        assert!(registry.lookup(key).is_err());
        registry.register(key, Arc::new("table-a")).unwrap();
        assert_eq!(*registry.lookup(key).unwrap(), "table-a");

        assert!(registry.unregister(key).is_some());
        assert!(matches!(
            registry.lookup(key),
            Err(LayerError::UnknownDispatchKey { .. })
        ));
        assert!(registry.unregister(key).is_none());
    }

    #[test]
    fn duplicate_register_keeps_original() {
        let registry = DispatchRegistry::new(TableCategory::Instance);
        let key = DispatchKey(7);

        registry.register(key, Arc::new(1u32)).unwrap();
        let err = registry.register(key, Arc::new(2u32)).unwrap_err();
        assert!(err.is_registry_violation());
        assert_eq!(*registry.lookup(key).unwrap(), 1);
    }

    #[test]
    fn lookup_outlives_unregister() {
        let registry = DispatchRegistry::new(TableCategory::Device);
        let key = DispatchKey(42);
        registry.register(key, Arc::new(String::from("live"))).unwrap();

        let held = registry.lookup(key).unwrap();
        registry.unregister(key);
        assert_eq!(held.as_str(), "live");
        assert!(registry.is_empty());
    }
}
