//! Key-value storage backends

use std::cell::RefCell;
use std::collections::HashMap;

/// Storage failure
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Storage backend unavailable")]
    Unavailable,
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value store (LocalStorage on web)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store; contents are lost on reload
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Persistent store that degrades to memory-only when its backend fails
///
/// Writes always land in memory first, and values read from the primary
/// backend are kept there too. The primary is dropped on its first write
/// failure; reads then come from memory alone.
pub struct FallbackStore {
    primary: Option<Box<dyn KeyValueStore>>,
    memory: RefCell<MemoryStore>,
}

impl FallbackStore {
    pub fn new(primary: Option<Box<dyn KeyValueStore>>) -> Self {
        if primary.is_none() {
            log::warn!("Persistent storage unavailable, using in-memory storage");
        }
        Self {
            primary,
            memory: RefCell::default(),
        }
    }

    /// Memory-only store
    pub fn memory_only() -> Self {
        Self {
            primary: None,
            memory: RefCell::default(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.primary.is_some()
    }

    fn degrade(&mut self, err: &StoreError) {
        log::warn!("{}; falling back to in-memory storage", err);
        self.primary = None;
    }
}

impl KeyValueStore for FallbackStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(primary) = &self.primary {
            match primary.get(key) {
                Ok(Some(value)) => {
                    self.memory.borrow_mut().set(key, &value)?;
                    return Ok(Some(value));
                }
                Ok(None) => {}
                Err(err) => log::warn!("Read of '{}' failed: {}", key, err),
            }
        }
        self.memory.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.memory.get_mut().set(key, value)?;
        if let Some(primary) = self.primary.as_mut() {
            if let Err(err) = primary.set(key, value) {
                self.degrade(&err);
            }
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.memory.get_mut().remove(key)?;
        if let Some(primary) = self.primary.as_mut() {
            if let Err(err) = primary.remove(key) {
                self.degrade(&err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend that fails every call
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("quota exceeded".to_string()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_fallback_degrades_without_losing_writes() {
        let mut store = FallbackStore::new(Some(Box::new(BrokenStore)));
        assert!(store.is_persistent());
        assert_eq!(store.get("name").unwrap(), None);

        store.set("name", "Ann").unwrap();
        assert!(!store.is_persistent());
        assert_eq!(store.get("name").unwrap().as_deref(), Some("Ann"));
    }

    /// Backend holding saved data that refuses new writes
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("quota exceeded".to_string()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    #[test]
    fn test_fallback_keeps_values_read_before_degrading() {
        let mut saved = MemoryStore::new();
        saved.set("rating", "[]").unwrap();
        let mut store = FallbackStore::new(Some(Box::new(ReadOnlyStore(saved))));
        assert_eq!(store.get("rating").unwrap().as_deref(), Some("[]"));

        store.set("name", "Ann").unwrap();
        assert!(!store.is_persistent());
        assert_eq!(store.get("rating").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get("name").unwrap().as_deref(), Some("Ann"));
    }

    #[test]
    fn test_fallback_writes_through() {
        let mut store = FallbackStore::new(Some(Box::new(MemoryStore::new())));
        store.set("k", "v").unwrap();
        assert!(store.is_persistent());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::Backend("quota".into()).to_string(),
            "Storage backend error: quota"
        );
    }
}
