//! Browser LocalStorage backend

use super::store::{KeyValueStore, StoreError};

pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// Access `window.localStorage`; fails in private modes that disable it
    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .ok_or(StoreError::Unavailable)?
            .local_storage()
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))?
            .ok_or(StoreError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))
    }
}
