//! Local persistence
//!
//! Everything the game keeps between page loads is a JSON value under one of
//! the [`keys`]. Reads never fail: missing or unparsable data comes back as
//! `None` and the caller uses its default.

pub mod store;
#[cfg(target_arch = "wasm32")]
pub mod local;

pub use store::{FallbackStore, KeyValueStore, MemoryStore, StoreError};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Storage keys
pub mod keys {
    pub const CURRENT_PLAYER: &str = "carGameCurrentPlayer";
    pub const LAST_GAME: &str = "carGameLastGame";
    pub const RATING: &str = "carGameRating";
    pub const START_LEVEL: &str = "carGameStartLevel";
}

/// Read and parse a JSON value, `None` if absent or malformed
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("Failed to read '{}': {}", key, err);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Ignoring malformed '{}': {}", key, err);
            None
        }
    }
}

pub fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// Open the platform's persistent store, falling back to memory
#[cfg(target_arch = "wasm32")]
pub fn open_default() -> FallbackStore {
    let primary = local::LocalStore::open()
        .map(|s| Box::new(s) as Box<dyn KeyValueStore>)
        .map_err(|err| log::warn!("{}", err))
        .ok();
    FallbackStore::new(primary)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn open_default() -> FallbackStore {
    FallbackStore::memory_only()
}
