//! Player preferences
//!
//! The player name is stored as a plain string, the start level as JSON.

use serde::{Deserialize, Serialize};

use crate::consts::LEVEL_COUNT;
use crate::persistence::{KeyValueStore, StoreError, keys, load_json, save_json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Trimmed player name; empty until the landing page stores one
    pub player_name: String,
    /// Level a new game starts at (1..=3)
    pub start_level: u8,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            start_level: 1,
        }
    }
}

impl Preferences {
    pub fn has_player(&self) -> bool {
        !self.player_name.is_empty()
    }

    /// Set the player name from user input. Blank names are rejected.
    pub fn set_player_name(&mut self, raw: &str) -> bool {
        let name = raw.trim();
        if name.is_empty() {
            return false;
        }
        self.player_name = name.to_string();
        true
    }

    pub fn set_start_level(&mut self, level: i64) {
        self.start_level = clamp_level(level);
    }

    /// Load preferences, falling back to defaults field by field
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let player_name = match store.get(keys::CURRENT_PLAYER) {
            Ok(name) => name.map(|n| n.trim().to_string()).unwrap_or_default(),
            Err(err) => {
                log::warn!("Failed to read player name: {}", err);
                String::new()
            }
        };
        let start_level = load_json::<i64>(store, keys::START_LEVEL)
            .map(clamp_level)
            .unwrap_or(1);

        log::info!("Loaded preferences (start level {})", start_level);
        Self {
            player_name,
            start_level,
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set(keys::CURRENT_PLAYER, &self.player_name)?;
        save_json(store, keys::START_LEVEL, &self.start_level)?;
        log::info!("Preferences saved");
        Ok(())
    }
}

fn clamp_level(level: i64) -> u8 {
    level.clamp(1, LEVEL_COUNT as i64) as u8
}
