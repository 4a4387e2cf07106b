//! Player rating table
//!
//! One entry per player name, sorted by best score. Persisted as a JSON array
//! next to the result of the most recent game.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError, keys, load_json, save_json};

/// Result of one finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub name: String,
    pub total_score: u32,
    /// Unix timestamp (ms)
    pub date: f64,
}

/// A single rating row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    pub name: String,
    pub best_score: u32,
    pub last_score: u32,
    /// Unix timestamp (ms) of the last game
    pub last_date: f64,
}

/// Rating table, sorted descending by best score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingTable {
    pub entries: Vec<RatingEntry>,
}

impl RatingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished game. Returns the player's 1-indexed rank.
    pub fn upsert(&mut self, result: &GameResult) -> usize {
        match self.entries.iter_mut().find(|e| e.name == result.name) {
            Some(entry) => {
                entry.best_score = entry.best_score.max(result.total_score);
                entry.last_score = result.total_score;
                entry.last_date = result.date;
            }
            None => self.entries.push(RatingEntry {
                name: result.name.clone(),
                best_score: result.total_score,
                last_score: result.total_score,
                last_date: result.date,
            }),
        }

        // Stable, so ties keep their previous order
        self.entries.sort_by(|a, b| b.best_score.cmp(&a.best_score));

        self.rank_of(&result.name).unwrap_or(self.entries.len())
    }

    /// 1-indexed rank of a player
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name).map(|i| i + 1)
    }

    pub fn get(&self, name: &str) -> Option<&RatingEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Load from the store; missing or malformed data is an empty table
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let table: Self = load_json(store, keys::RATING).unwrap_or_default();
        log::info!("Loaded rating table ({} entries)", table.len());
        table
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        save_json(store, keys::RATING, self)?;
        log::info!("Rating table saved ({} entries)", self.len());
        Ok(())
    }
}

/// Store a finished game as the last result and fold it into the rating
pub fn save_game_result(
    store: &mut dyn KeyValueStore,
    result: &GameResult,
) -> Result<RatingTable, StoreError> {
    save_json(store, keys::LAST_GAME, result)?;
    let mut table = RatingTable::load(store);
    let rank = table.upsert(result);
    table.save(store)?;
    log::info!(
        "Saved result for {}: {} points, rank {}",
        result.name,
        result.total_score,
        rank
    );
    Ok(table)
}

pub fn last_game_result(store: &dyn KeyValueStore) -> Option<GameResult> {
    load_json(store, keys::LAST_GAME)
}

pub fn clear_last_game(store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(keys::LAST_GAME)
}

/// Format a timestamp relative to `now` (both Unix ms)
pub fn format_date(timestamp: f64, now: f64) -> String {
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            let (year, month, day) = civil_date(timestamp);
            format!("{}/{}/{}", month, day, year % 100)
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

/// UTC (year, month, day) for a Unix timestamp in ms
fn civil_date(timestamp: f64) -> (i64, u32, u32) {
    let days = (timestamp / 86_400_000.0).floor() as i64;
    // Days-to-civil over 400-year eras, epoch shifted to 0000-03-01
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}
