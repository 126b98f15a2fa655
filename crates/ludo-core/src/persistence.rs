//! Saving and restoring games.
//!
//! A save is the JSON of `{state, config, timestamp_ms}`. Saves older than a
//! day, saves that fail to parse and saves whose state breaks an invariant
//! are all rejected; callers fall back to a fresh game.

use crate::config::{ConfigError, GameConfig};
use crate::game::{GameState, GameStatus};
use crate::invariants::{check_invariants, check_seating};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Saves older than this are discarded
pub const SAVE_TTL_MS: u64 = 86_400_000;

/// Errors reading or writing a save
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Malformed save: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Save is {age_ms} ms old")]
    Expired { age_ms: u64 },

    #[error("Saved config is invalid: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Saved state is inconsistent: {0}")]
    Corrupt(String),
}

/// A saved game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub state: GameState,
    pub config: GameConfig,
    /// Milliseconds since the Unix epoch when the save was written
    pub timestamp_ms: u64,
}

/// Where saves live. One slot per store.
pub trait SaveStore: Send {
    fn read(&self) -> Option<String>;

    fn write(&mut self, data: String);

    fn clear(&mut self);

    /// Wall-clock time used to stamp and age saves
    fn now_ms(&self) -> u64 {
        unix_now_ms()
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it
pub fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// In-memory store, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub data: Option<String>,
    /// Fixed clock; `None` uses the system clock
    pub clock_ms: Option<u64>,
}

impl MemoryStore {
    pub fn with_clock(clock_ms: u64) -> Self {
        Self {
            data: None,
            clock_ms: Some(clock_ms),
        }
    }
}

impl SaveStore for MemoryStore {
    fn read(&self) -> Option<String> {
        self.data.clone()
    }

    fn write(&mut self, data: String) {
        self.data = Some(data);
    }

    fn clear(&mut self) {
        self.data = None;
    }

    fn now_ms(&self) -> u64 {
        self.clock_ms.unwrap_or_else(unix_now_ms)
    }
}

/// Serialize a game for storage
pub fn save_game(
    state: &GameState,
    config: &GameConfig,
    now_ms: u64,
) -> Result<String, PersistError> {
    let saved = SavedGame {
        state: state.clone(),
        config: config.clone(),
        timestamp_ms: now_ms,
    };
    Ok(serde_json::to_string(&saved)?)
}

/// Parse and vet a save
pub fn load_game(raw: &str, now_ms: u64) -> Result<SavedGame, PersistError> {
    let saved: SavedGame = serde_json::from_str(raw)?;

    let age_ms = now_ms.saturating_sub(saved.timestamp_ms);
    if age_ms > SAVE_TTL_MS {
        return Err(PersistError::Expired { age_ms });
    }

    saved.config.validate()?;
    let violation = check_seating(&saved.state, &saved.config)
        .into_iter()
        .chain(check_invariants(&saved.state))
        .next();
    if let Some(violation) = violation {
        return Err(PersistError::Corrupt(violation.message));
    }

    Ok(saved)
}

/// What to do with the store after a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveAction {
    Write,
    Clear,
    Keep,
}

/// Games in progress are saved; finished games are cleared
pub fn autosave_action(state: &GameState) -> AutosaveAction {
    match state.game_status {
        GameStatus::Playing => AutosaveAction::Write,
        GameStatus::Finished => AutosaveAction::Clear,
        GameStatus::Waiting => AutosaveAction::Keep,
    }
}
