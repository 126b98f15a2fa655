//! Game configuration and cosmetic timings.

use crate::board::Color;
use crate::bot::Difficulty;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Who is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// One human against computer players
    Single,
    /// Everyone is human, sharing one device
    Local,
}

/// Errors in a game configuration
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Player count must be 2-4, got {0}")]
    InvalidPlayerCount(u8),

    #[error("Single-player mode needs an AI difficulty")]
    MissingDifficulty,
}

/// Configuration supplied when a game is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub mode: GameMode,
    pub player_count: u8,
    pub ai_difficulty: Option<Difficulty>,
    /// Seat taken by the human in single mode. A color that is not seated
    /// (blue in a 2- or 3-player game) leaves every seat to the computer.
    pub human_player_color: Color,
}

impl GameConfig {
    /// One human (red) against AI opponents
    pub fn single(player_count: u8, difficulty: Difficulty) -> Self {
        Self {
            mode: GameMode::Single,
            player_count,
            ai_difficulty: Some(difficulty),
            human_player_color: Color::Red,
        }
    }

    /// All-human game
    pub fn local(player_count: u8) -> Self {
        Self {
            mode: GameMode::Local,
            player_count,
            ai_difficulty: None,
            human_player_color: Color::Red,
        }
    }

    /// Move the human to another seat; an unseated color makes the game
    /// computer-only
    pub fn with_human_color(mut self, color: Color) -> Self {
        self.human_player_color = color;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=4).contains(&self.player_count) {
            return Err(ConfigError::InvalidPlayerCount(self.player_count));
        }
        if self.mode == GameMode::Single && self.ai_difficulty.is_none() {
            return Err(ConfigError::MissingDifficulty);
        }
        Ok(())
    }

    /// Colors seated in this game, in turn order
    pub fn colors(&self) -> &'static [Color] {
        let count = usize::from(self.player_count.clamp(2, 4));
        &Color::ALL[..count]
    }

    /// AI difficulty for a seat, or `None` if a human sits there
    pub fn difficulty_for(&self, color: Color) -> Option<Difficulty> {
        match self.mode {
            GameMode::Single if color != self.human_player_color => self.ai_difficulty,
            _ => None,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::single(4, Difficulty::Medium)
    }
}

/// Cosmetic delays in milliseconds. None of them affect the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Dice animation before a roll settles
    pub roll_ms: u64,
    /// Pause before a roll with no legal move passes the turn
    pub skip_ms: u64,
    /// AI "thinking" before rolling, indexed medium/hard/expert
    pub ai_roll_ms: [u64; 3],
    /// AI "thinking" before moving, indexed medium/hard/expert
    pub ai_move_ms: [u64; 3],
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            roll_ms: 600,
            skip_ms: 1000,
            ai_roll_ms: [800, 1000, 1200],
            ai_move_ms: [700, 1000, 1500],
        }
    }
}

impl Timings {
    /// No delays at all, for headless play and tests
    pub fn instant() -> Self {
        Self {
            roll_ms: 0,
            skip_ms: 0,
            ai_roll_ms: [0; 3],
            ai_move_ms: [0; 3],
        }
    }

    /// Multiply every delay by `factor`
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor.max(0.0)).round() as u64;
        Self {
            roll_ms: scale(self.roll_ms),
            skip_ms: scale(self.skip_ms),
            ai_roll_ms: self.ai_roll_ms.map(scale),
            ai_move_ms: self.ai_move_ms.map(scale),
        }
    }

    pub fn roll_delay(&self) -> Duration {
        Duration::from_millis(self.roll_ms)
    }

    pub fn skip_delay(&self) -> Duration {
        Duration::from_millis(self.skip_ms)
    }

    pub fn ai_roll_delay(&self, difficulty: Difficulty) -> Duration {
        Duration::from_millis(self.ai_roll_ms[difficulty.index()])
    }

    pub fn ai_move_delay(&self, difficulty: Difficulty) -> Duration {
        Duration::from_millis(self.ai_move_ms[difficulty.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_count() {
        assert_eq!(
            GameConfig::local(5).validate(),
            Err(ConfigError::InvalidPlayerCount(5))
        );
        assert_eq!(
            GameConfig::local(1).validate(),
            Err(ConfigError::InvalidPlayerCount(1))
        );
        assert!(GameConfig::local(2).validate().is_ok());
    }

    #[test]
    fn test_single_mode_requires_difficulty() {
        let mut config = GameConfig::single(3, Difficulty::Hard);
        assert!(config.validate().is_ok());
        config.ai_difficulty = None;
        assert_eq!(config.validate(), Err(ConfigError::MissingDifficulty));
    }

    #[test]
    fn test_seats_follow_color_order() {
        assert_eq!(GameConfig::local(2).colors(), &[Color::Red, Color::Green]);
        assert_eq!(GameConfig::local(4).colors(), &Color::ALL);
    }

    #[test]
    fn test_only_non_human_seats_are_ai_in_single_mode() {
        let config = GameConfig::single(4, Difficulty::Expert).with_human_color(Color::Yellow);
        assert_eq!(config.difficulty_for(Color::Yellow), None);
        assert_eq!(config.difficulty_for(Color::Red), Some(Difficulty::Expert));

        let local = GameConfig::local(4);
        assert!(Color::ALL.iter().all(|&c| local.difficulty_for(c).is_none()));
    }

    #[test]
    fn test_unseated_human_color_leaves_every_seat_to_ai() {
        let config = GameConfig::single(3, Difficulty::Medium).with_human_color(Color::Blue);
        assert!(config.validate().is_ok());
        assert!(config
            .colors()
            .iter()
            .all(|&c| config.difficulty_for(c) == Some(Difficulty::Medium)));
    }

    #[test]
    fn test_scaled_timings() {
        let timings = Timings::default().scaled(0.5);
        assert_eq!(timings.roll_ms, 300);
        assert_eq!(timings.ai_move_ms, [350, 500, 750]);
        assert_eq!(Timings::default().scaled(0.0), Timings::instant());
    }
}
