//! Players and their tokens.
//!
//! This module contains:
//! - `TokenId`, the stable `(color, slot)` identity of a token
//! - `Token` with its relative position and lifecycle state
//! - `Player`, four tokens plus seat metadata

use crate::board::{
    absolute_cell, is_ring_position, Color, FINISH_POSITION, HOME_POSITION, TOKENS_PER_PLAYER,
};
use crate::bot::Difficulty;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a token: its color and slot (0-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId {
    pub color: Color,
    pub slot: u8,
}

impl TokenId {
    pub fn new(color: Color, slot: u8) -> Self {
        Self { color, slot }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.color, self.slot)
    }
}

impl FromStr for TokenId {
    type Err = String;

    /// Parses ids of the form `red-2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (color, slot) = s
            .rsplit_once('-')
            .ok_or_else(|| format!("malformed token id: {s}"))?;
        let color: Color = color.parse()?;
        let slot: u8 = slot
            .parse()
            .map_err(|_| format!("malformed token slot: {s}"))?;
        if usize::from(slot) >= TOKENS_PER_PLAYER {
            return Err(format!("token slot out of range: {s}"));
        }
        Ok(Self { color, slot })
    }
}

/// Lifecycle state of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    /// Waiting in the home base
    Home,
    /// On the ring or the home stretch
    Active,
    /// Arrived at the finish
    Finished,
}

/// A single token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub color: Color,
    /// Relative position (-1 home, 0-51 ring, 52-57 home stretch, 58 finished)
    pub position: i8,
    pub state: TokenState,
}

impl Token {
    /// Create a token sitting in its home base
    pub fn new(color: Color, slot: u8) -> Self {
        Self {
            id: TokenId::new(color, slot),
            color,
            position: HOME_POSITION,
            state: TokenState::Home,
        }
    }

    pub fn is_home(&self) -> bool {
        self.state == TokenState::Home
    }

    pub fn is_active(&self) -> bool {
        self.state == TokenState::Active
    }

    pub fn is_finished(&self) -> bool {
        self.state == TokenState::Finished
    }

    /// Active and on the shared ring (not in the home stretch)
    pub fn is_on_ring(&self) -> bool {
        self.is_active() && is_ring_position(self.position)
    }

    /// Absolute ring cell, if the token is on the ring
    pub fn absolute_cell(&self) -> Option<u8> {
        if !self.is_on_ring() {
            return None;
        }
        absolute_cell(self.color, self.position)
    }

    /// Put the token at a relative position, keeping `state` in agreement
    pub(crate) fn place_at(&mut self, position: i8) {
        self.position = position;
        self.state = if position == FINISH_POSITION {
            TokenState::Finished
        } else if position <= HOME_POSITION {
            TokenState::Home
        } else {
            TokenState::Active
        };
    }

    /// Return the token to its home base
    pub(crate) fn send_home(&mut self) {
        self.place_at(HOME_POSITION);
    }
}

/// A seated player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub color: Color,
    pub name: String,
    pub tokens: [Token; TOKENS_PER_PLAYER],
    pub is_ai: bool,
    pub ai_difficulty: Option<Difficulty>,
    /// Always equal to the number of finished tokens
    pub finished_tokens: u8,
}

impl Player {
    /// Create a player with all tokens at home
    pub fn new(color: Color, name: String, ai_difficulty: Option<Difficulty>) -> Self {
        Self {
            id: format!("player-{color}"),
            color,
            name,
            tokens: std::array::from_fn(|slot| Token::new(color, slot as u8)),
            is_ai: ai_difficulty.is_some(),
            ai_difficulty,
            finished_tokens: 0,
        }
    }

    /// Get a token by id
    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    pub(crate) fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id == id)
    }

    /// Whether all four tokens have finished
    pub fn has_finished(&self) -> bool {
        usize::from(self.finished_tokens) == TOKENS_PER_PLAYER
    }

    /// Count tokens in a given state
    pub fn count_in_state(&self, state: TokenState) -> usize {
        self.tokens.iter().filter(|t| t.state == state).count()
    }

    /// The active token furthest along its path; earliest slot wins ties
    pub fn most_advanced_active(&self) -> Option<TokenId> {
        self.tokens
            .iter()
            .filter(|t| t.is_active())
            .fold(None::<&Token>, |best, t| match best {
                Some(b) if b.position >= t.position => Some(b),
                _ => Some(t),
            })
            .map(|t| t.id)
    }

    /// Recompute `finished_tokens` from the tokens themselves
    pub(crate) fn sync_finished(&mut self) {
        self.finished_tokens = self.count_in_state(TokenState::Finished) as u8;
    }
}
