//! Ludo - a rules engine for the classic race game
//!
//! This crate provides the core game logic, including:
//! - The shared 52-cell ring, safe cells and per-color home stretches
//! - Token movement, entry on a six, blocks and captures
//! - A turn state machine with bonus turns and the triple-six penalty
//! - Heuristic computer players at three difficulty levels
//! - Save/restore of games in progress
//!
//! # Architecture
//!
//! [`GameState`] is a plain value: actions produce a new snapshot and never
//! mutate the old one. [`Game`] wraps it with a virtual clock for the
//! cosmetic delays, seeded dice, the bots and autosave. The engine can be
//! compiled to:
//! - Native Rust for simulations and servers
//! - WebAssembly for a browser front end
//!
//! # Modules
//!
//! - [`board`]: Colors, board geometry and coordinate mapping
//! - [`player`]: Players and tokens
//! - [`movement`]: Move legality
//! - [`capture`]: Blocks and captures
//! - [`game`]: The turn state machine
//! - [`bot`]: Computer players
//! - [`engine`]: The live game controller
//! - [`persistence`]: Save format and stores

pub mod actions;
pub mod board;
pub mod bot;
pub mod capture;
pub mod config;
pub mod engine;
pub mod game;
pub mod invariants;
pub mod movement;
pub mod persistence;
pub mod player;
pub mod scheduler;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{BonusReason, CaptureEvent, FinishEvent, GameAction, GameEvent};
pub use board::Color;
pub use bot::{Bot, Difficulty, DifficultyProfile};
pub use config::{ConfigError, GameConfig, GameMode, Timings};
pub use engine::Game;
pub use game::{GameError, GameState, GameStatus, Transition};
pub use invariants::{check_invariants, InvariantViolation};
pub use persistence::{MemoryStore, PersistError, SaveStore, SavedGame};
pub use player::{Player, Token, TokenId, TokenState};
pub use scheduler::Ticket;
