//! Game actions that players can take.
//!
//! This module defines all possible actions in the game and the events
//! that result from those actions.

use crate::board::Color;
use crate::player::TokenId;
use serde::{Deserialize, Serialize};

/// All possible actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Leave the waiting room and start play
    StartGame,
    /// Start rolling the die (the value settles separately)
    RollDice,
    /// Settle a roll in progress on a drawn value (1-6)
    SettleDice(u8),
    /// Move a token by the pending die value
    MoveToken(TokenId),
    /// Pass the turn after a roll that left no legal move
    SkipTurn,
}

/// Recorded when a move sends opposing tokens home
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub attacker_color: Color,
    /// Color of the first victim in seating order
    pub victim_color: Color,
    /// Absolute ring cell where the capture happened
    pub position: u8,
    /// Every token sent home by this move
    pub victims: Vec<TokenId>,
}

/// Recorded when a token reaches the finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishEvent {
    pub color: Color,
    pub token_id: TokenId,
}

/// Why the current player keeps the turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BonusReason {
    RolledSix,
    Captured,
    Finished,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Play has begun
    GameStarted,

    /// The game was replaced by a fresh one
    GameReset,

    /// A roll is in progress
    RollStarted { color: Color },

    /// The die settled
    DiceRolled { color: Color, value: u8 },

    /// Third six in a row: roll forfeited and the lead token sent home
    TripleSixPenalty {
        color: Color,
        sent_home: Option<TokenId>,
    },

    /// A token left its home base
    TokenEntered { token: TokenId },

    /// A token moved along its path
    TokenMoved { token: TokenId, from: i8, to: i8 },

    /// Opposing tokens were sent home
    TokenCaptured(CaptureEvent),

    /// A token reached the finish
    TokenFinished(FinishEvent),

    /// A player brought all four tokens home
    PlayerRanked { color: Color, place: usize },

    /// The same player rolls again
    BonusTurn { color: Color, reason: BonusReason },

    /// The turn passed to another player
    TurnPassed { from: Color, to: Color },

    /// A roll left no legal move and the turn was skipped
    TurnSkipped { color: Color },

    /// The game is over
    GameOver {
        winner: Option<Color>,
        rankings: Vec<Color>,
    },
}
