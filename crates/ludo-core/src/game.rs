//! Core game state machine.
//!
//! This module contains the `GameState` snapshot and the reducer that maps
//! `(state, action)` to a new state. A snapshot is never edited in place by
//! callers: every accepted action yields a fresh value and a list of events,
//! and a rejected action yields a `GameError` with the old state untouched.

use crate::actions::{BonusReason, CaptureEvent, FinishEvent, GameAction, GameEvent};
use crate::board::{Color, RING_LEN};
use crate::capture::{capturable_at, send_home};
use crate::config::GameConfig;
use crate::movement::{can_token_move, destination, movable_tokens};
use crate::player::{Player, Token, TokenId};
use crate::scheduler::Ticket;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Sixes in a row that forfeit the roll
pub const MAX_CONSECUTIVE_SIXES: u8 = 3;

/// Overall game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Created, not started yet
    Waiting,
    /// In progress
    Playing,
    /// All but one player have finished
    Finished,
}

/// Reasons an action is rejected. The state is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Game is not in progress")]
    GameNotPlaying,

    #[error("Game already started")]
    AlreadyStarted,

    #[error("Game is over")]
    GameOver,

    #[error("Dice are already rolling")]
    AlreadyRolling,

    #[error("A die value is waiting for a move")]
    DicePending,

    #[error("No roll in progress")]
    NotRolling,

    #[error("Die value {0} is outside 1-6")]
    InvalidDieValue(u8),

    #[error("No die value to move with")]
    NoDiceValue,

    #[error("No such token: {0}")]
    NoSuchToken(TokenId),

    #[error("Token {0} does not belong to the current player")]
    NotYourToken(TokenId),

    #[error("Token {0} cannot move that far")]
    IllegalMove(TokenId),

    #[error("A legal move is available")]
    MovesAvailable,
}

/// Result of an accepted action
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Seated players in turn order
    pub players: Vec<Player>,
    /// Index into `players` of whoever acts next
    pub current_player_index: usize,
    /// Die value waiting to be used, 1-6
    pub dice_value: Option<u8>,
    pub is_rolling: bool,
    /// Whether the pending value is a six
    pub can_roll_again: bool,
    /// Tentative selection when exactly one token can move
    pub selected_token_id: Option<TokenId>,
    pub game_status: GameStatus,
    /// First player to bring all tokens home
    pub winner: Option<Color>,
    /// Players in the order they finished
    pub rankings: Vec<Color>,
    /// Resolved actions: moves, skips and forfeited rolls
    pub turn_count: u32,
    pub consecutive_sixes: u8,
    pub last_capture_event: Option<CaptureEvent>,
    pub last_finish_event: Option<FinishEvent>,
    /// Bumped by every accepted action
    #[serde(default)]
    pub version: u64,
    /// Bumped by every reset
    #[serde(default)]
    pub generation: u64,
}

impl GameState {
    /// Create a fresh game for a configuration
    pub fn new(config: &GameConfig) -> Self {
        let players = config
            .colors()
            .iter()
            .map(|&color| {
                let name = if color == config.human_player_color {
                    "You".to_string()
                } else {
                    format!("Player {color}")
                };
                Player::new(color, name, config.difficulty_for(color))
            })
            .collect();

        Self {
            players,
            current_player_index: 0,
            dice_value: None,
            is_rolling: false,
            can_roll_again: false,
            selected_token_id: None,
            game_status: GameStatus::Waiting,
            winner: None,
            rankings: Vec::new(),
            turn_count: 0,
            consecutive_sixes: 0,
            last_capture_event: None,
            last_finish_event: None,
            version: 0,
            generation: 0,
        }
    }

    /// A fresh game for the same configuration, in a new generation
    pub fn reset(&self, config: &GameConfig) -> Self {
        Self {
            generation: self.generation + 1,
            ..Self::new(config)
        }
    }

    /// Identity of this exact snapshot, for deferred actions
    pub fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
            version: self.version,
        }
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The player whose turn it is
    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player_index]
    }

    /// Get a player by color
    pub fn player(&self, color: Color) -> Option<&Player> {
        self.players.iter().find(|p| p.color == color)
    }

    fn player_mut(&mut self, color: Color) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.color == color)
    }

    /// Get a token by id
    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.player(id.color).and_then(|p| p.token(id))
    }

    pub fn is_finished(&self) -> bool {
        self.game_status == GameStatus::Finished
    }

    /// Playing, nothing pending: the current player should roll
    pub fn awaiting_roll(&self) -> bool {
        self.game_status == GameStatus::Playing && !self.is_rolling && self.dice_value.is_none()
    }

    /// Playing with a settled die: the current player should move or skip
    pub fn awaiting_move(&self) -> bool {
        self.game_status == GameStatus::Playing && !self.is_rolling && self.dice_value.is_some()
    }

    /// Whether `token` may move `dice` steps on the current board
    pub fn can_token_move(&self, token: &Token, dice: u8) -> bool {
        can_token_move(&self.players, token, dice)
    }

    /// Tokens of the current player that can use the pending die value
    pub fn movable_tokens(&self) -> Vec<Token> {
        let Some(dice) = self.dice_value else {
            return Vec::new();
        };
        movable_tokens(&self.players, self.current_player(), dice)
            .into_iter()
            .copied()
            .collect()
    }

    /// Human-facing roll permission: the current player is human and may roll
    pub fn can_roll(&self) -> bool {
        self.awaiting_roll() && !self.current_player().is_ai
    }

    // ==================== Reducers ====================

    /// Apply an action, producing the next state and its events
    pub fn apply(&self, action: GameAction) -> Result<Transition, GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }

        let mut next = self.clone();
        let mut events = Vec::new();

        match action {
            GameAction::StartGame => next.start(&mut events)?,
            GameAction::RollDice => next.begin_roll(&mut events)?,
            GameAction::SettleDice(value) => next.settle_roll(value, &mut events)?,
            GameAction::MoveToken(id) => next.move_token_inner(id, &mut events)?,
            GameAction::SkipTurn => next.skip(&mut events)?,
        }

        next.version += 1;
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Apply an action, treating rejection as a no-op
    pub fn reduce(&self, action: GameAction) -> GameState {
        match self.apply(action) {
            Ok(transition) => transition.state,
            Err(err) => {
                debug!(?action, %err, "action ignored");
                self.clone()
            }
        }
    }

    pub fn start_game(&self) -> GameState {
        self.reduce(GameAction::StartGame)
    }

    pub fn roll_dice(&self) -> GameState {
        self.reduce(GameAction::RollDice)
    }

    pub fn settle_dice(&self, value: u8) -> GameState {
        self.reduce(GameAction::SettleDice(value))
    }

    pub fn move_token(&self, id: TokenId) -> GameState {
        self.reduce(GameAction::MoveToken(id))
    }

    pub fn skip_turn(&self) -> GameState {
        self.reduce(GameAction::SkipTurn)
    }

    // ==================== Action handlers ====================

    fn start(&mut self, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.game_status != GameStatus::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        self.game_status = GameStatus::Playing;
        events.push(GameEvent::GameStarted);
        Ok(())
    }

    fn begin_roll(&mut self, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.game_status != GameStatus::Playing {
            return Err(GameError::GameNotPlaying);
        }
        if self.is_rolling {
            return Err(GameError::AlreadyRolling);
        }
        if self.dice_value.is_some() {
            return Err(GameError::DicePending);
        }

        self.is_rolling = true;
        self.selected_token_id = None;
        self.last_capture_event = None;
        self.last_finish_event = None;
        events.push(GameEvent::RollStarted {
            color: self.current_player().color,
        });
        Ok(())
    }

    fn settle_roll(&mut self, value: u8, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.game_status != GameStatus::Playing {
            return Err(GameError::GameNotPlaying);
        }
        if !self.is_rolling {
            return Err(GameError::NotRolling);
        }
        if !(1..=6).contains(&value) {
            return Err(GameError::InvalidDieValue(value));
        }

        let color = self.current_player().color;
        self.is_rolling = false;
        self.consecutive_sixes = if value == 6 {
            self.consecutive_sixes + 1
        } else {
            0
        };
        events.push(GameEvent::DiceRolled { color, value });

        if self.consecutive_sixes >= MAX_CONSECUTIVE_SIXES {
            self.forfeit_roll(events);
            return Ok(());
        }

        self.dice_value = Some(value);
        self.can_roll_again = value == 6;

        let movable = self.movable_tokens();
        if let [only] = movable.as_slice() {
            self.selected_token_id = Some(only.id);
        }
        Ok(())
    }

    /// Triple-six penalty: lead token home, turn passes, no move
    fn forfeit_roll(&mut self, events: &mut Vec<GameEvent>) {
        let index = self.current_player_index;
        let player = &mut self.players[index];
        let color = player.color;
        let sent_home = player.most_advanced_active();
        if let Some(id) = sent_home {
            if let Some(token) = player.token_mut(id) {
                token.send_home();
            }
        }
        player.sync_finished();

        info!(%color, ?sent_home, "triple six penalty");
        events.push(GameEvent::TripleSixPenalty { color, sent_home });

        self.consecutive_sixes = 0;
        self.dice_value = None;
        self.can_roll_again = false;
        self.selected_token_id = None;
        self.turn_count += 1;
        self.pass_turn(events);
    }

    fn move_token_inner(
        &mut self,
        id: TokenId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if self.game_status != GameStatus::Playing {
            return Err(GameError::GameNotPlaying);
        }
        let dice = self.dice_value.ok_or(GameError::NoDiceValue)?;
        let color = self.current_player().color;
        if id.color != color {
            return Err(GameError::NotYourToken(id));
        }
        let token = *self.token(id).ok_or(GameError::NoSuchToken(id))?;
        if !self.can_token_move(&token, dice) {
            return Err(GameError::IllegalMove(id));
        }
        let target = destination(&token, dice).ok_or(GameError::IllegalMove(id))?;

        // Move first; captures look at the updated board.
        let moved = {
            let player = self
                .player_mut(color)
                .ok_or(GameError::NoSuchToken(id))?;
            let moved = player.token_mut(id).ok_or(GameError::NoSuchToken(id))?;
            moved.place_at(target);
            let moved = *moved;
            player.sync_finished();
            moved
        };

        if token.is_home() {
            events.push(GameEvent::TokenEntered { token: id });
        } else {
            events.push(GameEvent::TokenMoved {
                token: id,
                from: token.position,
                to: target,
            });
        }

        let mut finish_event = None;
        if moved.is_finished() {
            let finish = FinishEvent {
                color,
                token_id: id,
            };
            info!(token = %id, "token finished");
            events.push(GameEvent::TokenFinished(finish));
            finish_event = Some(finish);
        }

        let mut capture_event = None;
        if moved.is_active() && target < RING_LEN {
            if let Some(cell) = moved.absolute_cell() {
                let victims = capturable_at(&self.players, cell, color);
                if let Some(first) = victims.first() {
                    let capture = CaptureEvent {
                        attacker_color: color,
                        victim_color: first.color,
                        position: cell,
                        victims: victims.clone(),
                    };
                    send_home(&mut self.players, &victims);
                    info!(attacker = %color, cell, victims = victims.len(), "capture");
                    events.push(GameEvent::TokenCaptured(capture.clone()));
                    capture_event = Some(capture);
                }
            }
        }

        self.record_ranking(color, events);

        self.last_capture_event = capture_event;
        self.last_finish_event = finish_event;
        self.dice_value = None;
        self.can_roll_again = false;
        self.selected_token_id = None;
        self.turn_count += 1;

        if self.is_finished() {
            return Ok(());
        }

        let bonus = if dice == 6 {
            Some(BonusReason::RolledSix)
        } else if self.last_capture_event.is_some() {
            Some(BonusReason::Captured)
        } else if self.last_finish_event.is_some() {
            Some(BonusReason::Finished)
        } else {
            None
        };

        match bonus {
            // A player with every token home has nothing left to roll for
            Some(reason) if !self.current_player().has_finished() => {
                events.push(GameEvent::BonusTurn { color, reason });
            }
            _ => {
                self.consecutive_sixes = 0;
                self.pass_turn(events);
            }
        }
        Ok(())
    }

    fn skip(&mut self, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.game_status != GameStatus::Playing {
            return Err(GameError::GameNotPlaying);
        }
        if self.dice_value.is_none() {
            return Err(GameError::NoDiceValue);
        }
        if !self.movable_tokens().is_empty() {
            return Err(GameError::MovesAvailable);
        }

        events.push(GameEvent::TurnSkipped {
            color: self.current_player().color,
        });
        self.dice_value = None;
        self.can_roll_again = false;
        self.consecutive_sixes = 0;
        self.selected_token_id = None;
        self.turn_count += 1;
        self.pass_turn(events);
        Ok(())
    }

    // ==================== Helper Methods ====================

    /// Rank a player who just brought their last token home
    fn record_ranking(&mut self, color: Color, events: &mut Vec<GameEvent>) {
        let done = self.player(color).is_some_and(Player::has_finished);
        if !done || self.rankings.contains(&color) {
            return;
        }

        self.rankings.push(color);
        if self.winner.is_none() {
            self.winner = Some(color);
        }
        info!(%color, place = self.rankings.len(), "player finished");
        events.push(GameEvent::PlayerRanked {
            color,
            place: self.rankings.len(),
        });

        if self.rankings.len() + 1 >= self.player_count() {
            self.game_status = GameStatus::Finished;
            info!(winner = ?self.winner, rankings = ?self.rankings, "game over");
            events.push(GameEvent::GameOver {
                winner: self.winner,
                rankings: self.rankings.clone(),
            });
        }
    }

    /// Index of the next player still holding unfinished tokens
    fn next_eligible_index(&self) -> usize {
        let count = self.player_count();
        (1..=count)
            .map(|step| (self.current_player_index + step) % count)
            .find(|&i| !self.players[i].has_finished())
            .unwrap_or(self.current_player_index)
    }

    fn pass_turn(&mut self, events: &mut Vec<GameEvent>) {
        let from = self.current_player().color;
        self.current_player_index = self.next_eligible_index();
        let to = self.current_player().color;
        if from != to {
            events.push(GameEvent::TurnPassed { from, to });
        }
    }
}
