//! The game controller.
//!
//! `Game` holds the live `GameState` and replaces it wholesale whenever an
//! action is accepted. It also owns the pieces around the pure reducer:
//! - a seeded RNG for dice
//! - one `Bot` per computer seat
//! - the scheduler for cosmetic delays (dice animation, AI thinking, skips)
//! - an optional save store, written after every change while playing
//!
//! Time is virtual. Callers drive it with [`Game::advance`]; with
//! [`Timings::instant`] a call to `advance(Duration::ZERO)` plays every
//! computer turn up to the next human decision.

use crate::actions::{GameAction, GameEvent};
use crate::bot::Bot;
use crate::config::{ConfigError, GameConfig, Timings};
use crate::game::{GameState, GameStatus, Transition};
use crate::invariants::{check_invariants, check_seating};
use crate::persistence::{autosave_action, load_game, save_game, AutosaveAction, SaveStore};
use crate::player::{Token, TokenId};
use crate::scheduler::{Deferred, Scheduler, Task};
use rand::prelude::*;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// A running game
pub struct Game {
    config: GameConfig,
    timings: Timings,
    state: GameState,
    rng: StdRng,
    bots: Vec<Bot>,
    scheduler: Scheduler,
    events: Vec<GameEvent>,
    store: Option<Box<dyn SaveStore>>,
}

impl Game {
    /// Create a new game seeded from entropy
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::build(config, None, StdRng::from_entropy())
    }

    /// Create a new game with reproducible dice and AI choices
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::build(config, None, StdRng::seed_from_u64(seed))
    }

    /// Resume from a previously captured state.
    ///
    /// A state that breaks an invariant or does not match the configuration
    /// is discarded in favour of a fresh game.
    pub fn from_state(
        config: GameConfig,
        state: GameState,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Some(state), StdRng::seed_from_u64(seed))
    }

    /// Resume whatever valid save `store` holds, otherwise start fresh with
    /// `config`. Invalid saves are cleared from the store.
    pub fn restore(
        config: GameConfig,
        mut store: Box<dyn SaveStore>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let restored = match store.read() {
            Some(raw) => match load_game(&raw, store.now_ms()) {
                Ok(saved) => Some(saved),
                Err(err) => {
                    warn!(%err, "discarding saved game");
                    store.clear();
                    None
                }
            },
            None => None,
        };

        let mut game = match restored {
            Some(saved) => {
                info!(turn = saved.state.turn_count, "resuming saved game");
                Self::from_state(saved.config, saved.state, seed)?
            }
            None => Self::with_seed(config, seed)?,
        };
        game.store = Some(store);
        game.after_change();
        Ok(game)
    }

    fn build(
        config: GameConfig,
        restored: Option<GameState>,
        mut rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = match restored {
            Some(state) if Self::fits(&config, &state) => state,
            Some(_) => {
                warn!("restored state does not fit the configuration, starting fresh");
                GameState::new(&config)
            }
            None => GameState::new(&config),
        };

        let bots = state
            .players
            .iter()
            .filter_map(|p| p.ai_difficulty.map(|d| Bot::with_seed(p.color, d, rng.gen())))
            .collect();

        let mut game = Self {
            config,
            timings: Timings::default(),
            state,
            rng,
            bots,
            scheduler: Scheduler::new(),
            events: Vec::new(),
            store: None,
        };
        game.schedule_followups();
        Ok(game)
    }

    fn fits(config: &GameConfig, state: &GameState) -> bool {
        check_seating(state, config).is_empty() && check_invariants(state).is_empty()
    }

    /// Use different cosmetic delays
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self.reschedule();
        self
    }

    /// Autosave into `store` from now on
    pub fn with_store(mut self, store: Box<dyn SaveStore>) -> Self {
        self.store = Some(store);
        self.autosave();
        self
    }

    // ==================== Queries ====================

    /// Read-only snapshot of the current state
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn store(&self) -> Option<&dyn SaveStore> {
        self.store.as_deref()
    }

    /// Whether a human may roll right now
    pub fn can_roll(&self) -> bool {
        self.state.can_roll()
    }

    /// Tokens of the current player that can use the pending die value
    pub fn movable_tokens(&self) -> Vec<Token> {
        self.state.movable_tokens()
    }

    /// Time until the next deferred action fires
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Deferred actions still queued
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Drain events produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ==================== Actions ====================

    /// Begin a roll; the value settles after the dice delay.
    /// Returns whether the action was accepted.
    pub fn roll_dice(&mut self) -> bool {
        self.dispatch(GameAction::RollDice)
    }

    /// Move a token by the pending die value
    pub fn move_token(&mut self, id: TokenId) -> bool {
        self.dispatch(GameAction::MoveToken(id))
    }

    pub fn start_game(&mut self) -> bool {
        self.dispatch(GameAction::StartGame)
    }

    /// Throw the current game away and start over with the same config
    pub fn reset_game(&mut self) {
        info!(generation = self.state.generation + 1, "game reset");
        self.state = self.state.reset(&self.config);
        self.scheduler.clear();
        if let Some(store) = self.store.as_mut() {
            store.clear();
        }
        self.events.push(GameEvent::GameReset);
        self.after_change();
    }

    /// Let `elapsed` of virtual time pass, firing every deferred action that
    /// comes due, including ones scheduled along the way.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.scheduler.now() + elapsed;
        while let Some(deferred) = self.scheduler.pop_due(until) {
            self.fire(deferred);
        }
        self.scheduler.advance_clock(until);
    }

    // ==================== Internals ====================

    fn dispatch(&mut self, action: GameAction) -> bool {
        match self.state.apply(action) {
            Ok(Transition { state, events }) => {
                self.state = state;
                self.events.extend(events);
                self.after_change();
                true
            }
            Err(err) => {
                debug!(?action, %err, "action ignored");
                false
            }
        }
    }

    fn after_change(&mut self) {
        self.reschedule();
        self.autosave();
    }

    fn reschedule(&mut self) {
        let dropped = self.scheduler.cancel_stale(self.state.ticket());
        if dropped > 0 {
            trace!(dropped, "cancelled superseded tasks");
        }
        self.schedule_followups();
    }

    /// Queue whatever the current state is waiting on
    fn schedule_followups(&mut self) {
        let state = &self.state;
        if state.game_status != GameStatus::Playing {
            return;
        }
        let ticket = state.ticket();

        let (delay, task) = if state.is_rolling {
            (self.timings.roll_delay(), Task::SettleDice)
        } else {
            let ai = state.current_player().ai_difficulty;
            match (state.dice_value, ai) {
                (Some(_), _) if state.movable_tokens().is_empty() => {
                    (self.timings.skip_delay(), Task::SkipTurn)
                }
                (Some(_), Some(difficulty)) => {
                    (self.timings.ai_move_delay(difficulty), Task::AiMove)
                }
                (None, Some(difficulty)) => (self.timings.ai_roll_delay(difficulty), Task::AiRoll),
                // A human decides
                (_, None) => return,
            }
        };

        if !self.scheduler.is_scheduled(ticket, task) {
            self.scheduler.schedule(delay, ticket, task);
        }
    }

    fn fire(&mut self, deferred: Deferred) {
        if deferred.ticket != self.state.ticket() {
            trace!(task = ?deferred.task, "discarding stale task");
            return;
        }

        match deferred.task {
            Task::SettleDice => {
                let value = self.rng.gen_range(1..=6);
                self.dispatch(GameAction::SettleDice(value));
            }
            Task::SkipTurn => {
                self.dispatch(GameAction::SkipTurn);
            }
            Task::AiRoll => {
                self.dispatch(GameAction::RollDice);
            }
            Task::AiMove => {
                let color = self.state.current_player().color;
                let choice = self
                    .bots
                    .iter_mut()
                    .find(|b| b.color == color)
                    .and_then(|bot| bot.choose_token(&self.state));
                match choice {
                    Some(id) => {
                        self.dispatch(GameAction::MoveToken(id));
                    }
                    None => warn!(%color, "no bot move for an AI seat"),
                }
            }
        }
    }

    fn autosave(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        match autosave_action(&self.state) {
            AutosaveAction::Write => match save_game(&self.state, &self.config, store.now_ms()) {
                Ok(raw) => store.write(raw),
                Err(err) => warn!(%err, "autosave failed"),
            },
            AutosaveAction::Clear => store.clear(),
            AutosaveAction::Keep => {}
        }
    }
}
