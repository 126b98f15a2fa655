//! Structural invariants of a game snapshot.
//!
//! A state produced by the reducer always passes these checks. They exist to
//! vet snapshots from outside the engine (restored saves) and to catch bugs
//! in tests.

use crate::board::{Color, FINISH_POSITION, HOME_POSITION, TOKENS_PER_PLAYER};
use crate::config::GameConfig;
use crate::game::{GameState, GameStatus};
use crate::player::TokenState;
use std::collections::HashSet;
use std::fmt;

/// Invariant violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all snapshot invariants, returning every violation found
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut fail = |message: String| violations.push(InvariantViolation { message });

    let count = state.player_count();
    if !(2..=4).contains(&count) {
        fail(format!("{count} players seated, expected 2-4"));
    }

    let mut seen = HashSet::new();
    for (seat, player) in state.players.iter().enumerate() {
        if Color::ALL.get(seat) != Some(&player.color) {
            fail(format!("seat {seat} holds {}", player.color));
        }
        if !seen.insert(player.color) {
            fail(format!("{} seated twice", player.color));
        }
        if player.is_ai != player.ai_difficulty.is_some() {
            fail(format!(
                "{} has is_ai {} with difficulty {:?}",
                player.color, player.is_ai, player.ai_difficulty
            ));
        }

        for (slot, token) in player.tokens.iter().enumerate() {
            if token.color != player.color || token.id.color != player.color {
                fail(format!("{} owns foreign token {}", player.color, token.id));
            }
            if usize::from(token.id.slot) != slot {
                fail(format!("token {} in slot {slot}", token.id));
            }
            if !(HOME_POSITION..=FINISH_POSITION).contains(&token.position) {
                fail(format!("token {} at {}", token.id, token.position));
            }
            let expected = match token.position {
                HOME_POSITION => TokenState::Home,
                FINISH_POSITION => TokenState::Finished,
                _ => TokenState::Active,
            };
            if token.state != expected {
                fail(format!(
                    "token {} at {} is {:?}, expected {expected:?}",
                    token.id, token.position, token.state
                ));
            }
        }

        let finished = player.count_in_state(TokenState::Finished);
        if usize::from(player.finished_tokens) != finished {
            fail(format!(
                "{} reports {} finished tokens, has {finished}",
                player.color, player.finished_tokens
            ));
        }
        let total = player.count_in_state(TokenState::Home)
            + player.count_in_state(TokenState::Active)
            + finished;
        if total != TOKENS_PER_PLAYER {
            fail(format!("{} has {total} tokens", player.color));
        }
    }

    if let Some(value) = state.dice_value {
        if !(1..=6).contains(&value) {
            fail(format!("die shows {value}"));
        }
    }
    if state.is_rolling && state.dice_value.is_some() {
        fail("rolling with a die value pending".to_string());
    }

    if state.current_player_index >= count {
        fail(format!("current player index {} out of range", state.current_player_index));
    } else if state.game_status != GameStatus::Finished
        && state.players[state.current_player_index].has_finished()
    {
        fail("current player has already finished".to_string());
    }

    for color in &state.rankings {
        let done = state.player(*color).is_some_and(|p| p.has_finished());
        if !done {
            fail(format!("{color} ranked without finishing"));
        }
    }
    if state.winner != state.rankings.first().copied() {
        fail(format!(
            "winner {:?} is not first in rankings {:?}",
            state.winner, state.rankings
        ));
    }
    let game_over = count > 0 && state.rankings.len() + 1 >= count;
    if game_over != (state.game_status == GameStatus::Finished) {
        fail(format!(
            "status {:?} with {} of {count} players ranked",
            state.game_status,
            state.rankings.len()
        ));
    }

    violations
}

/// Check that a snapshot seats the players `config` asks for, with the
/// computer playing exactly the seats the config gives it
#[must_use]
pub fn check_seating(state: &GameState, config: &GameConfig) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut fail = |message: String| violations.push(InvariantViolation { message });

    if state.player_count() != usize::from(config.player_count) {
        fail(format!(
            "{} players seated for a {}-player config",
            state.player_count(),
            config.player_count
        ));
    }
    for player in &state.players {
        let expected = config.difficulty_for(player.color);
        if player.ai_difficulty != expected {
            fail(format!(
                "{} plays as {:?}, config says {expected:?}",
                player.color, player.ai_difficulty
            ));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Difficulty;

    #[test]
    fn test_fresh_game_is_clean() {
        for count in 2..=4 {
            let game = GameState::new(&GameConfig::local(count));
            assert!(check_invariants(&game).is_empty());
        }
    }

    #[test]
    fn test_detects_state_position_mismatch() {
        let mut game = GameState::new(&GameConfig::local(2));
        game.players[0].tokens[0].position = 12;
        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("red-0"));
    }

    #[test]
    fn test_detects_finished_count_drift() {
        let mut game = GameState::new(&GameConfig::local(2));
        game.players[1].finished_tokens = 2;
        assert!(!check_invariants(&game).is_empty());
    }

    #[test]
    fn test_detects_ai_flag_without_difficulty() {
        let mut game = GameState::new(&GameConfig::local(2));
        game.players[0].is_ai = true;
        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("red"));
    }

    #[test]
    fn test_seating_must_match_config() {
        let config = GameConfig::single(3, Difficulty::Hard);
        let game = GameState::new(&config);
        assert!(check_seating(&game, &config).is_empty());

        // Same seats, but the config says nobody is a computer
        assert_eq!(check_seating(&game, &GameConfig::local(3)).len(), 2);
        assert_eq!(check_seating(&game, &GameConfig::single(4, Difficulty::Hard)).len(), 1);

        let mut drifted = game.clone();
        drifted.players[1].ai_difficulty = Some(Difficulty::Expert);
        assert_eq!(check_seating(&drifted, &config).len(), 1);
    }

    #[test]
    fn test_detects_bad_dice_and_status() {
        let mut game = GameState::new(&GameConfig::local(2));
        game.dice_value = Some(9);
        game.rankings.push(Color::Green);
        let violations = check_invariants(&game);
        // bad die, unfinished ranked player, winner mismatch, status mismatch
        assert_eq!(violations.len(), 4);
    }
}
