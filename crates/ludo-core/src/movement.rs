//! Move legality.
//!
//! Legality is decided per token from the current board occupancy and the
//! die value alone; nothing here depends on whose turn it is.

use crate::board::{absolute_cell, ENTRY_ROLL, FINISH_POSITION, RING_LEN};
use crate::capture::is_blocked_for;
use crate::player::{Player, Token, TokenState};

/// Relative position a token would reach with this die value.
///
/// Home tokens enter at relative 0 on an entry roll. Returns `None` when the
/// token cannot go anywhere: finished, stuck at home, overshooting the finish
/// or given a value no die shows.
pub fn destination(token: &Token, dice: u8) -> Option<i8> {
    if !(1..=6).contains(&dice) {
        return None;
    }
    match token.state {
        TokenState::Finished => None,
        TokenState::Home => (dice == ENTRY_ROLL).then_some(0),
        TokenState::Active => {
            let target = token.position + i8::try_from(dice).ok()?;
            (target <= FINISH_POSITION).then_some(target)
        }
    }
}

/// Whether `token` may move `dice` steps given everyone's tokens
pub fn can_token_move(players: &[Player], token: &Token, dice: u8) -> bool {
    let Some(target) = destination(token, dice) else {
        return false;
    };

    match token.state {
        TokenState::Home => match absolute_cell(token.color, 0) {
            Some(start) => !is_blocked_for(players, start, token.color),
            None => false,
        },
        TokenState::Active if target < RING_LEN => {
            // Every cell passed over, destination included, must be free of
            // opposing blocks.
            ((token.position + 1)..=target)
                .filter_map(|rel| absolute_cell(token.color, rel))
                .all(|cell| !is_blocked_for(players, cell, token.color))
        }
        TokenState::Active => true,
        TokenState::Finished => false,
    }
}

/// Tokens of `player` that may legally move with this die value
pub fn movable_tokens<'a>(players: &[Player], player: &'a Player, dice: u8) -> Vec<&'a Token> {
    player
        .tokens
        .iter()
        .filter(|t| can_token_move(players, t, dice))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, HOME_POSITION};

    fn players() -> Vec<Player> {
        Color::ALL
            .into_iter()
            .map(|c| Player::new(c, format!("Player {c}"), None))
            .collect()
    }

    #[test]
    fn test_home_token_needs_a_six() {
        let players = players();
        let token = players[0].tokens[0];
        for dice in 1..=5 {
            assert!(!can_token_move(&players, &token, dice));
        }
        assert!(can_token_move(&players, &token, 6));
        assert_eq!(destination(&token, 6), Some(0));
    }

    #[test]
    fn test_home_token_blocked_by_opponent_block_on_start() {
        let mut players = players();
        // Green relative 39 is absolute 0, red's start cell
        players[1].tokens[0].place_at(39);
        players[1].tokens[1].place_at(39);
        let token = players[0].tokens[0];
        assert!(!can_token_move(&players, &token, 6));
        assert_eq!(token.position, HOME_POSITION);
    }

    #[test]
    fn test_home_token_may_join_own_block_on_start() {
        let mut players = players();
        players[0].tokens[0].place_at(0);
        players[0].tokens[1].place_at(0);
        let token = players[0].tokens[2];
        assert!(can_token_move(&players, &token, 6));
    }

    #[test]
    fn test_finished_token_never_moves() {
        let mut players = players();
        players[0].tokens[0].place_at(FINISH_POSITION);
        let token = players[0].tokens[0];
        for dice in 1..=6 {
            assert!(!can_token_move(&players, &token, dice));
        }
    }

    #[test]
    fn test_entering_home_stretch() {
        let mut players = players();
        players[0].tokens[0].place_at(48);
        let token = players[0].tokens[0];
        assert!(can_token_move(&players, &token, 6));
        assert_eq!(destination(&token, 6), Some(54));
    }

    #[test]
    fn test_overshooting_finish_is_illegal() {
        let mut players = players();
        players[0].tokens[0].place_at(54);
        let token = players[0].tokens[0];
        assert!(!can_token_move(&players, &token, 5));
        assert!(can_token_move(&players, &token, 4));
        assert_eq!(destination(&token, 4), Some(FINISH_POSITION));
    }

    #[test]
    fn test_cannot_pass_opposing_block() {
        let mut players = players();
        players[0].tokens[0].place_at(10);
        // Green relative 51 is absolute 12
        players[1].tokens[0].place_at(51);
        players[1].tokens[1].place_at(51);
        let token = players[0].tokens[0];
        assert!(!can_token_move(&players, &token, 2), "landing on the block");
        assert!(!can_token_move(&players, &token, 5), "passing the block");
        assert!(can_token_move(&players, &token, 1), "stopping short");
    }

    #[test]
    fn test_own_block_does_not_impede() {
        let mut players = players();
        players[0].tokens[0].place_at(10);
        players[0].tokens[1].place_at(12);
        players[0].tokens[2].place_at(12);
        let token = players[0].tokens[0];
        assert!(can_token_move(&players, &token, 2));
        assert!(can_token_move(&players, &token, 5));
    }

    #[test]
    fn test_out_of_range_die_goes_nowhere() {
        let mut players = players();
        players[0].tokens[0].place_at(20);
        let token = players[0].tokens[0];
        for dice in [0, 7, 100, u8::MAX] {
            assert_eq!(destination(&token, dice), None);
            assert!(!can_token_move(&players, &token, dice));
        }
        assert_eq!(destination(&players[0].tokens[1], 0), None);
    }

    #[test]
    fn test_movable_tokens_filters_by_legality() {
        let mut players = players();
        players[0].tokens[0].place_at(20);
        let movable = movable_tokens(&players, &players[0], 3);
        assert_eq!(movable.len(), 1);
        assert_eq!(movable[0].id, players[0].tokens[0].id);

        let movable = movable_tokens(&players, &players[0], 6);
        assert_eq!(movable.len(), 4);
    }
}
