//! Blocks and captures on the shared ring.
//!
//! A block is two or more tokens of one color on the same ring cell. Blocks
//! cannot be captured and opponents can neither pass nor land on them.
//! Everything here looks only at active tokens on the ring; tokens in a home
//! stretch are invisible to other colors.

use crate::board::{is_safe_cell, Color};
use crate::player::{Player, TokenId};

/// Number of same-color tokens that turn a cell into a block
pub const BLOCK_SIZE: usize = 2;

/// Active ring tokens of `color` occupying an absolute cell
pub fn tokens_at(players: &[Player], cell: u8, color: Color) -> Vec<TokenId> {
    players
        .iter()
        .filter(|p| p.color == color)
        .flat_map(|p| p.tokens.iter())
        .filter(|t| t.absolute_cell() == Some(cell))
        .map(|t| t.id)
        .collect()
}

/// Whether a block owned by some color other than `mover` sits on this cell
pub fn is_blocked_for(players: &[Player], cell: u8, mover: Color) -> bool {
    players
        .iter()
        .filter(|p| p.color != mover)
        .any(|p| tokens_at(players, cell, p.color).len() >= BLOCK_SIZE)
}

/// Opposing tokens an attacker landing on `cell` would send home.
///
/// Empty when the cell is safe or holds an opposing block. Victims come back
/// in seating order, then slot order.
pub fn capturable_at(players: &[Player], cell: u8, attacker: Color) -> Vec<TokenId> {
    if is_safe_cell(cell) || is_blocked_for(players, cell, attacker) {
        return Vec::new();
    }
    players
        .iter()
        .filter(|p| p.color != attacker)
        .flat_map(|p| tokens_at(players, cell, p.color))
        .collect()
}

/// Send every token in `victims` back to its home base
pub(crate) fn send_home(players: &mut [Player], victims: &[TokenId]) {
    for victim in victims {
        if let Some(token) = players
            .iter_mut()
            .find(|p| p.color == victim.color)
            .and_then(|p| p.token_mut(*victim))
        {
            token.send_home();
        }
    }
}
