//! Board geometry: the shared ring, start offsets, safe cells and home stretches.
//!
//! Token positions are stored relative to their owner's start cell. This
//! module converts them to absolute ring cells so tokens of different colors
//! can be compared, and classifies cells as safe or start cells.
//!
//! Relative positions:
//! - `-1`: in the home base
//! - `0..=51`: on the shared ring
//! - `52..=57`: on the owner's private home stretch
//! - `58`: finished

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of cells on the shared ring
pub const RING_LEN: i8 = 52;

/// Number of cells in each color's private home stretch
pub const HOME_STRETCH_LEN: i8 = 6;

/// Relative position of a finished token
pub const FINISH_POSITION: i8 = RING_LEN + HOME_STRETCH_LEN;

/// Relative position of a token sitting in its home base
pub const HOME_POSITION: i8 = -1;

/// Tokens owned by each player
pub const TOKENS_PER_PLAYER: usize = 4;

/// Die value required to bring a token out of home
pub const ENTRY_ROLL: u8 = 6;

/// Absolute ring cells where captures never happen
pub const SAFE_CELLS: [u8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];

/// Player color. Also fixes seating order and start offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    /// All colors in seating order
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Yellow, Color::Blue];

    /// Absolute ring cell where this color's tokens enter the board
    pub fn start_offset(self) -> u8 {
        match self {
            Color::Red => 0,
            Color::Green => 13,
            Color::Yellow => 26,
            Color::Blue => 39,
        }
    }

    /// Lowercase name, used for token ids and player names
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
        }
    }

    /// Seat index of this color (0-3)
    pub fn seat(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Green => 1,
            Color::Yellow => 2,
            Color::Blue => 3,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown color: {s}"))
    }
}

/// Map a relative position to its absolute ring cell.
///
/// Returns `None` for home-base, home-stretch and finished positions, which
/// have no ring equivalent.
pub fn absolute_cell(color: Color, relative: i8) -> Option<u8> {
    if !is_ring_position(relative) {
        return None;
    }
    Some(((i16::from(color.start_offset()) + i16::from(relative)) % i16::from(RING_LEN)) as u8)
}

/// Whether a relative position lies on the shared ring
pub fn is_ring_position(relative: i8) -> bool {
    (0..RING_LEN).contains(&relative)
}

/// Whether an absolute ring cell is safe from captures
pub fn is_safe_cell(cell: u8) -> bool {
    SAFE_CELLS.contains(&(cell % RING_LEN as u8))
}

/// Forward distance along the ring from `from` to `to` (0-51)
pub fn ring_distance(from: u8, to: u8) -> u8 {
    let len = RING_LEN as u16;
    ((u16::from(to) % len + len - u16::from(from) % len) % len) as u8
}
