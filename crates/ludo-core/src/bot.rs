//! AI players.
//!
//! Every legal move is given an additive score from a difficulty profile.
//! The best move is played, except that a bot sometimes plays the
//! second-best move instead to imitate imperfect play:
//! - Medium: 40% of the time, small capture bonus, ignores danger
//! - Hard: 15% of the time, weighs danger at the destination
//! - Expert: 5% of the time, weighs danger harder and checks its start cell

use crate::actions::GameAction;
use crate::board::{
    absolute_cell, is_safe_cell, ring_distance, Color, FINISH_POSITION, RING_LEN,
};
use crate::capture::capturable_at;
use crate::game::GameState;
use crate::movement::destination;
use crate::player::{Token, TokenId};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Furthest an opponent can travel on one roll
pub const THREAT_RANGE: u8 = 6;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Medium, Difficulty::Hard, Difficulty::Expert];

    /// Row index into per-difficulty tables
    pub fn index(self) -> usize {
        match self {
            Difficulty::Medium => 0,
            Difficulty::Hard => 1,
            Difficulty::Expert => 2,
        }
    }

    /// Heuristic weights for this difficulty
    pub fn profile(self) -> DifficultyProfile {
        PROFILES[self.index()]
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(format!("unknown difficulty: {s}")),
        }
    }
}

/// Move-scoring weights. A zero weight switches its factor off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Bringing a token out of home
    pub leave_home_bonus: f64,
    /// Subtracted when an opponent sits within reach of the start cell
    pub start_risk_penalty: f64,
    /// Destination holds opponent tokens that would be captured
    pub capture_bonus: f64,
    /// Destination is a safe cell
    pub safe_cell_bonus: f64,
    /// Move crosses from the ring into the home stretch
    pub home_stretch_bonus: f64,
    /// Move finishes the token
    pub finish_bonus: f64,
    /// Multiplied by the token's current relative position
    pub progress_weight: f64,
    /// Destination already holds one of our own tokens
    pub block_bonus: f64,
    /// Subtracted when an unsafe destination is within reach of an opponent
    pub destination_risk_penalty: f64,
    /// Added when the token leaves an unsafe, threatened cell
    pub escape_bonus: f64,
    /// Probability of playing the second-best move
    pub mistake_chance: f64,
}

/// Profiles indexed by `Difficulty::index`
pub const PROFILES: [DifficultyProfile; 3] = [
    DifficultyProfile {
        leave_home_bonus: 15.0,
        start_risk_penalty: 0.0,
        capture_bonus: 30.0,
        safe_cell_bonus: 20.0,
        home_stretch_bonus: 40.0,
        finish_bonus: 100.0,
        progress_weight: 0.5,
        block_bonus: 25.0,
        destination_risk_penalty: 0.0,
        escape_bonus: 0.0,
        mistake_chance: 0.40,
    },
    DifficultyProfile {
        leave_home_bonus: 15.0,
        start_risk_penalty: 0.0,
        capture_bonus: 60.0,
        safe_cell_bonus: 20.0,
        home_stretch_bonus: 40.0,
        finish_bonus: 100.0,
        progress_weight: 0.5,
        block_bonus: 25.0,
        destination_risk_penalty: 15.0,
        escape_bonus: 10.0,
        mistake_chance: 0.15,
    },
    DifficultyProfile {
        leave_home_bonus: 15.0,
        start_risk_penalty: 20.0,
        capture_bonus: 60.0,
        safe_cell_bonus: 20.0,
        home_stretch_bonus: 40.0,
        finish_bonus: 100.0,
        progress_weight: 0.5,
        block_bonus: 25.0,
        destination_risk_penalty: 35.0,
        escape_bonus: 10.0,
        mistake_chance: 0.05,
    },
];

/// A bot player that can decide on actions
#[derive(Debug)]
pub struct Bot {
    pub color: Color,
    pub difficulty: Difficulty,
    profile: DifficultyProfile,
    rng: StdRng,
}

impl Bot {
    pub fn new(color: Color, difficulty: Difficulty) -> Self {
        Self {
            color,
            difficulty,
            profile: difficulty.profile(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(color: Color, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            color,
            difficulty,
            profile: difficulty.profile(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replace the scoring weights
    pub fn with_profile(mut self, profile: DifficultyProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Choose the next action if it is this bot's turn
    pub fn choose_action(&mut self, game: &GameState) -> Option<GameAction> {
        if game.current_player().color != self.color {
            return None;
        }
        if game.awaiting_roll() {
            return Some(GameAction::RollDice);
        }
        if game.awaiting_move() {
            return Some(match self.choose_token(game) {
                Some(id) => GameAction::MoveToken(id),
                None => GameAction::SkipTurn,
            });
        }
        None
    }

    /// Pick a token to move with the pending die value
    pub fn choose_token(&mut self, game: &GameState) -> Option<TokenId> {
        if game.current_player().color != self.color {
            return None;
        }
        let dice = game.dice_value?;
        let movable = game.movable_tokens();

        match movable.as_slice() {
            [] => None,
            [only] => Some(only.id),
            _ => {
                let ranked = rank_moves(game, &movable, dice, &self.profile);
                if ranked.len() >= 2 && self.rng.gen_bool(self.profile.mistake_chance) {
                    Some(ranked[1].0)
                } else {
                    ranked.first().map(|(id, _)| *id)
                }
            }
        }
    }
}

/// Score every candidate and sort best first. Ties keep candidate order.
pub fn rank_moves(
    game: &GameState,
    candidates: &[Token],
    dice: u8,
    profile: &DifficultyProfile,
) -> Vec<(TokenId, f64)> {
    let mut scored: Vec<_> = candidates
        .iter()
        .map(|token| (token.id, score_move(game, token, dice, profile)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}

/// Additive heuristic score for moving `token` by `dice`
pub fn score_move(game: &GameState, token: &Token, dice: u8, profile: &DifficultyProfile) -> f64 {
    let color = token.color;

    if token.is_home() {
        let mut score = profile.leave_home_bonus;
        if let Some(start) = absolute_cell(color, 0) {
            if is_threatened(game, start, color) {
                score -= profile.start_risk_penalty;
            }
        }
        return score;
    }

    let Some(target) = destination(token, dice) else {
        return f64::NEG_INFINITY;
    };
    let landing = absolute_cell(color, target);
    let mut score = 0.0;

    if let Some(cell) = landing {
        if !capturable_at(&game.players, cell, color).is_empty() {
            score += profile.capture_bonus;
        }
        if is_safe_cell(cell) {
            score += profile.safe_cell_bonus;
        }
    }

    if target >= RING_LEN && token.position < RING_LEN {
        score += profile.home_stretch_bonus;
    }
    if target == FINISH_POSITION {
        score += profile.finish_bonus;
    }

    score += profile.progress_weight * f64::from(token.position);

    if let Some(cell) = landing {
        let joins_own = game.player(color).is_some_and(|p| {
            p.tokens
                .iter()
                .any(|t| t.id != token.id && t.absolute_cell() == Some(cell))
        });
        if joins_own {
            score += profile.block_bonus;
        }

        if !is_safe_cell(cell) && is_threatened(game, cell, color) {
            score -= profile.destination_risk_penalty;
        }
    }

    if let Some(current) = token.absolute_cell() {
        if !is_safe_cell(current) && is_threatened(game, current, color) {
            score += profile.escape_bonus;
        }
    }

    score
}

/// Whether an opposing ring token sits 1-6 steps behind `cell`
pub fn is_threatened(game: &GameState, cell: u8, color: Color) -> bool {
    game.players
        .iter()
        .filter(|p| p.color != color)
        .flat_map(|p| p.tokens.iter())
        .filter_map(Token::absolute_cell)
        .any(|from| (1..=THREAT_RANGE).contains(&ring_distance(from, cell)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn game_with(placements: &[(Color, u8, i8)], dice: u8) -> GameState {
        let mut game = GameState::new(&GameConfig::single(4, Difficulty::Medium)).start_game();
        for &(color, slot, position) in placements {
            let player = game.players.iter_mut().find(|p| p.color == color).unwrap();
            player.tokens[slot as usize].place_at(position);
            player.sync_finished();
        }
        game.roll_dice().settle_dice(dice)
    }

    fn greedy(difficulty: Difficulty) -> DifficultyProfile {
        DifficultyProfile {
            mistake_chance: 0.0,
            ..difficulty.profile()
        }
    }

    fn red(slot: u8) -> TokenId {
        TokenId::new(Color::Red, slot)
    }

    #[test]
    fn test_bot_creation() {
        let bot = Bot::new(Color::Green, Difficulty::Hard);
        assert_eq!(bot.color, Color::Green);
        assert_eq!(bot.difficulty, Difficulty::Hard);
        assert_eq!(bot.profile().mistake_chance, 0.15);
    }

    #[test]
    fn test_profiles_follow_difficulty_table() {
        let medium = Difficulty::Medium.profile();
        let hard = Difficulty::Hard.profile();
        let expert = Difficulty::Expert.profile();
        assert_eq!(medium.capture_bonus, 30.0);
        assert_eq!(hard.capture_bonus, 60.0);
        assert_eq!(expert.destination_risk_penalty, 35.0);
        assert_eq!(medium.destination_risk_penalty, 0.0);
        assert_eq!(expert.start_risk_penalty, 20.0);
        assert_eq!(hard.start_risk_penalty, 0.0);
    }

    #[test]
    fn test_single_move_is_taken_without_scoring() {
        let game = game_with(&[(Color::Red, 0, 10)], 3);
        let mut bot = Bot::with_seed(Color::Red, Difficulty::Medium, 1);
        for _ in 0..20 {
            assert_eq!(bot.choose_token(&game), Some(red(0)));
        }
    }

    #[test]
    fn test_no_move_means_skip() {
        let game = game_with(&[], 2);
        let mut bot = Bot::with_seed(Color::Red, Difficulty::Expert, 1);
        assert_eq!(bot.choose_token(&game), None);
        assert_eq!(bot.choose_action(&game), Some(GameAction::SkipTurn));
    }

    #[test]
    fn test_bot_rolls_when_awaiting_roll() {
        let game = GameState::new(&GameConfig::single(2, Difficulty::Hard)).start_game();
        let mut bot = Bot::with_seed(Color::Red, Difficulty::Hard, 1);
        assert_eq!(bot.choose_action(&game), Some(GameAction::RollDice));

        let mut other = Bot::with_seed(Color::Green, Difficulty::Hard, 1);
        assert_eq!(other.choose_action(&game), None, "not green's turn");
    }

    #[test]
    fn test_finish_beats_progress() {
        let game = game_with(&[(Color::Red, 0, 55), (Color::Red, 1, 30)], 3);
        let mut bot =
            Bot::with_seed(Color::Red, Difficulty::Hard, 7).with_profile(greedy(Difficulty::Hard));
        assert_eq!(bot.choose_token(&game), Some(red(0)));
    }

    #[test]
    fn test_capture_bonus_scales_with_difficulty() {
        // Red at 9 rolling 3 lands on absolute 12, where green relative 51 sits
        let game = game_with(&[(Color::Red, 0, 9), (Color::Green, 0, 51)], 3);
        let token = *game.token(red(0)).unwrap();
        let medium = score_move(&game, &token, 3, &Difficulty::Medium.profile());
        let hard = score_move(&game, &token, 3, &Difficulty::Hard.profile());
        assert_eq!(medium, 30.0 + 4.5);
        assert!(hard > medium);
    }

    #[test]
    fn test_leaving_home_scores_fifteen() {
        let game = game_with(&[], 6);
        let token = *game.token(red(0)).unwrap();
        assert_eq!(score_move(&game, &token, 6, &Difficulty::Medium.profile()), 15.0);
    }

    #[test]
    fn test_expert_fears_opponent_near_start() {
        // Blue relative 10 is absolute 49, three steps behind red's start
        let game = game_with(&[(Color::Blue, 0, 10)], 6);
        let token = *game.token(red(0)).unwrap();
        assert_eq!(score_move(&game, &token, 6, &Difficulty::Expert.profile()), -5.0);
        assert_eq!(score_move(&game, &token, 6, &Difficulty::Hard.profile()), 15.0);
    }

    #[test]
    fn test_safe_cell_and_home_stretch_bonuses() {
        let game = game_with(&[(Color::Red, 0, 5), (Color::Red, 1, 50)], 3);
        let profile = Difficulty::Medium.profile();
        // 5 -> 8 is a safe cell
        let to_safe = score_move(&game, game.token(red(0)).unwrap(), 3, &profile);
        assert_eq!(to_safe, 20.0 + 2.5);
        // 50 -> 53 enters the home stretch
        let to_stretch = score_move(&game, game.token(red(1)).unwrap(), 3, &profile);
        assert_eq!(to_stretch, 40.0 + 25.0);
    }

    #[test]
    fn test_forming_a_block_is_rewarded() {
        let game = game_with(&[(Color::Red, 0, 10), (Color::Red, 1, 14)], 4);
        let token = game.token(red(0)).unwrap();
        let score = score_move(&game, token, 4, &Difficulty::Medium.profile());
        assert_eq!(score, 25.0 + 5.0);
    }

    #[test]
    fn test_risk_and_escape_for_hard() {
        // Green relative 0 is absolute 13; red moving 10 -> 16 lands three
        // steps past it.
        let game = game_with(&[(Color::Red, 0, 10), (Color::Green, 0, 0)], 6);
        let token = *game.token(red(0)).unwrap();
        let hard = score_move(&game, &token, 6, &Difficulty::Hard.profile());
        let expert = score_move(&game, &token, 6, &Difficulty::Expert.profile());
        let medium = score_move(&game, &token, 6, &Difficulty::Medium.profile());
        assert_eq!(medium, 5.0);
        assert_eq!(hard, 5.0 - 15.0);
        assert_eq!(expert, 5.0 - 35.0);

        // Red sitting at absolute 15 is two steps past green and escapes to 18
        let game = game_with(&[(Color::Red, 0, 15), (Color::Green, 0, 0)], 6);
        let token = *game.token(red(0)).unwrap();
        let hard = score_move(&game, &token, 6, &Difficulty::Hard.profile());
        // 15 -> 21 is safe, so only the escape and progress apply
        assert_eq!(hard, 20.0 + 7.5 + 10.0);
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let game = game_with(&[], 6);
        let ranked = rank_moves(&game, &game.movable_tokens(), 6, &Difficulty::Medium.profile());
        let order: Vec<_> = ranked.iter().map(|(id, _)| id.slot).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_mistakes_pick_second_best_at_profile_rate() {
        let game = game_with(&[(Color::Red, 0, 55), (Color::Red, 1, 30)], 3);
        let mut bot = Bot::with_seed(Color::Red, Difficulty::Medium, 42);
        let trials = 2000;
        let seconds = (0..trials)
            .filter(|_| bot.choose_token(&game) == Some(red(1)))
            .count();
        // Expected 40%
        assert!((600..1000).contains(&seconds), "got {seconds}");
    }
}
