//! Concurrent headless games.

use crate::store::FileStore;
use dashmap::DashMap;
use futures_util::future::join_all;
use ludo_core::{Bot, Color, ConfigError, Difficulty, Game, GameConfig, GameEvent, Timings};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid game config: {0}")]
    Config(#[from] ConfigError),

    #[error("Game {0} did not finish within the step limit")]
    Stalled(Uuid),
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub games: usize,
    pub players: u8,
    pub difficulty: Difficulty,
    pub seed: u64,
    /// Delay multiplier; 0 plays instantly, 1 at interactive pace
    pub speed: f64,
    /// Autosave the first game here
    pub save_path: Option<PathBuf>,
    pub max_steps: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            games: 8,
            players: 4,
            difficulty: Difficulty::Medium,
            seed: 0,
            speed: 0.0,
            save_path: None,
            max_steps: 100_000,
        }
    }
}

impl SimConfig {
    /// Read `LUDO_*` variables from the environment
    pub fn from_env() -> Result<Self, SimError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SimError> {
        fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, SimError> {
            value
                .trim()
                .parse()
                .map_err(|_| SimError::InvalidEnv { name, value })
        }

        let mut config = Self {
            seed: ludo_core::persistence::unix_now_ms(),
            ..Self::default()
        };
        if let Some(v) = lookup("LUDO_GAMES") {
            config.games = parse("LUDO_GAMES", v)?;
        }
        if let Some(v) = lookup("LUDO_PLAYERS") {
            config.players = parse("LUDO_PLAYERS", v)?;
        }
        if let Some(v) = lookup("LUDO_DIFFICULTY") {
            config.difficulty = parse("LUDO_DIFFICULTY", v)?;
        }
        if let Some(v) = lookup("LUDO_SEED") {
            config.seed = parse("LUDO_SEED", v)?;
        }
        if let Some(v) = lookup("LUDO_SPEED") {
            let speed: f64 = parse("LUDO_SPEED", v.clone())?;
            if !speed.is_finite() || speed < 0.0 {
                return Err(SimError::InvalidEnv {
                    name: "LUDO_SPEED",
                    value: v,
                });
            }
            config.speed = speed;
        }
        config.save_path = lookup("LUDO_SAVE_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        config.game_config().validate()?;
        Ok(config)
    }

    /// Every seat is played by a bot; the human seat goes to a stand-in
    pub fn game_config(&self) -> GameConfig {
        GameConfig::single(self.players, self.difficulty)
    }

    pub fn timings(&self) -> Timings {
        Timings::default().scaled(self.speed)
    }
}

/// Outcome of one game
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub id: Uuid,
    pub seed: u64,
    pub winner: Option<Color>,
    pub rankings: Vec<Color>,
    pub turns: u32,
    pub captures: u32,
}

/// Aggregate results
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub games: usize,
    pub completed: usize,
    pub wins: BTreeMap<Color, u32>,
    pub summaries: Vec<GameSummary>,
}

/// Results shared between running games
#[derive(Debug, Default)]
pub struct SimState {
    pub wins: DashMap<Color, u32>,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_win(&self, color: Color) {
        *self.wins.entry(color).or_insert(0) += 1;
    }
}

/// Run every game concurrently and collect the results
pub async fn run_simulation(config: SimConfig) -> Report {
    let state = Arc::new(SimState::new());

    let handles: Vec<_> = (0..config.games)
        .map(|n| {
            let config = config.clone();
            let state = state.clone();
            let seed = config.seed.wrapping_add(n as u64);
            let store = if n == 0 { config.save_path.clone() } else { None };
            tokio::spawn(async move {
                play_game(Uuid::new_v4(), seed, &config, store, &state).await
            })
        })
        .collect();

    let mut summaries = Vec::new();
    for result in join_all(handles).await {
        match result {
            Ok(Ok(summary)) => summaries.push(summary),
            Ok(Err(e)) => warn!("game failed: {}", e),
            Err(e) => warn!("game task panicked: {}", e),
        }
    }

    let wins = state.wins.iter().map(|e| (*e.key(), *e.value())).collect();
    Report {
        games: config.games,
        completed: summaries.len(),
        wins,
        summaries,
    }
}

/// Play one game to the end, sleeping through its cosmetic delays
pub async fn play_game(
    id: Uuid,
    seed: u64,
    config: &SimConfig,
    save_path: Option<PathBuf>,
    state: &SimState,
) -> Result<GameSummary, SimError> {
    let game_config = config.game_config();
    let mut game = Game::with_seed(game_config.clone(), seed)?.with_timings(config.timings());
    if let Some(path) = save_path {
        let store = FileStore::new(path);
        info!(game = %id, path = %store.path().display(), "autosaving");
        game = game.with_store(Box::new(store));
    }

    let human = game_config.human_player_color;
    let mut stand_in = Bot::with_seed(human, config.difficulty, seed.rotate_left(17));
    let mut captures = 0;

    info!(game = %id, seed, players = config.players, "game started");
    game.start_game();

    for _ in 0..config.max_steps {
        if game.state().is_finished() {
            break;
        }

        if game.can_roll() {
            game.roll_dice();
        } else if game.state().current_player().color == human {
            if let Some(token) = stand_in.choose_token(game.state()) {
                game.move_token(token);
            }
        }

        let wait = game.next_deadline().unwrap_or(Duration::ZERO);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        } else {
            tokio::task::yield_now().await;
        }
        game.advance(wait);

        for event in game.take_events() {
            if matches!(event, GameEvent::TokenCaptured(_)) {
                captures += 1;
            }
            debug!(game = %id, ?event);
        }
    }

    let final_state = game.state();
    if !final_state.is_finished() {
        return Err(SimError::Stalled(id));
    }
    if let Some(winner) = final_state.winner {
        state.record_win(winner);
    }
    info!(game = %id, winner = ?final_state.winner, turns = final_state.turn_count, "game over");

    Ok(GameSummary {
        id,
        seed,
        winner: final_state.winner,
        rankings: final_state.rankings.clone(),
        turns: final_state.turn_count,
        captures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_from_env() {
        let config = SimConfig::from_lookup(lookup(&[
            ("LUDO_GAMES", "3"),
            ("LUDO_PLAYERS", "2"),
            ("LUDO_DIFFICULTY", "Expert"),
            ("LUDO_SEED", "77"),
            ("LUDO_SPEED", "0.5"),
        ]))
        .unwrap();
        assert_eq!(config.games, 3);
        assert_eq!(config.players, 2);
        assert_eq!(config.difficulty, Difficulty::Expert);
        assert_eq!(config.seed, 77);
        assert_eq!(config.timings().roll_ms, 300);
        assert_eq!(config.save_path, None);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(matches!(
            SimConfig::from_lookup(lookup(&[("LUDO_GAMES", "many")])),
            Err(SimError::InvalidEnv { name: "LUDO_GAMES", .. })
        ));
        assert!(matches!(
            SimConfig::from_lookup(lookup(&[("LUDO_SPEED", "-1")])),
            Err(SimError::InvalidEnv { name: "LUDO_SPEED", .. })
        ));
        assert!(matches!(
            SimConfig::from_lookup(lookup(&[("LUDO_PLAYERS", "5")])),
            Err(SimError::Config(ConfigError::InvalidPlayerCount(5)))
        ));
    }

    #[tokio::test]
    async fn test_simulation_counts_every_win() {
        let config = SimConfig {
            games: 3,
            players: 2,
            seed: 11,
            ..SimConfig::default()
        };
        let report = run_simulation(config).await;
        assert_eq!(report.completed, 3);
        assert_eq!(report.wins.values().sum::<u32>(), 3);
        for summary in &report.summaries {
            assert_eq!(summary.rankings.len(), 1);
            assert_eq!(summary.winner, summary.rankings.first().copied());
        }
    }

    #[tokio::test]
    async fn test_first_game_autosave_is_cleared_at_the_end() {
        let path = std::env::temp_dir().join(format!("ludo-sim-{}.json", Uuid::new_v4()));
        let config = SimConfig {
            games: 1,
            players: 3,
            seed: 5,
            save_path: Some(path.clone()),
            ..SimConfig::default()
        };
        let state = SimState::new();
        let summary = play_game(Uuid::new_v4(), 5, &config, Some(path.clone()), &state)
            .await
            .unwrap();
        assert!(summary.winner.is_some());
        assert!(!path.exists(), "finished games are not kept");
        assert_eq!(state.wins.iter().map(|e| *e.value()).sum::<u32>(), 1);
    }

    #[tokio::test]
    async fn test_step_limit_reports_stall() {
        let config = SimConfig {
            players: 2,
            max_steps: 3,
            ..SimConfig::default()
        };
        let result = play_game(Uuid::new_v4(), 1, &config, None, &SimState::new()).await;
        assert!(matches!(result, Err(SimError::Stalled(_))));
    }
}
