//! WebAssembly bindings for the Ludo engine.
//!
//! This module exposes the game controller to JavaScript through wasm-bindgen.
//! The page drives virtual time with `tick` from its animation loop.

use wasm_bindgen::prelude::*;

use crate::config::{GameConfig, Timings};
use crate::engine::Game;
use crate::persistence::{load_game, save_game};
use crate::player::TokenId;
use std::time::Duration;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_err(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game from a JSON `GameConfig`
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmGame, JsValue> {
        let config: GameConfig =
            serde_json::from_str(config_json).map_err(|e| js_err("Invalid config", e))?;
        let game = Game::new(config).map_err(|e| js_err("Invalid config", e))?;
        Ok(WasmGame { game })
    }

    /// Resume a save produced by `saveGame`, falling back to `config_json`
    pub fn restore(save_json: &str, config_json: &str, now_ms: f64) -> Result<WasmGame, JsValue> {
        match load_game(save_json, now_ms as u64) {
            Ok(saved) => {
                let seed = now_ms as u64;
                let game = Game::from_state(saved.config, saved.state, seed)
                    .map_err(|e| js_err("Invalid save", e))?;
                Ok(WasmGame { game })
            }
            Err(_) => WasmGame::new(config_json),
        }
    }

    /// Replace the cosmetic delays with a JSON `Timings`
    #[wasm_bindgen(js_name = setTimings)]
    pub fn set_timings(self, timings_json: &str) -> Result<WasmGame, JsValue> {
        let timings: Timings =
            serde_json::from_str(timings_json).map_err(|e| js_err("Invalid timings", e))?;
        Ok(WasmGame {
            game: self.game.with_timings(timings),
        })
    }

    /// Get the current game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(self.game.state()).unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = startGame)]
    pub fn start_game(&mut self) -> bool {
        self.game.start_game()
    }

    #[wasm_bindgen(js_name = resetGame)]
    pub fn reset_game(&mut self) {
        self.game.reset_game();
    }

    #[wasm_bindgen(js_name = rollDice)]
    pub fn roll_dice(&mut self) -> bool {
        self.game.roll_dice()
    }

    /// Move a token by id, e.g. `"red-2"`
    #[wasm_bindgen(js_name = moveToken)]
    pub fn move_token(&mut self, token_id: &str) -> Result<bool, JsValue> {
        let id: TokenId = token_id.parse().map_err(|e| js_err("Invalid token id", e))?;
        Ok(self.game.move_token(id))
    }

    #[wasm_bindgen(js_name = canRoll)]
    pub fn can_roll(&self) -> bool {
        self.game.can_roll()
    }

    /// Movable tokens of the current player as a JSON array
    #[wasm_bindgen(js_name = getMovableTokens)]
    pub fn get_movable_tokens(&self) -> String {
        serde_json::to_string(&self.game.movable_tokens()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Advance virtual time; returns the events produced as JSON
    pub fn tick(&mut self, elapsed_ms: f64) -> String {
        self.game.advance(Duration::from_millis(elapsed_ms.max(0.0) as u64));
        serde_json::to_string(&self.game.take_events()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Milliseconds until something happens on its own, if anything will
    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.game.next_deadline().map(|d| d.as_millis() as f64)
    }

    /// Serialize the game for local storage
    #[wasm_bindgen(js_name = saveGame)]
    pub fn save_game(&self, now_ms: f64) -> Result<String, JsValue> {
        save_game(self.game.state(), self.game.config(), now_ms as u64)
            .map_err(|e| js_err("Save failed", e))
    }
}
