//! WebAssembly bindings for the Othello engine.
//!
//! This module exposes the engine to JavaScript through wasm-bindgen as a
//! thin JSON-in/JSON-out wrapper. Rendering, sound, and settings stay on the
//! JavaScript side; only rules and state live here.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::board::Player;
#[cfg(feature = "wasm")]
use crate::coord::Coord;
#[cfg(feature = "wasm")]
use crate::game::Game;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmGame {
    /// Create a new session with optional player identifiers.
    #[wasm_bindgen(constructor)]
    pub fn new(black_player_id: Option<String>, white_player_id: Option<String>) -> WasmGame {
        WasmGame {
            game: Game::with_players(black_player_id, white_player_id),
        }
    }

    /// Attempt a move at (x, y). Returns whether it was applied.
    #[wasm_bindgen(js_name = makeMove)]
    pub fn make_move(&mut self, x: u8, y: u8) -> bool {
        self.game.make_move(Coord::new(x, y))
    }

    /// Step back one move. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        self.game.undo()
    }

    /// Step forward one undone move. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        self.game.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.game.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.game.can_redo()
    }

    /// Restore the starting position and clear history.
    pub fn reset(&mut self) {
        self.game.reset()
    }

    /// Get the full game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.game.view()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the board with legal-move markers as JSON (for rendering)
    #[wasm_bindgen(js_name = getAnnotatedBoard)]
    pub fn get_annotated_board(&self) -> String {
        serde_json::to_string(&self.game.annotated_board()).unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    /// The winner as a color code ("B"/"W"), or undefined on a tie or while
    /// the game is in progress.
    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<String> {
        if !self.game.is_game_over() {
            return None;
        }
        self.game.winner().map(|player| match player {
            Player::Black => "B".to_string(),
            Player::White => "W".to_string(),
        })
    }

    /// Serialize the session for storage on the JavaScript side.
    #[wasm_bindgen(js_name = exportState)]
    pub fn export_state(&self) -> Result<String, JsValue> {
        self.game
            .export_state()
            .map_err(|error| JsValue::from_str(&error.to_string()))
    }

    /// Replace the session from a previously exported payload.
    #[wasm_bindgen(js_name = importState)]
    pub fn import_state(&mut self, payload: &str) -> Result<(), JsValue> {
        self.game
            .import_state(payload)
            .map_err(|error| JsValue::from_str(&error.to_string()))
    }
}
