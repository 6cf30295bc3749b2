//! Game engine: session state, history, undo/redo, events, export/import.
//!
//! [`Game`] is the stateful wrapper around the board rules. It owns the
//! authoritative board and move history, keeps full-state snapshots for
//! undo/redo, publishes typed events, and round-trips serializable state.
//! Callers interact only with this surface; the board is never handed out
//! for external mutation.

use crate::board::{Board, Player, RuleViolation, Score, TileValue};
use crate::coord::{Coord, BOARD_SIZE};
use crate::events::{
    EventBus, EventKind, GameEvent, GameView, ListenerId, Move, StateChangeCause,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors surfaced by the engine.
///
/// Everything here is recoverable from the process's point of view. Illegal
/// moves never reach callers as `Err` at all: `make_move` converts them into
/// a `false` return plus an `InvalidMove` event.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum GameError {
    /// A rules-level rejection (occupied square, no captures, out of bounds).
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// The game has concluded; no further moves are accepted.
    #[error("the game is already over")]
    GameOver,

    /// Serialized state could not be parsed or failed validation.
    #[error("malformed game state: {0}")]
    Malformed(String),
}

/// Deep capture of board + history, owned by the undo/redo stacks.
#[derive(Debug, Clone)]
struct Snapshot {
    board: Board,
    history: Vec<Move>,
}

/// Wire form of a saved game: board, history, and player identifiers.
///
/// Keys are camelCase on the wire (`moveHistory`, `blackPlayerId`, ...), and
/// the board nests as `{tiles, playerTurn}` with single-character tile codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedGame {
    board: Board,
    move_history: Vec<Move>,
    black_player_id: Option<String>,
    white_player_id: Option<String>,
}

/// A single Othello session: the authoritative board, move history,
/// undo/redo stacks, player identifiers, and the event channel.
///
/// Single-threaded by design; a host serving many sessions confines each
/// instance behind its own lock or single-writer task.
pub struct Game {
    board: Board,
    history: Vec<Move>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    black_player_id: Option<String>,
    white_player_id: Option<String>,
    bus: EventBus,
}

impl Game {
    /// Create a session on the canonical starting board. No event fires.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            history: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            black_player_id: None,
            white_player_id: None,
            bus: EventBus::new(),
        }
    }

    /// Create a session with optional player identifiers attached.
    pub fn with_players(
        black_player_id: Option<String>,
        white_player_id: Option<String>,
    ) -> Self {
        Self {
            black_player_id,
            white_player_id,
            ..Self::new()
        }
    }

    /// Create a session from an explicit tile grid, for loading a position.
    ///
    /// Rejects grids carrying annotation markers: those exist only in
    /// derived views and must never become authoritative.
    pub fn from_tiles(
        tiles: [[TileValue; BOARD_SIZE]; BOARD_SIZE],
        player_turn: Player,
    ) -> Result<Self, GameError> {
        let board = Board::from_tiles(tiles, player_turn);
        if board.has_markers() {
            return Err(GameError::Malformed(
                "board tiles contain annotation markers".to_string(),
            ));
        }
        Ok(Self {
            board,
            ..Self::new()
        })
    }

    // ==================== Event Channel ====================

    /// Register `listener` for events of `kind`. Listeners for a kind run
    /// synchronously in registration order on the operation that emits.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.bus.subscribe(kind, Box::new(listener))
    }

    /// Remove a previously registered listener. Returns whether anything
    /// was removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ==================== Moves ====================

    /// Attempt a move for the current player.
    ///
    /// On success the move is recorded, the redo chain is discarded, and
    /// `Move`, `StateChange`, and (on a terminal position) `GameOver` events
    /// fire, in that order. When the opponent then has no reply but the game
    /// is not over, the turn passes straight back to the mover.
    ///
    /// On rejection (occupied square, captureless placement, out-of-bounds
    /// coordinate, or a concluded game) nothing changes, an `InvalidMove`
    /// event fires, and the call returns `false`. No error escapes to the
    /// caller for expected-illegal input.
    pub fn make_move(&mut self, coord: Coord) -> bool {
        // Snapshot first; rolled back below if the rules reject the move.
        self.undo_stack.push(self.snapshot());

        let attempted = if self.board.is_game_over() {
            Err(GameError::GameOver)
        } else {
            self.board.take_turn(coord).map_err(GameError::from)
        };

        match attempted {
            Ok(()) => {
                self.redo_stack.clear();

                let mover = self.board.player_turn().opponent();
                let mv = Move {
                    player: mover,
                    coordinate: coord,
                    timestamp: Utc::now().timestamp_millis(),
                    score_after: self.board.score(),
                };
                self.history.push(mv.clone());

                if !self.board.is_game_over() && !self.board.has_any_move(self.board.player_turn())
                {
                    debug!(stuck = %self.board.player_turn(), "no reply available, turn passes back");
                    self.board.pass_turn();
                }

                debug!(player = %mv.player, coord = %coord, "move applied");
                let state = self.view();
                self.bus.emit(&GameEvent::Move {
                    mv,
                    state: state.clone(),
                });
                self.bus.emit(&GameEvent::StateChange {
                    cause: StateChangeCause::Move,
                    state: state.clone(),
                });
                if state.is_game_over {
                    self.bus.emit(&GameEvent::GameOver {
                        winner: state.winner,
                        state,
                    });
                }
                true
            }
            Err(error) => {
                self.undo_stack.pop();
                trace!(coord = %coord, %error, "move rejected");
                self.bus.emit(&GameEvent::InvalidMove {
                    coordinate: coord,
                    reason: error.to_string(),
                });
                false
            }
        }
    }

    // ==================== Undo / Redo ====================

    /// Step back to the state before the most recent move. Returns `false`
    /// when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.snapshot());
        self.restore(snapshot);
        debug!("undo applied");
        self.emit_state_change(StateChangeCause::Undo);
        true
    }

    /// Step forward along a previously undone chain. Returns `false` when
    /// there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.snapshot());
        self.restore(snapshot);
        debug!("redo applied");
        self.emit_state_change(StateChangeCause::Redo);
        true
    }

    /// Whether `undo` would do anything.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether `redo` would do anything.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Restore the canonical starting board and clear history and both
    /// stacks. Emits a single `StateChange`.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.history.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
        debug!("session reset");
        self.emit_state_change(StateChangeCause::Reset);
    }

    // ==================== Queries ====================

    /// Assemble the full read-only view. Computed fresh on every call, so it
    /// is always consistent with the current board and history.
    pub fn view(&self) -> GameView {
        let is_game_over = self.board.is_game_over();
        GameView {
            board: self.board,
            score: self.board.score(),
            valid_moves: self.board.valid_moves(),
            is_game_over,
            winner: if is_game_over { self.board.winner() } else { None },
            move_history: self.history.clone(),
            current_player: self.board.player_turn(),
            black_player_id: self.black_player_id.clone(),
            white_player_id: self.white_player_id.clone(),
        }
    }

    /// A copy of the current board. The authoritative instance stays owned
    /// by the engine.
    pub fn board(&self) -> Board {
        self.board
    }

    /// The board with legal-move squares marked, for display.
    pub fn annotated_board(&self) -> Board {
        self.board.annotated()
    }

    /// A copy of the move history.
    pub fn move_history(&self) -> Vec<Move> {
        self.history.clone()
    }

    /// Current piece counts.
    pub fn score(&self) -> Score {
        self.board.score()
    }

    /// Legal moves for the current player, freshly computed.
    pub fn valid_moves(&self) -> Vec<Coord> {
        self.board.valid_moves()
    }

    /// Whether the session has reached a terminal position.
    pub fn is_game_over(&self) -> bool {
        self.board.is_game_over()
    }

    /// The leading side, or `None` on a tie. Meaningful once
    /// [`Game::is_game_over`] is true.
    pub fn winner(&self) -> Option<Player> {
        self.board.winner()
    }

    /// The color whose turn it is.
    pub fn current_player(&self) -> Player {
        self.board.player_turn()
    }

    /// The identifier registered for `player`, if any.
    pub fn player_id(&self, player: Player) -> Option<&str> {
        match player {
            Player::Black => self.black_player_id.as_deref(),
            Player::White => self.white_player_id.as_deref(),
        }
    }

    // ==================== Export / Import ====================

    /// Serialize board, history, and player identifiers to portable JSON.
    pub fn export_state(&self) -> Result<String, GameError> {
        let saved = SavedGame {
            board: self.board,
            move_history: self.history.clone(),
            black_player_id: self.black_player_id.clone(),
            white_player_id: self.white_player_id.clone(),
        };
        serde_json::to_string(&saved).map_err(|error| GameError::Malformed(error.to_string()))
    }

    /// Replace board, history, and player identifiers wholesale from a
    /// previously exported payload. Both undo/redo stacks are cleared so the
    /// session cannot step back into a state that predates the import.
    /// Emits a `StateChange` on success; malformed input is an error and
    /// leaves the session untouched.
    pub fn import_state(&mut self, payload: &str) -> Result<(), GameError> {
        let saved: SavedGame =
            serde_json::from_str(payload).map_err(|error| GameError::Malformed(error.to_string()))?;
        if saved.board.has_markers() {
            return Err(GameError::Malformed(
                "board tiles contain annotation markers".to_string(),
            ));
        }

        self.board = saved.board;
        self.history = saved.move_history;
        self.black_player_id = saved.black_player_id;
        self.white_player_id = saved.white_player_id;
        self.undo_stack.clear();
        self.redo_stack.clear();
        debug!(moves = self.history.len(), "state imported");
        self.emit_state_change(StateChangeCause::Import);
        Ok(())
    }

    // ==================== Helper Methods ====================

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board,
            history: self.history.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.board = snapshot.board;
        self.history = snapshot.history;
    }

    fn emit_state_change(&mut self, cause: StateChangeCause) {
        let state = self.view();
        self.bus.emit(&GameEvent::StateChange { cause, state });
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("board", &self.board)
            .field("history", &self.history)
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("listeners", &self.bus.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn first_valid_move(game: &Game) -> Coord {
        game.valid_moves()[0]
    }

    #[test]
    fn test_successful_move_records_history_and_passes_turn() {
        let mut game = Game::new();
        assert!(game.make_move(Coord::new(2, 3)));

        assert_eq!(game.move_history().len(), 1);
        assert_eq!(game.current_player(), Player::White);
        let mv = &game.move_history()[0];
        assert_eq!(mv.player, Player::Black);
        assert_eq!(mv.coordinate, Coord::new(2, 3));
        assert_eq!(mv.score_after, Score { black: 4, white: 1 });
    }

    #[test]
    fn test_rejected_move_leaves_no_trace() {
        let mut game = Game::new();
        assert!(!game.make_move(Coord::new(0, 0)));

        assert_eq!(game.move_history().len(), 0);
        assert_eq!(game.current_player(), Player::Black);
        assert!(!game.can_undo());
        assert!(!game.can_redo());
    }

    #[test]
    fn test_rejected_move_preserves_redo_chain() {
        let mut game = Game::new();
        assert!(game.make_move(Coord::new(2, 3)));
        assert!(game.undo());
        assert!(game.can_redo());

        assert!(!game.make_move(Coord::new(0, 0)));
        assert!(game.can_redo());
        assert!(game.redo());
        assert_eq!(game.move_history().len(), 1);
    }

    #[test]
    fn test_new_move_discards_redo_chain() {
        let mut game = Game::new();
        assert!(game.make_move(Coord::new(2, 3)));
        assert!(game.undo());
        assert!(game.can_redo());

        assert!(game.make_move(Coord::new(3, 2)));
        assert!(!game.can_redo());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut game = Game::new();
        assert!(game.make_move(Coord::new(2, 3)));
        let after_move = game.view();

        assert!(game.undo());
        assert_eq!(game.move_history().len(), 0);
        assert_eq!(game.score(), Score { black: 2, white: 2 });
        assert!(game.can_redo());

        assert!(game.redo());
        assert_eq!(game.view(), after_move);
    }

    #[test]
    fn test_undo_on_empty_stack_is_a_no_op() {
        let mut game = Game::new();
        assert!(!game.undo());
        assert!(!game.redo());
    }

    #[test]
    fn test_auto_pass_keeps_the_mover_on_turn() {
        // Black captures the white piece at (1, 0). The surviving white
        // piece at (1, 5) is walled in by black to the right edge, so White
        // has no reply anywhere, while Black can still play (0, 5).
        let mut tiles = [[TileValue::Empty; BOARD_SIZE]; BOARD_SIZE];
        tiles[0][1] = TileValue::White;
        tiles[0][2] = TileValue::Black;
        tiles[5][1] = TileValue::White;
        for x in 2..BOARD_SIZE {
            tiles[5][x] = TileValue::Black;
        }
        let mut game = Game::from_tiles(tiles, Player::Black).unwrap();

        assert!(game.make_move(Coord::new(0, 0)));
        assert!(!game.is_game_over());
        assert_eq!(game.current_player(), Player::Black);
        assert!(game.valid_moves().contains(&Coord::new(0, 5)));
    }

    #[test]
    fn test_moves_rejected_after_game_over() {
        let tiles = [[TileValue::Black; BOARD_SIZE]; BOARD_SIZE];
        let mut game = Game::from_tiles(tiles, Player::White).unwrap();
        assert!(game.is_game_over());

        let reasons = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reasons);
        game.subscribe(EventKind::InvalidMove, move |event| {
            if let GameEvent::InvalidMove { reason, .. } = event {
                sink.borrow_mut().push(reason.clone());
            }
        });

        assert!(!game.make_move(Coord::new(0, 0)));
        assert_eq!(game.move_history().len(), 0);
        assert_eq!(&*reasons.borrow(), &["the game is already over".to_string()]);
    }

    #[test]
    fn test_from_tiles_rejects_annotation_markers() {
        let mut tiles = [[TileValue::Empty; BOARD_SIZE]; BOARD_SIZE];
        tiles[5][5] = TileValue::ValidMoveMarker;
        assert!(matches!(
            Game::from_tiles(tiles, Player::Black),
            Err(GameError::Malformed(_))
        ));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = Game::with_players(Some("alice".to_string()), Some("bob".to_string()));
        assert!(source.make_move(Coord::new(2, 3)));
        assert!(source.make_move(first_valid_move(&source)));
        let payload = source.export_state().unwrap();

        let mut target = Game::new();
        target.import_state(&payload).unwrap();

        assert_eq!(target.move_history(), source.move_history());
        assert_eq!(target.current_player(), source.current_player());
        assert_eq!(target.board(), source.board());
        assert_eq!(target.player_id(Player::Black), Some("alice"));
        assert_eq!(target.player_id(Player::White), Some("bob"));
    }

    #[test]
    fn test_import_clears_undo_redo_stacks() {
        let mut source = Game::new();
        assert!(source.make_move(Coord::new(2, 3)));
        let payload = source.export_state().unwrap();

        let mut target = Game::new();
        assert!(target.make_move(Coord::new(2, 3)));
        assert!(target.undo());
        assert!(target.can_undo() || target.can_redo());

        target.import_state(&payload).unwrap();
        assert!(!target.can_undo());
        assert!(!target.can_redo());
    }

    #[test]
    fn test_import_rejects_garbage() {
        let mut game = Game::new();
        let before = game.view();
        assert!(matches!(
            game.import_state("not json at all"),
            Err(GameError::Malformed(_))
        ));
        assert_eq!(game.view(), before);
    }

    #[test]
    fn test_reset_restores_the_starting_state() {
        let mut game = Game::new();
        assert!(game.make_move(Coord::new(2, 3)));
        assert!(game.make_move(first_valid_move(&game)));

        game.reset();
        assert_eq!(game.move_history().len(), 0);
        assert_eq!(game.score(), Score { black: 2, white: 2 });
        assert!(!game.is_game_over());
        assert!(!game.can_undo());
        assert!(!game.can_redo());
        assert_eq!(game.current_player(), Player::Black);
    }

    #[test]
    fn test_event_order_on_a_successful_move() {
        let mut game = Game::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for kind in [EventKind::Move, EventKind::StateChange, EventKind::GameOver] {
            let sink = Rc::clone(&order);
            game.subscribe(kind, move |event| sink.borrow_mut().push(event.kind()));
        }

        assert!(game.make_move(Coord::new(2, 3)));
        // Mid-game: a move fires Move then StateChange, never GameOver.
        assert_eq!(&*order.borrow(), &[EventKind::Move, EventKind::StateChange]);
    }
}
