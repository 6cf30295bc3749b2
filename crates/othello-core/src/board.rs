//! Othello board representation and rules.
//!
//! This module contains:
//! - Tile values and the two player colors
//! - The 8x8 board grid with the current turn
//! - Capture detection along the eight compass directions
//! - Move legality, move execution, and terminal-state detection
//!
//! Everything here is value-level rules logic: the board carries no session
//! state beyond the tiles and whose turn it is. History, undo/redo, and
//! events live in [`crate::game`].

use crate::coord::{Coord, Direction, BOARD_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Contents of one board square.
///
/// `ValidMoveMarker` only ever appears in the annotated view produced by
/// [`Board::annotated`]; the authoritative board holds pieces and empties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileValue {
    /// A black piece
    #[serde(rename = "B")]
    Black,
    /// A white piece
    #[serde(rename = "W")]
    White,
    /// No piece
    #[serde(rename = "E")]
    Empty,
    /// Annotation: empty and a legal move for the player to act
    #[serde(rename = "M")]
    ValidMoveMarker,
}

impl TileValue {
    /// Whether this square holds a piece of either color.
    pub fn is_piece(&self) -> bool {
        matches!(self, TileValue::Black | TileValue::White)
    }
}

/// One of the two sides in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "W")]
    White,
}

impl Player {
    /// The other side.
    pub fn opponent(&self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }
}

impl From<Player> for TileValue {
    fn from(player: Player) -> Self {
        match player {
            Player::Black => TileValue::Black,
            Player::White => TileValue::White,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Black => write!(f, "Black"),
            Player::White => write!(f, "White"),
        }
    }
}

/// Piece counts for both sides. Derived from the board, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub black: u32,
    pub white: u32,
}

impl Score {
    /// Total pieces on the board.
    pub fn total(&self) -> u32 {
        self.black + self.white
    }

    /// Count for one side.
    pub fn of(&self, player: Player) -> u32 {
        match player {
            Player::Black => self.black,
            Player::White => self.white,
        }
    }
}

/// Rules-level rejection of an attempted placement.
///
/// These are recoverable: callers use them to turn away illegal input, not
/// to abort the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuleViolation {
    /// The target square already holds a piece.
    #[error("square {0} is already occupied")]
    OccupiedSquare(Coord),
    /// The placement would not flip any opponent piece.
    #[error("placing at {0} would not capture any piece")]
    NoCaptures(Coord),
    /// The coordinate is outside the 8x8 grid.
    #[error("coordinate {0} is outside the board")]
    OutOfBounds(Coord),
}

/// The game board: an 8x8 grid of tiles plus whose turn it is.
///
/// Rows are the outer index, so a square (x, y) lives at `tiles[y][x]`. The
/// board is plain value data (`Copy`); the engine owns the authoritative
/// instance and mutates it only through [`Board::take_turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    tiles: [[TileValue; BOARD_SIZE]; BOARD_SIZE],
    player_turn: Player,
}

impl Board {
    /// Create a board in the canonical starting position: two white pieces
    /// on the main diagonal at (3,3) and (4,4), two black pieces at (4,3)
    /// and (3,4), Black to move.
    pub fn new() -> Self {
        let mut tiles = [[TileValue::Empty; BOARD_SIZE]; BOARD_SIZE];
        tiles[3][3] = TileValue::White;
        tiles[3][4] = TileValue::Black;
        tiles[4][3] = TileValue::Black;
        tiles[4][4] = TileValue::White;
        Self {
            tiles,
            player_turn: Player::Black,
        }
    }

    /// Create a board from an explicit tile grid, for loading saved or
    /// crafted positions. The caller is responsible for the grid holding
    /// only pieces and empties; see [`Board::has_markers`].
    pub fn from_tiles(tiles: [[TileValue; BOARD_SIZE]; BOARD_SIZE], player_turn: Player) -> Self {
        Self { tiles, player_turn }
    }

    // ==================== Query Methods ====================

    /// Whether `coord` addresses a square on the board.
    pub fn contains(&self, coord: Coord) -> bool {
        (coord.x as usize) < BOARD_SIZE && (coord.y as usize) < BOARD_SIZE
    }

    /// The value of the square at `coord`.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is off the board; callers validate with
    /// [`Board::contains`] first. The engine surfaces out-of-range input as
    /// [`RuleViolation::OutOfBounds`] before rules calls are made.
    pub fn tile_at(&self, coord: Coord) -> TileValue {
        self.tiles[coord.y as usize][coord.x as usize]
    }

    /// The raw tile grid, rows outer.
    pub fn tiles(&self) -> &[[TileValue; BOARD_SIZE]; BOARD_SIZE] {
        &self.tiles
    }

    /// The player whose turn it is.
    pub fn player_turn(&self) -> Player {
        self.player_turn
    }

    /// Whether any square holds a `ValidMoveMarker`. True only for grids
    /// that were never authoritative (annotated views, bad imports).
    pub fn has_markers(&self) -> bool {
        self.tiles
            .iter()
            .flatten()
            .any(|tile| *tile == TileValue::ValidMoveMarker)
    }

    /// Count the pieces of both colors in one pass over the grid.
    pub fn score(&self) -> Score {
        let mut score = Score::default();
        for tile in self.tiles.iter().flatten() {
            match tile {
                TileValue::Black => score.black += 1,
                TileValue::White => score.white += 1,
                TileValue::Empty | TileValue::ValidMoveMarker => {}
            }
        }
        score
    }

    /// Number of empty squares.
    pub fn empty_count(&self) -> u32 {
        (BOARD_SIZE * BOARD_SIZE) as u32 - self.score().total()
    }

    /// Whether any of the eight neighboring squares holds a piece.
    /// Informational helper; not part of move validation.
    pub fn has_adjacent_piece(&self, coord: Coord) -> bool {
        Direction::ALL
            .iter()
            .filter_map(|direction| coord.step(*direction))
            .any(|neighbor| self.tile_at(neighbor).is_piece())
    }

    // ==================== Capture Detection ====================

    /// The directions in which a piece just placed at `coord` captures.
    ///
    /// Assumes `coord` already holds the current player's piece (placed
    /// speculatively by the caller). A direction counts when the adjacent
    /// square holds the opposite color and the line reaches the mover's own
    /// color before the board edge or an empty square. Directions are
    /// scanned in the fixed order of [`Direction::ALL`].
    pub fn flippable_directions(&self, coord: Coord) -> Vec<Direction> {
        let own = TileValue::from(self.player_turn);
        let opposite = TileValue::from(self.player_turn.opponent());

        let mut flippable = Vec::new();
        for direction in Direction::ALL {
            let Some(adjacent) = coord.step(direction) else {
                continue;
            };
            if self.tile_at(adjacent) != opposite {
                continue;
            }

            // Walk past the run of opposite pieces looking for an anchor.
            let mut current = adjacent;
            while let Some(next) = current.step(direction) {
                let tile = self.tile_at(next);
                if tile == own {
                    flippable.push(direction);
                    break;
                }
                if tile != opposite {
                    break;
                }
                current = next;
            }
        }
        flippable
    }

    /// Flip every captured piece along the given directions, walking out
    /// from `coord` and stopping at the first own-color piece (exclusive:
    /// the anchor is already the right color).
    pub fn flip_tiles(&mut self, directions: &[Direction], coord: Coord) {
        let own = TileValue::from(self.player_turn);
        for &direction in directions {
            let mut current = coord;
            while let Some(next) = current.step(direction) {
                if self.tile_at(next) == own {
                    break;
                }
                self.tiles[next.y as usize][next.x as usize] = own;
                current = next;
            }
        }
    }

    // ==================== Move Execution ====================

    /// Execute one move for the current player: place at `coord`, flip all
    /// captured pieces, and pass the turn to the opponent.
    ///
    /// Fails without net change to the board when the square is off the
    /// grid, occupied, or the placement captures nothing.
    pub fn take_turn(&mut self, coord: Coord) -> Result<(), RuleViolation> {
        if !self.contains(coord) {
            return Err(RuleViolation::OutOfBounds(coord));
        }
        if self.tile_at(coord) != TileValue::Empty {
            return Err(RuleViolation::OccupiedSquare(coord));
        }

        // Speculative placement; reverted if nothing flips.
        self.tiles[coord.y as usize][coord.x as usize] = TileValue::from(self.player_turn);
        let directions = self.flippable_directions(coord);
        if directions.is_empty() {
            self.tiles[coord.y as usize][coord.x as usize] = TileValue::Empty;
            return Err(RuleViolation::NoCaptures(coord));
        }

        self.flip_tiles(&directions, coord);
        self.player_turn = self.player_turn.opponent();
        Ok(())
    }

    /// Hand the turn to the opponent without placing a piece. Used by the
    /// engine when the side to move has no legal move but the game is not
    /// over.
    pub(crate) fn pass_turn(&mut self) {
        self.player_turn = self.player_turn.opponent();
    }

    // ==================== Legality Queries ====================

    /// Whether the current player may legally place at `coord`. Runs the
    /// full placement check against a scratch copy, so the board is never
    /// touched.
    pub fn is_valid_move(&self, coord: Coord) -> bool {
        let mut probe = *self;
        probe.take_turn(coord).is_ok()
    }

    /// All legal moves for the current player, in row-major scan order
    /// (row 0 left-to-right first). Freshly computed on every call.
    pub fn valid_moves(&self) -> Vec<Coord> {
        let mut moves = Vec::new();
        for y in 0..BOARD_SIZE as u8 {
            for x in 0..BOARD_SIZE as u8 {
                let coord = Coord::new(x, y);
                if self.is_valid_move(coord) {
                    moves.push(coord);
                }
            }
        }
        moves
    }

    /// Whether `player` has at least one legal move. Short-circuits on the
    /// first hit instead of materializing the full list.
    pub fn has_any_move(&self, player: Player) -> bool {
        let mut probe = *self;
        probe.player_turn = player;
        for y in 0..BOARD_SIZE as u8 {
            for x in 0..BOARD_SIZE as u8 {
                if probe.is_valid_move(Coord::new(x, y)) {
                    return true;
                }
            }
        }
        false
    }

    // ==================== Terminal State ====================

    /// Whether the game has ended: the board is full, or neither side has a
    /// legal move. The receiver's turn field is never altered.
    pub fn is_game_over(&self) -> bool {
        if self.empty_count() == 0 {
            return true;
        }
        !self.has_any_move(self.player_turn) && !self.has_any_move(self.player_turn.opponent())
    }

    /// The side with more pieces, or `None` on equal counts (a tie).
    ///
    /// Only meaningful once [`Board::is_game_over`] is true; the result for
    /// a mid-game board is whoever currently leads. Callers check terminal
    /// state first.
    pub fn winner(&self) -> Option<Player> {
        let score = self.score();
        match score.black.cmp(&score.white) {
            std::cmp::Ordering::Greater => Some(Player::Black),
            std::cmp::Ordering::Less => Some(Player::White),
            std::cmp::Ordering::Equal => None,
        }
    }

    // ==================== Derived Views ====================

    /// A copy of the board with every legal-move square for the current
    /// player replaced by [`TileValue::ValidMoveMarker`]. The receiver is
    /// never mutated; calling this twice yields identical results.
    pub fn annotated(&self) -> Board {
        let mut view = *self;
        for coord in self.valid_moves() {
            view.tiles[coord.y as usize][coord.x as usize] = TileValue::ValidMoveMarker;
        }
        view
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(pairs: &[(u8, u8)]) -> Vec<Coord> {
        pairs.iter().map(|&(x, y)| Coord::new(x, y)).collect()
    }

    #[test]
    fn test_starting_position() {
        let board = Board::new();
        assert_eq!(board.player_turn(), Player::Black);
        assert_eq!(board.score(), Score { black: 2, white: 2 });
        assert_eq!(board.empty_count(), 60);
        assert_eq!(board.tile_at(Coord::new(3, 3)), TileValue::White);
        assert_eq!(board.tile_at(Coord::new(4, 4)), TileValue::White);
        assert_eq!(board.tile_at(Coord::new(4, 3)), TileValue::Black);
        assert_eq!(board.tile_at(Coord::new(3, 4)), TileValue::Black);
    }

    #[test]
    fn test_starting_valid_moves_for_black() {
        let board = Board::new();
        assert_eq!(
            board.valid_moves(),
            coords(&[(3, 2), (2, 3), (5, 4), (4, 5)])
        );
    }

    #[test]
    fn test_flippable_directions_after_speculative_placement() {
        let mut board = Board::new();
        // Place Black's piece by hand, the way take_turn does speculatively.
        board.tiles[3][2] = TileValue::Black;
        assert_eq!(board.flippable_directions(Coord::new(2, 3)), vec![Direction::East]);
    }

    #[test]
    fn test_take_turn_flips_and_passes_the_turn() {
        let mut board = Board::new();
        board.take_turn(Coord::new(2, 3)).unwrap();

        assert_eq!(board.tile_at(Coord::new(2, 3)), TileValue::Black);
        assert_eq!(board.tile_at(Coord::new(3, 3)), TileValue::Black);
        assert_eq!(board.score(), Score { black: 4, white: 1 });
        assert_eq!(board.player_turn(), Player::White);
    }

    #[test]
    fn test_take_turn_rejects_occupied_square() {
        let mut board = Board::new();
        let before = board;
        let err = board.take_turn(Coord::new(3, 3)).unwrap_err();
        assert_eq!(err, RuleViolation::OccupiedSquare(Coord::new(3, 3)));
        assert_eq!(board, before);
    }

    #[test]
    fn test_take_turn_rejects_captureless_placement() {
        let mut board = Board::new();
        let before = board;
        let err = board.take_turn(Coord::new(0, 0)).unwrap_err();
        assert_eq!(err, RuleViolation::NoCaptures(Coord::new(0, 0)));
        assert_eq!(board, before);
    }

    #[test]
    fn test_take_turn_rejects_out_of_bounds() {
        let mut board = Board::new();
        let err = board.take_turn(Coord::new(8, 2)).unwrap_err();
        assert_eq!(err, RuleViolation::OutOfBounds(Coord::new(8, 2)));
    }

    #[test]
    fn test_is_valid_move_never_mutates() {
        let board = Board::new();
        let before = board;
        assert!(board.is_valid_move(Coord::new(2, 3)));
        assert!(!board.is_valid_move(Coord::new(0, 0)));
        assert_eq!(board, before);
    }

    #[test]
    fn test_has_adjacent_piece() {
        let board = Board::new();
        assert!(board.has_adjacent_piece(Coord::new(2, 3)));
        assert!(board.has_adjacent_piece(Coord::new(2, 2)));
        assert!(!board.has_adjacent_piece(Coord::new(0, 0)));
        assert!(!board.has_adjacent_piece(Coord::new(6, 1)));
    }

    #[test]
    fn test_is_game_over_on_full_board() {
        let mut tiles = [[TileValue::Black; BOARD_SIZE]; BOARD_SIZE];
        tiles[0][0] = TileValue::White;
        let board = Board::from_tiles(tiles, Player::White);
        assert!(board.is_game_over());
        assert_eq!(board.winner(), Some(Player::Black));
    }

    #[test]
    fn test_is_game_over_when_neither_side_can_move() {
        // Black holds one corner region, White the opposite; no empty square
        // borders both colors, so neither side can capture.
        let mut tiles = [[TileValue::Empty; BOARD_SIZE]; BOARD_SIZE];
        tiles[0][0] = TileValue::Black;
        tiles[7][7] = TileValue::White;
        let board = Board::from_tiles(tiles, Player::Black);
        assert!(board.is_game_over());
        assert_eq!(board.player_turn(), Player::Black);
    }

    #[test]
    fn test_is_game_over_false_at_start() {
        assert!(!Board::new().is_game_over());
    }

    #[test]
    fn test_winner_tie_is_none() {
        assert_eq!(Board::new().winner(), None);
    }

    #[test]
    fn test_annotated_marks_exactly_the_valid_moves() {
        let board = Board::new();
        let annotated = board.annotated();

        for y in 0..BOARD_SIZE as u8 {
            for x in 0..BOARD_SIZE as u8 {
                let coord = Coord::new(x, y);
                if board.is_valid_move(coord) {
                    assert_eq!(annotated.tile_at(coord), TileValue::ValidMoveMarker);
                } else {
                    assert_eq!(annotated.tile_at(coord), board.tile_at(coord));
                }
            }
        }
        assert!(annotated.has_markers());
        assert!(!board.has_markers());
    }

    #[test]
    fn test_annotated_is_idempotent_and_pure() {
        let board = Board::new();
        let first = board.annotated();
        let second = board.annotated();
        assert_eq!(first, second);
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_tile_conservation_through_a_playout() {
        let mut board = Board::new();
        while !board.is_game_over() {
            let moves = board.valid_moves();
            if moves.is_empty() {
                board.pass_turn();
                continue;
            }
            let total_before = board.score().total();
            board.take_turn(moves[0]).unwrap();
            // Flips recolor pieces; only the placement adds one.
            assert_eq!(board.score().total(), total_before + 1);
            assert_eq!(board.score().total() + board.empty_count(), 64);
        }
    }
}
