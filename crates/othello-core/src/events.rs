//! Move records, the read-only game view, and the engine's event channel.
//!
//! This module defines the engine's outward-facing surface types: the
//! immutable [`Move`] record appended to history, the [`GameView`] composite
//! handed to callers and carried by events, and the typed publish/subscribe
//! channel ([`GameEvent`], [`EventKind`], [`EventBus`]).
//!
//! Delivery is synchronous and single-threaded: listeners run inline, in
//! registration order, on the call that emitted the event. A listener that
//! panics unwinds through the emitting call; the bus does not isolate it.

use crate::board::{Board, Player, Score};
use crate::coord::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record of one executed turn. Immutable once created; appended to the
/// move history, never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    /// The color that moved
    pub player: Player,
    /// Where the piece was placed
    pub coordinate: Coord,
    /// Wall-clock time of the move, milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Piece counts immediately after the move resolved
    pub score_after: Score,
}

/// A read-only composite view of a session, assembled fresh from the live
/// board and history on every request. Nothing in it aliases engine state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub board: Board,
    pub score: Score,
    /// Legal moves for the current player, row-major scan order
    pub valid_moves: Vec<Coord>,
    pub is_game_over: bool,
    /// `None` while the game is in progress, and on a tie once it ends
    pub winner: Option<Player>,
    pub move_history: Vec<Move>,
    pub current_player: Player,
    pub black_player_id: Option<String>,
    pub white_player_id: Option<String>,
}

/// What triggered a `StateChange` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateChangeCause {
    Move,
    Undo,
    Redo,
    Reset,
    Import,
}

/// Events published by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    /// A legal move was applied.
    Move { mv: Move, state: GameView },

    /// A move was rejected; board and history are unchanged.
    InvalidMove { coordinate: Coord, reason: String },

    /// The game reached a terminal position.
    GameOver {
        winner: Option<Player>,
        state: GameView,
    },

    /// The authoritative state changed (move, undo, redo, reset, import).
    StateChange {
        cause: StateChangeCause,
        state: GameView,
    },
}

impl GameEvent {
    /// The channel this event is delivered on.
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::Move { .. } => EventKind::Move,
            GameEvent::InvalidMove { .. } => EventKind::InvalidMove,
            GameEvent::GameOver { .. } => EventKind::GameOver,
            GameEvent::StateChange { .. } => EventKind::StateChange,
        }
    }
}

/// The four event channels callers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Move,
    InvalidMove,
    GameOver,
    StateChange,
}

/// Handle identifying one registered listener, returned by `subscribe` and
/// consumed by `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) type Listener = Box<dyn FnMut(&GameEvent)>;

/// Listener registry keyed by event kind.
///
/// Listeners for a kind fire in registration order. Registration during
/// dispatch is not supported; the engine only exposes subscription between
/// operations, which is all the single-threaded model needs.
pub(crate) struct EventBus {
    listeners: Vec<(EventKind, ListenerId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Register `listener` for events of `kind`.
    pub(crate) fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((kind, id, listener));
        id
    }

    /// Remove the listener registered under `id`. Returns whether anything
    /// was removed.
    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(_, listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener subscribed to its kind, in
    /// registration order, synchronously.
    pub(crate) fn emit(&mut self, event: &GameEvent) {
        let kind = event.kind();
        for (listener_kind, _, listener) in &mut self.listeners {
            if *listener_kind == kind {
                listener(event);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
