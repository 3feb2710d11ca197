//! Error types for sessions, the decision engine and persistence.

use crate::games::tictactoe::Position;
use crate::session::SessionState;
use derive_more::{Display, Error};
use tracing::instrument;

/// Input rejected by a running game.
///
/// Recoverable: the session stays in `Playing` and its payload is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ValidationError {
    /// A numeric input fell outside the configured range.
    #[display("{value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        /// The rejected value.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },

    /// Input that could not be parsed at all.
    #[display("Malformed input: {}", _0)]
    Malformed(String),

    /// A tic-tac-toe move on a non-empty square.
    #[display("Square {} is already occupied", _0)]
    CellOccupied(Position),

    /// An edit to one of the puzzle's given cells.
    #[display("Cell ({row}, {col}) is part of the puzzle")]
    GivenCell {
        /// Row index (0-8).
        row: usize,
        /// Column index (0-8).
        col: usize,
    },

    /// A memory card that is already matched or already face up.
    #[display("Card {} cannot be flipped", _0)]
    CardUnavailable(usize),

    /// The hint budget is spent.
    #[display("No hints remaining")]
    NoHintsRemaining,

    /// An empty word guess.
    #[display("Guess is empty")]
    EmptyGuess,

    /// Input arrived while the opponent's reply is pending.
    #[display("Waiting for the opponent to move")]
    AwaitingOpponent,

    /// The game has already reached its completion predicate.
    #[display("Game is already over")]
    GameOver,
}

impl std::error::Error for ValidationError {}

/// Failure of the tic-tac-toe decision engine.
///
/// Only raised when the engine is asked to move on a terminal board,
/// which the session's own guards never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EngineError {
    /// The board already has a winner.
    #[display("Board already has a winner")]
    GameOver,
    /// The board is full.
    #[display("Board has no empty squares")]
    NoLegalMoves,
}

impl std::error::Error for EngineError {}

/// Error returned by [`GameSession`](crate::GameSession) operations.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionError {
    /// Input failed validation; the session is unchanged.
    #[display("Invalid input: {}", _0)]
    Validation(ValidationError),

    /// An operation was called from a state that does not allow it.
    #[display("Cannot {action} while session is {state}")]
    InvalidTransition {
        /// State the session was in.
        state: SessionState,
        /// Operation that was attempted.
        action: &'static str,
    },

    /// The decision engine refused to move.
    #[display("Engine error: {}", _0)]
    Engine(EngineError),

    /// Game payload could not be generated.
    #[display("Setup failed: {}", _0)]
    Setup(String),
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Failure to write or read score records.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Persistence error: {} at {}:{}", message, file, line)]
pub struct PersistenceError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl PersistenceError {
    /// Creates a new persistence error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<crate::db::DbError> for PersistenceError {
    #[track_caller]
    fn from(err: crate::db::DbError) -> Self {
        Self::new(err.to_string())
    }
}
