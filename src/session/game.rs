//! The contract each mini-game implements to run inside a session.

use crate::difficulty::Difficulty;
use crate::error::{SessionError, ValidationError};
use crate::scoring::{GameDetails, GameType};
use crate::session::SessionState;
use rand::rngs::StdRng;
use std::fmt;

/// What a game needs from the session while handling input.
#[derive(Debug)]
pub struct PlayContext<'a> {
    elapsed_seconds: u64,
    rng: &'a mut StdRng,
}

impl<'a> PlayContext<'a> {
    /// Creates a context for one input event.
    pub fn new(elapsed_seconds: u64, rng: &'a mut StdRng) -> Self {
        Self {
            elapsed_seconds,
            rng,
        }
    }

    /// Seconds spent playing so far.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// The session's random source.
    pub fn rng(&mut self) -> &mut StdRng {
        self.rng
    }
}

/// Where a game stands after accepting input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Keep accepting input.
    Continue,
    /// The opponent replies next; input is closed until it does.
    AwaitOpponent,
    /// The completion predicate holds.
    Finished,
}

/// Feedback for one accepted input plus the resulting progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<F> {
    /// Game-specific feedback for the UI.
    pub feedback: F,
    /// Resulting progress.
    pub progress: Progress,
}

impl<F> Step<F> {
    /// Input accepted, game continues.
    pub fn next(feedback: F) -> Self {
        Self {
            feedback,
            progress: Progress::Continue,
        }
    }

    /// Input accepted, opponent to move.
    pub fn awaiting(feedback: F) -> Self {
        Self {
            feedback,
            progress: Progress::AwaitOpponent,
        }
    }

    /// Input accepted, game over.
    pub fn finished(feedback: F) -> Self {
        Self {
            feedback,
            progress: Progress::Finished,
        }
    }
}

/// A mini-game payload driven by [`GameSession`](crate::GameSession).
///
/// Scores must be a pure function of the game's recorded state and the
/// elapsed seconds handed in, so a finished game can be re-scored exactly.
pub trait MiniGame: Sized {
    /// One input event (a move, a guess, a flip...).
    type Input: fmt::Debug;

    /// Feedback returned for accepted input.
    type Feedback: fmt::Debug + Clone;

    /// Game type recorded with the score.
    const GAME_TYPE: GameType;

    /// Whether the session runs its elapsed-time tick for this game.
    const TRACKS_ELAPSED: bool = true;

    /// Generates the payload for a new play-through.
    fn setup(difficulty: Difficulty, rng: &mut StdRng) -> Result<Self, SessionError>;

    /// Tier the score is recorded under.
    fn difficulty(&self) -> Difficulty;

    /// Validates and applies one input event.
    ///
    /// Rejected input must leave the game unchanged.
    fn apply(
        &mut self,
        input: Self::Input,
        ctx: &mut PlayContext<'_>,
    ) -> Result<Step<Self::Feedback>, ValidationError>;

    /// Plays the opponent's deferred reply. Games without an opponent keep
    /// the default, which is never reached through a session.
    fn respond(&mut self, _ctx: &mut PlayContext<'_>) -> Result<Step<Self::Feedback>, SessionError> {
        Err(SessionError::InvalidTransition {
            state: SessionState::Playing,
            action: "respond",
        })
    }

    /// Final score for the recorded state.
    fn score(&self, elapsed_seconds: u64) -> u32;

    /// Game-specific facts stored with the score.
    fn details(&self) -> GameDetails;

    /// Duration stored with the score.
    fn duration_seconds(&self, elapsed_seconds: u64) -> u64 {
        elapsed_seconds
    }
}
