//! The `Setup -> Playing -> Completed` state machine.

use super::game::{MiniGame, PlayContext, Progress, Step};
use super::scheduler::Scheduler;
use crate::difficulty::Difficulty;
use crate::error::{PersistenceError, SessionError, ValidationError};
use crate::scoring::ScoreRecord;
use crate::store::ScoreStore;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::TryCurrentError;
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum SessionState {
    /// Waiting for the player to pick a difficulty and start.
    Setup,
    /// Accepting game input.
    Playing,
    /// Score computed and reported; terminal until reset.
    Completed,
}

/// Events delivered by the session's scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One tick interval of play time passed.
    Tick,
    /// The opponent's deferred reply is due.
    OpponentTurn,
    /// The store finished writing the completed result.
    Saved(Result<(), PersistenceError>),
}

/// Timing knobs for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct SessionConfig {
    /// Pause before the opponent replies, so the player's move renders first.
    opponent_delay: Duration,
    /// Period of the elapsed-time tick; each tick adds this much play time.
    tick_interval: Duration,
}

impl SessionConfig {
    /// Creates a session configuration.
    pub fn new(opponent_delay: Duration, tick_interval: Duration) -> Self {
        Self {
            opponent_delay,
            tick_interval,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(1))
    }
}

/// Result of handing the score record to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// The write has not finished.
    Pending,
    /// The store accepted the record.
    Saved,
    /// The store failed; the completed result still stands.
    Failed(PersistenceError),
}

/// A completed session's result.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Completion {
    /// The record handed to the store.
    record: ScoreRecord,
    /// Outcome of the write.
    save: SaveStatus,
}

impl Completion {
    /// Final score.
    pub fn score(&self) -> u32 {
        *self.record.score()
    }
}

/// What an accepted input or event led to.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<F> {
    /// Still playing.
    Playing(F),
    /// Still playing; the opponent replies after the configured delay.
    AwaitingOpponent(F),
    /// The session completed.
    Completed {
        /// Feedback for the final input.
        feedback: F,
        /// Score and save status.
        completion: Completion,
    },
}

impl<F> Transition<F> {
    /// Returns the feedback carried by any variant.
    pub fn feedback(&self) -> &F {
        match self {
            Self::Playing(f) | Self::AwaitingOpponent(f) => f,
            Self::Completed { feedback, .. } => feedback,
        }
    }

    /// Returns the completion if the session finished.
    pub fn completion(&self) -> Option<&Completion> {
        match self {
            Self::Completed { completion, .. } => Some(completion),
            _ => None,
        }
    }
}

/// One play-through of a mini-game.
///
/// Owns its payload, timers and random source; the only shared resource is
/// the injected score store, written at most once per completion. The write
/// runs in the background, so the completed result is available before the
/// store answers.
pub struct GameSession<G: MiniGame> {
    id: String,
    user_id: String,
    store: Arc<dyn ScoreStore>,
    config: SessionConfig,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    elapsed: Duration,
    awaiting_opponent: bool,
    game: Option<G>,
    completion: Option<Completion>,
    scheduler: Scheduler<SessionEvent>,
    rng: StdRng,
}

impl<G: MiniGame> GameSession<G> {
    /// Creates a session in `Setup` for `user_id`, reporting to `store`.
    #[instrument(skip(user_id, store), fields(game_type = %G::GAME_TYPE))]
    pub fn new(user_id: impl Into<String>, store: Arc<dyn ScoreStore>, config: SessionConfig) -> Self {
        Self::with_rng(user_id.into(), store, config, StdRng::from_entropy())
    }

    /// Creates a session whose random choices are reproducible.
    #[instrument(skip(user_id, store), fields(game_type = %G::GAME_TYPE))]
    pub fn seeded(
        user_id: impl Into<String>,
        store: Arc<dyn ScoreStore>,
        config: SessionConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(user_id.into(), store, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(user_id: String, store: Arc<dyn ScoreStore>, config: SessionConfig, mut rng: StdRng) -> Self {
        let id = format!("{:016x}", rng.next_u64());
        info!(session_id = %id, user_id = %user_id, game_type = %G::GAME_TYPE, "Creating game session");
        Self {
            id,
            user_id,
            store,
            config,
            state: SessionState::Setup,
            started_at: None,
            elapsed: Duration::ZERO,
            awaiting_opponent: false,
            game: None,
            completion: None,
            scheduler: Scheduler::new(),
            rng,
        }
    }

    /// Session identifier used in logs.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Player the session belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Tier of the current play-through, if started.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.game.as_ref().map(G::difficulty)
    }

    /// When the current play-through started.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Whole seconds of play counted so far.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.as_secs()
    }

    /// True while the opponent's reply is pending and input is closed.
    pub fn is_awaiting_opponent(&self) -> bool {
        self.awaiting_opponent
    }

    /// The game payload, present while `Playing` or `Completed`.
    pub fn game(&self) -> Option<&G> {
        self.game.as_ref()
    }

    /// The result, present once `Completed`.
    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// Starts a play-through at `difficulty`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] unless the session is in
    /// `Setup`, or [`SessionError::Setup`] if the payload cannot be built or
    /// no tokio runtime is available for the session's timers. On error the
    /// session stays in `Setup`.
    #[instrument(skip(self), fields(session_id = %self.id, game_type = %G::GAME_TYPE))]
    pub fn start(&mut self, difficulty: Difficulty) -> Result<(), SessionError> {
        self.guard(SessionState::Setup, "start")?;

        let game = G::setup(difficulty, &mut self.rng)?;
        self.scheduler.cancel_all();
        if G::TRACKS_ELAPSED {
            self.scheduler
                .every(self.config.tick_interval, SessionEvent::Tick)
                .map_err(no_runtime)?;
        }

        self.game = Some(game);
        self.completion = None;
        self.elapsed = Duration::ZERO;
        self.awaiting_opponent = false;
        self.started_at = Some(Utc::now());
        self.state = SessionState::Playing;

        info!(%difficulty, "Session started");
        Ok(())
    }

    /// Counts one tick interval of play. Ignored outside `Playing`.
    pub fn tick(&mut self) {
        if self.state == SessionState::Playing {
            self.elapsed += self.config.tick_interval;
        } else {
            debug!(session_id = %self.id, state = %self.state, "Ignoring tick");
        }
    }

    /// Submits one input event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] outside `Playing` and
    /// [`SessionError::Validation`] for rejected input; in both cases the
    /// session is unchanged.
    #[instrument(skip(self), fields(session_id = %self.id, game_type = %G::GAME_TYPE))]
    pub async fn submit(&mut self, input: G::Input) -> Result<Transition<G::Feedback>, SessionError> {
        self.guard(SessionState::Playing, "submit")?;

        if self.awaiting_opponent {
            warn!("Input while opponent reply is pending");
            return Err(ValidationError::AwaitingOpponent.into());
        }

        let elapsed_seconds = self.elapsed_seconds();
        let step = {
            let game = self.game.as_mut().ok_or(SessionError::InvalidTransition {
                state: self.state,
                action: "submit",
            })?;
            let mut ctx = PlayContext::new(elapsed_seconds, &mut self.rng);
            game.apply(input, &mut ctx).map_err(|e| {
                warn!(error = %e, "Input rejected");
                SessionError::Validation(e)
            })?
        };

        self.advance(step)
    }

    /// Waits for and handles the next scheduled event.
    ///
    /// Returns `Some` when the event was the opponent's reply, `None` for a
    /// tick or a finished save. Pends forever while nothing is scheduled.
    pub async fn next_event(&mut self) -> Result<Option<Transition<G::Feedback>>, SessionError> {
        match self.scheduler.next().await {
            SessionEvent::Tick => {
                self.tick();
                Ok(None)
            }
            SessionEvent::OpponentTurn => self.respond().map(Some),
            SessionEvent::Saved(result) => {
                self.settle_save(result);
                Ok(None)
            }
        }
    }

    /// Handles events until the pending opponent reply has been played.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] if no reply is pending.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn await_opponent(&mut self) -> Result<Transition<G::Feedback>, SessionError> {
        if !self.awaiting_opponent {
            error!(state = %self.state, "No opponent reply is pending");
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action: "await opponent",
            });
        }
        loop {
            if let Some(transition) = self.next_event().await? {
                return Ok(transition);
            }
        }
    }

    /// Handles events until the completed result's save has settled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] unless the session is
    /// `Completed`.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn await_save(&mut self) -> Result<SaveStatus, SessionError> {
        loop {
            let Some(completion) = self.completion.as_ref() else {
                error!(state = %self.state, "No completed result to save");
                return Err(SessionError::InvalidTransition {
                    state: self.state,
                    action: "await save",
                });
            };
            if completion.save != SaveStatus::Pending {
                return Ok(completion.save.clone());
            }
            self.next_event().await?;
        }
    }

    /// Abandons the play-through and returns to `Setup`.
    ///
    /// Cancels the tick timer and any pending opponent reply. A save already
    /// in flight still reaches the store, but its status is no longer
    /// reported.
    #[instrument(skip(self), fields(session_id = %self.id, state = %self.state))]
    pub fn reset(&mut self) {
        self.scheduler.cancel_all();
        self.state = SessionState::Setup;
        self.game = None;
        self.completion = None;
        self.started_at = None;
        self.elapsed = Duration::ZERO;
        self.awaiting_opponent = false;
        info!("Session reset");
    }

    fn guard(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            error!(session_id = %self.id, state = %self.state, action, "Invalid lifecycle transition");
            Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn respond(&mut self) -> Result<Transition<G::Feedback>, SessionError> {
        if self.state != SessionState::Playing || !self.awaiting_opponent {
            debug!(session_id = %self.id, "Dropping opponent turn for settled session");
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action: "respond",
            });
        }
        self.awaiting_opponent = false;

        let elapsed_seconds = self.elapsed_seconds();
        let step = {
            let game = self.game.as_mut().ok_or(SessionError::InvalidTransition {
                state: self.state,
                action: "respond",
            })?;
            let mut ctx = PlayContext::new(elapsed_seconds, &mut self.rng);
            game.respond(&mut ctx)?
        };

        self.advance(step)
    }

    fn advance(&mut self, step: Step<G::Feedback>) -> Result<Transition<G::Feedback>, SessionError> {
        match step.progress {
            Progress::Continue => Ok(Transition::Playing(step.feedback)),
            Progress::AwaitOpponent => {
                self.scheduler
                    .after(self.config.opponent_delay, SessionEvent::OpponentTurn)
                    .map_err(no_runtime)?;
                self.awaiting_opponent = true;
                Ok(Transition::AwaitingOpponent(step.feedback))
            }
            Progress::Finished => {
                let completion = self.complete()?;
                Ok(Transition::Completed {
                    feedback: step.feedback,
                    completion,
                })
            }
        }
    }

    fn complete(&mut self) -> Result<Completion, SessionError> {
        let game = self.game.as_ref().ok_or(SessionError::InvalidTransition {
            state: self.state,
            action: "complete",
        })?;

        let record = ScoreRecord::new(
            self.user_id.clone(),
            game.score(self.elapsed_seconds()),
            game.difficulty(),
            game.duration_seconds(self.elapsed_seconds()),
            Utc::now(),
            game.details(),
        );

        self.scheduler.cancel_all();
        self.awaiting_opponent = false;
        self.state = SessionState::Completed;

        let store = Arc::clone(&self.store);
        let pending = record.clone();
        let save = match self
            .scheduler
            .when_done(async move { SessionEvent::Saved(store.record_score(&pending).await) })
        {
            Ok(()) => SaveStatus::Pending,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Score not saved; result stands");
                SaveStatus::Failed(PersistenceError::new(format!("no async runtime to save on: {e}")))
            }
        };

        info!(
            session_id = %self.id,
            score = record.score(),
            duration_seconds = record.duration_seconds(),
            "Session completed"
        );
        let completion = Completion { record, save };
        self.completion = Some(completion.clone());
        Ok(completion)
    }

    fn settle_save(&mut self, result: Result<(), PersistenceError>) {
        let status = match result {
            Ok(()) => {
                debug!(session_id = %self.id, "Score saved");
                SaveStatus::Saved
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Score not saved; result stands");
                SaveStatus::Failed(e)
            }
        };
        if let Some(completion) = self.completion.as_mut() {
            completion.save = status;
        }
    }
}

fn no_runtime(e: TryCurrentError) -> SessionError {
    error!(error = %e, "Session timers need a tokio runtime");
    SessionError::Setup(format!("no async runtime for session timers: {e}"))
}

impl<G: MiniGame> fmt::Debug for GameSession<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("game_type", &G::GAME_TYPE)
            .field("user_id", &self.user_id)
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("awaiting_opponent", &self.awaiting_opponent)
            .finish()
    }
}
