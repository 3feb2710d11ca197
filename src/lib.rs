//! Brain Break Hub game core.
//!
//! Mini-games run inside a generic session lifecycle
//! (`Setup -> Playing -> Completed`) that scores the play-through once and
//! hands the record to an injected score store.
//!
//! # Architecture
//!
//! - **Session**: [`GameSession`] drives any [`MiniGame`], owning its timers
//! - **Games**: tic-tac-toe (with a minimax decision engine), number
//!   guessing, memory match, word puzzle, sudoku, reaction test and trivia
//! - **Store**: the async [`ScoreStore`] boundary, backed by SQLite via
//!   [`ScoreService`] or in memory via [`MemoryScoreStore`]
//!
//! # Example
//!
//! ```no_run
//! use brain_break::{Difficulty, GameSession, MemoryScoreStore, Position, SessionConfig, TicTacToe};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), brain_break::SessionError> {
//! let store = Arc::new(MemoryScoreStore::new());
//! let mut session: GameSession<TicTacToe> =
//!     GameSession::new("ann", store, SessionConfig::default());
//!
//! session.start(Difficulty::Hard)?;
//! session.submit(Position::Center).await?;
//! let reply = session.await_opponent().await?;
//! println!("{}", reply.feedback().board);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod difficulty;
mod error;
pub mod games;
mod leaderboard;
mod score_service;
mod scoring;
mod session;
mod store;

pub use config::{AppConfig, ConfigError};
pub use db::{DbError, MIGRATIONS, NewStoredScore, ScoreRepository, StoredScore};
pub use difficulty::Difficulty;
pub use error::{EngineError, PersistenceError, SessionError, ValidationError};
pub use leaderboard::{
    LeaderboardEntry, LeaderboardMetric, PlayerSummary, rank, summarize,
};
pub use score_service::ScoreService;
pub use scoring::{GameDetails, GameOutcome, GameType, ScoreRecord, clamp_score};
pub use session::{
    Completion, GameSession, MiniGame, PlayContext, Progress, SaveStatus, Scheduler,
    SessionConfig, SessionEvent, SessionState, Step, Transition,
};
pub use store::{MemoryScoreStore, ScoreQuery, ScoreStore};

pub use games::tictactoe::{
    Board, ENGINE_MARK, Mark, Outcome, PLAYER_MARK, Position, Square, TicTacToe, best_move,
    choose_move,
};
pub use games::{MemoryMatch, NumberGuessing, ReactionTest, Sudoku, Trivia, WordPuzzle};
