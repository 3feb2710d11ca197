//! Game session lifecycle shared by every mini-game.
//!
//! A session moves `Setup -> Playing -> Completed`. Input is accepted only
//! while `Playing`; reaching `Completed` computes the score once and hands
//! a [`ScoreRecord`](crate::ScoreRecord) to the injected
//! [`ScoreStore`](crate::ScoreStore).

mod game;
mod lifecycle;
mod scheduler;

pub use game::{MiniGame, PlayContext, Progress, Step};
pub use lifecycle::{
    Completion, GameSession, SaveStatus, SessionConfig, SessionEvent, SessionState, Transition,
};
pub use scheduler::Scheduler;
