//! Tic-tac-toe: board model, rules, decision engine and the session mini-game.

mod engine;
mod game;
mod position;
pub mod rules;
mod types;

pub use engine::{ENGINE_MARK, MEDIUM_OPTIMAL_PROBABILITY, PLAYER_MARK, best_move, choose_move};
pub use game::{Move, TicTacToe, TurnFeedback, tictactoe_score};
pub use position::Position;
pub use types::{Board, Mark, Outcome, Square};
