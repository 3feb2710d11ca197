//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](super::Board); the engine and the
//! mini-game share them for terminal detection.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{LINES, check_winner};

use super::{Board, Outcome};

/// Evaluates a board: `Some` once a line is complete or the board is full.
pub fn outcome(board: &Board) -> Option<Outcome> {
    if let Some(winner) = check_winner(board) {
        Some(Outcome::Winner(winner))
    } else if is_full(board) {
        Some(Outcome::Draw)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::Mark;

    #[test]
    fn test_outcome_in_progress() {
        let board: Board = "X.. .O. ...".parse().unwrap();
        assert_eq!(outcome(&board), None);
    }

    #[test]
    fn test_outcome_prefers_win_over_full() {
        let board: Board = "XXX OOX OXO".parse().unwrap();
        assert_eq!(outcome(&board), Some(Outcome::Winner(Mark::X)));
    }

    #[test]
    fn test_outcome_draw() {
        let board: Board = "XOX OXX OXO".parse().unwrap();
        assert_eq!(outcome(&board), Some(Outcome::Draw));
    }
}
