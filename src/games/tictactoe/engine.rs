//! Decision engine for the tic-tac-toe opponent.
//!
//! `Hard` plays the minimax-optimal move found by a full alpha-beta
//! search. `Medium` plays it 70% of the time and a uniformly random legal
//! move otherwise. `Easy` always plays a random legal move.
//!
//! The engine plays [`ENGINE_MARK`] and is the maximizing side: a win is
//! worth `10 - depth`, a loss `depth - 10` and a draw `0`, so it prefers
//! faster wins and slower losses.

use super::rules::outcome;
use super::{Board, Mark, Outcome, Position};
use crate::difficulty::Difficulty;
use crate::error::EngineError;
use rand::Rng;
use tracing::{debug, instrument};

/// Mark played by the engine.
pub const ENGINE_MARK: Mark = Mark::O;

/// Mark played by the human.
pub const PLAYER_MARK: Mark = Mark::X;

/// Probability that `Medium` plays the optimal move.
pub const MEDIUM_OPTIMAL_PROBABILITY: f64 = 0.7;

const WIN_SCORE: i32 = 10;
const INFINITY: i32 = 1_000;

/// Chooses the engine's move for `board` at the given tier.
///
/// # Errors
///
/// Returns [`EngineError`] if the board is already terminal.
#[instrument(skip(board, rng), fields(filled = board.filled()))]
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Position, EngineError> {
    let moves = legal_moves(board)?;

    let position = match difficulty {
        Difficulty::Hard => best_move(board)?,
        Difficulty::Medium => {
            if rng.gen_bool(MEDIUM_OPTIMAL_PROBABILITY) {
                best_move(board)?
            } else {
                random_move(&moves, rng)
            }
        }
        Difficulty::Easy => random_move(&moves, rng),
    };

    debug!(%difficulty, position = %position, "Engine chose move");
    Ok(position)
}

/// Returns the minimax-optimal move for the engine.
///
/// Ties between equally valued moves go to the lowest board index.
///
/// # Errors
///
/// Returns [`EngineError`] if the board is already terminal.
pub fn best_move(board: &Board) -> Result<Position, EngineError> {
    let moves = legal_moves(board)?;

    let mut best = moves[0];
    let mut best_value = -INFINITY;
    let mut alpha = -INFINITY;

    for pos in moves {
        let value = minimax(&board.with(pos, ENGINE_MARK), 0, false, alpha, INFINITY);
        if value > best_value {
            best_value = value;
            best = pos;
        }
        alpha = alpha.max(value);
    }

    debug!(position = %best, value = best_value, "Minimax best move");
    Ok(best)
}

fn legal_moves(board: &Board) -> Result<Vec<Position>, EngineError> {
    match outcome(board) {
        Some(Outcome::Winner(_)) => Err(EngineError::GameOver),
        Some(Outcome::Draw) => Err(EngineError::NoLegalMoves),
        None => Ok(board.empty_positions()),
    }
}

fn random_move<R: Rng + ?Sized>(moves: &[Position], rng: &mut R) -> Position {
    moves[rng.gen_range(0..moves.len())]
}

fn minimax(board: &Board, depth: i32, maximizing: bool, mut alpha: i32, mut beta: i32) -> i32 {
    match outcome(board) {
        Some(Outcome::Winner(mark)) if mark == ENGINE_MARK => return WIN_SCORE - depth,
        Some(Outcome::Winner(_)) => return depth - WIN_SCORE,
        Some(Outcome::Draw) => return 0,
        None => {}
    }

    if maximizing {
        let mut max_eval = -INFINITY;
        for pos in board.empty_positions() {
            let eval = minimax(&board.with(pos, ENGINE_MARK), depth + 1, false, alpha, beta);
            max_eval = max_eval.max(eval);
            alpha = alpha.max(eval);
            if beta <= alpha {
                break;
            }
        }
        max_eval
    } else {
        let mut min_eval = INFINITY;
        for pos in board.empty_positions() {
            let eval = minimax(&board.with(pos, PLAYER_MARK), depth + 1, true, alpha, beta);
            min_eval = min_eval.min(eval);
            beta = beta.min(eval);
            if beta <= alpha {
                break;
            }
        }
        min_eval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Plain minimax without pruning, engine to move when `maximizing`.
    fn exhaustive(board: &Board, depth: i32, maximizing: bool) -> i32 {
        match outcome(board) {
            Some(Outcome::Winner(mark)) if mark == ENGINE_MARK => return WIN_SCORE - depth,
            Some(Outcome::Winner(_)) => return depth - WIN_SCORE,
            Some(Outcome::Draw) => return 0,
            None => {}
        }
        let children = board.empty_positions().into_iter().map(|pos| {
            let mark = if maximizing { ENGINE_MARK } else { PLAYER_MARK };
            exhaustive(&board.with(pos, mark), depth + 1, !maximizing)
        });
        if maximizing {
            children.max().unwrap_or(0)
        } else {
            children.min().unwrap_or(0)
        }
    }

    #[test]
    fn test_pruned_search_matches_exhaustive_value() {
        for text in ["X.. ... ...", "XO. .X. ...", "X.X .O. ...", "XOX .O. X.."] {
            let board: Board = text.parse().unwrap();
            for pos in board.empty_positions() {
                let child = board.with(pos, ENGINE_MARK);
                assert_eq!(
                    minimax(&child, 0, false, -INFINITY, INFINITY),
                    exhaustive(&child, 0, false),
                    "board {} move {:?}",
                    text,
                    pos
                );
            }
        }
    }

    #[test]
    fn test_takes_immediate_win() {
        let board: Board = "OO. XX. X..".parse().unwrap();
        assert_eq!(best_move(&board), Ok(Position::TopRight));
    }

    #[test]
    fn test_blocks_immediate_loss() {
        let board: Board = "XX. .O. ...".parse().unwrap();
        assert_eq!(best_move(&board), Ok(Position::TopRight));
    }

    #[test]
    fn test_answers_corner_opening_with_center() {
        let board: Board = "X.. ... ...".parse().unwrap();
        assert_eq!(best_move(&board), Ok(Position::Center));
    }

    #[test]
    fn test_terminal_board_is_rejected() {
        let won: Board = "XXX OO. ...".parse().unwrap();
        assert_eq!(best_move(&won), Err(EngineError::GameOver));

        let full: Board = "XOX OXX OXO".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            choose_move(&full, Difficulty::Easy, &mut rng),
            Err(EngineError::NoLegalMoves)
        );
    }

    #[test]
    fn test_hard_is_deterministic() {
        let board: Board = "X.. ... ..X".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let first = choose_move(&board, Difficulty::Hard, &mut rng).unwrap();
        for _ in 0..20 {
            assert_eq!(choose_move(&board, Difficulty::Hard, &mut rng).unwrap(), first);
        }
    }

    #[test]
    fn test_easy_reaches_every_legal_move() {
        let board: Board = "X.. ... ...".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..400 {
            let pos = choose_move(&board, Difficulty::Easy, &mut rng).unwrap();
            assert!(board.is_empty(pos));
            seen.insert(pos);
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_medium_mixes_optimal_and_random() {
        // Only TopRight blocks X; random picks it 1 time in 7.
        let board: Board = "XX. .O. ...".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 4_000;
        let optimal = (0..trials)
            .filter(|_| {
                choose_move(&board, Difficulty::Medium, &mut rng).unwrap() == Position::TopRight
            })
            .count();
        let expected = MEDIUM_OPTIMAL_PROBABILITY + (1.0 - MEDIUM_OPTIMAL_PROBABILITY) / 7.0;
        let observed = optimal as f64 / trials as f64;
        assert!(
            (observed - expected).abs() < 0.04,
            "observed {observed}, expected {expected}"
        );
    }
}
