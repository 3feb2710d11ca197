//! Tests for the tic-tac-toe decision engine.

use std::collections::{HashMap, HashSet};

use brain_break::games::tictactoe::rules::outcome;
use brain_break::{
    Board, Difficulty, ENGINE_MARK, Mark, Outcome, PLAYER_MARK, Position, best_move, choose_move,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Exhaustive minimax value from the engine's point of view.
fn value(board: &Board, to_move: Mark, depth: i32, memo: &mut HashMap<(Board, i32), i32>) -> i32 {
    if let Some(result) = outcome(board) {
        return match result {
            Outcome::Winner(mark) if mark == ENGINE_MARK => 10 - depth,
            Outcome::Winner(_) => depth - 10,
            Outcome::Draw => 0,
        };
    }
    if let Some(&v) = memo.get(&(*board, depth)) {
        return v;
    }
    let children = board
        .empty_positions()
        .into_iter()
        .map(|pos| value(&board.with(pos, to_move), to_move.opponent(), depth + 1, memo));
    let v = if to_move == ENGINE_MARK {
        children.max().unwrap_or(0)
    } else {
        children.min().unwrap_or(0)
    };
    memo.insert((*board, depth), v);
    v
}

/// Every non-terminal board reachable with the player opening and the
/// engine to move.
fn engine_turn_boards() -> Vec<Board> {
    let mut seen = HashSet::new();
    let mut frontier = vec![Board::new()];
    let mut found = Vec::new();
    while let Some(board) = frontier.pop() {
        if !seen.insert(board) || outcome(&board).is_some() {
            continue;
        }
        let to_move = if board.count(PLAYER_MARK) > board.count(ENGINE_MARK) {
            found.push(board);
            ENGINE_MARK
        } else {
            PLAYER_MARK
        };
        for pos in board.empty_positions() {
            frontier.push(board.with(pos, to_move));
        }
    }
    found
}

#[test]
fn test_best_move_is_optimal_on_every_reachable_board() {
    let mut memo = HashMap::new();
    let boards = engine_turn_boards();
    assert!(boards.len() > 1000);

    for board in boards {
        let best = board
            .empty_positions()
            .into_iter()
            .map(|pos| value(&board.with(pos, ENGINE_MARK), PLAYER_MARK, 1, &mut memo))
            .max()
            .unwrap();
        let chosen = best_move(&board).unwrap();
        assert!(board.is_empty(chosen));
        assert_eq!(
            value(&board.with(chosen, ENGINE_MARK), PLAYER_MARK, 1, &mut memo),
            best,
            "suboptimal move {:?} on\n{}",
            chosen,
            board
        );
    }
}

#[test]
fn test_takes_winning_square_over_block() {
    let board: Board = "XOX XOO ___".parse().unwrap();
    let chosen = best_move(&board).unwrap();
    assert_eq!(chosen, Position::BottomCenter);

    let after = board.with(chosen, ENGINE_MARK);
    assert_eq!(outcome(&after), Some(Outcome::Winner(ENGINE_MARK)));
}

#[test]
fn test_every_tier_answers_with_a_legal_move() {
    let board: Board = "XOX XOO ___".parse().unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        for _ in 0..20 {
            let chosen = choose_move(&board, difficulty, &mut rng).unwrap();
            assert!(
                [Position::BottomLeft, Position::BottomCenter, Position::BottomRight]
                    .contains(&chosen)
            );
        }
    }
}

#[test]
fn test_finished_boards_are_rejected() {
    let mut rng = StdRng::seed_from_u64(0);
    for text in ["XXX OO. ...", "XOX OXX OXO"] {
        let board: Board = text.parse().unwrap();
        assert!(best_move(&board).is_err());
        assert!(choose_move(&board, Difficulty::Easy, &mut rng).is_err());
    }
}

fn play_random_opening(moves: &[usize]) -> Board {
    let mut board = Board::new();
    let mut mark = PLAYER_MARK;
    for &pick in moves {
        if outcome(&board).is_some() {
            break;
        }
        let empty = board.empty_positions();
        board = board.with(empty[pick % empty.len()], mark);
        mark = mark.opponent();
    }
    board
}

proptest! {
    #[test]
    fn prop_engine_moves_only_to_empty_squares(
        moves in prop::collection::vec(0usize..9, 0..8),
        seed in any::<u64>(),
    ) {
        let board = play_random_opening(&moves);
        prop_assume!(outcome(&board).is_none());

        let mut rng = StdRng::seed_from_u64(seed);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let chosen = choose_move(&board, difficulty, &mut rng).unwrap();
            prop_assert!(board.is_empty(chosen));
        }
    }
}
