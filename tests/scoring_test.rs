//! Properties of the per-game scoring formulas.

use brain_break::games::memory::memory_score;
use brain_break::games::number_guessing::{GuessSettings, number_guessing_score};
use brain_break::games::sudoku::sudoku_score;
use brain_break::games::tictactoe::tictactoe_score;
use brain_break::games::word_puzzle::{WordSettings, word_points, word_puzzle_score};
use brain_break::{Difficulty, GameOutcome, clamp_score};
use proptest::prelude::*;

fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
    ]
}

#[test]
fn test_clamp_score_rounds_and_floors_at_zero() {
    assert_eq!(clamp_score(-12.0), 0);
    assert_eq!(clamp_score(2.5), 3);
    assert_eq!(clamp_score(2.4), 2);
    assert_eq!(clamp_score(1290.0), 1290);
}

#[test]
fn test_reference_scores() {
    let medium = GuessSettings::for_difficulty(Difficulty::Medium);
    assert_eq!(number_guessing_score(&medium, 3, 40), 460);
    assert_eq!(tictactoe_score(GameOutcome::Draw, Difficulty::Hard, 5), 50);
    assert_eq!(tictactoe_score(GameOutcome::Loss, Difficulty::Hard, 5), 0);
}

#[test]
fn test_very_long_sessions_lose_only_the_time_bonus() {
    let forever = u64::MAX / 3;
    assert_eq!(sudoku_score(Difficulty::Hard, 0, forever), 2000);
    assert_eq!(sudoku_score(Difficulty::Easy, 3, forever), 500);

    let easy = WordSettings::for_difficulty(Difficulty::Easy);
    assert_eq!(word_points(&easy, forever, 0), 100);
    assert_eq!(word_points(&easy, forever, 2), 50);
    assert_eq!(word_puzzle_score(Difficulty::Easy, &[100, 100], forever), 200);

    assert_eq!(memory_score(Difficulty::Easy, 0, 0, forever), 0);
    assert_eq!(number_guessing_score(&GuessSettings::for_difficulty(Difficulty::Easy), 8, forever), 140);
}

proptest! {
    #[test]
    fn prop_slower_wins_never_score_higher(d in difficulty(), t in 0u64..5_000, extra in 0u64..600) {
        prop_assert!(
            tictactoe_score(GameOutcome::Win, d, t + extra) <= tictactoe_score(GameOutcome::Win, d, t)
        );
        let settings = GuessSettings::for_difficulty(d);
        prop_assert!(number_guessing_score(&settings, 2, t + extra) <= number_guessing_score(&settings, 2, t));
        prop_assert!(sudoku_score(d, 1, t + extra) <= sudoku_score(d, 1, t));
        prop_assert!(memory_score(d, 6, 14, t + extra) <= memory_score(d, 6, 14, t));
        prop_assert!(word_puzzle_score(d, &[120, 80], t + extra) <= word_puzzle_score(d, &[120, 80], t));
    }

    #[test]
    fn prop_fewer_attempts_never_score_lower(d in difficulty(), attempts in 1u32..6, t in 0u64..300) {
        let settings = GuessSettings::for_difficulty(d);
        prop_assert!(
            number_guessing_score(&settings, attempts, t)
                >= number_guessing_score(&settings, attempts + 1, t)
        );
    }

    #[test]
    fn prop_more_sudoku_hints_never_score_higher(d in difficulty(), hints in 0u32..3, t in 0u64..10_000) {
        prop_assert!(sudoku_score(d, hints + 1, t) <= sudoku_score(d, hints, t));
    }

    #[test]
    fn prop_more_word_hints_never_score_higher(d in difficulty(), hints in 0u32..10, t in 0u64..1_000) {
        let settings = WordSettings::for_difficulty(d);
        prop_assert!(word_points(&settings, t, hints + 1) <= word_points(&settings, t, hints));
    }

    #[test]
    fn prop_more_memory_moves_never_score_higher(
        d in difficulty(),
        matches in 0u32..=8,
        extra in 0u32..40,
        more in 1u32..20,
        t in 0u64..600,
    ) {
        let moves = matches * 2 + extra;
        prop_assert!(memory_score(d, matches, moves + more, t) <= memory_score(d, matches, moves, t));
    }

    #[test]
    fn prop_sudoku_never_drops_below_floor(d in difficulty(), hints in 0u32..4, t in 0u64..100_000) {
        prop_assert!(sudoku_score(d, hints, t) >= 500);
    }

    #[test]
    fn prop_harder_wins_score_at_least_as_much(t in 0u64..1_000) {
        let easy = tictactoe_score(GameOutcome::Win, Difficulty::Easy, t);
        let medium = tictactoe_score(GameOutcome::Win, Difficulty::Medium, t);
        let hard = tictactoe_score(GameOutcome::Win, Difficulty::Hard, t);
        prop_assert!(easy <= medium && medium <= hard);
    }
}
