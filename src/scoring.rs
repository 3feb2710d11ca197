//! Score records handed to the persistence collaborator.

use crate::difficulty::Difficulty;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// The kind of mini-game a score belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameType {
    /// Tic-tac-toe against the decision engine.
    TicTacToe,
    /// Guess a hidden number within an attempt budget.
    NumberGuessing,
    /// Flip cards to find matching pairs.
    Memory,
    /// Unscramble words.
    WordPuzzle,
    /// Classic 9x9 sudoku.
    Sudoku,
    /// Five-round reaction-time test.
    Reaction,
    /// Multiple-choice questions.
    Trivia,
}

/// Game outcome from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameOutcome {
    /// User won the game.
    Win,
    /// User lost the game.
    Loss,
    /// Game ended in a draw.
    Draw,
}

/// Game-specific facts recorded alongside a score.
///
/// One variant per game type, each carrying only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game_type", rename_all = "kebab-case")]
pub enum GameDetails {
    /// Tic-tac-toe result.
    TicTacToe {
        /// Result for the human player.
        outcome: GameOutcome,
        /// Marks placed by both sides.
        moves: u32,
    },
    /// Number-guessing result.
    NumberGuessing {
        /// Whether the number was found.
        won: bool,
        /// Guesses used.
        attempts: u32,
        /// Attempt budget for the tier.
        max_attempts: u32,
    },
    /// Memory-match result.
    Memory {
        /// Pair flips made.
        moves: u32,
        /// Pairs found.
        matches: u32,
    },
    /// Word-puzzle result.
    WordPuzzle {
        /// Words unscrambled.
        words_completed: u32,
        /// Hints spent.
        hints_used: u32,
    },
    /// Sudoku result.
    Sudoku {
        /// Hints spent.
        hints_used: u32,
    },
    /// Reaction-test result.
    Reaction {
        /// Mean reaction time in milliseconds.
        average_ms: f64,
        /// Fastest reaction in milliseconds.
        best_ms: f64,
    },
    /// Trivia result.
    Trivia {
        /// Questions answered correctly.
        correct_answers: u32,
        /// Questions asked.
        questions: u32,
    },
}

impl GameDetails {
    /// Returns the game type this variant belongs to.
    #[instrument(skip(self))]
    pub fn game_type(&self) -> GameType {
        match self {
            Self::TicTacToe { .. } => GameType::TicTacToe,
            Self::NumberGuessing { .. } => GameType::NumberGuessing,
            Self::Memory { .. } => GameType::Memory,
            Self::WordPuzzle { .. } => GameType::WordPuzzle,
            Self::Sudoku { .. } => GameType::Sudoku,
            Self::Reaction { .. } => GameType::Reaction,
            Self::Trivia { .. } => GameType::Trivia,
        }
    }
}

/// Immutable result of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ScoreRecord {
    /// Player the score belongs to.
    user_id: String,
    /// Final score.
    score: u32,
    /// Tier the session was played at.
    difficulty: Difficulty,
    /// Play time in whole seconds.
    duration_seconds: u64,
    /// Completion time.
    recorded_at: DateTime<Utc>,
    /// Game-specific facts.
    details: GameDetails,
}

impl ScoreRecord {
    /// Creates a new score record.
    #[instrument(skip(user_id, details), fields(user_id = %user_id, game_type = %details.game_type()))]
    pub fn new(
        user_id: String,
        score: u32,
        difficulty: Difficulty,
        duration_seconds: u64,
        recorded_at: DateTime<Utc>,
        details: GameDetails,
    ) -> Self {
        Self {
            user_id,
            score,
            difficulty,
            duration_seconds,
            recorded_at,
            details,
        }
    }

    /// Returns the game type of this record.
    pub fn game_type(&self) -> GameType {
        self.details.game_type()
    }
}

/// Clamps a raw score to a non-negative integer, rounding half away from zero.
#[instrument]
pub fn clamp_score(raw: f64) -> u32 {
    if raw.is_nan() || raw <= 0.0 {
        0
    } else if raw >= u32::MAX as f64 {
        u32::MAX
    } else {
        raw.round() as u32
    }
}

/// `max(0, window - spent)`.
pub(crate) fn bonus(window: i64, spent: i64) -> i64 {
    (window - spent).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_clamp_score_never_negative() {
        assert_eq!(clamp_score(-12.0), 0);
        assert_eq!(clamp_score(f64::NAN), 0);
        assert_eq!(clamp_score(12.5), 13);
        assert_eq!(clamp_score(12.4), 12);
    }

    #[test]
    fn test_game_type_names_are_kebab_case() {
        assert_eq!(GameType::TicTacToe.to_string(), "tic-tac-toe");
        assert_eq!(
            GameType::from_str("number-guessing").unwrap(),
            GameType::NumberGuessing
        );
    }

    #[test]
    fn test_details_serialize_with_game_type_tag() {
        let details = GameDetails::Sudoku { hints_used: 2 };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["game_type"], "sudoku");
        assert_eq!(json["hints_used"], 2);

        let back: GameDetails = serde_json::from_value(json).unwrap();
        assert_eq!(back.game_type(), GameType::Sudoku);
    }
}
