//! Guess a hidden number within an attempt budget.

use crate::difficulty::Difficulty;
use crate::error::{SessionError, ValidationError};
use crate::scoring::{GameDetails, GameType, bonus, clamp_score};
use crate::session::{MiniGame, PlayContext, Step};
use derive_getters::Getters;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument};

const ATTEMPT_BONUS: i64 = 20;
const TIME_BONUS_WINDOW: i64 = 120;
const TIME_BONUS_PER_SECOND: i64 = 2;

/// Range, attempt budget and base score for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct GuessSettings {
    min: i64,
    max: i64,
    max_attempts: u32,
    base_score: i64,
}

impl GuessSettings {
    /// Settings for `difficulty`.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                min: 1,
                max: 50,
                max_attempts: 10,
                base_score: 100,
            },
            Difficulty::Medium => Self {
                min: 1,
                max: 100,
                max_attempts: 8,
                base_score: 200,
            },
            Difficulty::Hard => Self {
                min: 1,
                max: 200,
                max_attempts: 6,
                base_score: 300,
            },
        }
    }
}

/// Direction hint for a wrong guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Hint {
    /// The number is higher.
    #[strum(to_string = "Too low!")]
    TooLow,
    /// The number is lower.
    #[strum(to_string = "Too high!")]
    TooHigh,
    /// Found it.
    #[strum(to_string = "Correct!")]
    Correct,
}

/// Feedback for one accepted guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessFeedback {
    /// The guess.
    pub guess: i64,
    /// How it compares to the target.
    pub hint: Hint,
    /// Guesses left.
    pub attempts_remaining: u32,
    /// The target, revealed once the budget is spent.
    pub revealed: Option<i64>,
}

/// One round of number guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberGuessing {
    difficulty: Difficulty,
    settings: GuessSettings,
    target: i64,
    attempts: u32,
    history: Vec<(i64, Hint)>,
    won: bool,
}

impl NumberGuessing {
    /// Creates a round with a known target.
    #[instrument]
    pub fn with_target(difficulty: Difficulty, target: i64) -> Self {
        Self {
            difficulty,
            settings: GuessSettings::for_difficulty(difficulty),
            target,
            attempts: 0,
            history: Vec::new(),
            won: false,
        }
    }

    /// The hidden number.
    pub fn target(&self) -> i64 {
        self.target
    }

    /// Guesses made, including the correct one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Tier settings.
    pub fn settings(&self) -> &GuessSettings {
        &self.settings
    }

    /// Guesses and hints so far.
    pub fn history(&self) -> &[(i64, Hint)] {
        &self.history
    }

    /// True once the target was found.
    pub fn is_won(&self) -> bool {
        self.won
    }

    fn is_over(&self) -> bool {
        self.won || self.attempts >= self.settings.max_attempts
    }

    fn parse(&self, raw: &str) -> Result<i64, ValidationError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::Malformed(raw.trim().to_string()))?;
        if value < self.settings.min || value > self.settings.max {
            return Err(ValidationError::OutOfRange {
                value,
                min: self.settings.min,
                max: self.settings.max,
            });
        }
        Ok(value)
    }
}

/// Score for a won round; a lost round scores 0.
///
/// `attempts` counts every guess including the correct one.
pub fn number_guessing_score(settings: &GuessSettings, attempts: u32, elapsed_seconds: u64) -> u32 {
    let spare = i64::from(settings.max_attempts) - i64::from(attempts);
    let spent = i64::try_from(elapsed_seconds).unwrap_or(i64::MAX);
    let raw = settings.base_score
        + (spare * ATTEMPT_BONUS).max(0)
        + bonus(TIME_BONUS_WINDOW, spent) * TIME_BONUS_PER_SECOND;
    clamp_score(raw as f64)
}

impl MiniGame for NumberGuessing {
    type Input = String;
    type Feedback = GuessFeedback;
    const GAME_TYPE: GameType = GameType::NumberGuessing;

    fn setup(difficulty: Difficulty, rng: &mut StdRng) -> Result<Self, SessionError> {
        let settings = GuessSettings::for_difficulty(difficulty);
        let target = rng.gen_range(settings.min..=settings.max);
        debug!(min = settings.min, max = settings.max, "Target chosen");
        Ok(Self::with_target(difficulty, target))
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[instrument(skip(self, _ctx), fields(attempts = self.attempts))]
    fn apply(
        &mut self,
        raw: String,
        _ctx: &mut PlayContext<'_>,
    ) -> Result<Step<GuessFeedback>, ValidationError> {
        if self.is_over() {
            return Err(ValidationError::GameOver);
        }
        let guess = self.parse(&raw)?;

        self.attempts += 1;
        let hint = match guess.cmp(&self.target) {
            std::cmp::Ordering::Less => Hint::TooLow,
            std::cmp::Ordering::Greater => Hint::TooHigh,
            std::cmp::Ordering::Equal => Hint::Correct,
        };
        self.history.push((guess, hint));
        self.won = hint == Hint::Correct;

        let over = self.is_over();
        let feedback = GuessFeedback {
            guess,
            hint,
            attempts_remaining: self.settings.max_attempts.saturating_sub(self.attempts),
            revealed: (over && !self.won).then_some(self.target),
        };

        if over {
            info!(won = self.won, attempts = self.attempts, "Round over");
            Ok(Step::finished(feedback))
        } else {
            Ok(Step::next(feedback))
        }
    }

    fn score(&self, elapsed_seconds: u64) -> u32 {
        if self.won {
            number_guessing_score(&self.settings, self.attempts, elapsed_seconds)
        } else {
            0
        }
    }

    fn details(&self) -> GameDetails {
        GameDetails::NumberGuessing {
            won: self.won,
            attempts: self.attempts,
            max_attempts: self.settings.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Progress;
    use rand::SeedableRng;

    fn guess(game: &mut NumberGuessing, raw: &str) -> Result<Step<GuessFeedback>, ValidationError> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = PlayContext::new(0, &mut rng);
        game.apply(raw.to_string(), &mut ctx)
    }

    #[test]
    fn test_medium_third_attempt_in_forty_seconds() {
        let settings = GuessSettings::for_difficulty(Difficulty::Medium);
        assert_eq!(number_guessing_score(&settings, 3, 40), 460);
    }

    #[test]
    fn test_hints_point_toward_target() {
        let mut game = NumberGuessing::with_target(Difficulty::Easy, 25);
        assert_eq!(guess(&mut game, "10").unwrap().feedback.hint, Hint::TooLow);
        assert_eq!(guess(&mut game, "40").unwrap().feedback.hint, Hint::TooHigh);

        let step = guess(&mut game, "25").unwrap();
        assert_eq!(step.feedback.hint, Hint::Correct);
        assert_eq!(step.progress, Progress::Finished);
        assert_eq!(game.attempts(), 3);
        assert!(game.is_won());
    }

    #[test]
    fn test_rejected_guesses_do_not_count() {
        let mut game = NumberGuessing::with_target(Difficulty::Medium, 50);
        assert_eq!(
            guess(&mut game, "101"),
            Err(ValidationError::OutOfRange {
                value: 101,
                min: 1,
                max: 100
            })
        );
        assert!(matches!(
            guess(&mut game, "fifty"),
            Err(ValidationError::Malformed(_))
        ));
        assert_eq!(game.attempts(), 0);
    }

    #[test]
    fn test_budget_exhaustion_reveals_target_and_scores_zero() {
        let mut game = NumberGuessing::with_target(Difficulty::Hard, 150);
        for _ in 0..5 {
            assert_eq!(guess(&mut game, "1").unwrap().progress, Progress::Continue);
        }
        let last = guess(&mut game, "2").unwrap();
        assert_eq!(last.progress, Progress::Finished);
        assert_eq!(last.feedback.revealed, Some(150));
        assert_eq!(game.score(10), 0);
        assert_eq!(guess(&mut game, "150"), Err(ValidationError::GameOver));
    }

    #[test]
    fn test_setup_target_within_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let game = NumberGuessing::setup(Difficulty::Hard, &mut rng).unwrap();
            assert!((1..=200).contains(&game.target()));
        }
    }
}
