//! Reaction test: five rounds of waiting for a signal and reacting to it.
//!
//! The front end owns the signal timing; the game receives measured
//! reaction times and false starts.

use crate::difficulty::Difficulty;
use crate::error::{SessionError, ValidationError};
use crate::scoring::{GameDetails, GameType, clamp_score};
use crate::session::{MiniGame, PlayContext, Step};
use rand::Rng;
use rand::rngs::StdRng;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Rounds per test.
pub const ROUNDS: usize = 5;

const SPEED_WINDOW_MS: f64 = 1000.0;
const CONSISTENCY_WINDOW_MS: f64 = 200.0;

/// Random wait before the signal, between one and five seconds.
pub fn signal_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    Duration::from_millis(rng.gen_range(1_000..5_000))
}

/// One player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionInput {
    /// Reacted to the signal after this long.
    Click(Duration),
    /// Reacted before the signal.
    TooEarly,
}

/// Feedback for one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReactionFeedback {
    /// A round was recorded.
    Recorded {
        /// 1-based round number.
        round: usize,
        /// Reaction in milliseconds.
        ms: f64,
        /// Wait before the next signal, if another round follows.
        next_signal: Option<Duration>,
    },
    /// Reacted too early; the rounds start over.
    FalseStart {
        /// Wait before the first signal of the restart.
        next_signal: Duration,
    },
}

/// Qualitative band for an average reaction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Rating {
    /// Under 200 ms.
    Excellent,
    /// Under 250 ms.
    Good,
    /// Under 300 ms.
    Average,
    /// Under 400 ms.
    #[strum(to_string = "Below Average")]
    BelowAverage,
    /// 400 ms or slower.
    Slow,
}

impl Rating {
    /// Rates a reaction time in milliseconds.
    pub fn for_ms(ms: f64) -> Self {
        match ms {
            t if t < 200.0 => Self::Excellent,
            t if t < 250.0 => Self::Good,
            t if t < 300.0 => Self::Average,
            t if t < 400.0 => Self::BelowAverage,
            _ => Self::Slow,
        }
    }
}

/// Mean, best and worst of a set of reaction times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionStats {
    /// Mean in milliseconds.
    pub average_ms: f64,
    /// Fastest in milliseconds.
    pub best_ms: f64,
    /// Slowest in milliseconds.
    pub worst_ms: f64,
}

impl ReactionStats {
    /// Statistics for `times_ms`; `None` if empty.
    pub fn from_times(times_ms: &[f64]) -> Option<Self> {
        if times_ms.is_empty() {
            return None;
        }
        let sum: f64 = times_ms.iter().sum();
        let best_ms = times_ms.iter().copied().fold(f64::INFINITY, f64::min);
        let worst_ms = times_ms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            average_ms: sum / times_ms.len() as f64,
            best_ms,
            worst_ms,
        })
    }

    /// Speed points plus a consistency bonus for a narrow spread.
    pub fn score(&self) -> u32 {
        let speed = (SPEED_WINDOW_MS - self.average_ms).max(0.0);
        let consistency = (CONSISTENCY_WINDOW_MS - (self.worst_ms - self.best_ms)).max(0.0);
        clamp_score(speed + consistency)
    }

    /// Recorded duration: the mean reaction rounded to whole seconds.
    pub fn duration_seconds(&self) -> u64 {
        (self.average_ms / 1000.0).round() as u64
    }
}

/// One reaction test.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReactionTest {
    times_ms: Vec<f64>,
    false_starts: u32,
}

impl ReactionTest {
    /// Creates a test with no rounds played.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reaction times recorded in the current run.
    pub fn times_ms(&self) -> &[f64] {
        &self.times_ms
    }

    /// False starts so far.
    pub fn false_starts(&self) -> u32 {
        self.false_starts
    }

    /// Statistics for the current run.
    pub fn stats(&self) -> Option<ReactionStats> {
        ReactionStats::from_times(&self.times_ms)
    }
}

impl MiniGame for ReactionTest {
    type Input = ReactionInput;
    type Feedback = ReactionFeedback;
    const GAME_TYPE: GameType = GameType::Reaction;
    // Timing comes from the measured reactions.
    const TRACKS_ELAPSED: bool = false;

    fn setup(_difficulty: Difficulty, _rng: &mut StdRng) -> Result<Self, SessionError> {
        Ok(Self::new())
    }

    /// Always `Medium`: the test has a single tier.
    fn difficulty(&self) -> Difficulty {
        Difficulty::Medium
    }

    #[instrument(skip(self, ctx), fields(round = self.times_ms.len() + 1))]
    fn apply(
        &mut self,
        input: ReactionInput,
        ctx: &mut PlayContext<'_>,
    ) -> Result<Step<ReactionFeedback>, ValidationError> {
        if self.times_ms.len() >= ROUNDS {
            return Err(ValidationError::GameOver);
        }
        match input {
            ReactionInput::TooEarly => {
                self.false_starts += 1;
                self.times_ms.clear();
                warn!(false_starts = self.false_starts, "False start");
                Ok(Step::next(ReactionFeedback::FalseStart {
                    next_signal: signal_delay(ctx.rng()),
                }))
            }
            ReactionInput::Click(reaction) => {
                let ms = reaction.as_secs_f64() * 1000.0;
                self.times_ms.push(ms);
                let round = self.times_ms.len();
                if round == ROUNDS {
                    info!(average_ms = self.stats().map(|s| s.average_ms), "All rounds done");
                    Ok(Step::finished(ReactionFeedback::Recorded {
                        round,
                        ms,
                        next_signal: None,
                    }))
                } else {
                    Ok(Step::next(ReactionFeedback::Recorded {
                        round,
                        ms,
                        next_signal: Some(signal_delay(ctx.rng())),
                    }))
                }
            }
        }
    }

    fn score(&self, _elapsed_seconds: u64) -> u32 {
        self.stats().map(|s| s.score()).unwrap_or(0)
    }

    fn details(&self) -> GameDetails {
        let stats = self.stats();
        GameDetails::Reaction {
            average_ms: stats.map(|s| s.average_ms).unwrap_or(0.0),
            best_ms: stats.map(|s| s.best_ms).unwrap_or(0.0),
        }
    }

    fn duration_seconds(&self, _elapsed_seconds: u64) -> u64 {
        self.stats().map(|s| s.duration_seconds()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Progress;
    use rand::SeedableRng;

    fn act(game: &mut ReactionTest, input: ReactionInput) -> Result<Step<ReactionFeedback>, ValidationError> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = PlayContext::new(0, &mut rng);
        game.apply(input, &mut ctx)
    }

    fn click(ms: u64) -> ReactionInput {
        ReactionInput::Click(Duration::from_millis(ms))
    }

    #[test]
    fn test_stats_and_score() {
        let stats = ReactionStats::from_times(&[200.0, 250.0, 300.0, 250.0, 250.0]).unwrap();
        assert_eq!(stats.average_ms, 250.0);
        assert_eq!((stats.best_ms, stats.worst_ms), (200.0, 300.0));
        // (1000 - 250) + (200 - 100)
        assert_eq!(stats.score(), 850);
        assert_eq!(stats.duration_seconds(), 0);
    }

    #[test]
    fn test_slow_and_erratic_scores_zero() {
        let stats = ReactionStats::from_times(&[900.0, 1500.0]).unwrap();
        assert_eq!(stats.score(), 0);
        assert_eq!(stats.duration_seconds(), 1);
    }

    #[test]
    fn test_false_start_restarts_rounds() {
        let mut game = ReactionTest::new();
        act(&mut game, click(210)).unwrap();
        act(&mut game, click(230)).unwrap();
        let step = act(&mut game, ReactionInput::TooEarly).unwrap();
        assert!(matches!(step.feedback, ReactionFeedback::FalseStart { .. }));
        assert!(game.times_ms().is_empty());
        assert_eq!(game.false_starts(), 1);
    }

    #[test]
    fn test_fifth_round_finishes() {
        let mut game = ReactionTest::new();
        for ms in [200, 220, 240, 260] {
            let step = act(&mut game, click(ms)).unwrap();
            assert_eq!(step.progress, Progress::Continue);
            match step.feedback {
                ReactionFeedback::Recorded { next_signal: Some(d), .. } => {
                    assert!(d >= Duration::from_secs(1) && d < Duration::from_secs(5));
                }
                other => panic!("unexpected feedback {other:?}"),
            }
        }
        let last = act(&mut game, click(280)).unwrap();
        assert_eq!(last.progress, Progress::Finished);
        assert_eq!(game.score(99), 760 + 120);
        assert_eq!(game.difficulty(), Difficulty::Medium);
        assert_eq!(act(&mut game, click(1)), Err(ValidationError::GameOver));
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(Rating::for_ms(150.0), Rating::Excellent);
        assert_eq!(Rating::for_ms(399.0), Rating::BelowAverage);
        assert_eq!(Rating::for_ms(400.0), Rating::Slow);
    }
}
