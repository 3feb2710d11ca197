//! Word puzzle: unscramble a run of words drawn from a per-tier list.

use crate::difficulty::Difficulty;
use crate::error::{SessionError, ValidationError};
use crate::scoring::{GameDetails, GameType, bonus, clamp_score};
use crate::session::{MiniGame, PlayContext, Step};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

const EASY_WORDS: [&str; 20] = [
    "APPLE", "HOUSE", "WATER", "HAPPY", "MUSIC", "LIGHT", "PEACE", "SMILE", "HEART", "DREAM",
    "BEACH", "CLOUD", "DANCE", "EARTH", "FLAME", "GRACE", "HONEY", "MAGIC", "OCEAN", "PLANT",
];

const MEDIUM_WORDS: [&str; 20] = [
    "RAINBOW", "FREEDOM", "JOURNEY", "MYSTERY", "HARMONY", "COURAGE", "BALANCE", "CRYSTAL",
    "DIAMOND", "ELEPHANT", "FANTASY", "GRAVITY", "HORIZON", "IMAGINE", "JUSTICE", "KINGDOM",
    "LIBRARY", "MACHINE", "NETWORK", "PERFECT",
];

const HARD_WORDS: [&str; 20] = [
    "ADVENTURE", "BEAUTIFUL", "CHALLENGE", "DISCOVERY", "EDUCATION", "FANTASTIC", "GEOGRAPHY",
    "HAPPINESS", "IMPORTANT", "KNOWLEDGE", "LANDSCAPE", "MAGNITUDE", "NECESSARY", "OPERATION",
    "POTENTIAL", "QUESTIONS", "RECOGNIZE", "STRUCTURE", "TECHNIQUE", "WONDERFUL",
];

/// Hints available per game.
pub const HINTS_PER_GAME: u32 = 3;

const MIN_WORD_POINTS: i64 = 50;
const HINT_PENALTY: i64 = 50;

/// Word count, time bonus and base points for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSettings {
    /// Words to unscramble.
    pub words_to_complete: usize,
    /// Time bonus pool.
    pub time_bonus: i64,
    /// Points per word before bonus and penalty.
    pub base_score: i64,
}

impl WordSettings {
    /// Settings for `difficulty`.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            words_to_complete: difficulty.pick(5, 7, 10),
            time_bonus: difficulty.pick(500, 750, 1000),
            base_score: difficulty.pick(100, 150, 200),
        }
    }
}

/// Word list for `difficulty`.
pub fn word_list(difficulty: Difficulty) -> &'static [&'static str] {
    difficulty.pick(&EASY_WORDS[..], &MEDIUM_WORDS[..], &HARD_WORDS[..])
}

/// One player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordInput {
    /// Attempt the current word (case-insensitive).
    Guess(String),
    /// Reveal the next letter of the current word.
    Hint,
    /// Scramble the current word again.
    Reshuffle,
}

/// Feedback for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordFeedback {
    /// The guess was right.
    Correct {
        /// The solved word.
        word: &'static str,
        /// Points awarded for it.
        points: u32,
        /// Scramble of the next word, if any remain.
        next: Option<String>,
    },
    /// The guess was wrong.
    Incorrect,
    /// A letter was revealed.
    Hint {
        /// The revealed letter, `None` once the whole word is shown.
        letter: Option<char>,
        /// Every letter revealed so far.
        revealed: String,
        /// Hints left.
        remaining: u32,
    },
    /// The current word was rescrambled.
    Reshuffled(String),
}

/// One word-puzzle game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPuzzle {
    difficulty: Difficulty,
    settings: WordSettings,
    words: Vec<&'static str>,
    current: usize,
    scrambled: String,
    revealed: usize,
    hints_used: u32,
    word_points: Vec<u32>,
}

impl WordPuzzle {
    /// Creates a game over a fixed word sequence.
    pub fn with_words(difficulty: Difficulty, words: Vec<&'static str>, rng: &mut impl Rng) -> Self {
        let mut settings = WordSettings::for_difficulty(difficulty);
        settings.words_to_complete = settings.words_to_complete.min(words.len());
        let scrambled = words.first().map(|w| scramble(w, rng)).unwrap_or_default();
        Self {
            difficulty,
            settings,
            words,
            current: 0,
            scrambled,
            revealed: 0,
            hints_used: 0,
            word_points: Vec::new(),
        }
    }

    /// The scramble currently shown.
    pub fn scrambled(&self) -> &str {
        &self.scrambled
    }

    /// Words solved so far.
    pub fn words_completed(&self) -> usize {
        self.word_points.len()
    }

    /// Words needed to finish.
    pub fn words_to_complete(&self) -> usize {
        self.settings.words_to_complete
    }

    /// Hints spent.
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Hints left.
    pub fn hints_remaining(&self) -> u32 {
        HINTS_PER_GAME - self.hints_used
    }

    /// Points awarded per solved word.
    pub fn word_points(&self) -> &[u32] {
        &self.word_points
    }

    fn current_word(&self) -> Option<&'static str> {
        (self.words_completed() < self.settings.words_to_complete)
            .then(|| self.words.get(self.current).copied())
            .flatten()
    }
}

fn scramble(word: &str, rng: &mut impl Rng) -> String {
    let mut letters: Vec<char> = word.chars().collect();
    letters.shuffle(rng);
    letters.into_iter().collect()
}

/// Points for one solved word, given session time and hints used so far.
pub fn word_points(settings: &WordSettings, elapsed_seconds: u64, hints_used: u32) -> u32 {
    let spent = i64::try_from(elapsed_seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(10);
    let raw = settings.base_score + bonus(settings.time_bonus, spent)
        - i64::from(hints_used) * HINT_PENALTY;
    clamp_score(raw.max(MIN_WORD_POINTS) as f64)
}

/// Final score: solved-word points plus a slower-draining time bonus, scaled
/// by the tier multiplier.
pub fn word_puzzle_score(difficulty: Difficulty, word_points: &[u32], elapsed_seconds: u64) -> u32 {
    let settings = WordSettings::for_difficulty(difficulty);
    let spent = i64::try_from(elapsed_seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(5);
    let total: i64 = word_points.iter().map(|&p| i64::from(p)).sum();
    clamp_score((total + bonus(settings.time_bonus, spent)) as f64 * difficulty.multiplier())
}

impl MiniGame for WordPuzzle {
    type Input = WordInput;
    type Feedback = WordFeedback;
    const GAME_TYPE: GameType = GameType::WordPuzzle;

    #[instrument(skip(rng))]
    fn setup(difficulty: Difficulty, rng: &mut StdRng) -> Result<Self, SessionError> {
        let count = WordSettings::for_difficulty(difficulty).words_to_complete;
        let words: Vec<&'static str> = word_list(difficulty)
            .choose_multiple(rng, count)
            .copied()
            .collect();
        debug!(words = words.len(), "Words drawn");
        Ok(Self::with_words(difficulty, words, rng))
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[instrument(skip(self, ctx), fields(completed = self.words_completed()))]
    fn apply(
        &mut self,
        input: WordInput,
        ctx: &mut PlayContext<'_>,
    ) -> Result<Step<WordFeedback>, ValidationError> {
        let word = self.current_word().ok_or(ValidationError::GameOver)?;

        match input {
            WordInput::Guess(raw) => {
                let guess = raw.trim().to_uppercase();
                if guess.is_empty() {
                    return Err(ValidationError::EmptyGuess);
                }
                if guess != word {
                    return Ok(Step::next(WordFeedback::Incorrect));
                }

                let points = word_points(&self.settings, ctx.elapsed_seconds(), self.hints_used);
                self.word_points.push(points);
                self.current += 1;
                self.revealed = 0;
                debug!(word, points, "Word solved");

                let next = self.current_word().map(|w| scramble(w, ctx.rng()));
                self.scrambled = next.clone().unwrap_or_default();
                let feedback = WordFeedback::Correct { word, points, next };

                if self.current_word().is_none() {
                    info!(hints_used = self.hints_used, "All words solved");
                    Ok(Step::finished(feedback))
                } else {
                    Ok(Step::next(feedback))
                }
            }
            WordInput::Hint => {
                if self.hints_used >= HINTS_PER_GAME {
                    return Err(ValidationError::NoHintsRemaining);
                }
                self.hints_used += 1;
                let letter = word.chars().nth(self.revealed);
                if letter.is_some() {
                    self.revealed += 1;
                }
                Ok(Step::next(WordFeedback::Hint {
                    letter,
                    revealed: word.chars().take(self.revealed).collect(),
                    remaining: self.hints_remaining(),
                }))
            }
            WordInput::Reshuffle => {
                self.scrambled = scramble(word, ctx.rng());
                Ok(Step::next(WordFeedback::Reshuffled(self.scrambled.clone())))
            }
        }
    }

    fn score(&self, elapsed_seconds: u64) -> u32 {
        word_puzzle_score(self.difficulty, &self.word_points, elapsed_seconds)
    }

    fn details(&self) -> GameDetails {
        GameDetails::WordPuzzle {
            words_completed: self.words_completed() as u32,
            hints_used: self.hints_used,
        }
    }
}
