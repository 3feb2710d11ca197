//! Multiple-choice trivia with a per-question speed bonus.

use crate::difficulty::Difficulty;
use crate::error::{SessionError, ValidationError};
use crate::scoring::{GameDetails, GameType, clamp_score};
use crate::session::{MiniGame, PlayContext, Step};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// A bundled question: text, category, correct answer, then three wrong ones.
type BankEntry = (&'static str, &'static str, &'static str, [&'static str; 3]);

const EASY_BANK: [BankEntry; 5] = [
    ("What is the capital of France?", "Geography", "Paris", ["London", "Berlin", "Madrid"]),
    ("How many legs does a spider have?", "Science", "8", ["6", "10", "12"]),
    ("What color do you get when you mix red and white?", "Art", "Pink", ["Purple", "Orange", "Yellow"]),
    ("Which planet is known as the Red Planet?", "Science", "Mars", ["Venus", "Jupiter", "Saturn"]),
    ("What is 5 + 7?", "Math", "12", ["10", "14", "15"]),
];

const MEDIUM_BANK: [BankEntry; 5] = [
    ("Who painted the Mona Lisa?", "Art", "Leonardo da Vinci", ["Pablo Picasso", "Vincent van Gogh", "Michelangelo"]),
    ("What is the largest mammal in the world?", "Science", "Blue Whale", ["African Elephant", "Giraffe", "Hippopotamus"]),
    ("In which year did World War II end?", "History", "1945", ["1944", "1946", "1943"]),
    ("What is the chemical symbol for gold?", "Science", "Au", ["Go", "Gd", "Ag"]),
    ("Which Shakespeare play features the character Hamlet?", "Literature", "Hamlet", ["Macbeth", "Romeo and Juliet", "Othello"]),
];

const HARD_BANK: [BankEntry; 5] = [
    ("What is the smallest country in the world?", "Geography", "Vatican City", ["Monaco", "Nauru", "San Marino"]),
    ("Who developed the theory of relativity?", "Science", "Albert Einstein", ["Isaac Newton", "Galileo Galilei", "Stephen Hawking"]),
    ("What is the longest river in the world?", "Geography", "Nile River", ["Amazon River", "Mississippi River", "Yangtze River"]),
    ("In which year was the first iPhone released?", "Technology", "2007", ["2006", "2008", "2009"]),
    ("What is the hardest natural substance on Earth?", "Science", "Diamond", ["Quartz", "Titanium", "Graphite"]),
];

const SPEED_PENALTY_PER_SECOND: f64 = 10.0;

/// Question count, base points and speed bonus for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriviaSettings {
    /// Questions asked, before capping by bank size.
    pub questions: usize,
    /// Points per correct answer.
    pub base_score: u32,
    /// Speed bonus pool per question.
    pub time_bonus: u32,
}

impl TriviaSettings {
    /// Settings for `difficulty`.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            questions: difficulty.pick(5, 7, 10),
            base_score: difficulty.pick(100, 150, 200),
            time_bonus: difficulty.pick(100, 150, 200),
        }
    }
}

/// A question with its answers in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Question text.
    pub text: &'static str,
    /// Category label.
    pub category: &'static str,
    /// Answers as shown.
    pub answers: Vec<&'static str>,
    /// Index of the right answer in `answers`.
    pub correct: usize,
}

impl Question {
    fn from_bank(entry: &BankEntry, rng: &mut StdRng) -> Self {
        let (text, category, right, wrong) = *entry;
        let mut answers: Vec<&'static str> = std::iter::once(right).chain(wrong).collect();
        answers.shuffle(rng);
        let correct = answers.iter().position(|&a| a == right).unwrap_or(0);
        Self {
            text,
            category,
            answers,
            correct,
        }
    }
}

/// An answer and how long it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriviaAnswer {
    /// Chosen answer index.
    pub choice: usize,
    /// Time from question shown to answer.
    pub response_time: Duration,
}

/// Feedback for one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    /// Whether it was right.
    pub correct: bool,
    /// The right answer's text.
    pub correct_answer: &'static str,
    /// Points awarded for this question.
    pub points: f64,
    /// Next question, if any remain.
    pub next: Option<Question>,
}

/// Points for one correct answer.
pub fn answer_points(settings: &TriviaSettings, response_time: Duration) -> f64 {
    let speed =
        (f64::from(settings.time_bonus) - response_time.as_secs_f64() * SPEED_PENALTY_PER_SECOND).max(0.0);
    f64::from(settings.base_score) + speed
}

/// One trivia round.
#[derive(Debug, Clone, PartialEq)]
pub struct Trivia {
    difficulty: Difficulty,
    settings: TriviaSettings,
    questions: Vec<Question>,
    current: usize,
    points: Vec<f64>,
    correct_answers: u32,
}

impl Trivia {
    /// Creates a round over the given questions.
    pub fn with_questions(difficulty: Difficulty, questions: Vec<Question>) -> Self {
        Self {
            difficulty,
            settings: TriviaSettings::for_difficulty(difficulty),
            questions,
            current: 0,
            points: Vec::new(),
            correct_answers: 0,
        }
    }

    /// The question awaiting an answer.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Questions in this round.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Right answers so far.
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }
}

impl MiniGame for Trivia {
    type Input = TriviaAnswer;
    type Feedback = AnswerFeedback;
    const GAME_TYPE: GameType = GameType::Trivia;

    #[instrument(skip(rng))]
    fn setup(difficulty: Difficulty, rng: &mut StdRng) -> Result<Self, SessionError> {
        let settings = TriviaSettings::for_difficulty(difficulty);
        let bank = difficulty.pick(&EASY_BANK, &MEDIUM_BANK, &HARD_BANK);
        let mut order: Vec<&BankEntry> = bank.iter().collect();
        order.shuffle(rng);
        let questions: Vec<Question> = order
            .into_iter()
            .take(settings.questions)
            .map(|entry| Question::from_bank(entry, rng))
            .collect();
        debug!(questions = questions.len(), "Questions drawn");
        Ok(Self::with_questions(difficulty, questions))
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[instrument(skip(self, _ctx), fields(question = self.current + 1))]
    fn apply(
        &mut self,
        answer: TriviaAnswer,
        _ctx: &mut PlayContext<'_>,
    ) -> Result<Step<AnswerFeedback>, ValidationError> {
        let question = self.current_question().ok_or(ValidationError::GameOver)?;
        if answer.choice >= question.answers.len() {
            return Err(ValidationError::OutOfRange {
                value: answer.choice as i64,
                min: 0,
                max: question.answers.len() as i64 - 1,
            });
        }

        let correct = answer.choice == question.correct;
        let correct_answer = question.answers[question.correct];
        let points = if correct {
            answer_points(&self.settings, answer.response_time)
        } else {
            0.0
        };
        if correct {
            self.correct_answers += 1;
        }
        self.points.push(points);
        self.current += 1;

        let feedback = AnswerFeedback {
            correct,
            correct_answer,
            points,
            next: self.current_question().cloned(),
        };
        if feedback.next.is_none() {
            info!(correct = self.correct_answers, "Round over");
            Ok(Step::finished(feedback))
        } else {
            Ok(Step::next(feedback))
        }
    }

    fn score(&self, _elapsed_seconds: u64) -> u32 {
        clamp_score(self.points.iter().sum())
    }

    fn details(&self) -> GameDetails {
        GameDetails::Trivia {
            correct_answers: self.correct_answers,
            questions: self.questions.len() as u32,
        }
    }
}
