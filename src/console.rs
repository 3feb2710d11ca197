//! Line-oriented terminal front end that drives game sessions.

use anyhow::{Result, bail};
use brain_break::games::memory::FlipFeedback;
use brain_break::games::number_guessing::GuessFeedback;
use brain_break::games::reaction::{ReactionFeedback, ReactionInput, Rating, signal_delay};
use brain_break::games::sudoku::{SudokuFeedback, SudokuInput};
use brain_break::games::tictactoe::TurnFeedback;
use brain_break::games::trivia::{AnswerFeedback, TriviaAnswer};
use brain_break::games::word_puzzle::{WordFeedback, WordInput};
use brain_break::{
    AppConfig, Completion, Difficulty, GameSession, GameType, MemoryMatch, MiniGame,
    NumberGuessing, PLAYER_MARK, Position, ReactionTest, SaveStatus, ScoreStore, SessionError,
    Sudoku, TicTacToe, Transition, Trivia, WordPuzzle,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// How a game talks to the terminal.
trait ConsoleGame: MiniGame {
    /// Current state plus what to type next.
    fn prompt(&self) -> String;

    /// Turns one line into an input; `shown` is the time since the prompt.
    fn parse(&self, line: &str, shown: Duration) -> Result<Self::Input, String>;

    /// Describes accepted input.
    fn describe(feedback: &Self::Feedback) -> String;
}

/// Plays one game of `game_type` against stdin.
#[instrument(skip(config, store))]
pub async fn play(
    game_type: GameType,
    difficulty: Difficulty,
    config: &AppConfig,
    store: Arc<dyn ScoreStore>,
) -> Result<()> {
    match game_type {
        GameType::TicTacToe => run::<TicTacToe>(difficulty, config, store).await,
        GameType::NumberGuessing => run::<NumberGuessing>(difficulty, config, store).await,
        GameType::Memory => run::<MemoryMatch>(difficulty, config, store).await,
        GameType::WordPuzzle => run::<WordPuzzle>(difficulty, config, store).await,
        GameType::Sudoku => run::<Sudoku>(difficulty, config, store).await,
        GameType::Trivia => run::<Trivia>(difficulty, config, store).await,
        GameType::Reaction => run_reaction(config, store).await,
    }
}

fn new_session<G: MiniGame>(config: &AppConfig, store: Arc<dyn ScoreStore>) -> GameSession<G> {
    match config.seed() {
        Some(seed) => GameSession::seeded(config.user_id().clone(), store, config.session_config(), *seed),
        None => GameSession::new(config.user_id().clone(), store, config.session_config()),
    }
}

async fn run<G: ConsoleGame>(
    difficulty: Difficulty,
    config: &AppConfig,
    store: Arc<dyn ScoreStore>,
) -> Result<()> {
    let mut session = new_session::<G>(config, store);
    session.start(difficulty)?;
    info!(session_id = %session.id(), "Console game started");
    println!("{} ({}). Type 'quit' to give up.\n", G::GAME_TYPE, difficulty);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown_at = show_prompt(&session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    session.reset();
                    return Ok(());
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("quit") {
                    session.reset();
                    println!("Game abandoned.");
                    return Ok(());
                }
                let Some(game) = session.game() else {
                    bail!("session lost its game");
                };
                let input = match game.parse(line, shown_at.elapsed()) {
                    Ok(input) => input,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                match session.submit(input).await {
                    Ok(transition) => {
                        if report::<G>(&transition) {
                            return settle_save(&mut session).await;
                        }
                    }
                    Err(SessionError::Validation(e)) => {
                        println!("{e}");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
                if !session.is_awaiting_opponent() {
                    shown_at = show_prompt(&session);
                }
            }
            event = session.next_event() => {
                if let Some(transition) = event? {
                    if report::<G>(&transition) {
                        return settle_save(&mut session).await;
                    }
                    shown_at = show_prompt(&session);
                }
            }
        }
    }
}

fn show_prompt<G: ConsoleGame>(session: &GameSession<G>) -> Instant {
    if let Some(game) = session.game() {
        println!("{}", game.prompt());
    }
    Instant::now()
}

/// Prints a transition; true once the session is over.
fn report<G: ConsoleGame>(transition: &Transition<G::Feedback>) -> bool {
    match transition {
        Transition::Playing(feedback) => {
            println!("{}", G::describe(feedback));
            false
        }
        Transition::AwaitingOpponent(feedback) => {
            println!("{}\nOpponent is thinking...", G::describe(feedback));
            false
        }
        Transition::Completed {
            feedback,
            completion,
        } => {
            println!("{}", G::describe(feedback));
            report_completion(completion);
            true
        }
    }
}

fn report_completion(completion: &Completion) {
    let record = completion.record();
    println!(
        "\nGame over! Score: {} ({} s, {})",
        record.score(),
        record.duration_seconds(),
        record.difficulty()
    );
    report_save(completion.save());
}

fn report_save(save: &SaveStatus) {
    match save {
        SaveStatus::Saved => println!("Score saved."),
        SaveStatus::Failed(e) => {
            warn!(error = %e, "Score not saved");
            println!("Score could not be saved: {}", e.message);
        }
        SaveStatus::Pending => println!("Saving score..."),
    }
}

/// Waits for a pending save and reports how it went.
async fn settle_save<G: MiniGame>(session: &mut GameSession<G>) -> Result<()> {
    if session
        .completion()
        .is_some_and(|c| *c.save() == SaveStatus::Pending)
    {
        let save = session.await_save().await?;
        report_save(&save);
    }
    Ok(())
}

async fn run_reaction(config: &AppConfig, store: Arc<dyn ScoreStore>) -> Result<()> {
    let mut session = new_session::<ReactionTest>(config, store);
    session.start(Difficulty::Medium)?;
    let mut rng = match config.seed() {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_entropy(),
    };
    println!("Reaction test: press Enter as soon as you see GO! Type 'quit' to give up.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut wait = signal_delay(&mut rng);

    loop {
        println!("Wait for it...");
        let input = tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(l) if !l.trim().eq_ignore_ascii_case("quit") => ReactionInput::TooEarly,
                    _ => {
                        session.reset();
                        return Ok(());
                    }
                }
            }
            _ = tokio::time::sleep(wait) => {
                println!("GO!");
                let shown = Instant::now();
                if lines.next_line().await?.is_none() {
                    session.reset();
                    return Ok(());
                }
                ReactionInput::Click(shown.elapsed())
            }
        };

        let transition = session.submit(input).await?;
        match transition.feedback() {
            ReactionFeedback::Recorded {
                round,
                ms,
                next_signal,
            } => {
                println!("Round {round}: {ms:.0} ms ({})", Rating::for_ms(*ms));
                if let Some(next) = next_signal {
                    wait = *next;
                }
            }
            ReactionFeedback::FalseStart { next_signal } => {
                println!("Too early! Starting over.");
                wait = *next_signal;
            }
        }
        if let Some(completion) = transition.completion() {
            if let Some(stats) = session.game().and_then(ReactionTest::stats) {
                println!(
                    "Average {:.0} ms, best {:.0} ms ({})",
                    stats.average_ms,
                    stats.best_ms,
                    Rating::for_ms(stats.average_ms)
                );
            }
            report_completion(completion);
            return settle_save(&mut session).await;
        }
    }
}

impl ConsoleGame for TicTacToe {
    fn prompt(&self) -> String {
        format!("{}\nYour move (1-9):", self.board())
    }

    fn parse(&self, line: &str, _shown: Duration) -> Result<Position, String> {
        Position::from_label_or_number(line).ok_or_else(|| format!("'{line}' is not a square; use 1-9"))
    }

    fn describe(feedback: &TurnFeedback) -> String {
        let who = if feedback.placed.mark == PLAYER_MARK {
            "You"
        } else {
            "Opponent"
        };
        let mut text = format!("{who} played {}.", feedback.placed.position);
        if let Some(outcome) = feedback.outcome {
            text.push_str(&format!("\n{}\n{outcome}", feedback.board));
        }
        text
    }
}

impl ConsoleGame for NumberGuessing {
    fn prompt(&self) -> String {
        format!(
            "Guess a number from {} to {} ({} attempts left):",
            self.settings().min(),
            self.settings().max(),
            self.settings().max_attempts() - self.attempts()
        )
    }

    fn parse(&self, line: &str, _shown: Duration) -> Result<String, String> {
        Ok(line.to_string())
    }

    fn describe(feedback: &GuessFeedback) -> String {
        match feedback.revealed {
            Some(target) => format!("{} The number was {target}.", feedback.hint),
            None => format!("{}: {}", feedback.guess, feedback.hint),
        }
    }
}

impl ConsoleGame for MemoryMatch {
    fn prompt(&self) -> String {
        let cards: Vec<String> = self
            .cards()
            .iter()
            .enumerate()
            .map(|(i, card)| {
                if card.matched || self.face_up() == Some(i) {
                    format!("{:>3}", card.symbol)
                } else {
                    format!("{i:>3}")
                }
            })
            .collect();
        let rows: Vec<String> = cards.chunks(6).map(|row| row.join(" ")).collect();
        format!(
            "{}\nPairs {}/{}, moves {}. Flip a card:",
            rows.join("\n"),
            self.matches(),
            self.pairs(),
            self.moves()
        )
    }

    fn parse(&self, line: &str, _shown: Duration) -> Result<usize, String> {
        line.parse().map_err(|_| format!("'{line}' is not a card number"))
    }

    fn describe(feedback: &FlipFeedback) -> String {
        match feedback {
            FlipFeedback::FirstCard { index, symbol } => format!("Card {index}: {symbol}"),
            FlipFeedback::Match { symbol, .. } => format!("Match! {symbol} {symbol}"),
            FlipFeedback::Mismatch {
                symbols: (a, b), ..
            } => format!("{a} {b}: no match."),
        }
    }
}

impl ConsoleGame for WordPuzzle {
    fn prompt(&self) -> String {
        format!(
            "Word {}/{}: {}  (guess, 'hint' with {} left, or 'shuffle')",
            self.words_completed() + 1,
            self.words_to_complete(),
            self.scrambled(),
            self.hints_remaining()
        )
    }

    fn parse(&self, line: &str, _shown: Duration) -> Result<WordInput, String> {
        Ok(match line.to_ascii_lowercase().as_str() {
            "hint" => WordInput::Hint,
            "shuffle" => WordInput::Reshuffle,
            _ => WordInput::Guess(line.to_string()),
        })
    }

    fn describe(feedback: &WordFeedback) -> String {
        match feedback {
            WordFeedback::Correct { word, points, .. } => format!("{word}! +{points}"),
            WordFeedback::Incorrect => "Try again!".to_string(),
            WordFeedback::Hint { revealed, .. } => format!("Starts with: {revealed}"),
            WordFeedback::Reshuffled(_) => "Reshuffled.".to_string(),
        }
    }
}

impl ConsoleGame for Sudoku {
    fn prompt(&self) -> String {
        format!(
            "{}\n'row col digit', 'clear row col' or 'hint row col' (1-based, {} hints used):",
            self.grid(),
            self.hints_used()
        )
    }

    fn parse(&self, line: &str, _shown: Duration) -> Result<SudokuInput, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let cell = |r: &str, c: &str| -> Result<(usize, usize), String> {
            let r: usize = r.parse().map_err(|_| format!("bad row '{r}'"))?;
            let c: usize = c.parse().map_err(|_| format!("bad column '{c}'"))?;
            match (r.checked_sub(1), c.checked_sub(1)) {
                (Some(r), Some(c)) => Ok((r, c)),
                _ => Err("rows and columns start at 1".to_string()),
            }
        };
        match words.as_slice() {
            ["clear", r, c] => cell(r, c).map(|(row, col)| SudokuInput::Clear { row, col }),
            ["hint", r, c] => cell(r, c).map(|(row, col)| SudokuInput::Hint { row, col }),
            [r, c, d] => {
                let (row, col) = cell(r, c)?;
                let digit = d.parse().map_err(|_| format!("bad digit '{d}'"))?;
                Ok(SudokuInput::Place { row, col, digit })
            }
            _ => Err("expected three values".to_string()),
        }
    }

    fn describe(feedback: &SudokuFeedback) -> String {
        match feedback {
            SudokuFeedback::Placed { conflict: true, digit } => format!("{digit} conflicts with another cell."),
            SudokuFeedback::Placed { .. } => "Placed.".to_string(),
            SudokuFeedback::Cleared => "Cleared.".to_string(),
            SudokuFeedback::Hinted { digit, remaining } => format!("Hint: {digit} ({remaining} left)"),
        }
    }
}

impl ConsoleGame for Trivia {
    fn prompt(&self) -> String {
        let Some(question) = self.current_question() else {
            return String::new();
        };
        let answers: Vec<String> = question
            .answers
            .iter()
            .enumerate()
            .map(|(i, a)| format!("  {}. {a}", i + 1))
            .collect();
        format!("[{}] {}\n{}", question.category, question.text, answers.join("\n"))
    }

    fn parse(&self, line: &str, shown: Duration) -> Result<TriviaAnswer, String> {
        let number: usize = line.parse().map_err(|_| format!("'{line}' is not an answer number"))?;
        let choice = number.checked_sub(1).ok_or("answers start at 1")?;
        Ok(TriviaAnswer {
            choice,
            response_time: shown,
        })
    }

    fn describe(feedback: &AnswerFeedback) -> String {
        if feedback.correct {
            format!("Correct! +{:.0}", feedback.points)
        } else {
            format!("Incorrect. It was {}.", feedback.correct_answer)
        }
    }
}
