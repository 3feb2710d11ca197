//! Classic 9x9 sudoku with a backtracking solver behind the hints.

use crate::difficulty::Difficulty;
use crate::error::{SessionError, ValidationError};
use crate::scoring::{GameDetails, GameType, bonus};
use crate::session::{MiniGame, PlayContext, Step};
use rand::rngs::StdRng;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

const EASY_PUZZLE: &str =
    "530070000600195000098000060800060003400803001700020006060000280000419005000080079";
const MEDIUM_PUZZLE: &str =
    "000600400700003600000091080000000000050180003000306045040200060903000000020000100";
const HARD_PUZZLE: &str =
    "000000680000003000700090000500007000000045700000100030001000068008500010090000400";

/// Hints available per puzzle.
pub const HINTS_PER_PUZZLE: u32 = 3;

const MIN_SCORE: i64 = 500;
const TIME_BONUS: i64 = 2000;
const HINT_PENALTY: i64 = 200;

/// A 9x9 grid; `0` marks an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: [[u8; 9]; 9],
}

impl Grid {
    /// An empty grid.
    pub fn empty() -> Self {
        Self { cells: [[0; 9]; 9] }
    }

    /// Digit at `(row, col)`, `0` if empty.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    /// Writes `digit` at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, digit: u8) {
        self.cells[row][col] = digit;
    }

    /// True if every cell holds a digit.
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|&d| d != 0)
    }

    /// True if `digit` could go at `(row, col)` without repeating in its
    /// row, column or box. The cell itself is ignored.
    pub fn is_valid_placement(&self, row: usize, col: usize, digit: u8) -> bool {
        let box_row = row - row % 3;
        let box_col = col - col % 3;
        (0..9).all(|i| {
            (i == col || self.cells[row][i] != digit)
                && (i == row || self.cells[i][col] != digit)
        }) && (0..9).all(|i| {
            let (r, c) = (box_row + i / 3, box_col + i % 3);
            (r, c) == (row, col) || self.cells[r][c] != digit
        })
    }

    /// True if no filled cell conflicts with another.
    pub fn is_consistent(&self) -> bool {
        (0..81).all(|i| {
            let (row, col) = (i / 9, i % 9);
            let digit = self.cells[row][col];
            digit == 0 || self.is_valid_placement(row, col, digit)
        })
    }

    /// True once the grid is full with no conflicts.
    pub fn is_solved(&self) -> bool {
        self.is_full() && self.is_consistent()
    }

    /// Solves by backtracking, trying digits in ascending order.
    ///
    /// Returns `None` if the givens conflict or admit no solution.
    #[instrument(skip(self))]
    pub fn solve(&self) -> Option<Grid> {
        if !self.is_consistent() {
            return None;
        }
        let mut grid = *self;
        if fill(&mut grid) { Some(grid) } else { None }
    }
}

fn fill(grid: &mut Grid) -> bool {
    let Some(i) = (0..81).find(|&i| grid.cells[i / 9][i % 9] == 0) else {
        return true;
    };
    let (row, col) = (i / 9, i % 9);
    for digit in 1..=9 {
        if grid.is_valid_placement(row, col, digit) {
            grid.cells[row][col] = digit;
            if fill(grid) {
                return true;
            }
        }
    }
    grid.cells[row][col] = 0;
    false
}

impl FromStr for Grid {
    type Err = ValidationError;

    /// Parses 81 digits in row-major order, `0` or `.` for empty cells.
    /// Whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Vec<u8> = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '.' => Ok(0),
                c => c
                    .to_digit(10)
                    .map(|d| d as u8)
                    .ok_or_else(|| ValidationError::Malformed(format!("'{}' is not a digit", c))),
            })
            .collect::<Result<_, _>>()?;
        if digits.len() != 81 {
            return Err(ValidationError::Malformed(format!(
                "expected 81 cells, found {}",
                digits.len()
            )));
        }
        let mut grid = Grid::empty();
        for (i, digit) in digits.into_iter().enumerate() {
            grid.cells[i / 9][i % 9] = digit;
        }
        Ok(grid)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.iter().enumerate() {
            if r > 0 && r % 3 == 0 {
                writeln!(f, "------+-------+------")?;
            }
            for (c, &digit) in row.iter().enumerate() {
                if c > 0 && c % 3 == 0 {
                    write!(f, "| ")?;
                }
                match digit {
                    0 => write!(f, ".")?,
                    d => write!(f, "{}", d)?,
                }
                if c < 8 {
                    write!(f, " ")?;
                }
            }
            if r < 8 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Bundled puzzle for a tier.
pub fn puzzle_for(difficulty: Difficulty) -> &'static str {
    difficulty.pick(EASY_PUZZLE, MEDIUM_PUZZLE, HARD_PUZZLE)
}

/// One player action. Rows and columns are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SudokuInput {
    /// Write a digit into an open cell.
    Place {
        /// Row.
        row: usize,
        /// Column.
        col: usize,
        /// Digit 1-9.
        digit: u8,
    },
    /// Empty an open cell.
    Clear {
        /// Row.
        row: usize,
        /// Column.
        col: usize,
    },
    /// Fill an open cell from the solution.
    Hint {
        /// Row.
        row: usize,
        /// Column.
        col: usize,
    },
}

/// Feedback for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SudokuFeedback {
    /// A digit was written.
    Placed {
        /// The digit.
        digit: u8,
        /// It repeats in its row, column or box.
        conflict: bool,
    },
    /// The cell was emptied.
    Cleared,
    /// The solution digit was written.
    Hinted {
        /// The digit.
        digit: u8,
        /// Hints left.
        remaining: u32,
    },
}

/// One sudoku puzzle in play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sudoku {
    difficulty: Difficulty,
    givens: Grid,
    solution: Grid,
    grid: Grid,
    hints_used: u32,
}

impl Sudoku {
    /// Starts `puzzle`, solving it up front for hints.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Setup`] if the puzzle is malformed or unsolvable.
    #[instrument(skip(puzzle))]
    pub fn from_puzzle(difficulty: Difficulty, puzzle: &str) -> Result<Self, SessionError> {
        let givens: Grid = puzzle
            .parse()
            .map_err(|e: ValidationError| SessionError::Setup(e.to_string()))?;
        let solution = givens.solve().ok_or_else(|| {
            warn!("Bundled puzzle has no solution");
            SessionError::Setup("puzzle has no solution".to_string())
        })?;
        debug!(givens = givens.cells.iter().flatten().filter(|&&d| d != 0).count(), "Puzzle solved");
        Ok(Self {
            difficulty,
            givens,
            solution,
            grid: givens,
            hints_used: 0,
        })
    }

    /// Current grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The puzzle's given cells.
    pub fn givens(&self) -> &Grid {
        &self.givens
    }

    /// The solved grid.
    pub fn solution(&self) -> &Grid {
        &self.solution
    }

    /// Hints spent.
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    fn open_cell(&self, row: usize, col: usize) -> Result<(), ValidationError> {
        for value in [row, col] {
            if value > 8 {
                return Err(ValidationError::OutOfRange {
                    value: value as i64,
                    min: 0,
                    max: 8,
                });
            }
        }
        if self.givens.get(row, col) != 0 {
            return Err(ValidationError::GivenCell { row, col });
        }
        Ok(())
    }

    fn settle(&self, feedback: SudokuFeedback) -> Step<SudokuFeedback> {
        if self.grid.is_solved() {
            info!(hints_used = self.hints_used, "Puzzle solved");
            Step::finished(feedback)
        } else {
            Step::next(feedback)
        }
    }
}

/// Score for a solved puzzle, never below 500.
pub fn sudoku_score(difficulty: Difficulty, hints_used: u32, elapsed_seconds: u64) -> u32 {
    let base = difficulty.pick(1000, 1500, 2000);
    let spent = i64::try_from(elapsed_seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(2);
    let raw = base + bonus(TIME_BONUS, spent) - i64::from(hints_used) * HINT_PENALTY;
    raw.max(MIN_SCORE) as u32
}

impl MiniGame for Sudoku {
    type Input = SudokuInput;
    type Feedback = SudokuFeedback;
    const GAME_TYPE: GameType = GameType::Sudoku;

    fn setup(difficulty: Difficulty, _rng: &mut StdRng) -> Result<Self, SessionError> {
        Self::from_puzzle(difficulty, puzzle_for(difficulty))
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[instrument(skip(self, _ctx), fields(hints_used = self.hints_used))]
    fn apply(
        &mut self,
        input: SudokuInput,
        _ctx: &mut PlayContext<'_>,
    ) -> Result<Step<SudokuFeedback>, ValidationError> {
        if self.grid.is_solved() {
            return Err(ValidationError::GameOver);
        }
        match input {
            SudokuInput::Place { row, col, digit } => {
                self.open_cell(row, col)?;
                if !(1..=9).contains(&digit) {
                    return Err(ValidationError::OutOfRange {
                        value: i64::from(digit),
                        min: 1,
                        max: 9,
                    });
                }
                let conflict = !self.grid.is_valid_placement(row, col, digit);
                self.grid.set(row, col, digit);
                Ok(self.settle(SudokuFeedback::Placed { digit, conflict }))
            }
            SudokuInput::Clear { row, col } => {
                self.open_cell(row, col)?;
                self.grid.set(row, col, 0);
                Ok(Step::next(SudokuFeedback::Cleared))
            }
            SudokuInput::Hint { row, col } => {
                self.open_cell(row, col)?;
                if self.hints_used >= HINTS_PER_PUZZLE {
                    return Err(ValidationError::NoHintsRemaining);
                }
                let digit = self.solution.get(row, col);
                self.grid.set(row, col, digit);
                self.hints_used += 1;
                Ok(self.settle(SudokuFeedback::Hinted {
                    digit,
                    remaining: HINTS_PER_PUZZLE - self.hints_used,
                }))
            }
        }
    }

    fn score(&self, elapsed_seconds: u64) -> u32 {
        sudoku_score(self.difficulty, self.hints_used, elapsed_seconds)
    }

    fn details(&self) -> GameDetails {
        GameDetails::Sudoku {
            hints_used: self.hints_used,
        }
    }
}
