//! The mini-games, each a [`MiniGame`](crate::MiniGame) payload.

pub mod memory;
pub mod number_guessing;
pub mod reaction;
pub mod sudoku;
pub mod tictactoe;
pub mod trivia;
pub mod word_puzzle;

pub use memory::MemoryMatch;
pub use number_guessing::NumberGuessing;
pub use reaction::ReactionTest;
pub use sudoku::Sudoku;
pub use tictactoe::TicTacToe;
pub use trivia::Trivia;
pub use word_puzzle::WordPuzzle;
