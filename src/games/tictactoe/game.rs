//! Tic-tac-toe as a session mini-game: the human plays X, the engine O.

use super::engine::{ENGINE_MARK, PLAYER_MARK, choose_move};
use super::rules::outcome;
use super::{Board, Mark, Outcome, Position};
use crate::difficulty::Difficulty;
use crate::error::{EngineError, SessionError, ValidationError};
use crate::scoring::{GameDetails, GameOutcome, GameType, bonus, clamp_score};
use crate::session::{MiniGame, PlayContext, Step};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Seconds within which a win earns a speed bonus.
const WIN_BONUS_WINDOW: i64 = 60;
/// Points per second left in the bonus window.
const WIN_BONUS_PER_SECOND: i64 = 5;
/// Flat score for a draw.
const DRAW_SCORE: u32 = 50;

/// A mark placed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Who placed it.
    pub mark: Mark,
    /// Where.
    pub position: Position,
}

/// Feedback for one placed mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnFeedback {
    /// The mark just placed.
    pub placed: Move,
    /// Board after the move.
    pub board: Board,
    /// Set once the game is over.
    pub outcome: Option<Outcome>,
}

/// One game of tic-tac-toe against the decision engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicTacToe {
    board: Board,
    difficulty: Difficulty,
    to_move: Mark,
    history: Vec<Move>,
    outcome: Option<Outcome>,
}

impl TicTacToe {
    /// Creates an empty game with the human to move.
    #[instrument]
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            board: Board::new(),
            difficulty,
            to_move: PLAYER_MARK,
            history: Vec::new(),
            outcome: None,
        }
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Moves played so far, in order.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Result, once the game is over.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Result from the human's side, once the game is over.
    pub fn player_outcome(&self) -> Option<GameOutcome> {
        self.outcome.map(|o| match o {
            Outcome::Winner(mark) if mark == PLAYER_MARK => GameOutcome::Win,
            Outcome::Winner(_) => GameOutcome::Loss,
            Outcome::Draw => GameOutcome::Draw,
        })
    }

    fn place(&mut self, position: Position) -> Step<TurnFeedback> {
        let placed = Move {
            mark: self.to_move,
            position,
        };
        self.board = self.board.with(position, placed.mark);
        self.history.push(placed);
        self.outcome = outcome(&self.board);
        self.to_move = placed.mark.opponent();

        debug!(mark = %placed.mark, position = %position, "Mark placed");

        let feedback = TurnFeedback {
            placed,
            board: self.board,
            outcome: self.outcome,
        };
        match (self.outcome, self.to_move) {
            (Some(result), _) => {
                info!(%result, moves = self.history.len(), "Game over");
                Step::finished(feedback)
            }
            (None, ENGINE_MARK) => Step::awaiting(feedback),
            (None, _) => Step::next(feedback),
        }
    }
}

/// Score for a finished game: a base per tier plus a speed bonus for wins.
pub fn tictactoe_score(outcome: GameOutcome, difficulty: Difficulty, elapsed_seconds: u64) -> u32 {
    match outcome {
        GameOutcome::Win => {
            let base = difficulty.pick(100, 200, 300);
            let spent = i64::try_from(elapsed_seconds).unwrap_or(i64::MAX);
            clamp_score((base + bonus(WIN_BONUS_WINDOW, spent) * WIN_BONUS_PER_SECOND) as f64)
        }
        GameOutcome::Draw => DRAW_SCORE,
        GameOutcome::Loss => 0,
    }
}

impl MiniGame for TicTacToe {
    type Input = Position;
    type Feedback = TurnFeedback;
    const GAME_TYPE: GameType = GameType::TicTacToe;

    fn setup(difficulty: Difficulty, _rng: &mut StdRng) -> Result<Self, SessionError> {
        Ok(Self::new(difficulty))
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[instrument(skip(self, _ctx), fields(difficulty = %self.difficulty))]
    fn apply(
        &mut self,
        position: Position,
        _ctx: &mut PlayContext<'_>,
    ) -> Result<Step<TurnFeedback>, ValidationError> {
        if self.outcome.is_some() {
            return Err(ValidationError::GameOver);
        }
        if self.to_move != PLAYER_MARK {
            return Err(ValidationError::AwaitingOpponent);
        }
        if !self.board.is_empty(position) {
            return Err(ValidationError::CellOccupied(position));
        }
        Ok(self.place(position))
    }

    #[instrument(skip(self, ctx), fields(difficulty = %self.difficulty))]
    fn respond(&mut self, ctx: &mut PlayContext<'_>) -> Result<Step<TurnFeedback>, SessionError> {
        if self.outcome.is_some() {
            return Err(EngineError::GameOver.into());
        }
        let position = choose_move(&self.board, self.difficulty, ctx.rng())?;
        Ok(self.place(position))
    }

    fn score(&self, elapsed_seconds: u64) -> u32 {
        self.player_outcome()
            .map(|o| tictactoe_score(o, self.difficulty, elapsed_seconds))
            .unwrap_or(0)
    }

    fn details(&self) -> GameDetails {
        GameDetails::TicTacToe {
            outcome: self.player_outcome().unwrap_or(GameOutcome::Loss),
            moves: self.history.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn play(game: &mut TicTacToe, rng: &mut StdRng, pos: Position) -> Step<TurnFeedback> {
        let mut ctx = PlayContext::new(0, rng);
        game.apply(pos, &mut ctx).unwrap()
    }

    #[test]
    fn test_player_move_hands_turn_to_engine() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = TicTacToe::new(Difficulty::Hard);

        let step = play(&mut game, &mut rng, Position::TopLeft);
        assert_eq!(step.progress, crate::session::Progress::AwaitOpponent);
        assert_eq!(game.to_move(), Mark::O);

        let mut ctx = PlayContext::new(0, &mut rng);
        assert_eq!(
            game.apply(Position::Center, &mut ctx),
            Err(ValidationError::AwaitingOpponent)
        );

        let reply = game.respond(&mut ctx).unwrap();
        assert_eq!(reply.feedback.placed.mark, Mark::O);
        assert_eq!(reply.feedback.placed.position, Position::Center);
        assert_eq!(game.to_move(), Mark::X);
    }

    #[test]
    fn test_occupied_square_leaves_game_unchanged() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = TicTacToe::new(Difficulty::Easy);
        play(&mut game, &mut rng, Position::Center);
        let mut ctx = PlayContext::new(0, &mut rng);
        game.respond(&mut ctx).unwrap();

        let before = game.clone();
        let occupied = game.history()[1].position;
        assert_eq!(
            game.apply(occupied, &mut ctx),
            Err(ValidationError::CellOccupied(occupied))
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_score_by_outcome() {
        assert_eq!(tictactoe_score(GameOutcome::Win, Difficulty::Easy, 10), 100 + 50 * 5);
        assert_eq!(tictactoe_score(GameOutcome::Win, Difficulty::Hard, 90), 300);
        assert_eq!(tictactoe_score(GameOutcome::Draw, Difficulty::Hard, 5), 50);
        assert_eq!(tictactoe_score(GameOutcome::Loss, Difficulty::Easy, 5), 0);
    }

    #[test]
    fn test_hard_engine_never_lets_player_win() {
        let mut rng = StdRng::seed_from_u64(11);
        for opening in [Position::TopLeft, Position::Center, Position::TopCenter] {
            let mut game = TicTacToe::new(Difficulty::Hard);
            let mut next = opening;
            loop {
                let step = play(&mut game, &mut rng, next);
                if step.feedback.outcome.is_some() {
                    break;
                }
                let mut ctx = PlayContext::new(0, &mut rng);
                if game.respond(&mut ctx).unwrap().feedback.outcome.is_some() {
                    break;
                }
                next = game.board().empty_positions()[0];
            }
            assert!(game.outcome().is_some());
            assert_ne!(game.player_outcome(), Some(GameOutcome::Win));
        }
    }
}
