//! Memory match: flip cards two at a time to find every pair.

use crate::difficulty::Difficulty;
use crate::error::{SessionError, ValidationError};
use crate::scoring::{GameDetails, GameType, bonus, clamp_score};
use crate::session::{MiniGame, PlayContext, Step};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

const SYMBOLS: [&str; 24] = [
    "🎯", "🎨", "🎭", "🎪", "🎸", "🎺", "🎻", "🎹", "🎲", "🎳", "🏆", "🏅", "⚽", "🏀", "🏈", "⚾",
    "🎾", "🏐", "🏓", "🏸", "🥊", "🎿", "⛷️", "🏂",
];

const POINTS_PER_MATCH: i64 = 100;
const TIME_PENALTY_PER_SECOND: i64 = 10;
const EXTRA_MOVE_PENALTY: i64 = 5;

/// Number of pairs on the table for a tier.
pub fn pairs_for(difficulty: Difficulty) -> usize {
    difficulty.pick(6, 8, 12)
}

/// Time bonus pool for a tier.
pub fn time_bonus_for(difficulty: Difficulty) -> i64 {
    difficulty.pick(1000, 1500, 2000)
}

/// A card on the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Face symbol; two cards share each symbol.
    pub symbol: &'static str,
    /// Found as part of a pair.
    pub matched: bool,
}

/// What a flip revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipFeedback {
    /// First card of a move is face up.
    FirstCard {
        /// Card index.
        index: usize,
        /// Its symbol.
        symbol: &'static str,
    },
    /// The two face-up cards match and stay up.
    Match {
        /// Indices of the pair.
        pair: (usize, usize),
        /// Shared symbol.
        symbol: &'static str,
    },
    /// The two face-up cards differ and turn back over.
    Mismatch {
        /// Indices flipped.
        pair: (usize, usize),
        /// Symbols seen, in flip order.
        symbols: (&'static str, &'static str),
    },
}

/// One memory-match table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMatch {
    difficulty: Difficulty,
    cards: Vec<Card>,
    face_up: Option<usize>,
    moves: u32,
    matches: u32,
}

impl MemoryMatch {
    /// Lays out the given symbols in order, two cards each.
    pub fn from_symbols(difficulty: Difficulty, symbols: &[&'static str]) -> Self {
        let cards = symbols
            .iter()
            .map(|&symbol| Card {
                symbol,
                matched: false,
            })
            .collect();
        Self {
            difficulty,
            cards,
            face_up: None,
            moves: 0,
            matches: 0,
        }
    }

    /// Cards in table order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Pair flips made.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Pairs found.
    pub fn matches(&self) -> u32 {
        self.matches
    }

    /// Total pairs on the table.
    pub fn pairs(&self) -> u32 {
        (self.cards.len() / 2) as u32
    }

    /// Index of the card waiting for its partner.
    pub fn face_up(&self) -> Option<usize> {
        self.face_up
    }
}

/// Score from matches, flips and elapsed time.
///
/// Flips beyond two per match cost points; the time bonus drains ten points
/// a second.
pub fn memory_score(difficulty: Difficulty, matches: u32, moves: u32, elapsed_seconds: u64) -> u32 {
    let matches = i64::from(matches);
    let spent = i64::try_from(elapsed_seconds)
        .unwrap_or(i64::MAX / TIME_PENALTY_PER_SECOND)
        .saturating_mul(TIME_PENALTY_PER_SECOND);
    let extra_moves = (i64::from(moves) - matches * 2).max(0);
    let raw = matches * POINTS_PER_MATCH + bonus(time_bonus_for(difficulty), spent)
        - extra_moves * EXTRA_MOVE_PENALTY;
    clamp_score(raw as f64 * difficulty.multiplier())
}

impl MiniGame for MemoryMatch {
    type Input = usize;
    type Feedback = FlipFeedback;
    const GAME_TYPE: GameType = GameType::Memory;

    #[instrument(skip(rng))]
    fn setup(difficulty: Difficulty, rng: &mut StdRng) -> Result<Self, SessionError> {
        let pairs = pairs_for(difficulty);
        let mut symbols: Vec<&'static str> = SYMBOLS[..pairs]
            .iter()
            .chain(SYMBOLS[..pairs].iter())
            .copied()
            .collect();
        symbols.shuffle(rng);
        debug!(pairs, "Cards dealt");
        Ok(Self::from_symbols(difficulty, &symbols))
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[instrument(skip(self, _ctx), fields(moves = self.moves, matches = self.matches))]
    fn apply(
        &mut self,
        index: usize,
        _ctx: &mut PlayContext<'_>,
    ) -> Result<Step<FlipFeedback>, ValidationError> {
        if self.matches == self.pairs() {
            return Err(ValidationError::GameOver);
        }
        let card = self.cards.get(index).ok_or(ValidationError::OutOfRange {
            value: index as i64,
            min: 0,
            max: self.cards.len() as i64 - 1,
        })?;
        if card.matched || self.face_up == Some(index) {
            return Err(ValidationError::CardUnavailable(index));
        }
        let symbol = card.symbol;

        let Some(first) = self.face_up.take() else {
            self.face_up = Some(index);
            return Ok(Step::next(FlipFeedback::FirstCard { index, symbol }));
        };

        self.moves += 1;
        let first_symbol = self.cards[first].symbol;
        if first_symbol != symbol {
            debug!(first, second = index, "No match");
            return Ok(Step::next(FlipFeedback::Mismatch {
                pair: (first, index),
                symbols: (first_symbol, symbol),
            }));
        }

        self.cards[first].matched = true;
        self.cards[index].matched = true;
        self.matches += 1;
        let feedback = FlipFeedback::Match {
            pair: (first, index),
            symbol,
        };

        if self.matches == self.pairs() {
            info!(moves = self.moves, "All pairs found");
            Ok(Step::finished(feedback))
        } else {
            Ok(Step::next(feedback))
        }
    }

    fn score(&self, elapsed_seconds: u64) -> u32 {
        memory_score(self.difficulty, self.matches, self.moves, elapsed_seconds)
    }

    fn details(&self) -> GameDetails {
        GameDetails::Memory {
            moves: self.moves,
            matches: self.matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Progress;
    use rand::SeedableRng;

    fn flip(game: &mut MemoryMatch, index: usize) -> Result<Step<FlipFeedback>, ValidationError> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = PlayContext::new(0, &mut rng);
        game.apply(index, &mut ctx)
    }

    #[test]
    fn test_setup_deals_each_symbol_twice() {
        let mut rng = StdRng::seed_from_u64(5);
        let game = MemoryMatch::setup(Difficulty::Hard, &mut rng).unwrap();
        assert_eq!(game.cards().len(), 24);
        for card in game.cards() {
            let count = game.cards().iter().filter(|c| c.symbol == card.symbol).count();
            assert_eq!(count, 2);
        }
    }

    #[test]
    fn test_mismatch_then_match_to_completion() {
        let mut game = MemoryMatch::from_symbols(Difficulty::Easy, &["a", "b", "a", "b"]);

        assert!(matches!(
            flip(&mut game, 0).unwrap().feedback,
            FlipFeedback::FirstCard { index: 0, .. }
        ));
        assert_eq!(flip(&mut game, 0), Err(ValidationError::CardUnavailable(0)));
        assert!(matches!(
            flip(&mut game, 1).unwrap().feedback,
            FlipFeedback::Mismatch { pair: (0, 1), .. }
        ));
        assert_eq!(game.moves(), 1);

        flip(&mut game, 0).unwrap();
        assert!(matches!(
            flip(&mut game, 2).unwrap().feedback,
            FlipFeedback::Match { pair: (0, 2), .. }
        ));
        assert_eq!(flip(&mut game, 2), Err(ValidationError::CardUnavailable(2)));

        flip(&mut game, 1).unwrap();
        let last = flip(&mut game, 3).unwrap();
        assert_eq!(last.progress, Progress::Finished);
        assert_eq!((game.moves(), game.matches()), (3, 2));
    }

    #[test]
    fn test_index_past_table_is_out_of_range() {
        let mut game = MemoryMatch::from_symbols(Difficulty::Easy, &["a", "a"]);
        assert!(matches!(
            flip(&mut game, 7),
            Err(ValidationError::OutOfRange { value: 7, .. })
        ));
    }

    #[test]
    fn test_score_formula() {
        // (6*100 + (1000 - 300) - (14 - 12)*5) * 1.0
        assert_eq!(memory_score(Difficulty::Easy, 6, 14, 30), 1290);
        // (8*100 + 0 - 0) * 1.5
        assert_eq!(memory_score(Difficulty::Medium, 8, 16, 500), 1200);
        assert_eq!(memory_score(Difficulty::Easy, 0, 400, 500), 0);
    }
}
