//! Difficulty tiers shared by every mini-game.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A named preset controlling puzzle parameters and scoring multipliers.
///
/// Fixed for the lifetime of a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Gentle settings, no score multiplier.
    Easy,
    /// The default tier.
    #[default]
    Medium,
    /// Tight settings, double score.
    Hard,
}

impl Difficulty {
    /// Score multiplier applied by games that scale their final score.
    #[instrument]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.5,
            Self::Hard => 2.0,
        }
    }

    /// Picks one of three per-tier values.
    pub fn pick<T>(self, easy: T, medium: T, hard: T) -> T {
        match self {
            Self::Easy => easy,
            Self::Medium => medium,
            Self::Hard => hard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_trips_through_lowercase_names() {
        assert_eq!(Difficulty::Hard.to_string(), "hard");
        assert_eq!(Difficulty::from_str("easy").unwrap(), Difficulty::Easy);
        assert!(Difficulty::from_str("extreme").is_err());
    }

    #[test]
    fn test_multiplier_grows_with_tier() {
        assert!(Difficulty::Easy.multiplier() < Difficulty::Medium.multiplier());
        assert!(Difficulty::Medium.multiplier() < Difficulty::Hard.multiplier());
    }
}
