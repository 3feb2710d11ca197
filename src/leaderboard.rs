//! Leaderboard and per-player aggregation over score records.

use crate::scoring::{GameType, ScoreRecord};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// What the leaderboard is ranked by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LeaderboardMetric {
    /// Sum of all scores.
    #[default]
    TotalScore,
    /// Number of completed sessions.
    GamesPlayed,
}

/// One ranked player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct LeaderboardEntry {
    /// 1-based rank.
    rank: usize,
    /// Player.
    user_id: String,
    /// Sum of all scores.
    total_score: u64,
    /// Completed sessions.
    games_played: usize,
}

/// Ranks every player found in `records` by `metric`, highest first.
///
/// Ties on the metric fall back to the other metric, then to the player id.
#[instrument(skip(records), fields(records = records.len()))]
pub fn rank(records: &[ScoreRecord], metric: LeaderboardMetric) -> Vec<LeaderboardEntry> {
    let mut totals: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(record.user_id().as_str()).or_default();
        entry.0 += u64::from(*record.score());
        entry.1 += 1;
    }

    let mut rows: Vec<(&str, u64, usize)> = totals
        .into_iter()
        .map(|(user, (total, games))| (user, total, games))
        .collect();
    rows.sort_by(|a, b| {
        let by_metric = match metric {
            LeaderboardMetric::TotalScore => b.1.cmp(&a.1).then(b.2.cmp(&a.2)),
            LeaderboardMetric::GamesPlayed => b.2.cmp(&a.2).then(b.1.cmp(&a.1)),
        };
        by_metric.then(a.0.cmp(b.0))
    });

    debug!(players = rows.len(), %metric, "Leaderboard ranked");
    rows.into_iter()
        .enumerate()
        .map(|(i, (user, total, games))| LeaderboardEntry::new(i + 1, user.to_string(), total, games))
        .collect()
}

/// Aggregate statistics for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
pub struct PlayerSummary {
    /// Player.
    user_id: String,
    /// Completed sessions.
    games_played: usize,
    /// Sum of all scores.
    total_score: u64,
    /// Highest single score.
    best_score: u32,
    /// Best score per game played.
    best_by_game: BTreeMap<String, u32>,
}

impl PlayerSummary {
    /// Mean score, `0.0` with no games.
    pub fn average_score(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.total_score as f64 / self.games_played as f64
        }
    }

    /// Best score for `game_type`, if played.
    pub fn best_for(&self, game_type: GameType) -> Option<u32> {
        self.best_by_game.get(&game_type.to_string()).copied()
    }
}

/// Summarises `user_id`'s records; other players' records are ignored.
#[instrument(skip(records), fields(records = records.len()))]
pub fn summarize(user_id: &str, records: &[ScoreRecord]) -> PlayerSummary {
    let mut summary = PlayerSummary {
        user_id: user_id.to_string(),
        games_played: 0,
        total_score: 0,
        best_score: 0,
        best_by_game: BTreeMap::new(),
    };
    for record in records.iter().filter(|r| r.user_id() == user_id) {
        let score = *record.score();
        summary.games_played += 1;
        summary.total_score += u64::from(score);
        summary.best_score = summary.best_score.max(score);
        let best = summary
            .best_by_game
            .entry(record.game_type().to_string())
            .or_insert(0);
        *best = (*best).max(score);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use crate::scoring::GameDetails;
    use chrono::Utc;

    fn record(user: &str, score: u32) -> ScoreRecord {
        ScoreRecord::new(
            user.to_string(),
            score,
            Difficulty::Medium,
            10,
            Utc::now(),
            GameDetails::Sudoku { hints_used: 0 },
        )
    }

    fn records() -> Vec<ScoreRecord> {
        vec![
            record("ann", 100),
            record("bob", 500),
            record("ann", 300),
            record("cat", 50),
            record("cat", 50),
            record("cat", 50),
        ]
    }

    #[test]
    fn test_rank_by_total_score() {
        let board = rank(&records(), LeaderboardMetric::TotalScore);
        let order: Vec<(&str, usize)> = board
            .iter()
            .map(|e| (e.user_id().as_str(), *e.rank()))
            .collect();
        assert_eq!(order, vec![("bob", 1), ("ann", 2), ("cat", 3)]);
        assert_eq!(*board[1].total_score(), 400);
    }

    #[test]
    fn test_rank_by_games_played() {
        let board = rank(&records(), LeaderboardMetric::GamesPlayed);
        assert_eq!(board[0].user_id(), "cat");
        assert_eq!(*board[0].games_played(), 3);
        assert_eq!(board[2].user_id(), "bob");
    }

    #[test]
    fn test_summary_for_one_player() {
        let summary = summarize("ann", &records());
        assert_eq!(*summary.games_played(), 2);
        assert_eq!(*summary.best_score(), 300);
        assert_eq!(summary.average_score(), 200.0);
        assert_eq!(summary.best_for(GameType::Sudoku), Some(300));
        assert_eq!(summary.best_for(GameType::Trivia), None);

        let nobody = summarize("zed", &records());
        assert_eq!(nobody.average_score(), 0.0);
    }
}
