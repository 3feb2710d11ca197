//! The persistence collaborator sessions report completed scores to.

use crate::error::PersistenceError;
use crate::scoring::{GameType, ScoreRecord};
use async_trait::async_trait;
use derive_getters::Getters;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};

/// Filter for reading back recent scores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct ScoreQuery {
    /// Only scores of this game.
    game_type: Option<GameType>,
    /// Only scores of this player.
    user_id: Option<String>,
    /// At most this many records.
    limit: Option<usize>,
}

impl ScoreQuery {
    /// A query matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts the query to one game.
    pub fn with_game(mut self, game_type: GameType) -> Self {
        self.game_type = Some(game_type);
        self
    }

    /// Restricts the query to one player.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Caps the number of records returned.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True if `record` passes the game and user filters.
    pub fn matches(&self, record: &ScoreRecord) -> bool {
        self.game_type.is_none_or(|g| g == record.game_type())
            && self
                .user_id
                .as_deref()
                .is_none_or(|u| u == record.user_id())
    }
}

/// Durable storage for score records.
///
/// Sessions call [`record_score`](ScoreStore::record_score) exactly once per
/// completion; a failure is reported but never undoes the completion.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Stores one completed session's record.
    async fn record_score(&self, record: &ScoreRecord) -> Result<(), PersistenceError>;

    /// Returns matching records, newest first.
    async fn fetch_recent_scores(
        &self,
        query: &ScoreQuery,
    ) -> Result<Vec<ScoreRecord>, PersistenceError>;
}

/// In-process [`ScoreStore`] for tests and `--ephemeral` play.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    records: Arc<Mutex<Vec<ScoreRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryScoreStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copies out everything stored so far, oldest first.
    pub fn records(&self) -> Result<Vec<ScoreRecord>, PersistenceError> {
        self.records
            .lock()
            .map(|records| records.clone())
            .map_err(|e| PersistenceError::new(format!("Score store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    #[instrument(skip(self, record), fields(user_id = %record.user_id(), game_type = %record.game_type(), score = record.score()))]
    async fn record_score(&self, record: &ScoreRecord) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            warn!("Injected write failure");
            return Err(PersistenceError::new("Write rejected by memory store"));
        }

        let mut records = self
            .records
            .lock()
            .map_err(|e| PersistenceError::new(format!("Score store lock poisoned: {}", e)))?;
        records.push(record.clone());
        debug!(count = records.len(), "Score stored in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_recent_scores(
        &self,
        query: &ScoreQuery,
    ) -> Result<Vec<ScoreRecord>, PersistenceError> {
        let records = self.records()?;
        let limit = query.limit().unwrap_or(usize::MAX);
        let mut matching: Vec<ScoreRecord> = records
            .into_iter()
            .rev()
            .filter(|r| query.matches(r))
            .collect();
        matching.sort_by(|a, b| b.recorded_at().cmp(a.recorded_at()));
        matching.truncate(limit);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use crate::scoring::GameDetails;
    use chrono::{Duration, Utc};

    fn record(user: &str, details: GameDetails, minutes_ago: i64) -> ScoreRecord {
        ScoreRecord::new(
            user.to_string(),
            100,
            Difficulty::Easy,
            30,
            Utc::now() - Duration::minutes(minutes_ago),
            details,
        )
    }

    #[tokio::test]
    async fn test_fetch_filters_and_orders_newest_first() {
        let store = MemoryScoreStore::new();
        store
            .record_score(&record("ann", GameDetails::Sudoku { hints_used: 0 }, 10))
            .await
            .unwrap();
        store
            .record_score(&record("ann", GameDetails::Sudoku { hints_used: 1 }, 1))
            .await
            .unwrap();
        store
            .record_score(&record(
                "bob",
                GameDetails::Memory {
                    moves: 12,
                    matches: 6,
                },
                5,
            ))
            .await
            .unwrap();

        let sudoku = store
            .fetch_recent_scores(&ScoreQuery::all().with_game(GameType::Sudoku))
            .await
            .unwrap();
        assert_eq!(sudoku.len(), 2);
        assert_eq!(sudoku[0].details(), &GameDetails::Sudoku { hints_used: 1 });

        let latest = store
            .fetch_recent_scores(&ScoreQuery::all().with_limit(1))
            .await
            .unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].user_id(), "ann");

        let bob = store
            .fetch_recent_scores(&ScoreQuery::all().for_user("bob"))
            .await
            .unwrap();
        assert_eq!(bob.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_rejects_writes() {
        let store = MemoryScoreStore::new();
        store.fail_writes(true);
        let result = store
            .record_score(&record("ann", GameDetails::Sudoku { hints_used: 0 }, 0))
            .await;
        assert!(result.is_err());
        assert!(store.records().unwrap().is_empty());
    }
}
