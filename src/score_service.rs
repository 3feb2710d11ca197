//! Score persistence and leaderboard business logic.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::db::{DbError, ScoreRepository};
use crate::error::PersistenceError;
use crate::leaderboard::{LeaderboardEntry, LeaderboardMetric, PlayerSummary, rank, summarize};
use crate::scoring::ScoreRecord;
use crate::store::{ScoreQuery, ScoreStore};

/// Service layer over [`ScoreRepository`].
///
/// Implements [`ScoreStore`] for sessions by running the blocking Diesel
/// calls on tokio's blocking pool, and answers leaderboard queries.
#[derive(Debug, Clone)]
pub struct ScoreService {
    repository: ScoreRepository,
}

impl ScoreService {
    /// Creates a score service backed by the given repository.
    #[instrument(skip(repository), fields(db_path = %repository.db_path()))]
    pub fn new(repository: ScoreRepository) -> Self {
        info!("Creating ScoreService");
        Self { repository }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &ScoreRepository {
        &self.repository
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(ScoreRepository) -> Result<T, DbError> + Send + 'static,
    {
        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || op(repository))
            .await
            .map_err(|e| PersistenceError::new(format!("Database task failed: {}", e)))?
            .map_err(PersistenceError::from)
    }

    /// Ranks every player by `metric`, keeping the top `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the scores cannot be read.
    #[instrument(skip(self))]
    pub async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, PersistenceError> {
        let records = self.blocking(|repo| repo.all_scores()).await?;
        let mut entries = rank(&records, metric);
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        debug!(entries = entries.len(), "Leaderboard built");
        Ok(entries)
    }

    /// Summarises one player's history.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the scores cannot be read.
    #[instrument(skip(self))]
    pub async fn summary(&self, user_id: &str) -> Result<PlayerSummary, PersistenceError> {
        let query = ScoreQuery::all().for_user(user_id);
        let records = self.blocking(move |repo| repo.fetch_scores(&query)).await?;
        Ok(summarize(user_id, &records))
    }
}

#[async_trait]
impl ScoreStore for ScoreService {
    #[instrument(skip(self, record), fields(user_id = %record.user_id(), game_type = %record.game_type()))]
    async fn record_score(&self, record: &ScoreRecord) -> Result<(), PersistenceError> {
        let record = record.clone();
        let stored = self.blocking(move |repo| repo.record_score(&record)).await?;
        debug!(score_id = stored.id(), "Score persisted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_recent_scores(
        &self,
        query: &ScoreQuery,
    ) -> Result<Vec<ScoreRecord>, PersistenceError> {
        let query = query.clone();
        self.blocking(move |repo| repo.fetch_scores(&query)).await
    }
}
