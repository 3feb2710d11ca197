//! Database repository for score records.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{DbError, NewStoredScore, StoredScore, schema};
use crate::scoring::ScoreRecord;
use crate::store::ScoreQuery;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for score records.
///
/// Opens a fresh connection per call, so it is cheap to clone and safe to
/// move onto blocking worker threads.
#[derive(Debug, Clone)]
pub struct ScoreRepository {
    db_path: String,
}

impl ScoreRepository {
    /// Opens the database at `db_path`, creating it and applying pending
    /// migrations as needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, DbError> {
        let repo = Self {
            db_path: db_path.as_ref().to_string(),
        };
        let mut conn = repo.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migrations failed: {}", e)))?;
        info!(path = %repo.db_path, applied = applied.len(), "Score database ready");
        Ok(repo)
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Inserts one record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the record cannot be encoded or a database error occurs.
    #[instrument(skip(self, record), fields(user_id = %record.user_id(), game_type = %record.game_type(), score = record.score()))]
    pub fn record_score(&self, record: &ScoreRecord) -> Result<StoredScore, DbError> {
        debug!("Recording score");
        let row = NewStoredScore::from_record(record)?;
        let mut conn = self.connection()?;

        let stored = diesel::insert_into(schema::game_scores::table)
            .values(&row)
            .returning(StoredScore::as_returning())
            .get_result(&mut conn)?;

        info!(score_id = stored.id(), "Score recorded");
        Ok(stored)
    }

    /// Loads records matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a row cannot be decoded.
    #[instrument(skip(self))]
    pub fn fetch_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreRecord>, DbError> {
        use schema::game_scores::dsl;

        let mut conn = self.connection()?;
        let mut select: schema::game_scores::BoxedQuery<'_, Sqlite> =
            dsl::game_scores.into_boxed();

        if let Some(game_type) = query.game_type() {
            select = select.filter(dsl::game_type.eq(game_type.to_string()));
        }
        if let Some(user_id) = query.user_id() {
            select = select.filter(dsl::user_id.eq(user_id.clone()));
        }
        if let Some(limit) = query.limit() {
            select = select.limit(i64::try_from(*limit).unwrap_or(i64::MAX));
        }

        let rows = select
            .order((dsl::recorded_at.desc(), dsl::id.desc()))
            .load::<StoredScore>(&mut conn)?;

        let records = rows
            .iter()
            .map(StoredScore::to_record)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "Scores loaded");
        Ok(records)
    }

    /// Loads every record, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a row cannot be decoded.
    pub fn all_scores(&self) -> Result<Vec<ScoreRecord>, DbError> {
        self.fetch_scores(&ScoreQuery::all())
    }
}
