//! Database models and their mapping to [`ScoreRecord`].

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use std::str::FromStr;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::difficulty::Difficulty;
use crate::scoring::{GameDetails, ScoreRecord};

/// A stored score row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_scores)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StoredScore {
    id: i32,
    user_id: String,
    game_type: String,
    score: i32,
    difficulty: String,
    duration_seconds: i64,
    details: String,
    recorded_at: NaiveDateTime,
}

impl StoredScore {
    /// Decodes the row back into a [`ScoreRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a column holds a value no record could have
    /// produced.
    #[instrument(skip(self), fields(id = self.id))]
    pub fn to_record(&self) -> Result<ScoreRecord, DbError> {
        let details: GameDetails = serde_json::from_str(&self.details)?;
        if details.game_type().to_string() != self.game_type {
            return Err(DbError::new(format!(
                "Row {} is tagged '{}' but holds {} details",
                self.id,
                self.game_type,
                details.game_type()
            )));
        }
        let difficulty = Difficulty::from_str(&self.difficulty)
            .map_err(|_| DbError::new(format!("Invalid difficulty: '{}'", self.difficulty)))?;
        let score = u32::try_from(self.score)
            .map_err(|_| DbError::new(format!("Negative score in row {}", self.id)))?;
        let duration_seconds = u64::try_from(self.duration_seconds)
            .map_err(|_| DbError::new(format!("Negative duration in row {}", self.id)))?;

        Ok(ScoreRecord::new(
            self.user_id.clone(),
            score,
            difficulty,
            duration_seconds,
            self.recorded_at.and_utc(),
            details,
        ))
    }
}

/// Insertable score row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::game_scores)]
pub struct NewStoredScore {
    user_id: String,
    game_type: String,
    score: i32,
    difficulty: String,
    duration_seconds: i64,
    details: String,
    recorded_at: NaiveDateTime,
}

impl NewStoredScore {
    /// Encodes a record for insertion; details are stored as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the score or duration overflow their columns.
    #[instrument(skip(record), fields(user_id = %record.user_id(), game_type = %record.game_type()))]
    pub fn from_record(record: &ScoreRecord) -> Result<Self, DbError> {
        let score = i32::try_from(*record.score())
            .map_err(|_| DbError::new(format!("Score {} out of range", record.score())))?;
        let duration_seconds = i64::try_from(*record.duration_seconds()).map_err(|_| {
            DbError::new(format!("Duration {} out of range", record.duration_seconds()))
        })?;

        Ok(Self::new(
            record.user_id().clone(),
            record.game_type().to_string(),
            score,
            record.difficulty().to_string(),
            duration_seconds,
            serde_json::to_string(record.details())?,
            record.recorded_at().naive_utc(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_new_row_uses_kebab_case_tags() {
        let record = ScoreRecord::new(
            "ann".to_string(),
            310,
            Difficulty::Hard,
            42,
            Utc::now(),
            GameDetails::WordPuzzle {
                words_completed: 10,
                hints_used: 1,
            },
        );
        let row = NewStoredScore::from_record(&record).unwrap();
        assert_eq!(row.game_type(), "word-puzzle");
        assert_eq!(row.difficulty(), "hard");
        assert!(row.details().contains("\"hints_used\":1"));
    }
}
