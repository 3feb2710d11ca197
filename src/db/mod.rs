//! SQLite persistence for score records.

mod error;
mod models;
mod repository;
mod schema;

pub use error::DbError;
pub use models::{NewStoredScore, StoredScore};
pub use repository::{MIGRATIONS, ScoreRepository};
