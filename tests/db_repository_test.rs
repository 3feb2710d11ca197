//! Tests for database repository operations.

use chrono::{Duration, TimeZone, Utc};
use tempfile::NamedTempFile;

use brain_break::{
    Difficulty, GameDetails, GameOutcome, GameType, LeaderboardMetric, ScoreQuery,
    ScoreRecord, ScoreRepository, ScoreService, ScoreStore,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
fn setup_test_db() -> (NamedTempFile, ScoreRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repo = ScoreRepository::open(db_path).expect("Failed to open repository");
    (db_file, repo)
}

fn record(user: &str, score: u32, details: GameDetails, minutes: i64) -> ScoreRecord {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    ScoreRecord::new(
        user.to_string(),
        score,
        Difficulty::Medium,
        45,
        base + Duration::minutes(minutes),
        details,
    )
}

fn tictactoe(outcome: GameOutcome) -> GameDetails {
    GameDetails::TicTacToe { outcome, moves: 7 }
}

#[test]
fn test_record_score_round_trips() {
    let (_db, repo) = setup_test_db();
    let original = record(
        "ann",
        460,
        GameDetails::NumberGuessing {
            won: true,
            attempts: 3,
            max_attempts: 8,
        },
        0,
    );

    let stored = repo.record_score(&original).expect("Insert failed");
    assert!(*stored.id() > 0);
    assert_eq!(stored.game_type(), "number-guessing");
    assert_eq!(stored.difficulty(), "medium");

    let loaded = repo.all_scores().expect("Query failed");
    assert_eq!(loaded, vec![original]);
}

#[test]
fn test_fetch_scores_filters_and_orders_newest_first() {
    let (_db, repo) = setup_test_db();
    repo.record_score(&record("ann", 100, tictactoe(GameOutcome::Draw), 0))
        .unwrap();
    repo.record_score(&record("bob", 300, tictactoe(GameOutcome::Win), 5))
        .unwrap();
    repo.record_score(&record("ann", 1500, GameDetails::Sudoku { hints_used: 1 }, 10))
        .unwrap();

    let all = repo.all_scores().unwrap();
    let scores: Vec<u32> = all.iter().map(|r| *r.score()).collect();
    assert_eq!(scores, vec![1500, 300, 100]);

    let ann = repo.fetch_scores(&ScoreQuery::all().for_user("ann")).unwrap();
    assert_eq!(ann.len(), 2);
    assert!(ann.iter().all(|r| r.user_id() == "ann"));

    let games = repo
        .fetch_scores(&ScoreQuery::all().with_game(GameType::TicTacToe).with_limit(1))
        .unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].user_id(), "bob");
}

#[test]
fn test_reopen_keeps_existing_rows() {
    let (db, repo) = setup_test_db();
    repo.record_score(&record("ann", 100, tictactoe(GameOutcome::Draw), 0))
        .unwrap();

    let reopened = ScoreRepository::open(db.path().to_str().unwrap()).expect("Reopen failed");
    assert_eq!(reopened.all_scores().unwrap().len(), 1);
}

#[test]
fn test_open_fails_for_unwritable_path() {
    let result = ScoreRepository::open("/nonexistent-dir/scores.db");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_service_implements_store_and_leaderboard() {
    let (_db, repo) = setup_test_db();
    let service = ScoreService::new(repo);

    service
        .record_score(&record("ann", 200, tictactoe(GameOutcome::Win), 0))
        .await
        .unwrap();
    service
        .record_score(&record("ann", 50, tictactoe(GameOutcome::Draw), 1))
        .await
        .unwrap();
    service
        .record_score(&record("bob", 400, GameDetails::Sudoku { hints_used: 0 }, 2))
        .await
        .unwrap();

    let recent = service
        .fetch_recent_scores(&ScoreQuery::all().with_limit(2))
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].user_id(), "bob");

    let by_score = service
        .leaderboard(LeaderboardMetric::TotalScore, None)
        .await
        .unwrap();
    assert_eq!(by_score[0].user_id(), "bob");
    assert_eq!(*by_score[1].total_score(), 250);

    let by_games = service
        .leaderboard(LeaderboardMetric::GamesPlayed, Some(1))
        .await
        .unwrap();
    assert_eq!(by_games.len(), 1);
    assert_eq!(by_games[0].user_id(), "ann");

    let summary = service.summary("ann").await.unwrap();
    assert_eq!(*summary.games_played(), 2);
    assert_eq!(*summary.best_score(), 200);
    assert_eq!(summary.best_for(GameType::TicTacToe), Some(200));
    assert_eq!(summary.best_for(GameType::Sudoku), None);
}
