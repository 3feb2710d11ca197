//! Brain Break - terminal front end
//!
//! Plays mini-games and reports on the persisted score history.

#![warn(missing_docs)]

mod cli;
mod console;

use anyhow::Result;
use brain_break::{
    AppConfig, MemoryScoreStore, ScoreQuery, ScoreRepository, ScoreService, ScoreStore,
};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    match cli.command {
        Command::Play {
            game,
            difficulty,
            user,
            ephemeral,
        } => {
            let config = match user {
                Some(user) => config.with_user_id(user),
                None => config,
            };
            let store: Arc<dyn ScoreStore> = if ephemeral {
                Arc::new(MemoryScoreStore::new())
            } else {
                Arc::new(open_service(&config)?)
            };
            console::play(game, difficulty, &config, store).await
        }
        Command::Scores { game, user, limit } => {
            let mut query = ScoreQuery::all().with_limit(limit);
            if let Some(game) = game {
                query = query.with_game(game);
            }
            if let Some(user) = user {
                query = query.for_user(user);
            }
            show_scores(&open_service(&config)?, &query).await
        }
        Command::Leaderboard { by, limit } => {
            let entries = open_service(&config)?.leaderboard(by, limit).await?;
            if entries.is_empty() {
                println!("No scores yet.");
            }
            for entry in entries {
                println!(
                    "{:>3}. {:<16} {:>8} pts {:>4} games",
                    entry.rank(),
                    entry.user_id(),
                    entry.total_score(),
                    entry.games_played()
                );
            }
            Ok(())
        }
        Command::Summary { user } => {
            let user = user.unwrap_or_else(|| config.user_id().clone());
            let summary = open_service(&config)?.summary(&user).await?;
            println!(
                "{}: {} games, {} total, best {}, average {:.1}",
                summary.user_id(),
                summary.games_played(),
                summary.total_score(),
                summary.best_score(),
                summary.average_score()
            );
            for (game, best) in summary.best_by_game() {
                println!("  {game:<16} best {best}");
            }
            Ok(())
        }
    }
}

/// Opens the configured SQLite database, applying migrations.
#[instrument(skip(config), fields(db = %config.database_path()))]
fn open_service(config: &AppConfig) -> Result<ScoreService> {
    let repository = ScoreRepository::open(config.database_path())?;
    info!("Score database ready");
    Ok(ScoreService::new(repository))
}

async fn show_scores(service: &ScoreService, query: &ScoreQuery) -> Result<()> {
    let records = service.fetch_recent_scores(query).await?;
    if records.is_empty() {
        println!("No scores yet.");
    }
    for record in records {
        println!(
            "{}  {:<16} {:<16} {:<6} {:>6} pts {:>5} s",
            record.recorded_at().format("%Y-%m-%d %H:%M"),
            record.user_id(),
            record.game_type(),
            record.difficulty(),
            record.score(),
            record.duration_seconds()
        );
    }
    Ok(())
}
