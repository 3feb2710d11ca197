//! Command-line interface for brain_break.

use brain_break::{Difficulty, GameType, LeaderboardMetric};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Brain Break - quick brain-training games in the terminal
#[derive(Parser, Debug)]
#[command(name = "brain_break")]
#[command(about = "Brain-training mini-games with persistent scores", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults apply if it does not exist)
    #[arg(long, global = true, default_value = "brain_break.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one game in the terminal
    Play {
        /// Game to play
        #[arg(value_enum)]
        game: GameType,

        /// Difficulty tier
        #[arg(short, long, value_enum, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,

        /// Player id (overrides the config)
        #[arg(short, long)]
        user: Option<String>,

        /// Keep the score in memory instead of the database
        #[arg(long)]
        ephemeral: bool,
    },

    /// List recent scores, newest first
    Scores {
        /// Only this game
        #[arg(short, long, value_enum)]
        game: Option<GameType>,

        /// Only this player
        #[arg(short, long)]
        user: Option<String>,

        /// Maximum rows
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Rank every player
    Leaderboard {
        /// Ranking metric
        #[arg(long, value_enum, default_value_t = LeaderboardMetric::TotalScore)]
        by: LeaderboardMetric,

        /// Maximum rows
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Summarise one player's history
    Summary {
        /// Player id (defaults to the configured player)
        #[arg(short, long)]
        user: Option<String>,
    },
}
