use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use services::OpenTriviaConfig;
use trivia_core::model::{GameMode, GameSettings, GameSettingsDraft};

pub const DEFAULT_DB_URL: &str = "sqlite://trivia.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "trivia")]
#[command(about = "Timed multiple-choice trivia in the terminal")]
pub struct Cli {
    /// History database (sqlite URL or file path)
    #[arg(long = "db", env = "TRIVIA_DB_URL", default_value = DEFAULT_DB_URL, global = true)]
    pub db_url: String,

    #[command(flatten)]
    pub play: PlayArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List past score-mode results, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Game mode: lives or score
    #[arg(long, env = "TRIVIA_MODE", default_value = "lives")]
    pub mode: GameMode,

    /// Question endpoint
    #[arg(long, env = "TRIVIA_API_URL")]
    pub api_url: Option<String>,

    /// HTTP timeout for the question endpoint, in seconds
    #[arg(long, env = "TRIVIA_API_TIMEOUT_SECS")]
    pub api_timeout_secs: Option<u64>,

    /// Questions requested per fetch (1-50)
    #[arg(long, env = "TRIVIA_BATCH_SIZE")]
    pub batch_size: Option<u32>,

    /// Use the short per-question timer
    #[arg(long, env = "TRIVIA_REDUCED")]
    pub reduced: bool,

    /// Starting lives in lives mode
    #[arg(long, env = "TRIVIA_LIVES")]
    pub lives: Option<u32>,
}

impl PlayArgs {
    pub fn settings(&self) -> anyhow::Result<GameSettings> {
        GameSettingsDraft {
            mode: Some(self.mode),
            batch_size: self.batch_size,
            reduced_timer: self.reduced,
            starting_lives: self.lives,
            ..GameSettingsDraft::default()
        }
        .validate()
        .context("invalid game settings")
    }

    pub fn api_config(&self) -> OpenTriviaConfig {
        let mut config = OpenTriviaConfig::default();
        if let Some(url) = self.api_url.as_ref().filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(secs) = self.api_timeout_secs.filter(|s| *s > 0) {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the directory that will hold the database file.
pub fn prepare_sqlite_dir(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}
