use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound the question provider accepts for a single request.
pub const MAX_BATCH_SIZE: u32 = 50;

pub const DEFAULT_BATCH_SIZE: u32 = 20;
pub const DEFAULT_QUESTION_TIME_SECS: u32 = 60;
pub const REDUCED_QUESTION_TIME_SECS: u32 = 10;
pub const DEFAULT_STARTING_LIVES: u32 = 3;
pub const DEFAULT_REWARD_PER_CORRECT: u32 = 10;
pub const DEFAULT_ANSWER_DISPLAY_DELAY_MS: u64 = 1_000;

/// Which termination rules a session follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Wrong answers and timeouts cost a life; zero lives ends the session.
    #[default]
    Lives,
    /// Correct answers earn points; one wrong answer or a timeout ends the session.
    Score,
}

impl GameMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Lives => "lives",
            GameMode::Score => "score",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lives" => Ok(GameMode::Lives),
            "score" => Ok(GameMode::Score),
            other => Err(SettingsError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("unknown game mode: {0}")]
    UnknownMode(String),

    #[error("batch size must be between 1 and {max}, got {value}")]
    InvalidBatchSize { value: u32, max: u32 },

    #[error("question time must be greater than zero")]
    InvalidQuestionTime,

    #[error("starting lives must be greater than zero")]
    InvalidStartingLives,
}

/// Validated game configuration. One mode per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    mode: GameMode,
    batch_size: u32,
    question_time_secs: u32,
    starting_lives: u32,
    reward_per_correct: u32,
    answer_display_delay: Duration,
}

/// Unvalidated settings, e.g. parsed from flags or environment.
#[derive(Debug, Clone, Default)]
pub struct GameSettingsDraft {
    pub mode: Option<GameMode>,
    pub batch_size: Option<u32>,
    pub question_time_secs: Option<u32>,
    pub reduced_timer: bool,
    pub starting_lives: Option<u32>,
    pub reward_per_correct: Option<u32>,
    pub answer_display_delay_ms: Option<u64>,
}

impl GameSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply defaults and validate.
    ///
    /// An explicit `question_time_secs` wins over `reduced_timer`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` when a value is out of range.
    pub fn validate(self) -> Result<GameSettings, SettingsError> {
        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            return Err(SettingsError::InvalidBatchSize {
                value: batch_size,
                max: MAX_BATCH_SIZE,
            });
        }

        let question_time_secs = self.question_time_secs.unwrap_or(if self.reduced_timer {
            REDUCED_QUESTION_TIME_SECS
        } else {
            DEFAULT_QUESTION_TIME_SECS
        });
        if question_time_secs == 0 {
            return Err(SettingsError::InvalidQuestionTime);
        }

        let starting_lives = self.starting_lives.unwrap_or(DEFAULT_STARTING_LIVES);
        if starting_lives == 0 {
            return Err(SettingsError::InvalidStartingLives);
        }

        Ok(GameSettings {
            mode: self.mode.unwrap_or_default(),
            batch_size,
            question_time_secs,
            starting_lives,
            reward_per_correct: self
                .reward_per_correct
                .unwrap_or(DEFAULT_REWARD_PER_CORRECT),
            answer_display_delay: Duration::from_millis(
                self.answer_display_delay_ms
                    .unwrap_or(DEFAULT_ANSWER_DISPLAY_DELAY_MS),
            ),
        })
    }
}

impl GameSettings {
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    #[must_use]
    pub fn question_time_secs(&self) -> u32 {
        self.question_time_secs
    }

    #[must_use]
    pub fn starting_lives(&self) -> u32 {
        self.starting_lives
    }

    #[must_use]
    pub fn reward_per_correct(&self) -> u32 {
        self.reward_per_correct
    }

    #[must_use]
    pub fn answer_display_delay(&self) -> Duration {
        self.answer_display_delay
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::Lives,
            batch_size: DEFAULT_BATCH_SIZE,
            question_time_secs: DEFAULT_QUESTION_TIME_SECS,
            starting_lives: DEFAULT_STARTING_LIVES,
            reward_per_correct: DEFAULT_REWARD_PER_CORRECT,
            answer_display_delay: Duration::from_millis(DEFAULT_ANSWER_DISPLAY_DELAY_MS),
        }
    }
}
