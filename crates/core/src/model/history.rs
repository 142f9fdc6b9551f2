use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Final result of a score-mode session.
///
/// Appended to the history store once per finished session and never
/// modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    score: u32,
    recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    #[must_use]
    pub fn new(score: u32, recorded_at: DateTime<Utc>) -> Self {
        Self { score, recorded_at }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// ISO-8601 timestamp with millisecond precision, e.g. `2023-11-14T22:13:20.000Z`.
    #[must_use]
    pub fn timestamp(&self) -> String {
        self.recorded_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
