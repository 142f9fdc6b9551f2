use chrono::{DateTime, Utc};
use std::sync::Arc;

use storage::repository::{HistoryRepository, HistoryRow};
use trivia_core::model::HistoryRecordId;

use crate::error::HistoryServiceError;

/// Presentation-agnostic list item for a finished score-mode session.
///
/// Timestamps are left unformatted; the presentation layer decides how to
/// show them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryListItem {
    pub id: HistoryRecordId,
    pub score: u32,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryListItem {
    #[must_use]
    pub fn from_row(row: &HistoryRow) -> Self {
        Self {
            id: row.id,
            score: row.record.score(),
            recorded_at: row.record.recorded_at(),
        }
    }
}

/// Read side of the persisted score history.
#[derive(Clone)]
pub struct HistoryService {
    history: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(history: Arc<dyn HistoryRepository>) -> Self {
        Self { history }
    }

    /// Up to `limit` results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` on read failures.
    pub async fn recent(&self, limit: u32) -> Result<Vec<HistoryListItem>, HistoryServiceError> {
        let rows = self.history.latest_records(limit).await?;
        Ok(rows.iter().map(HistoryListItem::from_row).collect())
    }

    /// Highest score ever recorded, if any.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` on read failures.
    pub async fn best_score(&self) -> Result<Option<u32>, HistoryServiceError> {
        let rows = self.history.list_records().await?;
        Ok(rows.iter().map(|row| row.record.score()).max())
    }
}
