use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use trivia_core::model::{HistoryRecord, HistoryRecordId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted history record together with its storage id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: HistoryRecordId,
    pub record: HistoryRecord,
}

impl HistoryRow {
    #[must_use]
    pub fn new(id: HistoryRecordId, record: HistoryRecord) -> Self {
        Self { id, record }
    }
}

/// Append-only store of finished score-mode sessions.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a record and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_record(&self, record: &HistoryRecord)
    -> Result<HistoryRecordId, StorageError>;

    /// Fetch a single record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_record(&self, id: HistoryRecordId) -> Result<HistoryRecord, StorageError>;

    /// All records in append order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_records(&self) -> Result<Vec<HistoryRow>, StorageError>;

    /// Up to `limit` records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn latest_records(&self, limit: u32) -> Result<Vec<HistoryRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    history: Arc<Mutex<Vec<HistoryRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn row_id(index: usize) -> Result<HistoryRecordId, StorageError> {
    i64::try_from(index + 1)
        .map(HistoryRecordId::new)
        .map_err(|_| StorageError::Serialization("history id overflow".into()))
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append_record(
        &self,
        record: &HistoryRecord,
    ) -> Result<HistoryRecordId, StorageError> {
        let mut guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(*record);
        row_id(guard.len() - 1)
    }

    async fn get_record(&self, id: HistoryRecordId) -> Result<HistoryRecord, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        id.value()
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| guard.get(index).copied())
            .ok_or(StorageError::NotFound)
    }

    async fn list_records(&self) -> Result<Vec<HistoryRow>, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .enumerate()
            .map(|(index, record)| Ok(HistoryRow::new(row_id(index)?, *record)))
            .collect()
    }

    async fn latest_records(&self, limit: u32) -> Result<Vec<HistoryRow>, StorageError> {
        let mut rows = self.list_records().await?;
        rows.reverse();
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn HistoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let history: Arc<dyn HistoryRepository> = Arc::new(InMemoryRepository::new());
        Self { history }
    }
}
