//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use trivia_core::model::QuestionError;

/// Errors emitted while producing questions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("question request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("question provider rejected the request (code {code}): {reason}")]
    ResponseCode { code: u8, reason: &'static str },
    #[error("question provider returned no questions")]
    EmptyBatch,
    #[error("batch amount must be greater than zero")]
    InvalidAmount,
    #[error("malformed question at index {index}: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

/// Errors emitted by `SessionController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already ended")]
    Ended,
    #[error("answer already resolved; waiting for the next question")]
    Locked,
    #[error("no question is currently displayed")]
    NoQuestion,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// True for rejected operations that leave the session untouched.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            SessionError::Ended | SessionError::Locked | SessionError::NoQuestion
        )
    }
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
