use sqlx::Row;
use trivia_core::model::{HistoryRecord, HistoryRecordId};

use crate::repository::{HistoryRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn score_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid score: {v}")))
}

pub(crate) fn map_history_record(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<HistoryRecord, StorageError> {
    let score = score_from_i64(row.try_get::<i64, _>("score").map_err(ser)?)?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;
    Ok(HistoryRecord::new(score, recorded_at))
}

pub(crate) fn map_history_row(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryRow, StorageError> {
    let id = HistoryRecordId::new(row.try_get::<i64, _>("id").map_err(ser)?);
    Ok(HistoryRow::new(id, map_history_record(row)?))
}
