use trivia_core::model::{HistoryRecord, HistoryRecordId};

use super::SqliteRepository;
use super::mapping::{map_history_record, map_history_row};
use crate::repository::{HistoryRepository, HistoryRow, StorageError};

#[async_trait::async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append_record(
        &self,
        record: &HistoryRecord,
    ) -> Result<HistoryRecordId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO history_records (score, recorded_at)
                VALUES (?1, ?2)
            ",
        )
        .bind(i64::from(record.score()))
        .bind(record.recorded_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(HistoryRecordId::new(res.last_insert_rowid()))
    }

    async fn get_record(&self, id: HistoryRecordId) -> Result<HistoryRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT score, recorded_at
                FROM history_records
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_history_record(&row)
    }

    async fn list_records(&self) -> Result<Vec<HistoryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, score, recorded_at
                FROM history_records
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_history_row).collect()
    }

    async fn latest_records(&self, limit: u32) -> Result<Vec<HistoryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, score, recorded_at
                FROM history_records
                ORDER BY id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_history_row).collect()
    }
}
