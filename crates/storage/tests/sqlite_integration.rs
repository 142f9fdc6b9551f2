use chrono::Duration;
use storage::repository::{HistoryRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;
use trivia_core::model::{HistoryRecord, HistoryRecordId};
use trivia_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_appends_and_reads_history() {
    let repo = connect("memdb_history_roundtrip").await;
    let now = fixed_now();

    let id = repo
        .append_record(&HistoryRecord::new(70, now))
        .await
        .unwrap();
    let fetched = repo.get_record(id).await.unwrap();
    assert_eq!(fetched.score(), 70);
    assert_eq!(fetched.recorded_at(), now);
}

#[tokio::test]
async fn sqlite_lists_in_append_order_and_latest_first() {
    let repo = connect("memdb_history_order").await;
    let now = fixed_now();

    for (offset, score) in [10_u32, 0, 30].into_iter().enumerate() {
        let at = now + Duration::minutes(i64::try_from(offset).unwrap());
        repo.append_record(&HistoryRecord::new(score, at))
            .await
            .unwrap();
    }

    let all = repo.list_records().await.unwrap();
    assert_eq!(
        all.iter().map(|r| r.record.score()).collect::<Vec<_>>(),
        vec![10, 0, 30]
    );

    let latest = repo.latest_records(2).await.unwrap();
    assert_eq!(
        latest.iter().map(|r| r.record.score()).collect::<Vec<_>>(),
        vec![30, 0]
    );
    assert!(latest[0].id.value() > latest[1].id.value());
}

#[tokio::test]
async fn sqlite_missing_record_is_not_found() {
    let repo = connect("memdb_history_missing").await;
    let err = repo
        .get_record(HistoryRecordId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_history_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.append_record(&HistoryRecord::new(5, fixed_now()))
        .await
        .unwrap();
    assert_eq!(repo.list_records().await.unwrap().len(), 1);
}

#[tokio::test]
async fn storage_sqlite_wires_history() {
    let storage = Storage::sqlite("sqlite:file:memdb_history_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .history
        .append_record(&HistoryRecord::new(15, fixed_now()))
        .await
        .unwrap();
    assert_eq!(storage.history.latest_records(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_creates_missing_database_file() {
    let path = std::env::temp_dir().join(format!(
        "trivia-history-{}-{}.sqlite3",
        std::process::id(),
        fixed_now().timestamp()
    ));
    let _ = std::fs::remove_file(&path);

    let url = format!("sqlite://{}", path.display());
    let storage = Storage::sqlite(&url).await.expect("storage");
    assert!(path.exists());

    storage
        .history
        .append_record(&HistoryRecord::new(40, fixed_now()))
        .await
        .unwrap();
    assert_eq!(storage.history.list_records().await.unwrap().len(), 1);

    drop(storage);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
