use chrono::{TimeZone, Utc};
use driftwatch_db::{DbError, IngestedFileRecord, LedgerDb, ScoreRecord};

fn stamp(h: u32, m: u32, s: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 7, h, m, s).unwrap()
}

#[tokio::test]
async fn open_creates_schema_and_empty_ledgers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.sqlite3");

    let db = LedgerDb::open(&path).await.unwrap();
    assert!(path.exists());

    assert!(db.read_ingested_files().await.unwrap().is_empty());
    assert!(db.read_score_history().await.unwrap().is_empty());
    db.close().await;
}

#[tokio::test]
async fn open_existing_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.sqlite3");

    let err = LedgerDb::open_existing(&path).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)), "got: {err:?}");
}

#[tokio::test]
async fn replace_ingested_files_is_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let db = LedgerDb::open(dir.path().join("pipeline.sqlite3"))
        .await
        .unwrap();

    let batch1 = vec![
        IngestedFileRecord::new(stamp(10, 0, 0), "data1.csv"),
        IngestedFileRecord::new(stamp(10, 0, 0), "data2.csv"),
    ];
    db.replace_ingested_files(&batch1).await.unwrap();

    let known = db.read_ingested_files().await.unwrap();
    assert_eq!(known.len(), 2);
    assert!(known.contains("data1.csv"));
    assert!(known.contains("data2.csv"));

    // Second batch replaces, never appends
    let batch2 = vec![IngestedFileRecord::new(stamp(11, 0, 0), "data3.csv")];
    db.replace_ingested_files(&batch2).await.unwrap();

    let known = db.read_ingested_files().await.unwrap();
    assert_eq!(known.into_iter().collect::<Vec<_>>(), vec!["data3.csv"]);
    db.close().await;
}

#[tokio::test]
async fn score_history_is_chronological() {
    let dir = tempfile::tempdir().unwrap();
    let db = LedgerDb::open(dir.path().join("pipeline.sqlite3"))
        .await
        .unwrap();

    // Appended out of chronological order on purpose
    db.append_score(&ScoreRecord::new(stamp(12, 0, 0), 0.75))
        .await
        .unwrap();
    db.append_score(&ScoreRecord::new(stamp(9, 0, 0), 0.80))
        .await
        .unwrap();

    let history = db.read_score_history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].score, 0.80);
    assert_eq!(history[1].score, 0.75);
    assert!(history[0].recorded_at < history[1].recorded_at);
    db.close().await;
}

#[tokio::test]
async fn same_second_appends_keep_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let db = LedgerDb::open(dir.path().join("pipeline.sqlite3"))
        .await
        .unwrap();

    let at = stamp(12, 0, 0);
    db.append_score(&ScoreRecord::new(at, 0.80)).await.unwrap();
    db.append_score(&ScoreRecord::new(at, 0.75)).await.unwrap();

    let history = db.read_score_history().await.unwrap();
    assert_eq!(history[0].score, 0.80);
    assert_eq!(history[1].score, 0.75);
    db.close().await;
}

#[tokio::test]
async fn appends_from_a_second_handle_are_visible_after_reopen() {
    // The scoring stage runs as a separate process with its own connection;
    // the controller re-reads through a fresh one and must see the append.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.sqlite3");

    let writer = LedgerDb::open(&path).await.unwrap();
    writer
        .append_score(&ScoreRecord::new(stamp(9, 0, 0), 0.80))
        .await
        .unwrap();
    writer.close().await;

    let reader = LedgerDb::open_existing(&path).await.unwrap();
    let history = reader.read_score_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score, 0.80);
    reader.close().await;
}
