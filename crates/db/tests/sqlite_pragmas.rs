//! Connection settings applied by `DBService::open`.

use db::DBService;
use sqlx::Row;
use tempfile::TempDir;

async fn open_temp_db() -> (DBService, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = DBService::open(&temp_dir.path().join("mirror.sqlite"))
        .await
        .expect("Failed to open database");
    (db, temp_dir)
}

#[tokio::test]
async fn journal_mode_is_wal() {
    let (db, _temp_dir) = open_temp_db().await;

    let row = sqlx::query("PRAGMA journal_mode")
        .fetch_one(&db.pool)
        .await
        .expect("Failed to query journal_mode");
    let journal_mode: String = row.get(0);
    assert_eq!(journal_mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn foreign_keys_are_enforced() {
    let (db, _temp_dir) = open_temp_db().await;

    let row = sqlx::query("PRAGMA foreign_keys")
        .fetch_one(&db.pool)
        .await
        .expect("Failed to query foreign_keys");
    let enabled: i32 = row.get(0);
    assert_eq!(enabled, 1);

    let orphan = sqlx::query(
        "INSERT INTO conversations (id, user_id, title, created_at, updated_at)
         VALUES (x'01', x'02', 'orphan', '2025-01-01', '2025-01-01')",
    )
    .execute(&db.pool)
    .await;
    assert!(orphan.is_err(), "conversation without a user must be rejected");
}

#[tokio::test]
async fn pragmas_applied_to_every_connection() {
    let (db, _temp_dir) = open_temp_db().await;

    for i in 0..3 {
        let mut conn = db.pool.acquire().await.expect("Failed to acquire connection");

        let temp_store: i32 = sqlx::query("PRAGMA temp_store")
            .fetch_one(&mut *conn)
            .await
            .expect("Failed to query temp_store")
            .get(0);
        assert_eq!(temp_store, 2, "connection {i} should keep temp tables in memory");

        let synchronous: i32 = sqlx::query("PRAGMA synchronous")
            .fetch_one(&mut *conn)
            .await
            .expect("Failed to query synchronous")
            .get(0);
        assert_eq!(synchronous, 1, "connection {i} should use synchronous = NORMAL");

        let cache_size: i32 = sqlx::query("PRAGMA cache_size")
            .fetch_one(&mut *conn)
            .await
            .expect("Failed to query cache_size")
            .get(0);
        assert_eq!(cache_size, -16000);
    }
}

#[tokio::test]
async fn reopening_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("mirror.sqlite");

    let first = DBService::open(&path).await.unwrap();
    first.close().await;

    let second = DBService::open(&path).await.expect("migrations re-run cleanly");
    assert!(second.is_ready().await);
}
