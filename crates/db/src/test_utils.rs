//! Throwaway databases for tests.
//!
//! Migrations run once into a template file; each test then gets its own copy.

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::OnceCell;

use crate::models::user::{CreateUser, User, UserRole};

static TEMPLATE_DIR: OnceLock<TempDir> = OnceLock::new();
static TEMPLATE_READY: OnceCell<()> = OnceCell::const_new();

fn template_path() -> std::path::PathBuf {
    TEMPLATE_DIR
        .get_or_init(|| TempDir::new().expect("Failed to create template temp dir"))
        .path()
        .join("template.db")
}

async fn ensure_template_ready() {
    TEMPLATE_READY
        .get_or_init(|| async {
            let path = template_path();
            let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
                .expect("Invalid template database URL")
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Delete);

            let pool = SqlitePoolOptions::new()
                .min_connections(0)
                .max_connections(1)
                .connect_with(options)
                .await
                .expect("Failed to create template pool");

            crate::migrate(&pool)
                .await
                .expect("Failed to run migrations on template");

            // Release the file before it gets copied.
            pool.close().await;
            tracing::debug!("Template database ready at {:?}", path);
        })
        .await;
}

/// Create a migrated database in a fresh temp dir.
///
/// The returned `TempDir` must outlive the pool.
pub async fn create_test_pool() -> (SqlitePool, TempDir) {
    ensure_template_ready().await;

    let temp_dir = TempDir::new().expect("Failed to create test temp dir");
    let db_path = temp_dir.path().join("test.db");
    std::fs::copy(template_path(), &db_path).expect("Failed to copy template database");

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))
        .expect("Invalid test database URL")
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .expect("Failed to create test pool");

    (pool, temp_dir)
}

/// Insert a plain active user with a placeholder password hash.
pub async fn create_test_user(pool: &SqlitePool, username: &str) -> User {
    User::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            role: UserRole::User,
        },
    )
    .await
    .expect("Failed to create test user")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copies_are_migrated_and_isolated() {
        let (pool1, _temp1) = create_test_pool().await;
        let (pool2, _temp2) = create_test_pool().await;

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
             VALUES (x'01', 'first', 'first@example.com', 'x', '2025-01-01', '2025-01-01')",
        )
        .execute(&pool1)
        .await
        .expect("insert into first copy");

        let (in_first,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool1)
            .await
            .unwrap();
        let (in_second,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool2)
            .await
            .unwrap();
        assert_eq!((in_first, in_second), (1, 0));
    }
}
