use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    Error, Executor, Pool, Sqlite,
    migrate::MigrateError,
    sqlite::{
        SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
        SqliteSynchronous,
    },
};
use tracing::info;
use utils::assets::database_path;

pub mod models;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod validation;

// ============================================================================
// Connection Pool Configuration
// ============================================================================

/// SQLite benefits from limited connections due to its single-writer model.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

const DEFAULT_MIN_CONNECTIONS: u32 = 1;

const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connection timeout in seconds (10 minutes).
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Get max connections from environment or use default.
fn get_max_connections() -> u32 {
    std::env::var("MOH_SQLITE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0 && n <= 100)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

/// Pragmas applied to every new pooled connection.
///
/// `synchronous` must come after `mmap_size`, otherwise mmap'ed writes can
/// bypass fsync under heavy write load.
async fn apply_performance_pragmas(conn: &mut SqliteConnection) -> Result<(), Error> {
    conn.execute("PRAGMA temp_store = 2").await?;
    conn.execute("PRAGMA mmap_size = 67108864").await?; // 64MB
    conn.execute("PRAGMA synchronous = NORMAL").await?;
    conn.execute("PRAGMA cache_size = -16000").await?; // 16MB
    Ok(())
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS)))
}

pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Open the database at the default location (`MOH_DATABASE_PATH` or the
    /// asset directory) and apply pending migrations.
    pub async fn new() -> Result<DBService, Error> {
        Self::open(&database_path()).await
    }

    /// Open (creating if missing) the database file at `db_path` and migrate it.
    pub async fn open(db_path: &Path) -> Result<DBService, Error> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        let database_url = format!("sqlite://{}", db_path.to_string_lossy());
        let max_connections = get_max_connections();

        info!(
            path = %db_path.display(),
            max_connections,
            min_connections = DEFAULT_MIN_CONNECTIONS,
            "Initializing SQLite connection pool"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(DEFAULT_MIN_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)))
            .after_connect(|conn, _meta| {
                Box::pin(async move { apply_performance_pragmas(conn).await })
            })
            .connect_with(connect_options(&database_url)?)
            .await?;

        migrate(&pool).await?;
        info!("Database migrations applied");

        Ok(DBService { pool })
    }

    /// Quick connectivity probe used by the health endpoint.
    pub async fn is_ready(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    /// Flush the WAL into the main database file and close every connection.
    pub async fn close(&self) {
        info!("Running final WAL checkpoint...");
        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
        {
            tracing::warn!("Final WAL checkpoint failed (data may still be in WAL): {}", e);
        }
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_file_and_applies_migrations() {
        let temp = tempfile::TempDir::new().unwrap();
        let db_path = temp.path().join("nested").join("mirror.sqlite");

        let db = DBService::open(&db_path).await.expect("open database");

        assert!(db_path.exists());
        assert!(db.is_ready().await);

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('users', 'journal_entries', 'mood_entries', 'conversations', 'messages', 'api_logs')",
        )
        .fetch_one(&db.pool)
        .await
        .unwrap();
        assert_eq!(tables, 6);

        db.close().await;
    }
}
