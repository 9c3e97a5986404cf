//! SQLite pool for the record store.
//!
//! [`create_pool`] opens the database, applies the embedded migrations and
//! checks that a connection can be served. Foreign keys are switched on for
//! every connection: nulling a deleted genre or publishing house and dropping
//! the lendings of a deleted book or reader are done by the schema, not by
//! repository code.
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("library.db").max_connections(8)).await?;
//! ```

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Pool settings for one library database
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:<path>` or `sqlite::memory:`
    pub database_url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Also used as SQLite's busy timeout, so writers queue behind a lend in
    /// progress for at most this long
    pub acquire_timeout: Duration,
    pub max_lifetime: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub statement_cache_capacity: usize,
}

impl DatabaseConfig {
    fn with_url(database_url: String) -> Self {
        Self {
            database_url,
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: None,
            idle_timeout: None,
            statement_cache_capacity: 100,
        }
    }

    /// A database file, created on first use
    ///
    /// ```
    /// use core_library::db::DatabaseConfig;
    ///
    /// let config = DatabaseConfig::new("library.db");
    /// assert_eq!(config.database_url, "sqlite:library.db");
    /// ```
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        Self {
            max_lifetime: Some(Duration::from_secs(30 * 60)),
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            ..Self::with_url(format!("sqlite:{}", path.display()))
        }
    }

    /// A private in-memory database
    ///
    /// Connections are never recycled: the data lives only as long as one
    /// connection stays open.
    pub fn in_memory() -> Self {
        Self::with_url(IN_MEMORY_URL.to_string())
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_URL
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Open, migrate and health-check a library database
///
/// # Errors
///
/// `Database` if the file cannot be opened or the health check fails,
/// `Migration` if the schema cannot be brought up to date.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        in_memory = config.is_in_memory(),
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        "Opening library database"
    );

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(LibraryError::Database)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        .busy_timeout(config.acquire_timeout)
        .statement_cache_capacity(config.statement_cache_capacity);

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(database_url = %config.database_url, error = %e, "Cannot open library database");
            LibraryError::Database(e)
        })?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    info!(connections = pool.size(), "Library database ready");
    Ok(pool)
}

/// In-memory pool with the schema applied
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    debug!("Library schema is up to date");
    Ok(())
}

pub async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLES: [&str; 9] = [
        "authors",
        "genres",
        "publishings",
        "books",
        "book_authors",
        "readers",
        "phones",
        "addresses",
        "lendings",
    ];

    #[test]
    fn test_file_and_memory_settings() {
        let file = DatabaseConfig::new("/tmp/library.db")
            .min_connections(2)
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(60))
            .statement_cache_capacity(200);

        assert_eq!(file.database_url, "sqlite:/tmp/library.db");
        assert!(!file.is_in_memory());
        assert_eq!(file.min_connections, 2);
        assert_eq!(file.max_connections, 10);
        assert_eq!(file.acquire_timeout, Duration::from_secs(60));
        assert_eq!(file.statement_cache_capacity, 200);
        assert!(file.idle_timeout.is_some());

        let memory = DatabaseConfig::default();
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_lifetime, None);
        assert_eq!(memory.idle_timeout, None);
    }

    #[tokio::test]
    async fn test_pool_is_migrated_and_healthy() {
        let pool = create_test_pool().await.unwrap();
        health_check(&pool).await.unwrap();

        for table in TABLES {
            let (count,): (i32,) =
                sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                    .bind(table)
                    .fetch_one(&pool)
                    .await
                    .unwrap();

            assert_eq!(count, 1, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.unwrap();

        let (enabled,): (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_schema_rejects_negative_copies() {
        let pool = create_test_pool().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO books (id, title, isbn, year_published, available_copies, variety, created_at, updated_at)
             VALUES ('b', 'Broken', '123', 2000, -1, 'PAPERBACK', 0, 0)",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_directory_fails_to_open() {
        let config = DatabaseConfig::new("/nonexistent-library-dir/nested/library.db");

        let err = create_pool(config).await.unwrap_err();
        assert!(matches!(err, LibraryError::Database(_)));
    }
}
