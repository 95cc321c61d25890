//! Split reader/writer SQLite pools.
//!
//! Every write in Captor (agent creation, the delete cascades, appends) goes
//! through the single writer connection, so multi-statement transactions never
//! contend with each other. Reads fan out over a read-only pool sized by
//! `[database] max_readers`.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reader and writer pools over one SQLite database in WAL mode.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    /// Exactly one connection.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open the database, run migrations on the writer, then open
    /// `max_readers` read-only connections (at least one).
    pub async fn new(database_url: &str, max_readers: u32) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts.clone())
            .await?;

        // Readers must not see a half-migrated schema.
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(max_readers.max(1))
            .connect_with(base_opts.read_only(true))
            .await?;

        tracing::debug!(max_readers, "Database pool ready");
        Ok(Self { reader, writer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open(name: &str) -> (DatabasePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join(name);
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        (DatabasePool::new(&url, 2).await.unwrap(), dir)
    }

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let (pool, _dir) = open("test.db").await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        for table in [
            "agent_data_fields",
            "agent_data_schemas",
            "agents",
            "chat_sessions",
            "collected_data",
            "customers",
            "messages",
            "users",
        ] {
            assert!(table_names.contains(&table), "{table} table missing");
        }
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let (pool, _dir) = open("test_wal.db").await;

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_pool_foreign_keys_enforced() {
        let (pool, _dir) = open("test_fk.db").await;

        let err = sqlx::query(
            "INSERT INTO agents (user_id, name, created_at) VALUES (999, 'Orphan', '2025-01-01T00:00:00Z')",
        )
        .execute(&pool.writer)
        .await;

        assert!(err.is_err(), "insert referencing a missing user should fail");
    }

    #[tokio::test]
    async fn test_reader_rejects_writes() {
        let (pool, _dir) = open("test_ro.db").await;

        let err = sqlx::query(
            "INSERT INTO users (name, email, password_hash, created_at) VALUES ('A', 'a@x.com', 'x', '2025-01-01T00:00:00Z')",
        )
        .execute(&pool.reader)
        .await;
        assert!(err.is_err(), "reader connections are read-only");

        let users: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(users.0, 0);
    }
}
