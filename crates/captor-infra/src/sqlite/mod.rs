//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod agent;
pub mod chat;
pub mod customer;
pub mod pool;
pub mod schema;
pub mod user;

use captor_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};

/// Parse a stored RFC 3339 timestamp.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn parse_optional_datetime(
    s: Option<String>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    s.as_deref().map(parse_datetime).transpose()
}

/// Fixed-width UTC timestamps so that TEXT ordering matches time ordering.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::pool::DatabasePool;

    pub async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url, 4).await.unwrap()
    }

    /// Insert a user row directly and return its id.
    pub async fn seed_user(pool: &DatabasePool, email: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (name, email, password_hash, created_at) VALUES ('Test', ?, 'x', ?)",
        )
        .bind(email)
        .bind(super::format_datetime(&chrono::Utc::now()))
        .execute(&pool.writer)
        .await
        .unwrap()
        .last_insert_rowid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_round_trip_is_fixed_width() {
        let now = Utc::now();
        let a = format_datetime(&now);
        let b = format_datetime(&(now + chrono::Duration::milliseconds(1)));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(
            parse_datetime(&a).unwrap().timestamp_micros(),
            now.timestamp_micros()
        );
    }
}
