//! SQLite user repository implementation.

use captor_core::repository::user::{NewUser, UserRepository};
use captor_types::error::RepositoryError;
use captor_types::user::User;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::debug;

use super::agent::delete_agent_rows;
use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, parse_optional_datetime, query_err};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User, RepositoryError> {
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(User {
        id: row.try_get("id").map_err(query_err)?,
        name: row.try_get("name").map_err(query_err)?,
        email: row.try_get("email").map_err(query_err)?,
        password_hash: row.try_get("password_hash").map_err(query_err)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_optional_datetime(row.try_get("updated_at").map_err(query_err)?)?,
    })
}

fn email_conflict(e: sqlx::Error, email: &str) -> RepositoryError {
    if is_unique_violation(&e) {
        RepositoryError::Conflict(format!("email '{email}' already exists"))
    } else {
        query_err(e)
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| email_conflict(e, &user.email))?;

        Ok(User {
            id: result.last_insert_rowid(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: None,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id ASC LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter().map(row_to_user).collect()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;
        Ok(row.0 as u64)
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE users SET name = ?, email = ?, password_hash = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(format_datetime(&now))
        .bind(user.id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| email_conflict(e, &user.email))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(User {
            updated_at: Some(now),
            ..user.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let agents =
            delete_agent_rows(&mut tx, "SELECT id FROM agents WHERE user_id = ?1", id).await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(query_err)?;
        debug!(user_id = id, agents, "User delete committed");
        Ok(())
    }
}
