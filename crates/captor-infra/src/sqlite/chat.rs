//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `captor-core` for chat sessions,
//! messages, and collected answers.

use captor_core::chat::repository::{ChatRepository, NewMessage};
use captor_types::chat::{ChatSession, CollectedData, Message};
use captor_types::error::RepositoryError;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_optional_datetime, query_err};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn row_to_session(row: &SqliteRow) -> Result<ChatSession, RepositoryError> {
    let started_at: String = row.try_get("started_at").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(ChatSession {
        id: row.try_get("id").map_err(query_err)?,
        agent_id: row.try_get("agent_id").map_err(query_err)?,
        customer_name: row.try_get("customer_name").map_err(query_err)?,
        customer_email: row.try_get("customer_email").map_err(query_err)?,
        started_at: parse_datetime(&started_at)?,
        ended_at: parse_optional_datetime(row.try_get("ended_at").map_err(query_err)?)?,
        session_closed: row.try_get("session_closed").map_err(query_err)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_optional_datetime(row.try_get("updated_at").map_err(query_err)?)?,
    })
}

fn row_to_message(row: &SqliteRow) -> Result<Message, RepositoryError> {
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(Message {
        id: row.try_get("id").map_err(query_err)?,
        session_id: row.try_get("session_id").map_err(query_err)?,
        sender: row.try_get("sender").map_err(query_err)?,
        receiver: row.try_get("receiver").map_err(query_err)?,
        content: row.try_get("content").map_err(query_err)?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn row_to_collected(row: &SqliteRow) -> Result<CollectedData, RepositoryError> {
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(CollectedData {
        id: row.try_get("id").map_err(query_err)?,
        session_id: row.try_get("session_id").map_err(query_err)?,
        field_id: row.try_get("field_id").map_err(query_err)?,
        answer: row.try_get("answer").map_err(query_err)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl ChatRepository for SqliteChatRepository {
    async fn create_session(
        &self,
        agent_id: i64,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
    ) -> Result<ChatSession, RepositoryError> {
        let now = Utc::now();
        let timestamp = format_datetime(&now);
        let result = sqlx::query(
            "INSERT INTO chat_sessions (agent_id, customer_name, customer_email, started_at, session_closed, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(agent_id)
        .bind(customer_name)
        .bind(customer_email)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(ChatSession {
            id: result.last_insert_rowid(),
            agent_id,
            customer_name: customer_name.map(str::to_string),
            customer_email: customer_email.map(str::to_string),
            started_at: now,
            ended_at: None,
            session_closed: false,
            created_at: now,
            updated_at: None,
        })
    }

    async fn get_session(&self, session_id: i64) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn find_latest_session(
        &self,
        agent_id: i64,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        // IS compares NULL to NULL as equal, unlike =.
        let row = sqlx::query(
            "SELECT * FROM chat_sessions
             WHERE agent_id = ? AND customer_name IS ? AND customer_email IS ?
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(agent_id)
        .bind(customer_name)
        .bind(customer_email)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn list_sessions(&self, agent_id: i64) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE agent_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(agent_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter().map(row_to_session).collect()
    }

    async fn close_session(&self, session_id: i64) -> Result<ChatSession, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = sqlx::query(
            "UPDATE chat_sessions
             SET session_closed = 1, ended_at = COALESCE(ended_at, ?), updated_at = ?
             WHERE id = ?",
        )
        .bind(&now)
        .bind(&now)
        .bind(session_id)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_one(&self.pool.writer)
            .await
            .map_err(query_err)?;
        row_to_session(&row)
    }

    async fn save_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO messages (session_id, sender, receiver, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.session_id)
        .bind(&message.sender)
        .bind(&message.receiver)
        .bind(&message.content)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(Message {
            id: result.last_insert_rowid(),
            session_id: message.session_id,
            sender: message.sender.clone(),
            receiver: message.receiver.clone(),
            content: message.content.clone(),
            created_at: now,
        })
    }

    async fn get_messages(&self, session_id: i64) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter().map(row_to_message).collect()
    }

    async fn save_collected_data(
        &self,
        session_id: i64,
        field_id: i64,
        answer: &str,
    ) -> Result<CollectedData, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO collected_data (session_id, field_id, answer, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(field_id)
        .bind(answer)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(CollectedData {
            id: result.last_insert_rowid(),
            session_id,
            field_id,
            answer: answer.to_string(),
            created_at: now,
        })
    }

    async fn get_collected_data(
        &self,
        session_id: i64,
    ) -> Result<Vec<CollectedData>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM collected_data WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter().map(row_to_collected).collect()
    }

    async fn count_sessions(&self) -> Result<u64, RepositoryError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;
        Ok(row.0 as u64)
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;
        Ok(row.0 as u64)
    }
}
