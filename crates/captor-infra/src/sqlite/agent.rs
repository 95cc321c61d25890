//! SQLite agent repository implementation.
//!
//! Implements `AgentRepository` from `captor-core` using sqlx with split
//! read/write pools. Creation and cascade deletion each run in a single
//! transaction on the writer.

use captor_core::repository::agent::AgentRepository;
use captor_types::agent::{
    Agent, AgentDetail, DataField, DataSchema, NewAgent, NewDataField, SchemaType,
};
use captor_types::error::RepositoryError;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use tracing::debug;

use super::pool::DatabasePool;
use super::schema::encode_rules;
use super::{
    format_datetime, is_unique_violation, parse_datetime, parse_optional_datetime, query_err,
};

/// SQLite-backed implementation of `AgentRepository`.
pub struct SqliteAgentRepository {
    pool: DatabasePool,
}

impl SqliteAgentRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn row_to_agent(row: &SqliteRow) -> Result<Agent, RepositoryError> {
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(Agent {
        id: row.try_get("id").map_err(query_err)?,
        user_id: row.try_get("user_id").map_err(query_err)?,
        name: row.try_get("name").map_err(query_err)?,
        description: row.try_get("description").map_err(query_err)?,
        system_prompt: row.try_get("system_prompt").map_err(query_err)?,
        user_instructions: row.try_get("user_instructions").map_err(query_err)?,
        webhook_url: row.try_get("webhook_url").map_err(query_err)?,
        chat_url: row.try_get("chat_url").map_err(query_err)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_optional_datetime(row.try_get("updated_at").map_err(query_err)?)?,
    })
}

impl AgentRepository for SqliteAgentRepository {
    async fn create(
        &self,
        agent: &NewAgent,
        schema_type: SchemaType,
        fields: &[NewDataField],
    ) -> Result<AgentDetail, RepositoryError> {
        let now = Utc::now();
        let created_at = format_datetime(&now);

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let agent_id = sqlx::query(
            "INSERT INTO agents (user_id, name, description, system_prompt, user_instructions, webhook_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(agent.user_id)
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(&agent.system_prompt)
        .bind(&agent.user_instructions)
        .bind(&agent.webhook_url)
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?
        .last_insert_rowid();

        let schema_id = sqlx::query(
            "INSERT INTO agent_data_schemas (agent_id, type, created_at) VALUES (?, ?, ?)",
        )
        .bind(agent_id)
        .bind(schema_type.to_string())
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?
        .last_insert_rowid();

        let mut data_fields = Vec::with_capacity(fields.len());
        for field in fields {
            let field_id = sqlx::query(
                "INSERT INTO agent_data_fields (schema_id, key, question, data_type, required, validation_rules, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(schema_id)
            .bind(&field.key)
            .bind(&field.question)
            .bind(&field.data_type)
            .bind(field.required)
            .bind(encode_rules(&field.validation_rules)?)
            .bind(&created_at)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?
            .last_insert_rowid();

            data_fields.push(DataField {
                id: field_id,
                schema_id,
                key: field.key.clone(),
                question: field.question.clone(),
                data_type: field.data_type.clone(),
                required: field.required,
                validation_rules: field.validation_rules.clone(),
                created_at: now,
                updated_at: None,
            });
        }

        tx.commit().await.map_err(query_err)?;

        Ok(AgentDetail {
            agent: Agent {
                id: agent_id,
                user_id: agent.user_id,
                name: agent.name.clone(),
                description: agent.description.clone(),
                system_prompt: agent.system_prompt.clone(),
                user_instructions: agent.user_instructions.clone(),
                webhook_url: agent.webhook_url.clone(),
                chat_url: None,
                created_at: now,
                updated_at: None,
            },
            data_schema: Some(DataSchema {
                id: schema_id,
                agent_id,
                schema_type,
                created_at: now,
                updated_at: None,
                fields: data_fields,
            }),
            chat_sessions: Vec::new(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_agent).transpose()
    }

    async fn get_by_chat_url(&self, chat_url: &str) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE chat_url = ?")
            .bind(chat_url)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_agent).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Agent>, RepositoryError> {
        // LIMIT -1 means no limit in SQLite.
        let rows = sqlx::query(
            "SELECT * FROM agents WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit.unwrap_or(-1))
        .bind(offset.unwrap_or(0))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter().map(row_to_agent).collect()
    }

    async fn count_by_user(&self, user_id: i64) -> Result<u64, RepositoryError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agents WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;
        Ok(row.0 as u64)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agents")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;
        Ok(row.0 as u64)
    }

    async fn update(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE agents SET name = ?, description = ?, system_prompt = ?, user_instructions = ?, webhook_url = ?, chat_url = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(&agent.system_prompt)
        .bind(&agent.user_instructions)
        .bind(&agent.webhook_url)
        .bind(&agent.chat_url)
        .bind(format_datetime(&now))
        .bind(agent.id)
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(RepositoryError::NotFound),
            Ok(_) => Ok(Agent {
                updated_at: Some(now),
                ..agent.clone()
            }),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "chat_url '{}' already exists",
                agent.chat_url.as_deref().unwrap_or_default()
            ))),
            Err(e) => Err(query_err(e)),
        }
    }

    async fn delete_cascade(&self, id: i64) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let deleted = delete_agent_rows(&mut tx, "?1", id).await?;
        if deleted == 0 {
            // Dropping the transaction rolls it back.
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(query_err)?;
        debug!(agent_id = id, "Agent cascade delete committed");
        Ok(())
    }
}

/// Delete the agents selected by `agents` together with everything they own.
///
/// `agents` is an SQL expression yielding agent ids, bound to `?1 = id`.
/// Children go before parents. Returns the number of agent rows removed.
pub(crate) async fn delete_agent_rows(
    conn: &mut SqliteConnection,
    agents: &str,
    id: i64,
) -> Result<u64, RepositoryError> {
    let statements = [
        format!(
            "DELETE FROM collected_data WHERE session_id IN \
             (SELECT id FROM chat_sessions WHERE agent_id IN ({agents}))"
        ),
        format!(
            "DELETE FROM messages WHERE session_id IN \
             (SELECT id FROM chat_sessions WHERE agent_id IN ({agents}))"
        ),
        format!("DELETE FROM chat_sessions WHERE agent_id IN ({agents})"),
        format!("DELETE FROM customers WHERE agent_id IN ({agents})"),
        format!(
            "DELETE FROM agent_data_fields WHERE schema_id IN \
             (SELECT id FROM agent_data_schemas WHERE agent_id IN ({agents}))"
        ),
        format!("DELETE FROM agent_data_schemas WHERE agent_id IN ({agents})"),
    ];
    for sql in &statements {
        sqlx::query(sql)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(query_err)?;
    }

    let result = sqlx::query(&format!("DELETE FROM agents WHERE id IN ({agents})"))
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(query_err)?;
    Ok(result.rows_affected())
}
