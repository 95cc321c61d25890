//! SQLite data schema and data field repository implementation.

use captor_core::repository::schema::SchemaRepository;
use captor_types::agent::{DataField, DataSchema, NewDataField, SchemaType};
use captor_types::error::RepositoryError;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_optional_datetime, query_err};

/// SQLite-backed implementation of `SchemaRepository`.
pub struct SqliteSchemaRepository {
    pool: DatabasePool,
}

impl SqliteSchemaRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn row_to_schema(row: &SqliteRow) -> Result<DataSchema, RepositoryError> {
    let schema_type: String = row.try_get("type").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(DataSchema {
        id: row.try_get("id").map_err(query_err)?,
        agent_id: row.try_get("agent_id").map_err(query_err)?,
        schema_type: schema_type.parse().map_err(RepositoryError::Query)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_optional_datetime(row.try_get("updated_at").map_err(query_err)?)?,
        fields: Vec::new(),
    })
}

fn row_to_field(row: &SqliteRow) -> Result<DataField, RepositoryError> {
    let rules: String = row.try_get("validation_rules").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(DataField {
        id: row.try_get("id").map_err(query_err)?,
        schema_id: row.try_get("schema_id").map_err(query_err)?,
        key: row.try_get("key").map_err(query_err)?,
        question: row.try_get("question").map_err(query_err)?,
        data_type: row.try_get("data_type").map_err(query_err)?,
        required: row.try_get("required").map_err(query_err)?,
        validation_rules: parse_rules(&rules)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_optional_datetime(row.try_get("updated_at").map_err(query_err)?)?,
    })
}

fn parse_rules(s: &str) -> Result<Map<String, Value>, RepositoryError> {
    serde_json::from_str(s)
        .map_err(|e| RepositoryError::Query(format!("invalid validation_rules JSON: {e}")))
}

pub(crate) fn encode_rules(rules: &Map<String, Value>) -> Result<String, RepositoryError> {
    serde_json::to_string(rules).map_err(|e| RepositoryError::Query(e.to_string()))
}

impl SchemaRepository for SqliteSchemaRepository {
    async fn get_canonical(&self, agent_id: i64) -> Result<Option<DataSchema>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM agent_data_schemas WHERE agent_id = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(agent_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut schema = row_to_schema(&row)?;

        let rows = sqlx::query("SELECT * FROM agent_data_fields WHERE schema_id = ? ORDER BY id ASC")
            .bind(schema.id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        schema.fields = rows.iter().map(row_to_field).collect::<Result<_, _>>()?;

        Ok(Some(schema))
    }

    async fn update_type(
        &self,
        schema_id: i64,
        schema_type: SchemaType,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE agent_data_schemas SET type = ?, updated_at = ? WHERE id = ?")
                .bind(schema_type.to_string())
                .bind(format_datetime(&Utc::now()))
                .bind(schema_id)
                .execute(&self.pool.writer)
                .await
                .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_field(&self, field_id: i64) -> Result<Option<DataField>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agent_data_fields WHERE id = ?")
            .bind(field_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_field).transpose()
    }

    async fn create_field(
        &self,
        schema_id: i64,
        field: &NewDataField,
    ) -> Result<DataField, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO agent_data_fields (schema_id, key, question, data_type, required, validation_rules, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(schema_id)
        .bind(&field.key)
        .bind(&field.question)
        .bind(&field.data_type)
        .bind(field.required)
        .bind(encode_rules(&field.validation_rules)?)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(DataField {
            id: result.last_insert_rowid(),
            schema_id,
            key: field.key.clone(),
            question: field.question.clone(),
            data_type: field.data_type.clone(),
            required: field.required,
            validation_rules: field.validation_rules.clone(),
            created_at: now,
            updated_at: None,
        })
    }

    async fn update_field(&self, field: &DataField) -> Result<DataField, RepositoryError> {
        let result = sqlx::query(
            "UPDATE agent_data_fields SET key = ?, question = ?, data_type = ?, required = ?, validation_rules = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&field.key)
        .bind(&field.question)
        .bind(&field.data_type)
        .bind(field.required)
        .bind(encode_rules(&field.validation_rules)?)
        .bind(format_datetime(&Utc::now()))
        .bind(field.id)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query("SELECT * FROM agent_data_fields WHERE id = ?")
            .bind(field.id)
            .fetch_one(&self.pool.writer)
            .await
            .map_err(query_err)?;
        row_to_field(&row)
    }
}
