//! SQLite customer repository implementation.

use captor_core::repository::customer::CustomerRepository;
use captor_types::customer::Customer;
use captor_types::error::RepositoryError;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_optional_datetime, query_err};

/// SQLite-backed implementation of `CustomerRepository`.
pub struct SqliteCustomerRepository {
    pool: DatabasePool,
}

impl SqliteCustomerRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &SqliteRow) -> Result<Customer, RepositoryError> {
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(Customer {
        id: row.try_get("id").map_err(query_err)?,
        agent_id: row.try_get("agent_id").map_err(query_err)?,
        name: row.try_get("name").map_err(query_err)?,
        email: row.try_get("email").map_err(query_err)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_optional_datetime(row.try_get("updated_at").map_err(query_err)?)?,
    })
}

impl CustomerRepository for SqliteCustomerRepository {
    async fn create(
        &self,
        agent_id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Customer, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO customers (agent_id, name, email, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(agent_id)
        .bind(name)
        .bind(email)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            agent_id,
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            created_at: now,
            updated_at: None,
        })
    }

    async fn find_by_email(
        &self,
        agent_id: i64,
        email: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM customers WHERE agent_id = ? AND email = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(agent_id)
        .bind(email)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        row.as_ref().map(row_to_customer).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::agent::SqliteAgentRepository;
    use crate::sqlite::test_support::{seed_user, test_pool};
    use captor_core::repository::agent::AgentRepository;
    use captor_types::agent::{NewAgent, SchemaType};

    async fn seed_agent(pool: &DatabasePool, user_id: i64, name: &str) -> i64 {
        SqliteAgentRepository::new(pool.clone())
            .create(
                &NewAgent {
                    user_id,
                    name: name.to_string(),
                    description: None,
                    system_prompt: None,
                    user_instructions: None,
                    webhook_url: None,
                },
                SchemaType::Json,
                &[],
            )
            .await
            .unwrap()
            .agent
            .id
    }

    #[tokio::test]
    async fn test_find_by_email_scoped_to_agent() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "owner@example.com").await;
        let support = seed_agent(&pool, user_id, "Support").await;
        let sales = seed_agent(&pool, user_id, "Sales").await;
        let repo = SqliteCustomerRepository::new(pool);

        let jane = repo
            .create(support, Some("Jane"), Some("jane@x.com"))
            .await
            .unwrap();

        let found = repo.find_by_email(support, "jane@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, jane.id);
        assert_eq!(found.name.as_deref(), Some("Jane"));
        assert!(repo.find_by_email(sales, "jane@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_anonymous_customer_stores_nulls() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "owner@example.com").await;
        let agent_id = seed_agent(&pool, user_id, "Support").await;
        let repo = SqliteCustomerRepository::new(pool);

        let first = repo.create(agent_id, None, None).await.unwrap();
        let second = repo.create(agent_id, None, None).await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.name.is_none() && first.email.is_none());
    }
}
