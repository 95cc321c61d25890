//! Agent lifecycle service.
//!
//! Orchestrates agent creation together with its data schema and fields,
//! partial updates that reach into the canonical schema, cascade deletion,
//! and claiming or releasing a public chat URL.

use captor_types::agent::{
    Agent, AgentDetail, CreateAgentRequest, DataSchema, NewAgent, NewDataField, SchemaType,
    UpdateAgentRequest,
};
use captor_types::error::{AgentError, RepositoryError};
use captor_types::page::{Page, PageRequest};
use tracing::{debug, info, warn};

use crate::chat::repository::ChatRepository;
use crate::repository::agent::AgentRepository;
use crate::repository::schema::SchemaRepository;

/// Service orchestrating the full agent lifecycle.
///
/// Generic over repository traits to maintain clean architecture --
/// captor-core never depends on captor-infra.
pub struct AgentService<A: AgentRepository, S: SchemaRepository, C: ChatRepository> {
    agent_repo: A,
    schema_repo: S,
    chat_repo: C,
}

impl<A: AgentRepository, S: SchemaRepository, C: ChatRepository> AgentService<A, S, C> {
    /// Create a new AgentService.
    ///
    /// - `agent_repo`: persistence for agent records and their cascade
    /// - `schema_repo`: the canonical data schema and its fields
    /// - `chat_repo`: session summaries attached to agent views
    pub fn new(agent_repo: A, schema_repo: S, chat_repo: C) -> Self {
        Self {
            agent_repo,
            schema_repo,
            chat_repo,
        }
    }

    /// Access the agent repository.
    pub fn agent_repo(&self) -> &A {
        &self.agent_repo
    }

    /// List a user's agents, newest first, each fully populated.
    pub async fn list_agents(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<AgentDetail>, AgentError> {
        let total = self
            .agent_repo
            .count_by_user(user_id)
            .await
            .map_err(storage)?;
        let agents = self
            .agent_repo
            .list_by_user(user_id, Some(page.limit), Some(page.skip))
            .await
            .map_err(storage)?;

        let mut items = Vec::with_capacity(agents.len());
        for agent in agents {
            items.push(self.detail(agent).await?);
        }
        Ok(Page::new(items, total, page))
    }

    /// Create an agent with its data schema and fields.
    ///
    /// The agent, schema, and fields are written as one unit, so a failure
    /// never leaves an agent without its schema.
    pub async fn create_agent(
        &self,
        user_id: i64,
        request: CreateAgentRequest,
    ) -> Result<AgentDetail, AgentError> {
        let name = validate_name(&request.name)?;
        let schema_type = parse_schema_type(&request.schema_type)?;
        for field in &request.agent_data_fields {
            validate_new_field(field)?;
        }

        let new_agent = NewAgent {
            user_id,
            name,
            description: request.description,
            system_prompt: request.system_prompt,
            user_instructions: request.user_instructions,
            webhook_url: request.webhook_url,
        };

        let detail = self
            .agent_repo
            .create(&new_agent, schema_type, &request.agent_data_fields)
            .await
            .map_err(storage)?;

        info!(
            agent_id = detail.agent.id,
            user_id,
            schema_type = %schema_type,
            fields = request.agent_data_fields.len(),
            "Agent created"
        );
        Ok(detail)
    }

    /// Get a fully populated agent by id.
    pub async fn get_agent(&self, id: i64) -> Result<AgentDetail, AgentError> {
        let agent = self.find(id).await?;
        self.detail(agent).await
    }

    /// Get a fully populated agent, requiring `user_id` to own it.
    pub async fn get_owned_agent(&self, id: i64, user_id: i64) -> Result<AgentDetail, AgentError> {
        let agent = self.ensure_owner(id, user_id).await?;
        self.detail(agent).await
    }

    /// Load an agent and check that `user_id` owns it.
    pub async fn ensure_owner(&self, id: i64, user_id: i64) -> Result<Agent, AgentError> {
        let agent = self.find(id).await?;
        if agent.user_id != user_id {
            return Err(AgentError::Forbidden);
        }
        Ok(agent)
    }

    /// Public lookup by chat URL. Session summaries are not exposed.
    pub async fn get_by_chat_url(&self, chat_url: &str) -> Result<AgentDetail, AgentError> {
        let agent = self
            .agent_repo
            .get_by_chat_url(chat_url.trim())
            .await
            .map_err(storage)?
            .ok_or(AgentError::NotFound)?;
        let data_schema = self.canonical_schema(agent.id).await?;
        Ok(AgentDetail {
            agent,
            data_schema,
            chat_sessions: Vec::new(),
        })
    }

    /// Apply a partial update.
    ///
    /// Plain attributes are written only when supplied. `schema_type`
    /// rewrites the canonical schema's type. Field entries with an id update
    /// that field in place when it belongs to the canonical schema and are
    /// skipped otherwise; entries without an id are inserted under the
    /// canonical schema.
    pub async fn update_agent(
        &self,
        id: i64,
        request: UpdateAgentRequest,
    ) -> Result<AgentDetail, AgentError> {
        let mut agent = self.find(id).await?;

        let schema_type = request
            .schema_type
            .as_deref()
            .map(parse_schema_type)
            .transpose()?;
        if let Some(name) = &request.name {
            validate_name(name)?;
        }
        let mut new_fields = Vec::new();
        for entry in request.agent_data_fields.iter().flatten() {
            if entry.id.is_none() {
                let field = entry.to_new_field().ok_or_else(|| {
                    AgentError::Validation("new data fields require a data_type".to_string())
                })?;
                validate_new_field(&field)?;
                new_fields.push(field);
            }
        }

        if request.apply_to(&mut agent) {
            agent.name = agent.name.trim().to_string();
            agent = self.agent_repo.update(&agent).await.map_err(|e| match e {
                RepositoryError::NotFound => AgentError::NotFound,
                other => storage(other),
            })?;
        }

        let wants_schema = schema_type.is_some() || request.agent_data_fields.is_some();
        let schema = if wants_schema {
            self.canonical_schema(id).await?
        } else {
            None
        };

        match (&schema, wants_schema) {
            (Some(schema), _) => {
                self.update_schema(schema, schema_type, &request, new_fields)
                    .await?
            }
            (None, true) => warn!(agent_id = id, "Agent has no data schema; schema update skipped"),
            (None, false) => {}
        }

        info!(agent_id = id, "Agent updated");
        self.detail(agent).await
    }

    async fn update_schema(
        &self,
        schema: &DataSchema,
        schema_type: Option<SchemaType>,
        request: &UpdateAgentRequest,
        new_fields: Vec<NewDataField>,
    ) -> Result<(), AgentError> {
        if let Some(schema_type) = schema_type {
            self.schema_repo
                .update_type(schema.id, schema_type)
                .await
                .map_err(storage)?;
        }

        for entry in request.agent_data_fields.iter().flatten() {
            let Some(field_id) = entry.id else { continue };
            let field = self
                .schema_repo
                .get_field(field_id)
                .await
                .map_err(storage)?;
            match field {
                Some(mut field) if field.schema_id == schema.id => {
                    entry.apply_to(&mut field);
                    self.schema_repo
                        .update_field(&field)
                        .await
                        .map_err(storage)?;
                }
                _ => debug!(
                    schema_id = schema.id,
                    field_id, "Field not in canonical schema; update skipped"
                ),
            }
        }

        for field in &new_fields {
            self.schema_repo
                .create_field(schema.id, field)
                .await
                .map_err(storage)?;
        }
        Ok(())
    }

    /// Delete an agent and everything it owns.
    pub async fn delete_agent(&self, id: i64) -> Result<(), AgentError> {
        self.agent_repo
            .delete_cascade(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AgentError::NotFound,
                other => storage(other),
            })?;
        info!(agent_id = id, "Agent deleted");
        Ok(())
    }

    /// Claim a chat URL for an agent owned by `user_id`.
    ///
    /// Re-claiming the URL an agent already holds succeeds unchanged.
    pub async fn set_chat_url(
        &self,
        id: i64,
        chat_url: &str,
        user_id: i64,
    ) -> Result<AgentDetail, AgentError> {
        let mut agent = self.ensure_owner(id, user_id).await?;

        let chat_url = chat_url.trim();
        if chat_url.is_empty() {
            return Err(AgentError::Validation("chat URL cannot be empty".to_string()));
        }

        if let Some(holder) = self
            .agent_repo
            .get_by_chat_url(chat_url)
            .await
            .map_err(storage)?
        {
            if holder.id != agent.id {
                return Err(AgentError::ChatUrlConflict(chat_url.to_string()));
            }
            return self.detail(agent).await;
        }

        agent.chat_url = Some(chat_url.to_string());
        let agent = self.agent_repo.update(&agent).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AgentError::ChatUrlConflict(chat_url.to_string()),
            RepositoryError::NotFound => AgentError::NotFound,
            other => storage(other),
        })?;

        info!(agent_id = id, chat_url, "Chat URL assigned");
        self.detail(agent).await
    }

    /// Release the chat URL of an agent owned by `user_id`.
    pub async fn clear_chat_url(&self, id: i64, user_id: i64) -> Result<AgentDetail, AgentError> {
        let mut agent = self.ensure_owner(id, user_id).await?;
        if agent.chat_url.is_some() {
            agent.chat_url = None;
            agent = self.agent_repo.update(&agent).await.map_err(storage)?;
            info!(agent_id = id, "Chat URL cleared");
        }
        self.detail(agent).await
    }

    async fn find(&self, id: i64) -> Result<Agent, AgentError> {
        self.agent_repo
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(AgentError::NotFound)
    }

    async fn canonical_schema(&self, agent_id: i64) -> Result<Option<DataSchema>, AgentError> {
        self.schema_repo
            .get_canonical(agent_id)
            .await
            .map_err(storage)
    }

    async fn detail(&self, agent: Agent) -> Result<AgentDetail, AgentError> {
        let data_schema = self.canonical_schema(agent.id).await?;
        let chat_sessions = self
            .chat_repo
            .list_sessions(agent.id)
            .await
            .map_err(storage)?;
        Ok(AgentDetail {
            agent,
            data_schema,
            chat_sessions,
        })
    }
}

fn storage(e: RepositoryError) -> AgentError {
    AgentError::StorageError(e.to_string())
}

fn parse_schema_type(value: &str) -> Result<SchemaType, AgentError> {
    value.parse().map_err(AgentError::InvalidSchemaType)
}

fn validate_name(name: &str) -> Result<String, AgentError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AgentError::Validation("name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

fn validate_new_field(field: &NewDataField) -> Result<(), AgentError> {
    if field.data_type.trim().is_empty() {
        return Err(AgentError::Validation(
            "data field data_type cannot be empty".to_string(),
        ));
    }
    Ok(())
}
