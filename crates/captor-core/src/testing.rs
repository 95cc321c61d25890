//! In-memory repositories and fake crypto for service tests.
//!
//! `MemoryStore` implements every repository trait over one shared state so
//! that cascades and cross-entity lookups behave like the SQLite store.

use std::sync::{Arc, Mutex, MutexGuard};

use captor_types::agent::{
    Agent, AgentDetail, DataField, DataSchema, NewAgent, NewDataField, SchemaType,
};
use captor_types::chat::{ChatSession, CollectedData, Message};
use captor_types::customer::Customer;
use captor_types::error::{AuthError, RepositoryError};
use captor_types::user::{TokenClaims, User};
use chrono::Utc;

use crate::chat::repository::{ChatRepository, NewMessage};
use crate::repository::agent::AgentRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::schema::SchemaRepository;
use crate::repository::user::{NewUser, UserRepository};
use crate::service::auth::{PasswordHasher, TokenCodec};

#[derive(Default)]
pub(crate) struct State {
    next_id: i64,
    pub users: Vec<User>,
    pub agents: Vec<Agent>,
    pub schemas: Vec<DataSchema>,
    pub fields: Vec<DataField>,
    pub customers: Vec<Customer>,
    pub sessions: Vec<ChatSession>,
    pub messages: Vec<Message>,
    pub collected: Vec<CollectedData>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Remove the given agents and every row they own.
    fn remove_agents(&mut self, agent_ids: &[i64]) {
        let session_ids: Vec<i64> = self
            .sessions
            .iter()
            .filter(|s| agent_ids.contains(&s.agent_id))
            .map(|s| s.id)
            .collect();
        let schema_ids: Vec<i64> = self
            .schemas
            .iter()
            .filter(|s| agent_ids.contains(&s.agent_id))
            .map(|s| s.id)
            .collect();

        self.collected.retain(|c| !session_ids.contains(&c.session_id));
        self.messages.retain(|m| !session_ids.contains(&m.session_id));
        self.sessions.retain(|s| !agent_ids.contains(&s.agent_id));
        self.customers.retain(|c| !agent_ids.contains(&c.agent_id));
        self.fields.retain(|f| !schema_ids.contains(&f.schema_id));
        self.schemas.retain(|s| !agent_ids.contains(&s.agent_id));
        self.agents.retain(|a| !agent_ids.contains(&a.id));
    }

    fn canonical_schema(&self, agent_id: i64) -> Option<DataSchema> {
        let mut schema = self
            .schemas
            .iter()
            .filter(|s| s.agent_id == agent_id)
            .min_by_key(|s| s.id)?
            .clone();
        schema.fields = self
            .fields
            .iter()
            .filter(|f| f.schema_id == schema.id)
            .cloned()
            .collect();
        Some(schema)
    }
}

/// Shared in-memory store. Clones share the same state.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Insert an extra (non-canonical) schema for an agent, as older data may hold.
    pub fn push_schema(&self, agent_id: i64, schema_type: SchemaType) -> i64 {
        let mut state = self.state();
        let id = state.next_id();
        state.schemas.push(DataSchema {
            id,
            agent_id,
            schema_type,
            created_at: Utc::now(),
            updated_at: None,
            fields: Vec::new(),
        });
        id
    }
}

impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email '{}' already exists",
                user.email
            )));
        }
        let user = User {
            id: state.next_id(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        Ok(self.state().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.state().users.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .state()
            .users
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.state().users.len() as u64)
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let mut state = self.state();
        if state
            .users
            .iter()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(RepositoryError::Conflict(format!(
                "email '{}' already exists",
                user.email
            )));
        }
        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = User {
            updated_at: Some(Utc::now()),
            ..user.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if !state.users.iter().any(|u| u.id == id) {
            return Err(RepositoryError::NotFound);
        }
        let owned: Vec<i64> = state
            .agents
            .iter()
            .filter(|a| a.user_id == id)
            .map(|a| a.id)
            .collect();
        state.remove_agents(&owned);
        state.users.retain(|u| u.id != id);
        Ok(())
    }
}

impl AgentRepository for MemoryStore {
    async fn create(
        &self,
        agent: &NewAgent,
        schema_type: SchemaType,
        fields: &[NewDataField],
    ) -> Result<AgentDetail, RepositoryError> {
        let mut state = self.state();
        let now = Utc::now();
        let agent = Agent {
            id: state.next_id(),
            user_id: agent.user_id,
            name: agent.name.clone(),
            description: agent.description.clone(),
            system_prompt: agent.system_prompt.clone(),
            user_instructions: agent.user_instructions.clone(),
            webhook_url: agent.webhook_url.clone(),
            chat_url: None,
            created_at: now,
            updated_at: None,
        };
        state.agents.push(agent.clone());

        let schema_id = state.next_id();
        state.schemas.push(DataSchema {
            id: schema_id,
            agent_id: agent.id,
            schema_type,
            created_at: now,
            updated_at: None,
            fields: Vec::new(),
        });
        for field in fields {
            let id = state.next_id();
            state.fields.push(DataField {
                id,
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

        let data_schema = state.canonical_schema(agent.id);
        Ok(AgentDetail {
            agent,
            data_schema,
            chat_sessions: Vec::new(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.state().agents.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_chat_url(&self, chat_url: &str) -> Result<Option<Agent>, RepositoryError> {
        Ok(self
            .state()
            .agents
            .iter()
            .find(|a| a.chat_url.as_deref() == Some(chat_url))
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Agent>, RepositoryError> {
        let state = self.state();
        let mut agents: Vec<Agent> = state
            .agents
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        agents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(agents
            .into_iter()
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.map_or(usize::MAX, |l| l as usize))
            .collect())
    }

    async fn count_by_user(&self, user_id: i64) -> Result<u64, RepositoryError> {
        Ok(self
            .state()
            .agents
            .iter()
            .filter(|a| a.user_id == user_id)
            .count() as u64)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.state().agents.len() as u64)
    }

    async fn update(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let mut state = self.state();
        if let Some(url) = &agent.chat_url {
            if state
                .agents
                .iter()
                .any(|a| a.id != agent.id && a.chat_url.as_ref() == Some(url))
            {
                return Err(RepositoryError::Conflict(format!(
                    "chat_url '{url}' already exists"
                )));
            }
        }
        let stored = state
            .agents
            .iter_mut()
            .find(|a| a.id == agent.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = Agent {
            updated_at: Some(Utc::now()),
            ..agent.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_cascade(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if !state.agents.iter().any(|a| a.id == id) {
            return Err(RepositoryError::NotFound);
        }
        state.remove_agents(&[id]);
        Ok(())
    }
}

impl SchemaRepository for MemoryStore {
    async fn get_canonical(&self, agent_id: i64) -> Result<Option<DataSchema>, RepositoryError> {
        Ok(self.state().canonical_schema(agent_id))
    }

    async fn update_type(
        &self,
        schema_id: i64,
        schema_type: SchemaType,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let schema = state
            .schemas
            .iter_mut()
            .find(|s| s.id == schema_id)
            .ok_or(RepositoryError::NotFound)?;
        schema.schema_type = schema_type;
        schema.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn get_field(&self, field_id: i64) -> Result<Option<DataField>, RepositoryError> {
        Ok(self.state().fields.iter().find(|f| f.id == field_id).cloned())
    }

    async fn create_field(
        &self,
        schema_id: i64,
        field: &NewDataField,
    ) -> Result<DataField, RepositoryError> {
        let mut state = self.state();
        let field = DataField {
            id: state.next_id(),
            schema_id,
            key: field.key.clone(),
            question: field.question.clone(),
            data_type: field.data_type.clone(),
            required: field.required,
            validation_rules: field.validation_rules.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        state.fields.push(field.clone());
        Ok(field)
    }

    async fn update_field(&self, field: &DataField) -> Result<DataField, RepositoryError> {
        let mut state = self.state();
        let stored = state
            .fields
            .iter_mut()
            .find(|f| f.id == field.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = DataField {
            schema_id: stored.schema_id,
            updated_at: Some(Utc::now()),
            ..field.clone()
        };
        Ok(stored.clone())
    }
}

impl CustomerRepository for MemoryStore {
    async fn create(
        &self,
        agent_id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Customer, RepositoryError> {
        let mut state = self.state();
        let customer = Customer {
            id: state.next_id(),
            agent_id,
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            created_at: Utc::now(),
            updated_at: None,
        };
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn find_by_email(
        &self,
        agent_id: i64,
        email: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        Ok(self
            .state()
            .customers
            .iter()
            .find(|c| c.agent_id == agent_id && c.email.as_deref() == Some(email))
            .cloned())
    }
}

impl ChatRepository for MemoryStore {
    async fn create_session(
        &self,
        agent_id: i64,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
    ) -> Result<ChatSession, RepositoryError> {
        let mut state = self.state();
        let now = Utc::now();
        let session = ChatSession {
            id: state.next_id(),
            agent_id,
            customer_name: customer_name.map(str::to_string),
            customer_email: customer_email.map(str::to_string),
            started_at: now,
            ended_at: None,
            session_closed: false,
            created_at: now,
            updated_at: None,
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: i64) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .state()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
    }

    async fn find_latest_session(
        &self,
        agent_id: i64,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .state()
            .sessions
            .iter()
            .filter(|s| {
                s.agent_id == agent_id
                    && s.customer_name.as_deref() == customer_name
                    && s.customer_email.as_deref() == customer_email
            })
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn list_sessions(&self, agent_id: i64) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sessions: Vec<ChatSession> = self
            .state()
            .sessions
            .iter()
            .filter(|s| s.agent_id == agent_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    async fn close_session(&self, session_id: i64) -> Result<ChatSession, RepositoryError> {
        let mut state = self.state();
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(RepositoryError::NotFound)?;
        let now = Utc::now();
        session.session_closed = true;
        session.ended_at.get_or_insert(now);
        session.updated_at = Some(now);
        Ok(session.clone())
    }

    async fn save_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let mut state = self.state();
        let message = Message {
            id: state.next_id(),
            session_id: message.session_id,
            sender: message.sender.clone(),
            receiver: message.receiver.clone(),
            content: message.content.clone(),
            created_at: Utc::now(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn get_messages(&self, session_id: i64) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .state()
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn save_collected_data(
        &self,
        session_id: i64,
        field_id: i64,
        answer: &str,
    ) -> Result<CollectedData, RepositoryError> {
        let mut state = self.state();
        let row = CollectedData {
            id: state.next_id(),
            session_id,
            field_id,
            answer: answer.to_string(),
            created_at: Utc::now(),
        };
        state.collected.push(row.clone());
        Ok(row)
    }

    async fn get_collected_data(
        &self,
        session_id: i64,
    ) -> Result<Vec<CollectedData>, RepositoryError> {
        Ok(self
            .state()
            .collected
            .iter()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn count_sessions(&self) -> Result<u64, RepositoryError> {
        Ok(self.state().sessions.len() as u64)
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        Ok(self.state().messages.len() as u64)
    }
}

/// Reversible stand-in for Argon2: `plain:{password}`.
#[derive(Clone, Default)]
pub(crate) struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash.strip_prefix("plain:") == Some(password))
    }
}

/// Unsigned token stand-in: `{uid}|{email}|{exp}`.
#[derive(Clone)]
pub(crate) struct FakeTokens {
    pub ttl_minutes: i64,
}

impl TokenCodec for FakeTokens {
    fn issue(&self, user: &User) -> Result<String, AuthError> {
        let exp = Utc::now().timestamp() + self.ttl_minutes * 60;
        Ok(format!("{}|{}|{exp}", user.id, user.email))
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut parts = token.split('|');
        let (Some(uid), Some(sub), Some(exp)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AuthError::InvalidToken);
        };
        let uid = uid.parse().map_err(|_| AuthError::InvalidToken)?;
        let exp: i64 = exp.parse().map_err(|_| AuthError::InvalidToken)?;
        if exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }
        Ok(TokenClaims {
            sub: sub.to_string(),
            uid,
            iat: exp - self.ttl_minutes * 60,
            exp,
        })
    }
}
