//! Conversation service appending to existing chat sessions.
//!
//! ConversationService coordinates the ChatRepository, SchemaRepository, and
//! AgentRepository: it appends messages in either direction, records
//! collected answers, closes sessions, and builds the conversation views
//! shown to agent owners.

use captor_types::chat::{
    ASSISTANT_ROLE, AgentSnapshot, AppendAssistantMessageRequest,
    AppendAssistantMessageWithDataRequest, AppendMessageRequest, AppendUserMessageRequest,
    AssistantAppendResult, ChatSession, ConversationSummary, Message, SessionDetail, USER_ROLE,
};
use captor_types::error::{ChatError, RepositoryError};
use tracing::{info, warn};

use crate::chat::repository::{ChatRepository, NewMessage};
use crate::repository::agent::AgentRepository;
use crate::repository::schema::SchemaRepository;

/// Appends to sessions and reads conversation history.
///
/// Generic over `AgentRepository`, `SchemaRepository`, and `ChatRepository`
/// to maintain clean architecture (captor-core never depends on captor-infra).
pub struct ConversationService<A: AgentRepository, S: SchemaRepository, C: ChatRepository> {
    agent_repo: A,
    schema_repo: S,
    chat_repo: C,
}

impl<A: AgentRepository, S: SchemaRepository, C: ChatRepository> ConversationService<A, S, C> {
    pub fn new(agent_repo: A, schema_repo: S, chat_repo: C) -> Self {
        Self {
            agent_repo,
            schema_repo,
            chat_repo,
        }
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    // --- Appends ---

    /// Append a message with caller-supplied role labels.
    pub async fn append_message(&self, request: &AppendMessageRequest) -> Result<Message, ChatError> {
        let session = self.require_session(request.session_id).await?;
        self.save(session.id, &request.sender, &request.receiver, &request.content)
            .await
    }

    /// Append a message from the customer to the agent.
    pub async fn append_user_message(
        &self,
        request: &AppendUserMessageRequest,
    ) -> Result<Message, ChatError> {
        let session = self.require_session(request.session_id).await?;
        self.save(session.id, USER_ROLE, ASSISTANT_ROLE, &request.content)
            .await
    }

    /// Append a message from the agent to the customer, closing the session
    /// when asked.
    pub async fn append_assistant_message(
        &self,
        request: &AppendAssistantMessageRequest,
    ) -> Result<AssistantAppendResult, ChatError> {
        let session = self.require_session(request.session_id).await?;
        let message = self
            .save(session.id, ASSISTANT_ROLE, USER_ROLE, &request.content)
            .await?;
        let session_closed = self.finish(session, request.close_session).await?;

        Ok(AssistantAppendResult {
            message,
            collected_data: Vec::new(),
            session_closed,
        })
    }

    /// Append an agent message together with extracted answers.
    ///
    /// Answers naming a field outside the session agent's canonical schema
    /// (unknown, or owned by another agent) are dropped; the append still
    /// succeeds. Every stored answer is bound to this session.
    pub async fn append_assistant_message_with_data(
        &self,
        request: &AppendAssistantMessageWithDataRequest,
    ) -> Result<AssistantAppendResult, ChatError> {
        let session = self.require_session(request.session_id).await?;
        let message = self
            .save(session.id, ASSISTANT_ROLE, USER_ROLE, &request.content)
            .await?;

        let own_fields: Vec<i64> = if request.collected_data.is_empty() {
            Vec::new()
        } else {
            self.schema_repo
                .get_canonical(session.agent_id)
                .await
                .map_err(storage)?
                .map(|schema| schema.fields.iter().map(|f| f.id).collect())
                .unwrap_or_default()
        };

        let mut collected_data = Vec::with_capacity(request.collected_data.len());
        for item in &request.collected_data {
            if !own_fields.contains(&item.field_id) {
                warn!(
                    session_id = session.id,
                    agent_id = session.agent_id,
                    field_id = item.field_id,
                    "Skipping collected data for a field outside the agent's schema"
                );
                continue;
            }
            let row = self
                .chat_repo
                .save_collected_data(session.id, item.field_id, &item.answer)
                .await
                .map_err(storage)?;
            collected_data.push(row);
        }

        let session_closed = self.finish(session, request.close_session).await?;

        Ok(AssistantAppendResult {
            message,
            collected_data,
            session_closed,
        })
    }

    // --- Reads ---

    /// Every session across the user's agents, newest first, each joined
    /// with its agent's display fields.
    pub async fn list_conversations(
        &self,
        user_id: i64,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let agents = self
            .agent_repo
            .list_by_user(user_id, None, None)
            .await
            .map_err(storage)?;

        let mut conversations = Vec::new();
        for agent in agents {
            let snapshot = AgentSnapshot {
                id: agent.id,
                name: agent.name,
                description: agent.description,
                webhook_url: agent.webhook_url,
                chat_url: agent.chat_url,
            };
            let sessions = self
                .chat_repo
                .list_sessions(agent.id)
                .await
                .map_err(storage)?;
            conversations.extend(sessions.into_iter().map(|session| ConversationSummary {
                session,
                agent: snapshot.clone(),
            }));
        }

        conversations.sort_by(|a, b| {
            b.session
                .created_at
                .cmp(&a.session.created_at)
                .then(b.session.id.cmp(&a.session.id))
        });
        Ok(conversations)
    }

    /// A session with its full message and collected-data history.
    pub async fn get_session_detail(&self, session_id: i64) -> Result<SessionDetail, ChatError> {
        let session = self.require_session(session_id).await?;
        let messages = self
            .chat_repo
            .get_messages(session.id)
            .await
            .map_err(storage)?;
        let collected_data = self
            .chat_repo
            .get_collected_data(session.id)
            .await
            .map_err(storage)?;
        Ok(SessionDetail {
            session,
            messages,
            collected_data,
        })
    }

    async fn require_session(&self, session_id: i64) -> Result<ChatSession, ChatError> {
        self.chat_repo
            .get_session(session_id)
            .await
            .map_err(storage)?
            .ok_or(ChatError::SessionNotFound)
    }

    async fn save(
        &self,
        session_id: i64,
        sender: &str,
        receiver: &str,
        content: &str,
    ) -> Result<Message, ChatError> {
        self.chat_repo
            .save_message(&NewMessage {
                session_id,
                sender: sender.to_string(),
                receiver: receiver.to_string(),
                content: content.to_string(),
            })
            .await
            .map_err(storage)
    }

    /// Close the session if requested; returns the resulting closed flag.
    async fn finish(&self, session: ChatSession, close: bool) -> Result<bool, ChatError> {
        if !close {
            return Ok(session.session_closed);
        }
        let session = self
            .chat_repo
            .close_session(session.id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::SessionNotFound,
                other => storage(other),
            })?;
        info!(session_id = session.id, "Chat session closed");
        Ok(session.session_closed)
    }
}

fn storage(e: RepositoryError) -> ChatError {
    ChatError::StorageError(e.to_string())
}
