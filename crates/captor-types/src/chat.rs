//! Chat session, message, and collected-data types for Captor.
//!
//! A session is one conversation thread between a customer and an agent.
//! Sessions carry a denormalized snapshot of the customer's name and email
//! rather than a customer reference, so a session's history never changes
//! when customer data does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customer::Customer;

/// Conventional role label for the customer side of a conversation.
pub const USER_ROLE: &str = "User";

/// Conventional role label for the agent side of a conversation.
pub const ASSISTANT_ROLE: &str = "Assistant";

/// A conversation thread between a customer and an agent.
///
/// `session_closed` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: i64,
    pub agent_id: i64,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub session_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single message within a chat session, ordered by creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub session_id: i64,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One answer collected for a data field during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedData {
    pub id: i64,
    pub session_id: i64,
    pub field_id: i64,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Input to session resolution from the public chat widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveSessionRequest {
    pub agent_id: i64,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// Outcome of session resolution: who is talking, in which session, and
/// everything said so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSession {
    pub customer: Customer,
    pub session: ChatSession,
    pub messages: Vec<Message>,
    pub collected_data: Vec<CollectedData>,
    pub is_new_session: bool,
}

/// Generic append with caller-supplied role labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageRequest {
    pub session_id: i64,
    pub sender: String,
    pub receiver: String,
    pub content: String,
}

/// Append from the customer side (`User` → `Assistant`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendUserMessageRequest {
    pub session_id: i64,
    pub content: String,
}

/// Append from the agent side (`Assistant` → `User`), optionally closing
/// the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendAssistantMessageRequest {
    pub session_id: i64,
    pub content: String,
    #[serde(default)]
    pub close_session: bool,
}

/// One extracted answer posted alongside an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedDataItem {
    /// Accepted for wire compatibility; rows are bound to the session being
    /// appended to.
    #[serde(default)]
    pub session_id: Option<i64>,
    pub field_id: i64,
    pub answer: String,
}

/// Assistant append carrying extracted answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendAssistantMessageWithDataRequest {
    pub session_id: i64,
    pub content: String,
    #[serde(default)]
    pub collected_data: Vec<CollectedDataItem>,
    #[serde(default)]
    pub close_session: bool,
}

/// Result of an assistant-side append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantAppendResult {
    pub message: Message,
    /// Rows actually inserted; items naming fields outside the agent's schema are absent.
    pub collected_data: Vec<CollectedData>,
    pub session_closed: bool,
}

/// Display fields of the agent owning a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub webhook_url: Option<String>,
    pub chat_url: Option<String>,
}

/// A session joined with its owning agent's display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub session: ChatSession,
    pub agent: AgentSnapshot,
}

/// A session with its full message and collected-data history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session: ChatSession,
    pub messages: Vec<Message>,
    pub collected_data: Vec<CollectedData>,
}
