//! Session resolution for the public chat widget.
//!
//! Given an agent and an optional customer identity, finds or creates the
//! customer and the session they are talking in, and returns the history so
//! far. Repeated calls with the same email land in the same session.

use captor_types::chat::{ResolveSessionRequest, ResolvedSession};
use captor_types::error::{ChatError, RepositoryError};
use tracing::{debug, info};

use crate::chat::repository::ChatRepository;
use crate::repository::agent::AgentRepository;
use crate::repository::customer::CustomerRepository;

/// Finds or creates the customer and session for an incoming chat.
pub struct SessionResolver<A: AgentRepository, Cu: CustomerRepository, Ch: ChatRepository> {
    agent_repo: A,
    customer_repo: Cu,
    chat_repo: Ch,
}

impl<A: AgentRepository, Cu: CustomerRepository, Ch: ChatRepository> SessionResolver<A, Cu, Ch> {
    pub fn new(agent_repo: A, customer_repo: Cu, chat_repo: Ch) -> Self {
        Self {
            agent_repo,
            customer_repo,
            chat_repo,
        }
    }

    /// Resolve the customer and session for `request`.
    ///
    /// - A customer is reused only when an email is given and matches one
    ///   already recorded for the agent; anonymous callers always get a
    ///   fresh customer.
    /// - The session is the newest one whose snapshot equals the resolved
    ///   customer's stored name and email, which may differ from the name
    ///   just supplied. Closed sessions are reused like open ones.
    pub async fn resolve(
        &self,
        request: &ResolveSessionRequest,
    ) -> Result<ResolvedSession, ChatError> {
        let agent = self
            .agent_repo
            .get_by_id(request.agent_id)
            .await
            .map_err(storage)?
            .ok_or(ChatError::AgentNotFound)?;

        let existing = match request.customer_email.as_deref() {
            Some(email) if !email.is_empty() => self
                .customer_repo
                .find_by_email(agent.id, email)
                .await
                .map_err(storage)?,
            _ => None,
        };

        let customer = match existing {
            Some(customer) => {
                debug!(agent_id = agent.id, customer_id = customer.id, "Matched customer by email");
                customer
            }
            None => self
                .customer_repo
                .create(
                    agent.id,
                    request.customer_name.as_deref(),
                    request.customer_email.as_deref(),
                )
                .await
                .map_err(storage)?,
        };

        let latest = self
            .chat_repo
            .find_latest_session(
                agent.id,
                customer.name.as_deref(),
                customer.email.as_deref(),
            )
            .await
            .map_err(storage)?;

        let (session, is_new_session) = match latest {
            Some(session) => (session, false),
            None => {
                let session = self
                    .chat_repo
                    .create_session(agent.id, customer.name.as_deref(), customer.email.as_deref())
                    .await
                    .map_err(storage)?;
                info!(
                    agent_id = agent.id,
                    session_id = session.id,
                    customer_id = customer.id,
                    "Chat session created"
                );
                (session, true)
            }
        };

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

        Ok(ResolvedSession {
            customer,
            session,
            messages,
            collected_data,
            is_new_session,
        })
    }
}

fn storage(e: RepositoryError) -> ChatError {
    ChatError::StorageError(e.to_string())
}
