//! Customer type: an end-user identity scoped to one agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An end user talking to an agent through its public chat surface.
///
/// Customers under the same agent are the same person when their email
/// matches; customers without an email are never deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub agent_id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
