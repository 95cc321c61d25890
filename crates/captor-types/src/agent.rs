//! Agent, data schema, and data field types.
//!
//! An agent owns exactly one semantically-active data schema (the
//! "canonical" schema) describing what it collects from customers, either as
//! free-form questions (`qa`) or as named JSON fields (`json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use std::fmt;
use std::str::FromStr;

use crate::chat::ChatSession;

/// An AI agent configured by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    /// Instructions shown to the customer in the chat widget.
    pub user_instructions: Option<String>,
    /// Automation endpoint that posts messages back into sessions.
    pub webhook_url: Option<String>,
    /// Public conversation entry point. Unique across all agents when set.
    pub chat_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Data-collection mode of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// Free-form question/answer collection.
    Qa,
    /// Named-field structured collection.
    Json,
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Qa => write!(f, "qa"),
            SchemaType::Json => write!(f, "json"),
        }
    }
}

impl FromStr for SchemaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qa" => Ok(SchemaType::Qa),
            "json" => Ok(SchemaType::Json),
            other => Err(format!("invalid schema type: '{other}' (expected 'qa' or 'json')")),
        }
    }
}

/// The data-collection schema of an agent, with its fields in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSchema {
    pub id: i64,
    pub agent_id: i64,
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: Vec<DataField>,
}

/// One question (`qa`) or named field (`json`) within a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataField {
    pub id: i64,
    pub schema_id: i64,
    /// Field name, used by `json` schemas.
    pub key: Option<String>,
    /// Question text, used by `qa` schemas.
    pub question: Option<String>,
    /// Value tag such as `string`, `number`, or `email`.
    pub data_type: String,
    pub required: bool,
    pub validation_rules: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A field to be inserted under a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataField {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    pub data_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub validation_rules: Map<String, Value>,
}

/// Partial update of a data field. Entries without an `id` describe a new
/// field to insert under the canonical schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFieldUpdate {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub key: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub question: Option<Option<String>>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub validation_rules: Option<Map<String, Value>>,
}

impl DataFieldUpdate {
    /// Apply the supplied attributes to an existing field, leaving the rest untouched.
    pub fn apply_to(&self, field: &mut DataField) {
        if let Some(key) = &self.key {
            field.key = key.clone();
        }
        if let Some(question) = &self.question {
            field.question = question.clone();
        }
        if let Some(data_type) = &self.data_type {
            field.data_type = data_type.clone();
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(rules) = &self.validation_rules {
            field.validation_rules = rules.clone();
        }
    }

    /// Build an insertable field from the supplied attributes.
    ///
    /// `data_type` is mandatory for new fields; `None` is returned without it.
    pub fn to_new_field(&self) -> Option<NewDataField> {
        Some(NewDataField {
            key: self.key.clone().flatten(),
            question: self.question.clone().flatten(),
            data_type: self.data_type.clone()?,
            required: self.required.unwrap_or(false),
            validation_rules: self.validation_rules.clone().unwrap_or_default(),
        })
    }
}

/// Agent attributes supplied at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAgent {
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub user_instructions: Option<String>,
    pub webhook_url: Option<String>,
}

/// Request to create an agent together with its schema and fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_instructions: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Schema type, `"qa"` or `"json"`.
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub agent_data_fields: Vec<NewDataField>,
}

/// Partial agent update. Absent attributes are left untouched; for nullable
/// attributes an explicit `null` clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub system_prompt: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub user_instructions: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub webhook_url: Option<Option<String>>,
    /// Rewrites the canonical schema's type when present.
    #[serde(default, rename = "type")]
    pub schema_type: Option<String>,
    #[serde(default)]
    pub agent_data_fields: Option<Vec<DataFieldUpdate>>,
}

impl UpdateAgentRequest {
    /// Apply the plain agent attributes (not schema or fields) to `agent`.
    ///
    /// Returns `true` when at least one attribute was supplied.
    pub fn apply_to(&self, agent: &mut Agent) -> bool {
        let mut touched = false;
        if let Some(name) = &self.name {
            agent.name = name.clone();
            touched = true;
        }
        for (update, slot) in [
            (&self.description, &mut agent.description),
            (&self.system_prompt, &mut agent.system_prompt),
            (&self.user_instructions, &mut agent.user_instructions),
            (&self.webhook_url, &mut agent.webhook_url),
        ] {
            if let Some(value) = update {
                *slot = value.clone();
                touched = true;
            }
        }
        touched
    }
}

/// Request body for claiming a chat URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatUrlRequest {
    pub chat_url: String,
}

/// Fully populated agent view: the agent, its canonical schema with fields,
/// and summaries of its chat sessions (newest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDetail {
    #[serde(flatten)]
    pub agent: Agent,
    pub data_schema: Option<DataSchema>,
    #[serde(default)]
    pub chat_sessions: Vec<ChatSession>,
}

/// Distinguishes "absent" (outer `None`) from "explicit null" (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_agent() -> Agent {
        Agent {
            id: 1,
            user_id: 7,
            name: "Support Bot".to_string(),
            description: Some("Helps customers".to_string()),
            system_prompt: None,
            user_instructions: None,
            webhook_url: Some("https://hooks.example.com/a".to_string()),
            chat_url: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_schema_type_parse() {
        assert_eq!("qa".parse::<SchemaType>().unwrap(), SchemaType::Qa);
        assert_eq!("JSON".parse::<SchemaType>().unwrap(), SchemaType::Json);
        assert!("form".parse::<SchemaType>().is_err());
        assert_eq!(SchemaType::Json.to_string(), "json");
    }

    #[test]
    fn test_update_request_distinguishes_absent_from_null() {
        let req: UpdateAgentRequest =
            serde_json::from_str(r#"{"description": null, "name": "Renamed"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("Renamed"));
        assert_eq!(req.description, Some(None));
        assert_eq!(req.webhook_url, None);

        let mut agent = make_agent();
        assert!(req.apply_to(&mut agent));
        assert_eq!(agent.name, "Renamed");
        assert_eq!(agent.description, None);
        assert_eq!(
            agent.webhook_url.as_deref(),
            Some("https://hooks.example.com/a")
        );
    }

    #[test]
    fn test_empty_update_touches_nothing() {
        let req = UpdateAgentRequest::default();
        let mut agent = make_agent();
        let before = agent.clone();
        assert!(!req.apply_to(&mut agent));
        assert_eq!(agent, before);
    }

    #[test]
    fn test_field_update_to_new_field_requires_data_type() {
        let update = DataFieldUpdate {
            question: Some(Some("issue?".to_string())),
            ..Default::default()
        };
        assert!(update.to_new_field().is_none());

        let update = DataFieldUpdate {
            data_type: Some("string".to_string()),
            required: Some(true),
            ..update
        };
        let field = update.to_new_field().unwrap();
        assert_eq!(field.question.as_deref(), Some("issue?"));
        assert!(field.required);
        assert!(field.validation_rules.is_empty());
    }

    #[test]
    fn test_create_request_wire_names() {
        let req: CreateAgentRequest = serde_json::from_str(
            r#"{"name": "Support Bot", "type": "qa",
                "agent_data_fields": [{"question": "email?", "data_type": "email"}]}"#,
        )
        .unwrap();
        assert_eq!(req.schema_type, "qa");
        assert_eq!(req.agent_data_fields.len(), 1);
        assert!(!req.agent_data_fields[0].required);
    }

    #[test]
    fn test_schema_serializes_type_key() {
        let schema = DataSchema {
            id: 3,
            agent_id: 1,
            schema_type: SchemaType::Qa,
            created_at: Utc::now(),
            updated_at: None,
            fields: Vec::new(),
        };
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "qa");
    }
}
