use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::types::Role;

/// A single entry in the chat transcript.
///
/// Messages are immutable once created: the content is trimmed and the
/// timestamp taken at construction, and nothing can change either afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
    #[serde(serialize_with = "crate::utils::time::serialize")]
    timestamp: OffsetDateTime,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyContent`] if `content` is empty after trimming.
    pub fn new(role: Role, content: &str) -> Result<Self> {
        let content = validate_content(content)?;
        Ok(Self {
            role,
            content,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Creates a message from a role name and string content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRole`] for unknown roles and
    /// [`Error::EmptyContent`] for blank content.
    pub fn from_parts(role: &str, content: &str) -> Result<Self> {
        let role = role.parse::<Role>()?;
        Self::new(role, content)
    }

    /// Creates a message from untyped content, as received from an external
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] when `content` is not a JSON
    /// string, otherwise behaves like [`ChatMessage::new`].
    pub fn from_value(role: Role, content: &Value) -> Result<Self> {
        let content = content_from_value(content)?;
        Self::new(role, content)
    }

    /// The author of the message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The trimmed message text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// When the message was created.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }
}

/// Trims `content` and rejects it when nothing is left.
pub(crate) fn validate_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(Error::empty_content());
    }
    Ok(trimmed.to_string())
}

/// Extracts string content from a JSON value.
pub(crate) fn content_from_value(value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| Error::invalid_content_type(describe_value(value)))
}

/// Names the JSON type of `value` for error messages.
pub(crate) fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
