use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::Role;
use crate::types::chat_message::content_from_value;

/// A message sent to the chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    /// The author of the message.
    pub role: Role,

    /// The message text.
    pub content: String,
}

impl CompletionMessage {
    /// Create a new `CompletionMessage`.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Parameters for a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,

    /// Messages in conversation order.
    pub messages: Vec<CompletionMessage>,

    /// Sampling temperature; retrochat always asks for 0.
    pub temperature: f32,

    /// Whether the response should be streamed as server-sent events.
    #[serde(default)]
    pub stream: bool,

    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a deterministic request for a single prompt.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![CompletionMessage::user(prompt)],
            temperature: 0.0,
            stream: false,
            max_tokens: None,
        }
    }

    /// Prepend a system message to the request.
    pub fn with_system(mut self, system: Option<&str>) -> Self {
        if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
            self.messages.insert(0, CompletionMessage::system(system));
        }
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The last user message, if any.
    pub fn prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// One streamed chunk of a chat completion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionChunk {
    /// Identifier shared by every chunk of the completion.
    #[serde(default)]
    pub id: Option<String>,

    /// Model that produced the chunk.
    #[serde(default)]
    pub model: Option<String>,

    /// Incremental choices; retrochat only reads the first.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl CompletionChunk {
    /// The text delta carried by the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }

    /// The finish reason of the first choice, if the completion ended.
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }
}

/// A choice inside a streamed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Position of the choice.
    #[serde(default)]
    pub index: u32,

    /// The incremental content.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Why generation stopped, present on the last chunk.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental message content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Present on the first chunk only.
    #[serde(default)]
    pub role: Option<Role>,

    /// The text appended by this chunk.
    #[serde(default)]
    pub content: Option<String>,
}

/// Extracts the assistant text from a non-streaming completion response.
///
/// The payload crosses the provider boundary untyped, so the content is
/// validated at runtime.
///
/// # Errors
///
/// Returns [`Error::InvalidContentType`] when the content is not a string
/// and a serialization error when the response has no choices.
pub fn completion_text(response: &Value) -> Result<String> {
    let message = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| Error::serialization("completion response has no choices", None))?;
    let content = message.get("content").unwrap_or(&Value::Null);
    content_from_value(content).map(str::to_string)
}
