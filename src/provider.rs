//! Capability traits for the external model provider.
//!
//! The chat session only depends on these traits; [`crate::Groq`] implements
//! [`Provider`] over HTTP and [`crate::ChainOfThought`] implements
//! [`ResearchAgent`] on top of any provider.

use std::fmt;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Result;
use crate::types::{AgentEvent, CompletionRequest};

/// Environment variable holding the provider credential.
pub const CREDENTIAL_ENV_VAR: &str = "GROQ_API_KEY";

/// Default number of intermediate steps a research agent may take.
pub const DEFAULT_RESEARCH_STEPS: usize = 25;

/// A stream of generated text deltas.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A finite, non-restartable stream of agent events.
pub type AgentEventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent>> + Send>>;

/// A secret used to authenticate with the model provider.
///
/// The secret never appears in `Debug` output.
#[derive(Clone)]
pub struct Credential {
    secret: SecretString,
}

impl Credential {
    /// Wraps a secret, returning `None` when it is blank.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        let secret = secret.trim();
        if secret.is_empty() {
            None
        } else {
            Some(Self {
                secret: SecretString::from(secret.to_string()),
            })
        }
    }

    /// Reads the credential from [`CREDENTIAL_ENV_VAR`].
    pub fn from_env() -> Option<Self> {
        std::env::var(CREDENTIAL_ENV_VAR).ok().and_then(Self::new)
    }

    /// Exposes the secret for building request headers.
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Parameters for a research agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchRequest {
    /// The user's prompt.
    pub prompt: String,
    /// Model identifier to reason with.
    pub model: String,
    /// Maximum number of intermediate steps.
    pub max_steps: usize,
    /// Optional system prompt framing every generation.
    pub system: Option<String>,
}

impl ResearchRequest {
    /// Creates a request with the default step budget.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_steps: DEFAULT_RESEARCH_STEPS,
            system: None,
        }
    }

    /// Sets the step budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the system prompt.
    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }
}

/// Model listing and text generation.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Lists the identifiers of the models available to `credential`, in the
    /// provider's order.
    async fn list_models(&self, credential: &Credential) -> Result<Vec<String>>;

    /// Starts a streaming completion, yielding text deltas as they arrive.
    async fn stream_completion(
        &self,
        credential: &Credential,
        request: CompletionRequest,
    ) -> Result<TextStream>;

    /// Generates a complete response.
    ///
    /// The default implementation drains [`Provider::stream_completion`].
    async fn complete(&self, credential: &Credential, request: CompletionRequest) -> Result<String> {
        let mut stream = self.stream_completion(credential, request).await?;
        let mut text = String::new();
        while let Some(delta) = stream.next().await {
            text.push_str(&delta?);
        }
        Ok(text)
    }
}

/// Multi-step research producing a stream of tagged events.
#[async_trait::async_trait]
pub trait ResearchAgent: Send + Sync {
    /// Starts a research run for `request`.
    async fn research(
        &self,
        credential: &Credential,
        request: ResearchRequest,
    ) -> Result<AgentEventStream>;
}
