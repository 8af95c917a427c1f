//! A retro terminal chat client for Groq's hosted models.
//!
//! The heart of the crate is [`chat::SessionManager`], which owns one
//! session's bounded transcript and model selection, and
//! [`chat::TurnHandler`], which runs a prompt through the [`Groq`] client or
//! the [`ChainOfThought`] research agent and records the reply.

// Public modules
pub mod agent;
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod provider;
pub mod render;
pub mod sse;
pub mod types;
pub mod utils;

// Re-exports
pub use agent::ChainOfThought;
pub use client::Groq;
pub use error::{Error, Result};
pub use observability::{CounterSnapshot, register_biometrics, snapshot};
pub use provider::{
    AgentEventStream, CREDENTIAL_ENV_VAR, Credential, DEFAULT_RESEARCH_STEPS, Provider,
    ResearchAgent, ResearchRequest, TextStream,
};
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
