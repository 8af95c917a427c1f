//! Chat session state and the interactive front end built on it.
//!
//! This module keeps one session's transcript and model selection and runs
//! prompts against the provider. It supports:
//!
//! - A bounded transcript that evicts the oldest messages first
//! - A model picker constrained to the provider's listing
//! - Streaming responses with real-time token display
//! - An optional chain-of-thought mode backed by a research agent
//! - Slash commands for session control
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`message_log`]: validated, bounded transcript storage
//! - [`model_registry`]: available models and the current selection
//! - [`session`]: session ownership and lifecycle
//! - [`turn`]: the prompt-to-response state machine
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing
//! - [`style`]: the terminal colour scheme

pub mod commands;
pub mod config;
pub mod message_log;
pub mod model_registry;
pub mod session;
pub mod style;
pub mod turn;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_STYLE_PATH};
pub use message_log::{MAX_MESSAGES, MessageLog};
pub use model_registry::{DEFAULT_MODEL, ModelRegistry};
pub use session::{Session, SessionManager};
pub use style::{Color, Style};
pub use turn::{TurnHandler, TurnOutcome, TurnState};
