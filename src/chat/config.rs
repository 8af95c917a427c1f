//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::chat::message_log::MAX_MESSAGES;
use crate::chat::model_registry::DEFAULT_MODEL;
use crate::provider::{Credential, DEFAULT_RESEARCH_STEPS};

/// Where the style sheet is looked for unless overridden.
pub const DEFAULT_STYLE_PATH: &str = ".retrochat/style.yaml";

/// Command-line arguments for the retrochat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model selected at startup.
    #[arrrg(optional, "Model to use (default: llama2-70b-4096)", "MODEL")]
    pub model: Option<String>,

    /// System prompt sent ahead of every request.
    #[arrrg(optional, "System prompt for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: provider limit)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Provider endpoint override.
    #[arrrg(optional, "Base URL of the OpenAI-compatible API", "URL")]
    pub base_url: Option<String>,

    /// Style sheet location.
    #[arrrg(optional, "Style sheet path (default: .retrochat/style.yaml)", "PATH")]
    pub style: Option<String>,

    /// Transcript bound.
    #[arrrg(optional, "Messages kept in the transcript (default: 100)", "COUNT")]
    pub max_messages: Option<usize>,

    /// Research step budget for chain-of-thought mode.
    #[arrrg(optional, "Research steps in chain-of-thought mode (default: 25)", "STEPS")]
    pub research_steps: Option<usize>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Start with chain-of-thought mode on.
    #[arrrg(flag, "Start in chain-of-thought mode")]
    pub chain_of_thought: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model selected when the session starts.
    pub model: String,

    /// Optional system prompt sent ahead of every request.
    pub system_prompt: Option<String>,

    /// Maximum tokens per response; `None` leaves the limit to the provider.
    pub max_tokens: Option<u32>,

    /// Provider credential the session starts with.
    pub credential: Option<Credential>,

    /// Provider endpoint; `None` uses the public Groq API.
    pub base_url: Option<String>,

    /// HTTP request timeout; `None` uses the client default.
    pub timeout: Option<Duration>,

    /// Maximum number of messages kept in the transcript.
    pub max_messages: usize,

    /// Step budget for chain-of-thought research.
    pub max_research_steps: usize,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether chain-of-thought mode starts enabled.
    pub chain_of_thought: bool,

    /// Style sheet location.
    pub style_path: PathBuf,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: llama2-70b-4096
    /// - No credential
    /// - Transcript bound: 100 messages
    /// - Research steps: 25
    /// - Color: enabled
    /// - Chain of thought: disabled
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_tokens: None,
            credential: None,
            base_url: None,
            timeout: None,
            max_messages: MAX_MESSAGES,
            max_research_steps: DEFAULT_RESEARCH_STEPS,
            use_color: true,
            chain_of_thought: false,
            style_path: PathBuf::from(DEFAULT_STYLE_PATH),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the starting credential.
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Sets the provider endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the transcript bound.
    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages;
        self
    }

    /// Sets the research step budget.
    pub fn with_research_steps(mut self, steps: usize) -> Self {
        self.max_research_steps = steps;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets whether chain-of-thought mode starts enabled.
    pub fn with_chain_of_thought(mut self, enabled: bool) -> Self {
        self.chain_of_thought = enabled;
        self
    }

    /// Sets the style sheet location.
    pub fn with_style_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.style_path = path.into();
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            model: args
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.model),
            system_prompt: args.system.filter(|s| !s.trim().is_empty()),
            max_tokens: args.max_tokens.filter(|&n| n > 0),
            credential: None,
            base_url: args.base_url,
            timeout: args.timeout.map(Duration::from_secs),
            max_messages: args.max_messages.unwrap_or(MAX_MESSAGES),
            max_research_steps: args.research_steps.unwrap_or(DEFAULT_RESEARCH_STEPS),
            use_color: !args.no_color,
            chain_of_thought: args.chain_of_thought,
            style_path: args
                .style
                .map(PathBuf::from)
                .unwrap_or(defaults.style_path),
        }
    }
}
