//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the API.

use crate::provider::Credential;

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Use a new provider credential.
    Key(Credential),

    /// List the available models.
    Models,

    /// Re-list the available models from the provider.
    Refresh,

    /// Select a model.
    Model(String),

    /// Turn chain-of-thought mode on or off.
    ChainOfThought(bool),

    /// Print the transcript.
    History,

    /// Display session statistics (message count, current model, etc.).
    Stats,

    /// Discard the session and start over.
    Reset,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use retrochat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model mixtral-8x7b-32768").is_some());
/// assert!(parse_command("What is 2+2?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "key" => match argument.and_then(Credential::new) {
            Some(credential) => ChatCommand::Key(credential),
            None => ChatCommand::Invalid("/key requires an API key".to_string()),
        },
        "models" => ChatCommand::Models,
        "refresh" => ChatCommand::Refresh,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "cot" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::ChainOfThought(value),
            None => ChatCommand::Invalid("/cot expects 'on' or 'off'".to_string()),
        },
        "history" => ChatCommand::History,
        "stats" | "status" => ChatCommand::Stats,
        "reset" | "clear" => ChatCommand::Reset,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /key <api-key>         Use a Groq API key for this session
  /models                List the available models
  /refresh               Re-list models from the provider
  /model <name>          Select a model (e.g., /model mixtral-8x7b-32768)
  /cot on|off            Use chain of thought for new prompts
  /history               Show the conversation so far
  /stats                 Show session statistics
  /reset                 Start a fresh session
  /help                  Show this help message
  /quit                  Exit the chat"#
}
