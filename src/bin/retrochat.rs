//! Retro terminal chat with Groq-hosted models.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage; the key comes from GROQ_API_KEY or a .env file
//! retrochat
//!
//! # Pick a model, a system prompt and a response limit
//! retrochat --model mixtral-8x7b-32768 --system "You are a terse assistant" --max-tokens 512
//!
//! # Start in chain-of-thought mode with a small research budget
//! retrochat --chain-of-thought --research-steps 5
//!
//! # Disable colors (useful for piping output)
//! retrochat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/key <api-key>` - Supply the Groq API key
//! - `/models`, `/refresh`, `/model <name>` - Inspect and pick models
//! - `/cot on|off` - Toggle chain-of-thought mode
//! - `/history`, `/stats`, `/reset` - Inspect or restart the session
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use retrochat::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, Session, SessionManager,
    Style, TurnHandler, help_text, parse_command,
};
use retrochat::{ChainOfThought, Credential, Groq, Provider};

/// Main entry point for the retrochat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "could not load .env file"),
    }

    let (args, _) = ChatArgs::from_command_line_relaxed("retrochat [OPTIONS]");
    let config = ChatConfig::from(args).with_credential(Credential::from_env());
    let style = Style::load(&config.style_path)?;

    let provider = Arc::new(Groq::with_options(
        config.base_url.as_deref(),
        config.timeout,
    )?);
    let agent = ChainOfThought::from_arc(Arc::clone(&provider));
    let handler = TurnHandler::new(&*provider, &agent)
        .with_system_prompt(config.system_prompt.clone())
        .with_max_tokens(config.max_tokens)
        .with_research_steps(config.max_research_steps);

    let mut sessions = SessionManager::from_config(&config);
    sessions.initialize();
    let mut renderer = PlainTextRenderer::with_style(style, config.use_color);
    let mut chain_of_thought = config.chain_of_thought;
    let mut rl = DefaultEditor::new()?;

    renderer.print_banner();
    if sessions.get_state().credential().is_some() {
        refresh_models(sessions.get_state(), &*provider, &mut renderer).await;
    } else {
        renderer.print_info("Enter your Groq API key with /key <api-key>.");
    }
    renderer.print_info(&format!(
        "Current model: {}",
        sessions.get_state().models().selected()
    ));
    renderer.print_info("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("] ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    if !matches!(cmd, ChatCommand::Key(_)) {
                        let _ = rl.add_history_entry(line);
                    }
                    match cmd {
                        ChatCommand::Quit => {
                            renderer.print_info("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                renderer.print_info(&format!("    {line}"));
                            }
                        }
                        ChatCommand::Key(credential) => {
                            let session = sessions.get_state();
                            session.set_credential(Some(credential));
                            renderer.print_info("API key set.");
                            refresh_models(session, &*provider, &mut renderer).await;
                        }
                        ChatCommand::Models => {
                            let models = sessions.get_state().models();
                            for (index, model) in models.available().iter().enumerate() {
                                let marker = if index == models.selected_index() {
                                    "*"
                                } else {
                                    " "
                                };
                                renderer.print_info(&format!("  {marker} {model}"));
                            }
                        }
                        ChatCommand::Refresh => {
                            refresh_models(sessions.get_state(), &*provider, &mut renderer)
                                .await;
                        }
                        ChatCommand::Model(model) => match sessions.set_selected_model(&model) {
                            Ok(()) => renderer.print_info(&format!("Model changed to: {model}")),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::ChainOfThought(enabled) => {
                            chain_of_thought = enabled;
                            if enabled {
                                renderer.print_info("Chain of thought enabled.");
                            } else {
                                renderer.print_info("Chain of thought disabled.");
                            }
                        }
                        ChatCommand::History => {
                            let session = sessions.get_state();
                            if session.log().is_empty() {
                                renderer.print_info("(no messages)");
                            }
                            for message in session.log() {
                                renderer.print_message(message);
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(sessions.get_state(), chain_of_thought, &mut renderer);
                        }
                        ChatCommand::Reset => {
                            sessions.reset();
                            sessions.initialize();
                            renderer.print_info("Session reset.");
                            renderer.print_info("]READY");
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                let _ = rl.add_history_entry(line);
                if let Err(err) = handler
                    .handle(sessions.get_state(), line, chain_of_thought, &mut renderer)
                    .await
                {
                    renderer.print_error(&err.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                renderer.print_info("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

async fn refresh_models(
    session: &mut Session,
    provider: &dyn Provider,
    renderer: &mut PlainTextRenderer,
) {
    match session.refresh_models(provider).await {
        Ok(count) => renderer.print_info(&format!(
            "Loaded {count} models (selected: {}).",
            session.models().selected()
        )),
        Err(err) => renderer.print_error(&format!("Could not load models: {err}")),
    }
}

fn print_stats(session: &Session, chain_of_thought: bool, renderer: &mut PlainTextRenderer) {
    let counters = retrochat::snapshot();
    let lines = [
        "    Session Statistics:".to_string(),
        format!("      Model: {}", session.models().selected()),
        format!("      Available models: {}", session.models().available().len()),
        format!(
            "      Messages: {}/{}",
            session.log().len(),
            session.log().capacity()
        ),
        format!(
            "      Chain of thought: {}",
            if chain_of_thought { "on" } else { "off" }
        ),
        format!(
            "      API key: {}",
            if session.credential().is_some() {
                "set"
            } else {
                "(none)"
            }
        ),
        format!(
            "      Turns: {} started / {} completed / {} failed",
            counters.turns_started, counters.turns_completed, counters.turns_failed
        ),
        format!(
            "      Messages appended: {} ({} evicted)",
            counters.messages_appended, counters.messages_evicted
        ),
        format!("      API requests: {}", counters.client_requests),
    ];
    for line in lines {
        renderer.print_info(&line);
    }
}
