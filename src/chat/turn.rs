//! One prompt-to-response exchange.
//!
//! A turn moves through `Idle -> UserSubmitted -> AwaitingResponse` and ends
//! either `Completed` with the assistant reply stored, or `Failed` with the
//! user message kept and nothing else stored. Turns run one at a time.

use std::fmt;
use std::time::Instant;

use futures::StreamExt;

use crate::chat::session::Session;
use crate::error::{Error, Result};
use crate::observability::{TURN_DURATION, TURNS_COMPLETED, TURNS_FAILED, TURNS_STARTED};
use crate::provider::{
    Credential, DEFAULT_RESEARCH_STEPS, Provider, ResearchAgent, ResearchRequest,
};
use crate::render::Renderer;
use crate::types::{AgentEvent, CompletionRequest, Role};

/// Where a turn is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    UserSubmitted,
    AwaitingResponse,
    Completed,
    Failed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::Idle => "idle",
            TurnState::UserSubmitted => "user_submitted",
            TurnState::AwaitingResponse => "awaiting_response",
            TurnState::Completed => "completed",
            TurnState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a turn that got past validation ended.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The reply was stored as an assistant message.
    Completed {
        /// The stored reply.
        response: String,
    },
    /// No reply was stored. The error has already been rendered.
    Failed {
        /// Why the turn failed.
        error: Error,
    },
}

impl TurnOutcome {
    /// The terminal state this outcome represents.
    pub fn state(&self) -> TurnState {
        match self {
            TurnOutcome::Completed { .. } => TurnState::Completed,
            TurnOutcome::Failed { .. } => TurnState::Failed,
        }
    }

    /// Returns true when a reply was stored.
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }

    /// The stored reply, if any.
    pub fn response(&self) -> Option<&str> {
        match self {
            TurnOutcome::Completed { response } => Some(response),
            TurnOutcome::Failed { .. } => None,
        }
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            TurnOutcome::Completed { .. } => None,
            TurnOutcome::Failed { error } => Some(error),
        }
    }
}

/// Runs turns against a provider and a research agent.
pub struct TurnHandler<'a> {
    provider: &'a dyn Provider,
    agent: &'a dyn ResearchAgent,
    system_prompt: Option<String>,
    max_tokens: Option<u32>,
    max_research_steps: usize,
}

impl<'a> TurnHandler<'a> {
    /// Creates a handler with no system prompt and the default step budget.
    pub fn new(provider: &'a dyn Provider, agent: &'a dyn ResearchAgent) -> Self {
        Self {
            provider,
            agent,
            system_prompt: None,
            max_tokens: None,
            max_research_steps: DEFAULT_RESEARCH_STEPS,
        }
    }

    /// Sets the system prompt sent ahead of each request.
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt.filter(|s| !s.trim().is_empty());
        self
    }

    /// Caps the length of direct replies.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the chain-of-thought step budget.
    pub fn with_research_steps(mut self, steps: usize) -> Self {
        self.max_research_steps = steps;
        self
    }

    /// Runs one turn.
    ///
    /// The prompt is stored as a user message first. With
    /// `use_chain_of_thought` set, the research agent answers and its
    /// research events are rendered but not stored; otherwise the provider's
    /// streamed reply is rendered as it arrives.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the prompt itself is rejected, in
    /// which case nothing is stored. Every later failure is rendered and
    /// reported as [`TurnOutcome::Failed`].
    pub async fn handle(
        &self,
        session: &mut Session,
        prompt: &str,
        use_chain_of_thought: bool,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome> {
        let mut state = TurnState::Idle;
        session.log_mut().append(Role::User, prompt)?;
        advance(&mut state, TurnState::UserSubmitted);
        TURNS_STARTED.click();
        let start = Instant::now();
        let prompt = prompt.trim();

        let Some(credential) = session.credential().cloned() else {
            let error = Error::missing_credential("enter your Groq API key with /key <key>");
            return Ok(self.fail(&mut state, error, start, renderer));
        };
        let model = session.models().selected().to_string();

        advance(&mut state, TurnState::AwaitingResponse);
        let generated = if use_chain_of_thought {
            self.research(&credential, prompt, &model, renderer).await
        } else {
            self.generate(&credential, prompt, &model, renderer).await
        };
        renderer.finish_response();

        let stored = generated.and_then(|response| {
            session.log_mut().append(Role::Assistant, &response)?;
            Ok(session
                .log()
                .last()
                .map(|message| message.content().to_string())
                .unwrap_or(response))
        });
        match stored {
            Ok(response) => {
                advance(&mut state, TurnState::Completed);
                TURNS_COMPLETED.click();
                TURN_DURATION.add(start.elapsed().as_secs_f64());
                tracing::info!(
                    model = %model,
                    chain_of_thought = use_chain_of_thought,
                    chars = response.len(),
                    "turn completed"
                );
                Ok(TurnOutcome::Completed { response })
            }
            Err(error) => Ok(self.fail(&mut state, error, start, renderer)),
        }
    }

    async fn generate(
        &self,
        credential: &Credential,
        prompt: &str,
        model: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        let request = CompletionRequest::new(model, prompt)
            .with_system(self.system_prompt.as_deref())
            .with_max_tokens(self.max_tokens);
        let mut stream = self.provider.stream_completion(credential, request).await?;
        let mut response = String::new();
        while let Some(delta) = stream.next().await {
            let delta = delta?;
            renderer.print_text(&delta);
            response.push_str(&delta);
        }
        Ok(response)
    }

    async fn research(
        &self,
        credential: &Credential,
        prompt: &str,
        model: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        renderer.print_info("Processing with chain of thought...");
        let request = ResearchRequest::new(prompt, model)
            .with_max_steps(self.max_research_steps)
            .with_system(self.system_prompt.clone());
        let mut events = self.agent.research(credential, request).await?;
        let mut responses: Vec<String> = Vec::new();
        while let Some(event) = events.next().await {
            match event? {
                AgentEvent::Research(text) => renderer.print_research(&text),
                AgentEvent::Response(text) => {
                    if !responses.is_empty() {
                        renderer.print_text("\n");
                    }
                    renderer.print_text(&text);
                    responses.push(text);
                }
            }
        }
        Ok(responses.join("\n"))
    }

    fn fail(
        &self,
        state: &mut TurnState,
        error: Error,
        start: Instant,
        renderer: &mut dyn Renderer,
    ) -> TurnOutcome {
        advance(state, TurnState::Failed);
        TURNS_FAILED.click();
        TURN_DURATION.add(start.elapsed().as_secs_f64());
        if error.is_missing_credential() {
            tracing::warn!(error = %error, "turn needs a credential");
        } else {
            tracing::error!(error = %error, "chat handling error");
        }
        renderer.print_error(&format!("Error processing message: {error}"));
        TurnOutcome::Failed { error }
    }
}

fn advance(state: &mut TurnState, next: TurnState) {
    tracing::trace!(from = %state, to = %next, "turn transition");
    *state = next;
}
