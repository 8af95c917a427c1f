//! A chain-of-thought research agent built on a plain [`Provider`].
//!
//! The agent asks the model for a short plan, works through each planned
//! step, and finally synthesizes an answer from its notes. Planning and step
//! output surface as research events; the synthesized answer is the single
//! response event. Each event is produced lazily, one model call at a time,
//! as the stream is polled.

use std::sync::Arc;

use futures::stream;

use crate::error::Result;
use crate::observability::{AGENT_RESEARCH_EVENTS, AGENT_STEPS};
use crate::provider::{AgentEventStream, Credential, Provider, ResearchAgent, ResearchRequest};
use crate::types::{AgentEvent, CompletionRequest};

/// Research agent that reasons step by step with the configured provider.
pub struct ChainOfThought<P> {
    provider: Arc<P>,
}

impl<P: Provider + 'static> ChainOfThought<P> {
    /// Creates an agent that owns its provider.
    pub fn new(provider: P) -> Self {
        Self::from_arc(Arc::new(provider))
    }

    /// Creates an agent sharing a provider with other components.
    pub fn from_arc(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P: Provider + 'static> ResearchAgent for ChainOfThought<P> {
    async fn research(
        &self,
        credential: &Credential,
        request: ResearchRequest,
    ) -> Result<AgentEventStream> {
        tracing::info!(
            model = %request.model,
            max_steps = request.max_steps,
            "starting chain-of-thought research"
        );
        let run = Run {
            provider: Arc::clone(&self.provider),
            credential: credential.clone(),
            request,
            phase: Phase::Start,
            steps: Vec::new(),
            findings: Vec::new(),
        };
        Ok(Box::pin(stream::unfold(run, |mut run| async move {
            let event = run.next_event().await?;
            Some((event, run))
        })))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Plan,
    Step(usize),
    Synthesize,
    Done,
}

struct Run<P> {
    provider: Arc<P>,
    credential: Credential,
    request: ResearchRequest,
    phase: Phase,
    steps: Vec<String>,
    findings: Vec<String>,
}

impl<P: Provider> Run<P> {
    async fn next_event(&mut self) -> Option<Result<AgentEvent>> {
        let event = match self.phase {
            Phase::Start => {
                if self.request.max_steps == 0 {
                    self.phase = Phase::Synthesize;
                    AgentEvent::research("No research budget; answering directly.")
                } else {
                    self.phase = Phase::Plan;
                    AgentEvent::research(format!(
                        "Planning up to {} research steps.",
                        self.request.max_steps
                    ))
                }
            }
            Phase::Plan => {
                let plan = match self.generate(self.plan_prompt()).await {
                    Ok(plan) => plan,
                    Err(err) => return self.fail(err),
                };
                self.steps = parse_plan(&plan, self.request.max_steps);
                if self.steps.is_empty() {
                    self.steps.push(self.request.prompt.clone());
                }
                self.phase = Phase::Step(0);
                let listing = self
                    .steps
                    .iter()
                    .enumerate()
                    .map(|(i, step)| format!("{}. {step}", i + 1))
                    .collect::<Vec<_>>()
                    .join("\n");
                AgentEvent::research(format!("Plan:\n{listing}"))
            }
            Phase::Step(index) if index < self.steps.len() => {
                let finding = match self.generate(self.step_prompt(index)).await {
                    Ok(finding) => finding.trim().to_string(),
                    Err(err) => return self.fail(err),
                };
                AGENT_STEPS.click();
                let event = AgentEvent::research(format!(
                    "Step {}/{}: {}\n{finding}",
                    index + 1,
                    self.steps.len(),
                    self.steps[index]
                ));
                self.findings.push(finding);
                self.phase = Phase::Step(index + 1);
                event
            }
            Phase::Step(_) | Phase::Synthesize => {
                let answer = match self.generate(self.synthesis_prompt()).await {
                    Ok(answer) => answer,
                    Err(err) => return self.fail(err),
                };
                self.phase = Phase::Done;
                tracing::debug!(steps = self.findings.len(), "research complete");
                return Some(Ok(AgentEvent::response(answer.trim())));
            }
            Phase::Done => return None,
        };
        AGENT_RESEARCH_EVENTS.click();
        Some(Ok(event))
    }

    fn fail(&mut self, err: crate::Error) -> Option<Result<AgentEvent>> {
        tracing::warn!(error = %err, "research step failed");
        self.phase = Phase::Done;
        Some(Err(err))
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let request = CompletionRequest::new(self.request.model.clone(), prompt)
            .with_system(self.request.system.as_deref());
        self.provider.complete(&self.credential, request).await
    }

    fn plan_prompt(&self) -> String {
        format!(
            "Break the following question into at most {} short research steps. \
             Reply with one step per line and nothing else.\n\nQuestion: {}",
            self.request.max_steps, self.request.prompt
        )
    }

    fn step_prompt(&self, index: usize) -> String {
        format!(
            "Question: {}\n\nNotes so far:\n{}\n\nWork through this step and report what you \
             found in a few sentences: {}",
            self.request.prompt,
            self.notes(),
            self.steps[index]
        )
    }

    fn synthesis_prompt(&self) -> String {
        if self.findings.is_empty() {
            return self.request.prompt.clone();
        }
        format!(
            "Question: {}\n\nResearch notes:\n{}\n\nUsing the notes, write the final answer to \
             the question.",
            self.request.prompt,
            self.notes()
        )
    }

    fn notes(&self) -> String {
        if self.findings.is_empty() {
            return "(none yet)".to_string();
        }
        self.steps
            .iter()
            .zip(self.findings.iter())
            .map(|(step, finding)| format!("- {step}: {finding}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parses a model-written plan into at most `max_steps` steps.
///
/// Blank lines are dropped, as are list markers such as `-`, `*`, `1.`,
/// `2)` and `Step 3:`.
fn parse_plan(plan: &str, max_steps: usize) -> Vec<String> {
    plan.lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .take(max_steps)
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line
        .strip_prefix(['-', '*', '\u{2022}'])
        .unwrap_or(line)
        .trim_start();
    let line = match line.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("step ") => &line[5..],
        _ => line,
    };
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(['.', ')', ':']) {
            return rest.trim();
        }
    }
    line.trim()
}
