//! End-to-end chat turns through the public API, with scripted providers.

use std::io;
use std::sync::{Arc, Mutex};

use futures::stream;

use retrochat::chat::{ChatConfig, PlainTextRenderer, SessionManager, Style, TurnHandler};
use retrochat::{
    AgentEvent, AgentEventStream, ChainOfThought, CompletionRequest, Credential, Error, Provider,
    ResearchAgent, ResearchRequest, Result, Role, TextStream,
};

/// Replies to every completion with the next scripted reply.
struct ScriptedProvider {
    replies: Mutex<Vec<Result<String>>>,
    models: Vec<String>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            models: vec!["llama3-8b-8192".to_string(), "mixtral-8x7b-32768".to_string()],
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    async fn list_models(&self, _: &Credential) -> Result<Vec<String>> {
        Ok(self.models.clone())
    }

    async fn stream_completion(
        &self,
        _: &Credential,
        _: CompletionRequest,
    ) -> Result<TextStream> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(Error::service_unavailable("no reply scripted", None)))?;
        Ok(Box::pin(stream::iter(vec![Ok(reply)])))
    }
}

struct ScriptedAgent(Vec<AgentEvent>);

#[async_trait::async_trait]
impl ResearchAgent for ScriptedAgent {
    async fn research(&self, _: &Credential, _: ResearchRequest) -> Result<AgentEventStream> {
        Ok(Box::pin(stream::iter(
            self.0.clone().into_iter().map(Ok).collect::<Vec<_>>(),
        )))
    }
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn renderer() -> (PlainTextRenderer, Captured, Captured) {
    let out = Captured::default();
    let err = Captured::default();
    let renderer = PlainTextRenderer::with_writers(
        Box::new(out.clone()),
        Box::new(err.clone()),
        Style::default(),
        false,
    );
    (renderer, out, err)
}

fn sessions() -> SessionManager {
    SessionManager::from_config(&ChatConfig::new().with_credential(Credential::new("gsk_test")))
}

fn transcript(sessions: &mut SessionManager) -> Vec<(Role, String)> {
    sessions
        .get_state()
        .log()
        .iter()
        .map(|m| (m.role(), m.content().to_string()))
        .collect()
}

#[tokio::test]
async fn failed_generation_keeps_the_prompt_and_shows_an_error() {
    let provider = ScriptedProvider::new(vec![Err(Error::internal_server(
        "model overloaded",
        None,
    ))]);
    let agent = ScriptedAgent(Vec::new());
    let handler = TurnHandler::new(&provider, &agent);
    let mut sessions = sessions();
    let (mut renderer, _, err) = renderer();

    let outcome = handler
        .handle(sessions.get_state(), "Hello", false, &mut renderer)
        .await
        .unwrap();

    assert!(!outcome.is_completed());
    assert_eq!(
        transcript(&mut sessions),
        vec![(Role::User, "Hello".to_string())]
    );
    assert!(err.text().contains("model overloaded"));
}

#[tokio::test]
async fn successful_generation_records_the_exchange() {
    let provider = ScriptedProvider::new(vec![Ok("4".to_string())]);
    let agent = ScriptedAgent(Vec::new());
    let handler = TurnHandler::new(&provider, &agent);
    let mut sessions = sessions();
    let (mut renderer, out, _) = renderer();

    handler
        .handle(sessions.get_state(), "2+2?", false, &mut renderer)
        .await
        .unwrap();

    assert_eq!(
        transcript(&mut sessions),
        vec![
            (Role::User, "2+2?".to_string()),
            (Role::Assistant, "4".to_string())
        ]
    );
    assert!(out.text().contains('4'));
}

#[tokio::test]
async fn chain_of_thought_stores_only_responses() {
    let provider = ScriptedProvider::new(Vec::new());
    let agent = ScriptedAgent(vec![
        AgentEvent::research("searching"),
        AgentEvent::response("step1"),
        AgentEvent::response("step2"),
    ]);
    let handler = TurnHandler::new(&provider, &agent);
    let mut sessions = sessions();
    let (mut renderer, out, _) = renderer();

    handler
        .handle(sessions.get_state(), "Why is the sky blue?", true, &mut renderer)
        .await
        .unwrap();

    let transcript = transcript(&mut sessions);
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1], (Role::Assistant, "step1\nstep2".to_string()));
    assert!(out.text().contains("[research] searching"));
}

#[tokio::test]
async fn bundled_agent_runs_through_a_turn() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok("1. Recall Rayleigh scattering".to_string()),
        Ok("Shorter wavelengths scatter more.".to_string()),
        Ok("Blue light scatters most.".to_string()),
    ]));
    let agent = ChainOfThought::from_arc(Arc::clone(&provider));
    let handler = TurnHandler::new(&*provider, &agent).with_research_steps(3);
    let mut sessions = sessions();
    let (mut renderer, out, _) = renderer();

    let outcome = handler
        .handle(sessions.get_state(), "Why is the sky blue?", true, &mut renderer)
        .await
        .unwrap();

    assert_eq!(outcome.response(), Some("Blue light scatters most."));
    assert!(out.text().contains("Step 1/1: Recall Rayleigh scattering"));
    assert_eq!(sessions.get_state().log().len(), 2);
}

#[tokio::test]
async fn refreshed_models_constrain_selection() {
    let provider = ScriptedProvider::new(Vec::new());
    let mut sessions = sessions();

    sessions
        .get_state()
        .refresh_models(&provider)
        .await
        .unwrap();
    assert_eq!(sessions.get_state().models().selected(), "llama3-8b-8192");

    sessions.set_selected_model("mixtral-8x7b-32768").unwrap();
    let err = sessions.set_selected_model("gpt-4").unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        sessions.get_state().models().selected(),
        "mixtral-8x7b-32768"
    );
}

#[tokio::test]
async fn reset_discards_the_transcript() {
    let provider = ScriptedProvider::new(vec![Ok("hi".to_string())]);
    let agent = ScriptedAgent(Vec::new());
    let handler = TurnHandler::new(&provider, &agent);
    let mut sessions = sessions();
    let (mut renderer, _, _) = renderer();

    handler
        .handle(sessions.get_state(), "hello", false, &mut renderer)
        .await
        .unwrap();
    assert_eq!(sessions.get_state().log().len(), 2);

    sessions.reset();
    assert!(sessions.get_state().log().is_empty());
    assert!(sessions.get_state().credential().is_some());
}
