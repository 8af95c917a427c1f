use serde::{Deserialize, Serialize};

/// One step yielded by a research agent.
///
/// Research events are informational and shown to the operator; response
/// events carry the text that becomes the assistant's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum AgentEvent {
    /// Intermediate research output, displayed but never stored.
    Research(String),

    /// A piece of the final answer.
    Response(String),
}

impl AgentEvent {
    /// Creates a research event.
    pub fn research(content: impl Into<String>) -> Self {
        AgentEvent::Research(content.into())
    }

    /// Creates a response event.
    pub fn response(content: impl Into<String>) -> Self {
        AgentEvent::Response(content.into())
    }

    /// Returns the event's text.
    pub fn content(&self) -> &str {
        match self {
            AgentEvent::Research(content) | AgentEvent::Response(content) => content,
        }
    }

    /// Returns true for response events.
    pub fn is_response(&self) -> bool {
        matches!(self, AgentEvent::Response(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let event = AgentEvent::research("searching");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "research", "content": "searching"})
        );

        let event: AgentEvent =
            serde_json::from_value(serde_json::json!({"type": "response", "content": "4"}))
                .unwrap();
        assert_eq!(event, AgentEvent::response("4"));
        assert!(event.is_response());
        assert_eq!(event.content(), "4");
    }
}
