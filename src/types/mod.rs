// Public modules
pub mod agent_event;
pub mod chat_message;
pub mod completion;
pub mod model_list;
pub mod role;

// Re-exports
pub use agent_event::AgentEvent;
pub use chat_message::ChatMessage;
pub use completion::{
    ChunkChoice, ChunkDelta, CompletionChunk, CompletionMessage, CompletionRequest,
    completion_text,
};
pub use model_list::model_ids_from_value;
pub use role::Role;
