pub mod error;
pub mod traits;
pub mod types;

pub use error::LlmError;
pub use traits::{AsyncLlm, Llm};
pub use types::{
    ChatDelta, ChatDeltaIter, ChatDeltaStream, ChatMessage, ChatResponse, ChatRole,
    CompletionDelta, CompletionDeltaIter, CompletionDeltaStream, CompletionResponse, LlmMetadata,
    Tool, ToolCall, ToolChoice, ToolSelection,
};
