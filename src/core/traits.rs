use async_trait::async_trait;

use super::{
    error::LlmError,
    types::{
        ChatDeltaIter, ChatDeltaStream, ChatMessage, ChatResponse, CompletionDeltaIter,
        CompletionDeltaStream, CompletionResponse, LlmMetadata,
    },
};

/// Blocking half of the LLM capability interface.
pub trait Llm {
    fn metadata(&self) -> LlmMetadata;

    fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError>;

    fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError>;

    fn stream_complete(&self, prompt: &str) -> Result<CompletionDeltaIter, LlmError>;

    fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChatDeltaIter, LlmError>;
}

/// Non-blocking half of the LLM capability interface.
///
/// Results have the same shape as their [`Llm`] counterparts.
#[async_trait]
pub trait AsyncLlm: Send + Sync {
    async fn acomplete(&self, prompt: &str) -> Result<CompletionResponse, LlmError>;

    async fn achat(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError>;

    async fn astream_complete(&self, prompt: &str) -> Result<CompletionDeltaStream, LlmError>;

    async fn astream_chat(&self, messages: &[ChatMessage]) -> Result<ChatDeltaStream, LlmError>;
}
