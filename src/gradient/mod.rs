//! Minimal client for the DigitalOcean Gradient inference API.
//!
//! Transport, retries and authentication live here. The adapter in
//! [`crate::provider::gradient`] only constructs clients through a
//! [`Connector`] and calls `create`/`create_stream` on them.

pub(crate) mod async_client;
pub(crate) mod client;
pub(crate) mod http;
pub(crate) mod options;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod stream;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

pub use async_client::AsyncGradient;
pub use client::Gradient;
pub use http::{HttpClientConfig, SDK_USER_AGENT};
pub use options::ClientOptions;
pub use request::{
    ChatCompletionRequest, FunctionCall, FunctionDefinition, FunctionTool, NamedFunction,
    NamedToolChoice, RequestMessage, ToolCallPayload, ToolChoice, ToolMode,
};
pub use response::{
    ChatCompletion, ChatCompletionChunk, Choice, ChunkChoice, ChunkDelta, ChunkFunctionCall,
    ChunkToolCall, ResponseMessage, Usage,
};

use crate::core::LlmError;

pub type ChunkIter = Box<dyn Iterator<Item = Result<ChatCompletionChunk, LlmError>> + Send>;
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, LlmError>> + Send>>;

/// Chat completions over a blocking client.
pub trait ChatCompletions {
    fn create(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, LlmError>;

    fn create_stream(&self, request: &ChatCompletionRequest) -> Result<ChunkIter, LlmError>;
}

/// Chat completions over an async client.
#[async_trait]
pub trait AsyncChatCompletions: Send + Sync {
    async fn create(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, LlmError>;

    async fn create_stream(&self, request: &ChatCompletionRequest)
    -> Result<ChunkStream, LlmError>;
}

/// Builds client handles. Called once per handle; implementations must not cache.
pub trait Connector: Send + Sync {
    type Client: ChatCompletions;
    type AsyncClient: AsyncChatCompletions;

    fn connect(&self, options: ClientOptions) -> Result<Self::Client, LlmError>;

    fn connect_async(&self, options: ClientOptions) -> Result<Self::AsyncClient, LlmError>;
}

/// Connects to the real API with [`Gradient`] and [`AsyncGradient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    type Client = Gradient;
    type AsyncClient = AsyncGradient;

    fn connect(&self, options: ClientOptions) -> Result<Gradient, LlmError> {
        Gradient::new(options)
    }

    fn connect_async(&self, options: ClientOptions) -> Result<AsyncGradient, LlmError> {
        AsyncGradient::new(options)
    }
}
