//! Gradient adapter for the [`Llm`] / [`AsyncLlm`] interfaces.
//!
//! Every operation builds a fresh client handle through the configured
//! [`Connector`], issues one request and converts the result. Nothing is
//! cached between calls and no retry happens at this layer.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value};

use crate::core::{
    AsyncLlm, ChatDelta, ChatDeltaIter, ChatDeltaStream, ChatMessage, ChatResponse, ChatRole,
    CompletionDelta, CompletionDeltaIter, CompletionDeltaStream, CompletionResponse, Llm,
    LlmError, LlmMetadata, Tool, ToolCall, ToolChoice,
};
use crate::gradient::{
    self, AsyncChatCompletions, ChatCompletion, ChatCompletionChunk, ChatCompletionRequest,
    ChatCompletions, ChunkToolCall, ClientOptions, Connector, HttpConnector, RequestMessage,
};
use crate::provider::constants::gradient as defaults;

/// Package name sent as `user_agent_package` on every client construction.
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

/// Package version sent as `user_agent_version` on every client construction.
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, PartialEq)]
pub struct GradientAiConfig {
    pub model: String,
    pub model_access_key: String,
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout: Option<f64>,
    pub max_retries: Option<u32>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub context_window: u32,
    /// Extra request body parameters, merged into every request.
    pub additional_kwargs: Map<String, Value>,
}

impl GradientAiConfig {
    pub fn new(model: impl Into<String>, model_access_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            model_access_key: model_access_key.into(),
            base_url: None,
            timeout: None,
            max_retries: None,
            temperature: defaults::DEFAULT_TEMPERATURE,
            max_tokens: None,
            top_p: None,
            context_window: defaults::DEFAULT_CONTEXT_WINDOW,
            additional_kwargs: Map::new(),
        }
    }

    /// Read the access key and optional base URL from the environment.
    pub fn from_env(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::from_lookup(model, |name| std::env::var(name).ok())
    }

    fn from_lookup(
        model: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LlmError> {
        let model_access_key = lookup(defaults::MODEL_ACCESS_KEY_ENV_VAR).ok_or_else(|| {
            LlmError::ProviderConfiguration(format!(
                "{} not set.",
                defaults::MODEL_ACCESS_KEY_ENV_VAR
            ))
        })?;

        let mut config = Self::new(model, model_access_key);
        config.base_url = lookup(defaults::BASE_URL_ENV_VAR).filter(|url| !url.is_empty());
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_context_window(mut self, context_window: u32) -> Self {
        self.context_window = context_window;
        self
    }

    pub fn with_additional_kwargs(mut self, additional_kwargs: Map<String, Value>) -> Self {
        self.additional_kwargs = additional_kwargs;
        self
    }

    fn validate(&self) -> Result<(), LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::ProviderConfiguration(
                "Model not set".to_string(),
            ));
        }

        if self.model_access_key.trim().is_empty() {
            return Err(LlmError::ProviderConfiguration(
                "Model access key not set".to_string(),
            ));
        }

        if let Some(timeout) = self.timeout {
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err(LlmError::ProviderConfiguration(format!(
                    "Timeout must be a positive number of seconds, got {timeout}"
                )));
            }
        }

        if let Some(base_url) = &self.base_url {
            reqwest::Url::parse(base_url).map_err(|e| {
                LlmError::ProviderConfiguration(format!("Invalid base URL '{base_url}': {e}"))
            })?;
        }

        Ok(())
    }
}

// Keeps the access key out of logs.
impl std::fmt::Debug for GradientAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientAiConfig")
            .field("model", &self.model)
            .field("model_access_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("context_window", &self.context_window)
            .field("additional_kwargs", &self.additional_kwargs)
            .finish()
    }
}

/// A Gradient chat model.
pub struct GradientAi<C: Connector = HttpConnector> {
    config: GradientAiConfig,
    connector: C,
}

impl GradientAi {
    pub fn new(config: GradientAiConfig) -> Result<Self, LlmError> {
        Self::with_connector(config, HttpConnector)
    }
}

impl<C: Connector> GradientAi<C> {
    /// Use `connector` instead of the HTTP clients.
    pub fn with_connector(config: GradientAiConfig, connector: C) -> Result<Self, LlmError> {
        config.validate()?;
        Ok(Self { config, connector })
    }

    pub fn config(&self) -> &GradientAiConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Constructor arguments for both client kinds.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            model_access_key: self.config.model_access_key.clone(),
            base_url: self.config.base_url.clone(),
            timeout: self.config.timeout,
            max_retries: self.config.max_retries,
            user_agent_package: Some(PACKAGE_NAME.to_string()),
            user_agent_version: Some(PACKAGE_VERSION.to_string()),
        }
    }

    /// A new blocking client. Every call constructs a new one.
    pub fn client(&self) -> Result<C::Client, LlmError> {
        self.connector.connect(self.client_options())
    }

    /// A new async client. Every call constructs a new one.
    pub fn async_client(&self) -> Result<C::AsyncClient, LlmError> {
        self.connector.connect_async(self.client_options())
    }

    /// Blocking chat with function tools attached.
    #[tracing::instrument(
        name = "gradient_chat_with_tools",
        skip(self, messages, tools, tool_choice),
        fields(model = %self.config.model, tools = tools.len()),
        err
    )]
    pub fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[Tool],
        tool_choice: Option<&ToolChoice>,
    ) -> Result<ChatResponse, LlmError> {
        let request = self.tool_request(messages, tools, tool_choice);
        chat_response(self.client()?.create(&request)?)
    }

    /// Async chat with function tools attached.
    #[tracing::instrument(
        name = "gradient_achat_with_tools",
        skip(self, messages, tools, tool_choice),
        fields(model = %self.config.model, tools = tools.len()),
        err
    )]
    pub async fn achat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[Tool],
        tool_choice: Option<&ToolChoice>,
    ) -> Result<ChatResponse, LlmError> {
        let request = self.tool_request(messages, tools, tool_choice);
        chat_response(self.async_client()?.create(&request).await?)
    }

    fn request(&self, messages: &[ChatMessage], stream: bool) -> ChatCompletionRequest {
        let mut request = ChatCompletionRequest::new(
            self.config.model.clone(),
            messages.iter().map(request_message).collect(),
        );
        request.temperature = Some(self.config.temperature);
        request.max_tokens = self.config.max_tokens;
        request.top_p = self.config.top_p;
        request.stream = stream;
        request.extra = self.config.additional_kwargs.clone();
        request
    }

    fn tool_request(
        &self,
        messages: &[ChatMessage],
        tools: &[Tool],
        tool_choice: Option<&ToolChoice>,
    ) -> ChatCompletionRequest {
        let mut request = self.request(messages, false);
        if !tools.is_empty() {
            request.tools = Some(tools.iter().map(function_tool).collect());
            request.tool_choice = tool_choice.map(wire_tool_choice);
        }
        request
    }
}

impl<C: Connector> Llm for GradientAi<C> {
    fn metadata(&self) -> LlmMetadata {
        LlmMetadata {
            model_name: self.config.model.clone(),
            context_window: self.config.context_window,
            num_output: self.config.max_tokens,
            is_chat_model: true,
            is_function_calling_model: true,
        }
    }

    #[tracing::instrument(
        name = "gradient_complete",
        skip(self, prompt),
        fields(model = %self.config.model),
        err
    )]
    fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let request = self.request(&[ChatMessage::user(prompt)], false);
        completion_response(self.client()?.create(&request)?)
    }

    #[tracing::instrument(
        name = "gradient_chat",
        skip(self, messages),
        fields(model = %self.config.model, messages = messages.len()),
        err
    )]
    fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError> {
        let request = self.request(messages, false);
        chat_response(self.client()?.create(&request)?)
    }

    fn stream_complete(&self, prompt: &str) -> Result<CompletionDeltaIter, LlmError> {
        let request = self.request(&[ChatMessage::user(prompt)], true);
        let chunks = self.client()?.create_stream(&request)?;

        let mut text = String::new();
        Ok(Box::new(chunks.map(move |chunk| {
            chunk.map(|chunk| completion_delta(&mut text, &chunk))
        })))
    }

    fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChatDeltaIter, LlmError> {
        let request = self.request(messages, true);
        let chunks = self.client()?.create_stream(&request)?;

        let mut message = ChatMessage::assistant("");
        Ok(Box::new(chunks.map(move |chunk| {
            chunk.and_then(|chunk| chat_delta(&mut message, chunk))
        })))
    }
}

#[async_trait]
impl<C: Connector> AsyncLlm for GradientAi<C> {
    #[tracing::instrument(
        name = "gradient_acomplete",
        skip(self, prompt),
        fields(model = %self.config.model),
        err
    )]
    async fn acomplete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let request = self.request(&[ChatMessage::user(prompt)], false);
        completion_response(self.async_client()?.create(&request).await?)
    }

    #[tracing::instrument(
        name = "gradient_achat",
        skip(self, messages),
        fields(model = %self.config.model, messages = messages.len()),
        err
    )]
    async fn achat(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError> {
        let request = self.request(messages, false);
        chat_response(self.async_client()?.create(&request).await?)
    }

    async fn astream_complete(&self, prompt: &str) -> Result<CompletionDeltaStream, LlmError> {
        let request = self.request(&[ChatMessage::user(prompt)], true);
        let chunks = self.async_client()?.create_stream(&request).await?;

        let mut text = String::new();
        Ok(Box::pin(chunks.map(move |chunk| {
            chunk.map(|chunk| completion_delta(&mut text, &chunk))
        })))
    }

    async fn astream_chat(&self, messages: &[ChatMessage]) -> Result<ChatDeltaStream, LlmError> {
        let request = self.request(messages, true);
        let chunks = self.async_client()?.create_stream(&request).await?;

        let mut message = ChatMessage::assistant("");
        Ok(Box::pin(chunks.map(move |chunk| {
            chunk.and_then(|chunk| chat_delta(&mut message, chunk))
        })))
    }
}

fn request_message(message: &ChatMessage) -> RequestMessage {
    let tool_calls = message.tool_calls.as_ref().map(|calls| {
        calls
            .iter()
            .map(|call| gradient::ToolCallPayload {
                id: call.id.clone(),
                r#type: "function".to_string(),
                function: gradient::FunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect::<Vec<_>>()
    });

    // Assistant turns that only carry tool calls are sent with null content.
    let content = if message.content.is_empty() && tool_calls.is_some() {
        None
    } else {
        Some(message.content.clone())
    };

    RequestMessage {
        role: message.role.as_str().to_string(),
        content,
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

fn function_tool(tool: &Tool) -> gradient::FunctionTool {
    gradient::FunctionTool {
        r#type: "function".to_string(),
        function: gradient::FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

fn wire_tool_choice(tool_choice: &ToolChoice) -> gradient::ToolChoice {
    match tool_choice {
        ToolChoice::None => gradient::ToolChoice::Mode(gradient::ToolMode::None),
        ToolChoice::Auto => gradient::ToolChoice::Mode(gradient::ToolMode::Auto),
        ToolChoice::Required => gradient::ToolChoice::Mode(gradient::ToolMode::Required),
        ToolChoice::Function { name } => gradient::ToolChoice::Named(gradient::NamedToolChoice {
            r#type: "function".to_string(),
            function: gradient::NamedFunction { name: name.clone() },
        }),
    }
}

fn raw_value<T: serde::Serialize>(value: &T) -> Result<Value, LlmError> {
    serde_json::to_value(value).map_err(|e| LlmError::Parse {
        message: "Failed to convert API response to JSON".to_string(),
        source: Box::new(e),
    })
}

fn first_message(completion: &ChatCompletion) -> Result<&gradient::ResponseMessage, LlmError> {
    completion
        .choices
        .first()
        .ok_or_else(|| LlmError::ResponseShape("No choices in response".to_string()))?
        .message
        .as_ref()
        .ok_or_else(|| LlmError::ResponseShape("No message in first choice".to_string()))
}

fn completion_response(completion: ChatCompletion) -> Result<CompletionResponse, LlmError> {
    let text = first_message(&completion)?
        .content
        .clone()
        .unwrap_or_default();

    Ok(CompletionResponse {
        text,
        raw: raw_value(&completion)?,
    })
}

fn chat_response(completion: ChatCompletion) -> Result<ChatResponse, LlmError> {
    let message = first_message(&completion)?;

    let role = match message.role.as_deref() {
        None => ChatRole::Assistant,
        Some(role) => ChatRole::from_wire(role)
            .ok_or_else(|| LlmError::ResponseShape(format!("Unknown message role '{role}'")))?,
    };

    let tool_calls = message.tool_calls.as_ref().map(|calls| {
        calls
            .iter()
            .map(|call| ToolCall {
                id: call.id.clone(),
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            })
            .collect()
    });

    Ok(ChatResponse {
        message: ChatMessage {
            role,
            content: message.content.clone().unwrap_or_default(),
            tool_calls,
            tool_call_id: None,
        },
        raw: raw_value(&completion)?,
    })
}

fn completion_delta(text: &mut String, chunk: &ChatCompletionChunk) -> CompletionDelta {
    let delta = chunk.delta_text();
    text.push_str(delta);

    CompletionDelta {
        text: text.clone(),
        delta: delta.to_string(),
    }
}

fn chat_delta(message: &mut ChatMessage, chunk: ChatCompletionChunk) -> Result<ChatDelta, LlmError> {
    if let Some(role) = chunk.delta_role().and_then(ChatRole::from_wire) {
        message.role = role;
    }

    let delta = chunk.delta_text().to_string();
    message.content.push_str(&delta);

    for fragment in chunk.delta_tool_calls() {
        merge_tool_call(message.tool_calls.get_or_insert_with(Vec::new), fragment);
    }

    Ok(ChatDelta {
        message: message.clone(),
        delta,
        raw: raw_value(&chunk)?,
    })
}

/// Fragments share an `index`: the first names the call, the rest extend its arguments.
fn merge_tool_call(calls: &mut Vec<ToolCall>, fragment: &ChunkToolCall) {
    if calls.len() <= fragment.index {
        calls.resize_with(fragment.index + 1, || ToolCall {
            id: String::new(),
            name: String::new(),
            arguments: String::new(),
        });
    }
    let call = &mut calls[fragment.index];

    if let Some(id) = &fragment.id {
        call.id.clone_from(id);
    }
    if let Some(function) = &fragment.function {
        if let Some(name) = &function.name {
            call.name.push_str(name);
        }
        if let Some(arguments) = &function.arguments {
            call.arguments.push_str(arguments);
        }
    }
}
