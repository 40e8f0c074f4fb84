//! Async Gradient client.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use super::{
    AsyncChatCompletions, ChunkStream,
    http::{Transport, is_retryable, network_error, parse_body, status_error},
    options::ClientOptions,
    request::ChatCompletionRequest,
    response::ChatCompletion,
    stream::SseDecoder,
};
use crate::core::LlmError;

/// Async client for the Gradient chat-completions API.
pub struct AsyncGradient {
    client: Client,
    transport: Transport,
}

impl AsyncGradient {
    pub fn new(options: ClientOptions) -> Result<Self, LlmError> {
        let transport = Transport::from_options(&options)?;

        let client = Client::builder()
            .timeout(transport.config.timeout)
            .user_agent(transport.user_agent.as_str())
            .default_headers(transport.headers.clone())
            .build()
            .map_err(|e| {
                LlmError::ProviderConfiguration(format!("Failed to build reqwest client: {e}"))
            })?;

        Ok(Self { client, transport })
    }

    /// The `User-Agent` sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.transport.user_agent
    }

    pub fn url(&self) -> &str {
        &self.transport.url
    }

    /// POST with retry on 429, 5xx and connection failures.
    #[tracing::instrument(
        name = "gradient_post",
        skip(self, request),
        fields(url = %self.transport.url, stream = request.stream),
        err
    )]
    async fn send(&self, request: &ChatCompletionRequest) -> Result<Response, LlmError> {
        let config = &self.transport.config;
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=config.max_retries {
            match self.client.post(&self.transport.url).json(request).send().await {
                Err(e) => {
                    warn!(attempt, error = %e, "HTTP request failed");
                    last_error = Some(network_error(attempt, config.max_retries, e));
                }
                Ok(res) => {
                    let status = res.status();

                    if status.is_success() {
                        debug!(status = %status, "HTTP request successful");
                        return Ok(res);
                    }

                    warn!(attempt, status = %status, "API returned error status");

                    let error_text = res
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    let error = status_error(status, &error_text);
                    if !is_retryable(status) {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
            }

            if attempt < config.max_retries {
                tokio::time::sleep(config.backoff_delay(attempt)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Api {
            message: format!(
                "Request failed after max retries ({}) with unknown error",
                config.max_retries
            ),
            status_code: None,
            source: None,
        }))
    }
}

#[async_trait]
impl AsyncChatCompletions for AsyncGradient {
    async fn create(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, LlmError> {
        let res = self.send(request).await?;
        let text = res.text().await.map_err(|e| LlmError::Network {
            message: "Failed to read response body".to_string(),
            source: Box::new(e),
        })?;

        parse_body(&text)
    }

    async fn create_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkStream, LlmError> {
        let mut request = request.clone();
        request.stream = true;

        let res = self.send(&request).await?;

        let state = (Box::pin(res.bytes_stream()), Some(SseDecoder::default()));
        let chunks = futures::stream::unfold(state, |(mut bytes, decoder)| async move {
            let mut decoder = decoder?;
            let chunks = match bytes.next().await {
                Some(Ok(data)) => decoder.feed(&data),
                Some(Err(e)) => vec![Err(LlmError::Network {
                    message: "Failed to read stream".to_string(),
                    source: Box::new(e),
                })],
                None => {
                    let rest: Vec<_> = decoder.finish().into_iter().collect();
                    return Some((rest, (bytes, None)));
                }
            };
            Some((chunks, (bytes, Some(decoder))))
        })
        .flat_map(futures::stream::iter);

        Ok(Box::pin(chunks))
    }
}
