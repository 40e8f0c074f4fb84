//! Transport settings shared by the blocking and the async Gradient clients.

use std::time::Duration;

use reqwest::{
    StatusCode, Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use super::options::ClientOptions;
use crate::core::LlmError;
use crate::provider::constants::gradient;

/// Agent token of the client itself. Caller identification is appended to it.
pub const SDK_USER_AGENT: &str = concat!("gradient-rust/", env!("CARGO_PKG_VERSION"));

/// Resolved transport configuration for one client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    /// Base duration for exponential backoff
    pub initial_retry_delay: Duration,
    /// Cap on the backoff duration
    pub max_retry_delay: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(gradient::DEFAULT_TIMEOUT_SECS),
            max_retries: gradient::DEFAULT_MAX_RETRIES,
            initial_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(8),
        }
    }
}

impl HttpClientConfig {
    pub fn from_options(options: &ClientOptions) -> Result<Self, LlmError> {
        let mut config = Self::default();

        if let Some(timeout) = options.timeout {
            config.timeout = Duration::try_from_secs_f64(timeout)
                .ok()
                .filter(|d| !d.is_zero())
                .ok_or_else(|| {
                    LlmError::ProviderConfiguration(format!(
                        "Timeout must be a positive number of seconds, got {timeout}"
                    ))
                })?;
        }

        if let Some(max_retries) = options.max_retries {
            config.max_retries = max_retries;
        }

        Ok(config)
    }

    /// Delay before retry number `attempt + 1`: exponential, +/- 10% jitter, capped.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.initial_retry_delay.as_millis() as f64 * 2_f64.powi(attempt as i32);
        let jitter_factor = rand::random::<f64>() * 0.2 + 0.9;
        let delay_ms = (base_delay * jitter_factor) as u64;

        Duration::from_millis(delay_ms).min(self.max_retry_delay)
    }
}

/// Everything both clients need to issue requests, resolved once per construction.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    pub url: String,
    pub user_agent: String,
    pub headers: HeaderMap,
    pub config: HttpClientConfig,
}

impl Transport {
    pub fn from_options(options: &ClientOptions) -> Result<Self, LlmError> {
        if options.model_access_key.trim().is_empty() {
            return Err(LlmError::ProviderConfiguration(
                "Model access key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            url: chat_completions_url(options.base_url.as_deref())?,
            user_agent: user_agent(options),
            headers: auth_headers(&options.model_access_key)?,
            config: HttpClientConfig::from_options(options)?,
        })
    }
}

pub(crate) fn chat_completions_url(base_url: Option<&str>) -> Result<String, LlmError> {
    let base = base_url.unwrap_or(gradient::API_BASE).trim_end_matches('/');

    Url::parse(base).map_err(|e| {
        LlmError::ProviderConfiguration(format!("Invalid base URL '{base}': {e}"))
    })?;

    Ok(format!("{base}{}", gradient::CHAT_COMPLETIONS_ENDPOINT))
}

pub(crate) fn user_agent(options: &ClientOptions) -> String {
    match (
        options.user_agent_package.as_deref(),
        options.user_agent_version.as_deref(),
    ) {
        (Some(package), Some(version)) => format!("{SDK_USER_AGENT} {package}/{version}"),
        (Some(package), None) => format!("{SDK_USER_AGENT} {package}"),
        _ => SDK_USER_AGENT.to_string(),
    }
}

fn auth_headers(model_access_key: &str) -> Result<HeaderMap, LlmError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {model_access_key}")).map_err(|e| {
        LlmError::ProviderConfiguration(format!("Model access key is not a valid header: {e}"))
    })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// 429 and 5xx are worth another attempt, other failures are final.
pub(crate) fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub(crate) fn status_error(status: StatusCode, error_text: &str) -> LlmError {
    let message = if is_retryable(status) {
        format!("Transient API error ({status}): {error_text}")
    } else {
        format!("Fatal API Error ({status}): {error_text}")
    };

    LlmError::Api {
        message,
        status_code: Some(status.as_u16()),
        source: None,
    }
}

pub(crate) fn network_error(attempt: u32, max_retries: u32, e: reqwest::Error) -> LlmError {
    LlmError::Network {
        message: format!("Request failed (attempt {}/{})", attempt + 1, max_retries + 1),
        source: Box::new(e),
    }
}

pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(text).map_err(|e| LlmError::Parse {
        message: "Failed to parse API response".to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_appends_package_and_version() {
        let options = ClientOptions::new("key").with_user_agent("my-package", "1.2.3");
        assert_eq!(
            user_agent(&options),
            format!("{SDK_USER_AGENT} my-package/1.2.3")
        );
    }

    #[test]
    fn test_user_agent_without_identification() {
        assert_eq!(user_agent(&ClientOptions::new("key")), SDK_USER_AGENT);
    }

    #[test]
    fn test_chat_completions_url_defaults_and_trims() {
        assert_eq!(
            chat_completions_url(None).unwrap(),
            "https://inference.do-ai.run/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url(Some("https://custom.api.com/v1/")).unwrap(),
            "https://custom.api.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_completions_url_rejects_garbage() {
        assert!(matches!(
            chat_completions_url(Some("not a url")),
            Err(LlmError::ProviderConfiguration(_))
        ));
    }

    #[test]
    fn test_timeout_validation() {
        let ok = HttpClientConfig::from_options(&ClientOptions::new("k").with_timeout(120.0))
            .unwrap();
        assert_eq!(ok.timeout, Duration::from_secs(120));

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                HttpClientConfig::from_options(&ClientOptions::new("k").with_timeout(bad))
                    .is_err(),
                "timeout {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_backoff_delay_grows_and_caps() {
        let config = HttpClientConfig::default();
        let first = config.backoff_delay(0);
        assert!(first >= Duration::from_millis(450) && first <= Duration::from_millis(550));
        assert_eq!(config.backoff_delay(10), config.max_retry_delay);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_empty_access_key_is_rejected() {
        assert!(matches!(
            Transport::from_options(&ClientOptions::new("  ")),
            Err(LlmError::ProviderConfiguration(_))
        ));
    }
}
