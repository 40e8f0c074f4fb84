use std::fmt;

/// Everything a Gradient client is constructed from.
///
/// Unset optional fields fall back to the client defaults
/// (see [`crate::provider::constants::gradient`]).
#[derive(Clone, PartialEq)]
pub struct ClientOptions {
    pub model_access_key: String,
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout: Option<f64>,
    pub max_retries: Option<u32>,
    /// Appended to the `User-Agent` header as `package/version`.
    pub user_agent_package: Option<String>,
    pub user_agent_version: Option<String>,
}

impl ClientOptions {
    pub fn new(model_access_key: impl Into<String>) -> Self {
        Self {
            model_access_key: model_access_key.into(),
            base_url: None,
            timeout: None,
            max_retries: None,
            user_agent_package: None,
            user_agent_version: None,
        }
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

    pub fn with_user_agent(
        mut self,
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.user_agent_package = Some(package.into());
        self.user_agent_version = Some(version.into());
        self
    }
}

// Keeps the access key out of logs.
impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("model_access_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("user_agent_package", &self.user_agent_package)
            .field("user_agent_version", &self.user_agent_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_access_key() {
        let options = ClientOptions::new("secret-key").with_base_url("https://example.com");
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("https://example.com"));
    }
}
