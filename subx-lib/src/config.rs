//! Configuration for the SubX API client.

use serde::{Deserialize, Serialize};

use crate::{Result, SubxError};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.subx.dev";

/// Configuration for [`SubxClient`](crate::SubxClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Project API key, sent as `X-Api-Key`.
    pub api_key: String,

    /// API base URL. Defaults to [`DEFAULT_BASE_URL`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ClientConfig {
    /// Create a new client configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Base URL with any trailing slash removed.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Check the configuration before building a client.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(SubxError::invalid_data(
                "api_key",
                "API key cannot be empty",
            ));
        }
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SubxError::invalid_data(
                    "base_url",
                    format!("expected an http(s) URL, got '{}'", url),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = ClientConfig::new("k");
        assert_eq!(config.resolved_base_url(), "https://api.subx.dev");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::new("k").with_base_url("http://localhost:3000/");
        assert_eq!(config.resolved_base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("k")
            .with_base_url("ftp://example.com")
            .validate()
            .is_err());
    }
}
