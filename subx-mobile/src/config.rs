//! Facade configuration.

use serde::{Deserialize, Serialize};
use subx_lib::ClientConfig;

/// Configuration passed to [`SubxMobile::configure`](crate::SubxMobile::configure).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubxMobileConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Entitlement lookup keys that make a customer "pro". When empty, any
    /// active subscription does.
    #[serde(default)]
    pub entitlement_ids: Vec<String>,
}

impl SubxMobileConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            entitlement_ids: Vec::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_entitlement_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entitlement_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.api_key.clone());
        match &self.base_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        }
    }
}
