//! HTTP implementation of [`SubxApi`].
//!
//! Each call is a single round trip: no retries, no caching and no client-side
//! timeout. Callers own their retry policy.
//!
//! # Example
//!
//! ```rust,ignore
//! use subx_lib::{ClientConfig, SubxApi, SubxClient};
//!
//! let client = SubxClient::new(ClientConfig::new("sk_live_..."))?;
//! let subscriber = client.upsert_subscriber("user-42", None).await?;
//! println!("{} entitlements", subscriber.entitlements.len());
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::SubxApi;
use crate::config::ClientConfig;
use crate::types::{
    ApiErrorBody, GrantEntitlementBody, MessageResponse, OfferingsResponse, PaywallsResponse,
    ReceiptData, ReceiptResponse, SubscriberResponse, TrackEventData, UpsertSubscriberBody,
};
use crate::{Result, SubxError};

/// Header carrying the project API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

/// SubX REST API client.
#[derive(Clone, Debug)]
pub struct SubxClient {
    config: ClientConfig,
    base_url: String,
    http: reqwest::Client,
}

impl SubxClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SubxError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_http_client(config, http)
    }

    /// Create a client reusing an existing `reqwest` client.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Result<Self> {
        config.validate()?;
        let base_url = config.resolved_base_url();
        Ok(Self {
            config,
            base_url,
            http,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolved base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, Option::<&()>::None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        self.request(Method::POST, path, body).await
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut request = self
            .http
            .request(method, self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.config.api_key);

        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }

        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(|e| {
                SubxError::Serialization(format!("{} returned no content: {}", path, e))
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SubxError::Transport(format!("Failed to read response: {}", e)))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            SubxError::Serialization(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> SubxError {
        if e.is_connect() {
            SubxError::ConnectionFailed {
                target: self.base_url.clone(),
                reason: e.to_string(),
            }
        } else {
            SubxError::Transport(format!("SubX request failed: {}", e))
        }
    }
}

/// Build the error for a non-2xx response.
///
/// Uses the body's `message` when the body is JSON, falling back to the status
/// text when the body is absent or unparsable.
fn api_error(status: StatusCode, body: &str) -> SubxError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()),
        Err(_) => status
            .canonical_reason()
            .unwrap_or(FALLBACK_ERROR_MESSAGE)
            .to_string(),
    };
    SubxError::api(status.as_u16(), message)
}

fn segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

fn subscriber_path(app_user_id: &str) -> String {
    format!("/v1/subscribers/{}", segment(app_user_id))
}

#[async_trait]
impl SubxApi for SubxClient {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn get_offerings(&self) -> Result<OfferingsResponse> {
        self.get("/v1/offerings").await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn get_offering_paywalls(&self, offering_id: &str) -> Result<PaywallsResponse> {
        self.get(&format!("/v1/offerings/{}/paywalls", segment(offering_id)))
            .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn get_subscriber(&self, app_user_id: &str) -> Result<SubscriberResponse> {
        self.get(&subscriber_path(app_user_id)).await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, attributes)))]
    async fn upsert_subscriber(
        &self,
        app_user_id: &str,
        attributes: Option<&HashMap<String, String>>,
    ) -> Result<SubscriberResponse> {
        let body = attributes.map(|attributes| UpsertSubscriberBody { attributes });
        self.post(&subscriber_path(app_user_id), body.as_ref())
            .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, receipt), fields(product_id = %receipt.product_id, store = %receipt.store)))]
    async fn submit_receipt(
        &self,
        app_user_id: &str,
        receipt: &ReceiptData,
    ) -> Result<ReceiptResponse> {
        self.post(
            &format!("{}/receipts", subscriber_path(app_user_id)),
            Some(receipt),
        )
        .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn get_subscriber_offerings(&self, app_user_id: &str) -> Result<OfferingsResponse> {
        self.get(&format!("{}/offerings", subscriber_path(app_user_id)))
            .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn grant_entitlement(
        &self,
        app_user_id: &str,
        entitlement_id: &str,
        expires_at: Option<&str>,
    ) -> Result<MessageResponse> {
        let body = GrantEntitlementBody {
            entitlement_id,
            expires_at,
        };
        self.post(
            &format!("{}/entitlements", subscriber_path(app_user_id)),
            Some(&body),
        )
        .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn revoke_entitlement(
        &self,
        app_user_id: &str,
        entitlement_id: &str,
    ) -> Result<MessageResponse> {
        self.request(
            Method::DELETE,
            &format!(
                "{}/entitlements/{}",
                subscriber_path(app_user_id),
                segment(entitlement_id)
            ),
            Option::<&()>::None,
        )
        .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, event), fields(event = %event.event_name)))]
    async fn track_event(&self, event: &TrackEventData) -> Result<()> {
        // The endpoint answers 204 or a small ack body; neither is surfaced.
        let _: serde_json::Value = self.post("/v1/events", Some(event)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_empty_key() {
        let result = SubxClient::new(ClientConfig::new(""));
        assert!(result.is_err());
    }

    #[test]
    fn test_url_building() {
        let client =
            SubxClient::new(ClientConfig::new("k").with_base_url("http://localhost:3000/"))
                .unwrap();
        assert_eq!(client.url("/v1/offerings"), "http://localhost:3000/v1/offerings");
    }

    #[test]
    fn test_subscriber_path_is_percent_encoded() {
        assert_eq!(
            subscriber_path("user@example.com/1"),
            "/v1/subscribers/user%40example.com%2F1"
        );
        assert_eq!(subscriber_path("plain-id_42"), "/v1/subscribers/plain-id_42");
    }

    #[test]
    fn test_api_error_prefers_body_message() {
        let err = api_error(StatusCode::NOT_FOUND, r#"{"message":"Subscriber not found"}"#);
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.message(), "Subscriber not found");
    }

    #[test]
    fn test_api_error_falls_back_to_status_text() {
        let err = api_error(StatusCode::BAD_GATEWAY, "<html>upstream</html>");
        assert_eq!(err.message(), "Bad Gateway");

        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.message(), "Internal Server Error");
    }

    #[test]
    fn test_api_error_json_without_message() {
        let err = api_error(StatusCode::BAD_REQUEST, r#"{"error":"bad"}"#);
        assert_eq!(err.message(), "Request failed");
    }
}
