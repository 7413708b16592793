use std::collections::HashMap;

use async_trait::async_trait;

use crate::types::{
    MessageResponse, OfferingsResponse, PaywallsResponse, ReceiptData, ReceiptResponse,
    SubscriberResponse, TrackEventData,
};
use crate::Result;

/// Operations exposed by the SubX REST API.
///
/// [`SubxClient`](crate::SubxClient) is the HTTP implementation. Higher layers
/// depend on this trait so they can be driven by an in-memory double in tests.
#[async_trait]
pub trait SubxApi: Send + Sync {
    /// `GET /v1/offerings`
    async fn get_offerings(&self) -> Result<OfferingsResponse>;

    /// `GET /v1/offerings/{id}/paywalls`
    async fn get_offering_paywalls(&self, offering_id: &str) -> Result<PaywallsResponse>;

    /// `GET /v1/subscribers/{appUserId}`
    async fn get_subscriber(&self, app_user_id: &str) -> Result<SubscriberResponse>;

    /// `POST /v1/subscribers/{appUserId}`, creating the subscriber if needed.
    ///
    /// Attributes are only sent when provided.
    async fn upsert_subscriber(
        &self,
        app_user_id: &str,
        attributes: Option<&HashMap<String, String>>,
    ) -> Result<SubscriberResponse>;

    /// `POST /v1/subscribers/{appUserId}/receipts`
    async fn submit_receipt(
        &self,
        app_user_id: &str,
        receipt: &ReceiptData,
    ) -> Result<ReceiptResponse>;

    /// `GET /v1/subscribers/{appUserId}/offerings`
    async fn get_subscriber_offerings(&self, app_user_id: &str) -> Result<OfferingsResponse>;

    /// `POST /v1/subscribers/{appUserId}/entitlements`
    async fn grant_entitlement(
        &self,
        app_user_id: &str,
        entitlement_id: &str,
        expires_at: Option<&str>,
    ) -> Result<MessageResponse>;

    /// `DELETE /v1/subscribers/{appUserId}/entitlements/{entitlementId}`
    async fn revoke_entitlement(
        &self,
        app_user_id: &str,
        entitlement_id: &str,
    ) -> Result<MessageResponse>;

    /// `POST /v1/events`
    async fn track_event(&self, event: &TrackEventData) -> Result<()>;
}
