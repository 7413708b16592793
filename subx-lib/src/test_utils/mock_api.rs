//! In-memory API double.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use super::fixtures;
use crate::api::SubxApi;
use crate::types::{
    Entitlement, MessageResponse, OfferingsResponse, PaywallsResponse, ReceiptData,
    ReceiptResponse, SubscriberResponse, TrackEventData,
};
use crate::{Result, SubxError};

/// Shared, ordered log of calls made against test doubles.
///
/// Clone it into several doubles to observe the relative order of their calls.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    /// Snapshot of all entries in call order.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Number of entries starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    /// Index of the first entry starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .position(|e| e.starts_with(prefix))
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// API operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    GetOfferings,
    GetOfferingPaywalls,
    GetSubscriber,
    UpsertSubscriber,
    SubmitReceipt,
    GetSubscriberOfferings,
    GrantEntitlement,
    RevokeEntitlement,
    TrackEvent,
}

impl ApiOperation {
    fn as_str(&self) -> &'static str {
        match self {
            Self::GetOfferings => "get_offerings",
            Self::GetOfferingPaywalls => "get_offering_paywalls",
            Self::GetSubscriber => "get_subscriber",
            Self::UpsertSubscriber => "upsert_subscriber",
            Self::SubmitReceipt => "submit_receipt",
            Self::GetSubscriberOfferings => "get_subscriber_offerings",
            Self::GrantEntitlement => "grant_entitlement",
            Self::RevokeEntitlement => "revoke_entitlement",
            Self::TrackEvent => "track_event",
        }
    }
}

/// In-memory [`SubxApi`].
///
/// Subscribers are created on upsert. Receipts for products registered with
/// [`grant_on_receipt`](Self::grant_on_receipt) add an entitlement and an
/// active subscription to the submitting subscriber.
///
/// Every call is logged as `api:<operation>:<detail>`.
#[derive(Default)]
pub struct MockSubxApi {
    subscribers: RwLock<HashMap<String, SubscriberResponse>>,
    offerings: RwLock<OfferingsResponse>,
    paywalls: RwLock<HashMap<String, PaywallsResponse>>,
    receipt_grants: RwLock<HashMap<String, Entitlement>>,
    receipts: RwLock<Vec<(String, ReceiptData)>>,
    events: RwLock<Vec<TrackEventData>>,
    failures: RwLock<HashSet<ApiOperation>>,
    log: EventLog,
}

impl MockSubxApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that records into a shared log.
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Insert or replace a subscriber fixture.
    pub fn put_subscriber(&self, subscriber: SubscriberResponse) {
        self.subscribers
            .write()
            .unwrap()
            .insert(subscriber.app_user_id.clone(), subscriber);
    }

    pub fn subscriber(&self, app_user_id: &str) -> Option<SubscriberResponse> {
        self.subscribers.read().unwrap().get(app_user_id).cloned()
    }

    pub fn set_offerings(&self, offerings: OfferingsResponse) {
        *self.offerings.write().unwrap() = offerings;
    }

    pub fn set_paywalls(&self, offering_id: &str, paywalls: PaywallsResponse) {
        self.paywalls
            .write()
            .unwrap()
            .insert(offering_id.to_string(), paywalls);
    }

    /// Grant `lookup_key` whenever a receipt for `product_id` is accepted.
    pub fn grant_on_receipt(&self, product_id: &str, lookup_key: &str) {
        self.receipt_grants
            .write()
            .unwrap()
            .insert(product_id.to_string(), fixtures::entitlement(lookup_key));
    }

    /// Make every subsequent call to `op` fail with a 500.
    pub fn fail(&self, op: ApiOperation) {
        self.failures.write().unwrap().insert(op);
    }

    /// Stop failing `op`.
    pub fn succeed(&self, op: ApiOperation) {
        self.failures.write().unwrap().remove(&op);
    }

    /// Accepted receipts, as `(app_user_id, receipt)`.
    pub fn receipts(&self) -> Vec<(String, ReceiptData)> {
        self.receipts.read().unwrap().clone()
    }

    pub fn events(&self) -> Vec<TrackEventData> {
        self.events.read().unwrap().clone()
    }

    fn enter(&self, op: ApiOperation, detail: &str) -> Result<()> {
        self.log.push(format!("api:{}:{}", op.as_str(), detail));
        if self.failures.read().unwrap().contains(&op) {
            return Err(SubxError::api(500, format!("mock failure: {}", op.as_str())));
        }
        Ok(())
    }

    fn lookup(&self, app_user_id: &str) -> Result<SubscriberResponse> {
        self.subscriber(app_user_id)
            .ok_or_else(|| SubxError::api(404, "Subscriber not found"))
    }
}

#[async_trait]
impl SubxApi for MockSubxApi {
    async fn get_offerings(&self) -> Result<OfferingsResponse> {
        self.enter(ApiOperation::GetOfferings, "")?;
        Ok(self.offerings.read().unwrap().clone())
    }

    async fn get_offering_paywalls(&self, offering_id: &str) -> Result<PaywallsResponse> {
        self.enter(ApiOperation::GetOfferingPaywalls, offering_id)?;
        self.paywalls
            .read()
            .unwrap()
            .get(offering_id)
            .cloned()
            .ok_or_else(|| SubxError::api(404, "Offering not found"))
    }

    async fn get_subscriber(&self, app_user_id: &str) -> Result<SubscriberResponse> {
        self.enter(ApiOperation::GetSubscriber, app_user_id)?;
        self.lookup(app_user_id)
    }

    async fn upsert_subscriber(
        &self,
        app_user_id: &str,
        attributes: Option<&HashMap<String, String>>,
    ) -> Result<SubscriberResponse> {
        self.enter(ApiOperation::UpsertSubscriber, app_user_id)?;
        let mut subscribers = self.subscribers.write().unwrap();
        let entry = subscribers
            .entry(app_user_id.to_string())
            .or_insert_with(|| fixtures::subscriber(app_user_id));
        if let Some(attributes) = attributes {
            entry.attributes.extend(attributes.clone());
        }
        Ok(entry.clone())
    }

    async fn submit_receipt(
        &self,
        app_user_id: &str,
        receipt: &ReceiptData,
    ) -> Result<ReceiptResponse> {
        self.enter(
            ApiOperation::SubmitReceipt,
            &format!("{}:{}", app_user_id, receipt.product_id),
        )?;
        self.receipts
            .write()
            .unwrap()
            .push((app_user_id.to_string(), receipt.clone()));

        let grant = self
            .receipt_grants
            .read()
            .unwrap()
            .get(&receipt.product_id)
            .cloned();
        let mut subscription = None;
        if let Some(entitlement) = grant {
            let mut subscribers = self.subscribers.write().unwrap();
            let entry = subscribers
                .entry(app_user_id.to_string())
                .or_insert_with(|| fixtures::subscriber(app_user_id));
            if !entry
                .entitlements
                .iter()
                .any(|e| e.lookup_key == entitlement.lookup_key)
            {
                entry.entitlements.push(entitlement);
            }
            let sub = fixtures::subscription(&receipt.product_id, "active");
            entry.subscriptions.push(sub.clone());
            subscription = Some(sub);
        }

        Ok(ReceiptResponse {
            success: true,
            subscription,
        })
    }

    async fn get_subscriber_offerings(&self, app_user_id: &str) -> Result<OfferingsResponse> {
        self.enter(ApiOperation::GetSubscriberOfferings, app_user_id)?;
        self.lookup(app_user_id)?;
        Ok(self.offerings.read().unwrap().clone())
    }

    async fn grant_entitlement(
        &self,
        app_user_id: &str,
        entitlement_id: &str,
        _expires_at: Option<&str>,
    ) -> Result<MessageResponse> {
        self.enter(
            ApiOperation::GrantEntitlement,
            &format!("{}:{}", app_user_id, entitlement_id),
        )?;
        let mut subscribers = self.subscribers.write().unwrap();
        let entry = subscribers
            .get_mut(app_user_id)
            .ok_or_else(|| SubxError::api(404, "Subscriber not found"))?;
        entry.entitlements.push(fixtures::entitlement(entitlement_id));
        Ok(MessageResponse {
            message: "Entitlement granted".to_string(),
        })
    }

    async fn revoke_entitlement(
        &self,
        app_user_id: &str,
        entitlement_id: &str,
    ) -> Result<MessageResponse> {
        self.enter(
            ApiOperation::RevokeEntitlement,
            &format!("{}:{}", app_user_id, entitlement_id),
        )?;
        let mut subscribers = self.subscribers.write().unwrap();
        let entry = subscribers
            .get_mut(app_user_id)
            .ok_or_else(|| SubxError::api(404, "Subscriber not found"))?;
        entry
            .entitlements
            .retain(|e| e.lookup_key != entitlement_id && e.id != entitlement_id);
        Ok(MessageResponse {
            message: "Entitlement revoked".to_string(),
        })
    }

    async fn track_event(&self, event: &TrackEventData) -> Result<()> {
        self.enter(ApiOperation::TrackEvent, &event.event_name)?;
        self.events.write().unwrap().push(event.clone());
        Ok(())
    }
}
