//! Wire types for the SubX REST API.
//!
//! All bodies are JSON with camelCase field names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalog offering: a named group of packages shown on a paywall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub id: String,
    pub lookup_key: String,
    pub display_name: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub packages: Vec<Package>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub lookup_key: String,
    pub display_name: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Kind of catalog product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Subscription,
    NonSubscription,
    /// A product kind this client does not know about yet.
    #[serde(other)]
    Unknown,
}

/// A catalog product, linked to the platform store by `store_product_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub store_product_id: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub display_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingsResponse {
    #[serde(default)]
    pub current_offering: Option<Offering>,
    #[serde(default)]
    pub all_offerings: Vec<Offering>,
}

/// A subscription as tracked by the backend.
///
/// `status` is assigned by the server and not interpreted by the client,
/// except for the `"active"` check used by the "pro" fallback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub product_id: String,
    pub store: String,
    pub status: String,
    pub started_at: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub is_trial: bool,
    #[serde(default)]
    pub auto_renew_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

impl Subscription {
    /// Status string the backend uses for a currently active subscription.
    pub const ACTIVE: &'static str = "active";

    pub fn is_active(&self) -> bool {
        self.status == Self::ACTIVE
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub id: String,
    pub lookup_key: String,
    pub display_name: String,
}

/// Full subscriber state as returned by the subscriber endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberResponse {
    pub app_user_id: String,
    #[serde(default)]
    pub first_seen_at: String,
    #[serde(default)]
    pub last_seen_at: String,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub entitlements: Vec<Entitlement>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paywall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaywallsResponse {
    #[serde(default)]
    pub paywalls: Vec<Paywall>,
}

/// Platform store a receipt originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreName {
    AppStore,
    PlayStore,
}

impl StoreName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppStore => "app_store",
            Self::PlayStore => "play_store",
        }
    }
}

impl std::fmt::Display for StoreName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoreName {
    type Err = crate::SubxError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "app_store" => Ok(Self::AppStore),
            "play_store" => Ok(Self::PlayStore),
            other => Err(crate::SubxError::invalid_data(
                "store",
                format!("unknown store '{}', expected app_store or play_store", other),
            )),
        }
    }
}

/// Receipt submission body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptData {
    pub store: StoreName,
    pub receipt_data: String,
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
}

/// Analytics event body for `POST /v1/events`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_user_id: Option<String>,
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl TrackEventData {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            app_user_id: None,
            event_name: event_name.into(),
            properties: None,
        }
    }

    pub fn with_app_user_id(mut self, app_user_id: impl Into<String>) -> Self {
        self.app_user_id = Some(app_user_id.into());
        self
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Plain `{message}` acknowledgement returned by the entitlement endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body shape: `{message?}`.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct UpsertSubscriberBody<'a> {
    pub attributes: &'a HashMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GrantEntitlementBody<'a> {
    pub entitlement_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscriber_defaults_missing_collections() {
        let res: SubscriberResponse = serde_json::from_value(json!({
            "appUserId": "u1",
            "firstSeenAt": "2024-01-01T00:00:00Z",
            "lastSeenAt": "2024-01-02T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(res.app_user_id, "u1");
        assert!(res.subscriptions.is_empty());
        assert!(res.entitlements.is_empty());
        assert!(res.attributes.is_empty());
    }

    #[test]
    fn test_product_type_field_name() {
        let product: Product = serde_json::from_value(json!({
            "id": "prod_1",
            "storeProductId": "sku1",
            "type": "non_subscription",
            "displayName": "Lifetime"
        }))
        .unwrap();
        assert_eq!(product.product_type, ProductType::NonSubscription);
        assert_eq!(product.store_product_id, "sku1");
    }

    #[test]
    fn test_unrecognised_product_type_still_decodes() {
        let res: SubscriberResponse = serde_json::from_value(json!({
            "appUserId": "u1",
            "firstSeenAt": "2024-01-01T00:00:00Z",
            "lastSeenAt": "2024-01-02T00:00:00Z",
            "subscriptions": [{
                "id": "sub_1",
                "productId": "coins",
                "store": "app_store",
                "status": "active",
                "startedAt": "2024-01-01T00:00:00Z",
                "product": {
                    "id": "prod_9",
                    "storeProductId": "coins_100",
                    "type": "consumable",
                    "displayName": "100 coins"
                }
            }]
        }))
        .unwrap();

        let product = res.subscriptions[0].product.as_ref().unwrap();
        assert_eq!(product.product_type, ProductType::Unknown);
    }

    #[test]
    fn test_receipt_omits_absent_price() {
        let receipt = ReceiptData {
            store: StoreName::PlayStore,
            receipt_data: "T".into(),
            product_id: "p1".into(),
            price: None,
            currency: None,
        };
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(
            value,
            json!({"store": "play_store", "receiptData": "T", "productId": "p1"})
        );
    }

    #[test]
    fn test_grant_body_omits_expiry() {
        let body = GrantEntitlementBody {
            entitlement_id: "pro",
            expires_at: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"entitlementId": "pro"})
        );
    }

    #[test]
    fn test_store_name_parse() {
        assert_eq!("app_store".parse::<StoreName>().unwrap(), StoreName::AppStore);
        assert!("steam".parse::<StoreName>().is_err());
    }
}
