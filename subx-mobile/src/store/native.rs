//! Native purchase-store surface.
//!
//! Host apps implement [`NativeIap`] over the platform billing library
//! (StoreKit, Play Billing, or a cross-platform bridge such as react-native-iap)
//! and hand it to [`StoreService`](super::StoreService).
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        Host app (Swift / Kotlin / JS)        │
//! │   NativeIap implementation over billing SDK  │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │  StoreService (Available | Unavailable)      │
//! │  normalization, cancellation handling        │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │  SubxMobile facade (receipt reconciliation)  │
//! └──────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::subscription::ListenerSubscription;

/// A purchase record as reported by the native store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<i64>,
    /// App Store receipt blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_receipt: Option<String>,
    /// Play Billing purchase token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_token: Option<String>,
}

impl Purchase {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            transaction_id: None,
            transaction_date: None,
            transaction_receipt: None,
            purchase_token: None,
        }
    }

    pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn with_transaction_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.transaction_receipt = Some(receipt.into());
        self
    }

    pub fn with_purchase_token(mut self, token: impl Into<String>) -> Self {
        self.purchase_token = Some(token.into());
        self
    }

    /// Identifier for logs: the transaction id when known, else the product id.
    pub fn label(&self) -> &str {
        self.transaction_id.as_deref().unwrap_or(&self.product_id)
    }
}

/// A product as returned by the native store, before normalization.
///
/// Field names differ between platforms and library versions; every variant
/// is optional here and resolved by [`StoreProduct::from_native`](super::StoreProduct::from_native).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeProduct {
    pub product_id: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Either a number or a string depending on the platform.
    pub price: Option<Value>,
    pub currency: Option<String>,
    pub localized_price: Option<String>,
    pub display_price: Option<String>,
    pub subscription_period: Option<String>,
}

/// Error reported by the native store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct NativeStoreError {
    pub code: String,
    pub message: String,
}

impl NativeStoreError {
    /// Cancellation code used by the iOS bridge.
    pub const USER_CANCELLED: &'static str = "E_USER_CANCELLED";
    /// Cancellation code used by the Android bridge.
    pub const USER_CANCELLED_ALT: &'static str = "user-cancelled";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn user_cancelled() -> Self {
        Self::new(Self::USER_CANCELLED, "User cancelled the purchase")
    }

    /// Whether the user dismissed the purchase sheet.
    pub fn is_user_cancelled(&self) -> bool {
        self.code == Self::USER_CANCELLED || self.code == Self::USER_CANCELLED_ALT
    }
}

/// Callback for purchases delivered outside the initiating call.
pub type PurchaseUpdatedListener = Arc<dyn Fn(Purchase) + Send + Sync>;

/// Callback for asynchronous purchase errors.
pub type PurchaseErrorListener = Arc<dyn Fn(NativeStoreError) + Send + Sync>;

/// Native in-app purchase module.
#[async_trait]
pub trait NativeIap: Send + Sync {
    async fn init_connection(&self) -> Result<(), NativeStoreError>;

    async fn end_connection(&self) -> Result<(), NativeStoreError>;

    async fn fetch_products(&self, skus: &[String]) -> Result<Vec<NativeProduct>, NativeStoreError>;

    /// Start the purchase sheet for one SKU.
    ///
    /// Some platforms report several records for one request; an empty list
    /// means nothing was purchased.
    async fn request_purchase(&self, sku: &str) -> Result<Vec<Purchase>, NativeStoreError>;

    /// Completed purchases not yet acknowledged.
    async fn get_available_purchases(&self) -> Result<Vec<Purchase>, NativeStoreError>;

    /// Acknowledge (or consume) a purchase.
    async fn finish_transaction(
        &self,
        purchase: &Purchase,
        is_consumable: bool,
    ) -> Result<(), NativeStoreError>;

    fn purchase_updated_listener(&self, listener: PurchaseUpdatedListener) -> ListenerSubscription;

    fn purchase_error_listener(&self, listener: PurchaseErrorListener) -> ListenerSubscription;
}
