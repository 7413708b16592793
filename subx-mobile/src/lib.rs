//! SubX mobile bridge.
//!
//! Connects the stateless [`subx_lib`] client with the platform purchase
//! store and keeps the current customer's entitlement state for the host app.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │          Host UI (SwiftUI, Compose, React Native)   │
//! │                     SubxView                        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                    SubxMobile                       │
//! │   identity, customer info, purchase reconciliation  │
//! └─────────────────────────────────────────────────────┘
//!              │                          │
//!              ▼                          ▼
//! ┌────────────────────────┐  ┌─────────────────────────┐
//! │  subx_lib::SubxApi     │  │  StoreService           │
//! │  (REST backend)        │  │  (native purchase store)│
//! └────────────────────────┘  └─────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use subx_mobile::{Platform, StoreService, SubxMobile, SubxMobileConfig};
//!
//! let subx = SubxMobile::new(StoreService::new(native_iap), Arc::new(app_state), Platform::current());
//! subx.configure(SubxMobileConfig::new("pk_live_123").with_entitlement_ids(["pro"])).await?;
//!
//! let info = subx.identify("user-42").await?;
//! if !info.is_entitled("pro") {
//!     let outcome = subx.purchase("monthly_pro").await?;
//!     println!("purchased: {}", outcome.success);
//! }
//! ```

pub mod config;
pub mod customer_info;
pub mod facade;
pub mod lifecycle;
pub mod listeners;
pub mod offerings;
pub mod platform;
pub mod receipt;
pub mod store;
pub mod subscription;
pub mod view;

/// Mock native store and app-state source for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::SubxMobileConfig;
pub use customer_info::CustomerInfo;
pub use facade::{ConfigState, PurchaseOutcome, SubxMobile};
pub use lifecycle::{AppState, AppStateListener, AppStateSource, NoopAppStateSource};
pub use listeners::{CustomerInfoListener, CustomerInfoListeners, ListenerId};
pub use offerings::{OfferingWithStoreProducts, OfferingsWithStoreProducts, PackageWithStoreProducts};
pub use platform::Platform;
pub use receipt::map_purchase_to_receipt;
pub use store::{
    HostRuntime, NativeIap, NativeProduct, NativeStoreError, Purchase, StoreCapability,
    StoreProduct, StoreService,
};
pub use subscription::ListenerSubscription;
pub use view::{SubxView, ViewSnapshot};

use subx_lib::SubxError;

/// Errors surfaced by the mobile bridge.
#[derive(Debug, thiserror::Error)]
pub enum SubxMobileError {
    /// An operation that needs the API ran before `configure`.
    #[error("SubX is not configured. Call configure() first.")]
    NotConfigured,

    /// Purchase or restore without an identified user.
    #[error("User not identified. Call identify() first.")]
    NotIdentified,

    /// No native purchase module in this runtime.
    #[error("In-app purchases are not available in this environment")]
    StoreUnavailable,

    /// Error reported by the native purchase store.
    #[error("Store error {code}: {message}")]
    Store { code: String, message: String },

    /// Error from the SubX API client.
    #[error(transparent)]
    Client(#[from] SubxError),

    /// Internal error (unexpected state).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubxMobileError {
    /// Whether the error was raised before any I/O because of missing setup.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::NotIdentified)
    }

    /// HTTP status when the API rejected the request.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Client(e) => e.status_code(),
            _ => None,
        }
    }
}

impl From<store::NativeStoreError> for SubxMobileError {
    fn from(e: store::NativeStoreError) -> Self {
        Self::Store {
            code: e.code,
            message: e.message,
        }
    }
}

/// Result type for mobile bridge operations.
pub type Result<T> = std::result::Result<T, SubxMobileError>;
