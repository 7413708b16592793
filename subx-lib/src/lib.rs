//! SubX client library.
//!
//! A thin, stateless client for the SubX subscription backend: offerings,
//! subscribers, receipts, entitlements and analytics events.
//!
//! The crate keeps no state between calls. Higher layers (see `subx-mobile`)
//! depend on the [`SubxApi`] trait rather than on the HTTP client directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use subx_lib::{ClientConfig, SubxApi, SubxClient};
//!
//! let client = SubxClient::new(ClientConfig::new("sk_test_123"))?;
//!
//! let offerings = client.get_offerings().await?;
//! for offering in &offerings.all_offerings {
//!     println!("{} ({} packages)", offering.display_name, offering.packages.len());
//! }
//! ```
//!
//! # Errors
//!
//! ```
//! use subx_lib::{SubxError, SubxErrorCode};
//!
//! let err = SubxError::api(404, "Subscriber not found");
//! assert_eq!(err.code(), SubxErrorCode::Api);
//! assert_eq!(err.status_code(), Some(404));
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod types;

/// In-memory API doubles for tests.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use api::SubxApi;
pub use client::{SubxClient, API_KEY_HEADER};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use errors::{SubxError, SubxErrorCode};
pub use types::{
    Entitlement, MessageResponse, Offering, OfferingsResponse, Package, Paywall,
    PaywallsResponse, Product, ProductType, ReceiptData, ReceiptResponse, StoreName,
    SubscriberResponse, Subscription, TrackEventData,
};

/// Common result alias for SubX client operations.
pub type Result<T> = std::result::Result<T, SubxError>;
