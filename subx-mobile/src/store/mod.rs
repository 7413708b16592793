//! Capability-gated adapter over the native purchase store.
//!
//! The native module can be missing entirely (sandboxed preview runtimes,
//! desktop builds). Availability is decided once when the [`StoreService`] is
//! built; an unavailable store answers with empty results and no-op handles,
//! except [`StoreService::request_purchase`], which fails with
//! [`SubxMobileError::StoreUnavailable`].

pub mod native;
pub mod product;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use native::{
    NativeIap, NativeProduct, NativeStoreError, Purchase, PurchaseErrorListener,
    PurchaseUpdatedListener,
};
pub use product::StoreProduct;

use crate::subscription::ListenerSubscription;
use crate::{Result, SubxMobileError};

/// Runtime the host app is executing in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostRuntime {
    /// A full native build with the billing module linked in.
    Native,
    /// A restricted runtime where native modules cannot be loaded.
    Sandboxed,
}

/// Whether native purchasing is possible in this process.
#[derive(Clone)]
pub enum StoreCapability {
    Available(Arc<dyn NativeIap>),
    Unavailable,
}

impl std::fmt::Debug for StoreCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(_) => f.write_str("Available"),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Store adapter used by the facade.
#[derive(Debug)]
pub struct StoreService {
    capability: StoreCapability,
    connected: Mutex<bool>,
}

impl StoreService {
    pub fn new(native: Arc<dyn NativeIap>) -> Self {
        Self::with_capability(StoreCapability::Available(native))
    }

    pub fn unavailable() -> Self {
        Self::with_capability(StoreCapability::Unavailable)
    }

    /// Pick the capability for `host`.
    pub fn detect(host: HostRuntime, native: Option<Arc<dyn NativeIap>>) -> Self {
        match (host, native) {
            (HostRuntime::Native, Some(native)) => Self::new(native),
            (HostRuntime::Sandboxed, _) => {
                warn!("Running in a sandboxed runtime; in-app purchases are disabled");
                Self::unavailable()
            }
            (HostRuntime::Native, None) => {
                warn!("Native purchase module not found; in-app purchases are disabled");
                Self::unavailable()
            }
        }
    }

    fn with_capability(capability: StoreCapability) -> Self {
        Self {
            capability,
            connected: Mutex::new(false),
        }
    }

    pub fn capability(&self) -> &StoreCapability {
        &self.capability
    }

    pub fn is_available(&self) -> bool {
        matches!(self.capability, StoreCapability::Available(_))
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.lock().await
    }

    fn native(&self) -> Option<&Arc<dyn NativeIap>> {
        match &self.capability {
            StoreCapability::Available(native) => Some(native),
            StoreCapability::Unavailable => None,
        }
    }

    /// Open the billing connection. No-op when already connected or unavailable.
    pub async fn connect(&self) -> Result<()> {
        let Some(native) = self.native() else {
            return Ok(());
        };
        let mut connected = self.connected.lock().await;
        if *connected {
            return Ok(());
        }
        native.init_connection().await?;
        *connected = true;
        debug!("Store connection opened");
        Ok(())
    }

    /// Close the billing connection. No-op when not connected or unavailable.
    pub async fn disconnect(&self) -> Result<()> {
        let Some(native) = self.native() else {
            return Ok(());
        };
        let mut connected = self.connected.lock().await;
        if !*connected {
            return Ok(());
        }
        native.end_connection().await?;
        *connected = false;
        debug!("Store connection closed");
        Ok(())
    }

    /// Fetch and normalize product metadata for `skus`.
    pub async fn get_products(&self, skus: &[String]) -> Result<Vec<StoreProduct>> {
        let Some(native) = self.native() else {
            return Ok(Vec::new());
        };
        if skus.is_empty() {
            return Ok(Vec::new());
        }
        let products = native.fetch_products(skus).await?;
        Ok(products.into_iter().map(StoreProduct::from_native).collect())
    }

    /// Run the native purchase flow for one SKU.
    ///
    /// Returns `Ok(None)` when the user cancels or the store reports nothing.
    pub async fn request_purchase(&self, sku: &str) -> Result<Option<Purchase>> {
        let native = self.native().ok_or(SubxMobileError::StoreUnavailable)?;
        match native.request_purchase(sku).await {
            Ok(purchases) => Ok(purchases.into_iter().next()),
            Err(e) if e.is_user_cancelled() => {
                debug!("Purchase of {} cancelled by user", sku);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Completed purchases that have not been finished yet.
    pub async fn get_available_purchases(&self) -> Result<Vec<Purchase>> {
        match self.native() {
            Some(native) => Ok(native.get_available_purchases().await?),
            None => Ok(Vec::new()),
        }
    }

    /// Acknowledge `purchase` with the store.
    pub async fn finish_transaction(&self, purchase: &Purchase, is_consumable: bool) -> Result<()> {
        match self.native() {
            Some(native) => Ok(native.finish_transaction(purchase, is_consumable).await?),
            None => Ok(()),
        }
    }

    pub fn add_purchase_updated_listener(
        &self,
        listener: PurchaseUpdatedListener,
    ) -> ListenerSubscription {
        match self.native() {
            Some(native) => native.purchase_updated_listener(listener),
            None => ListenerSubscription::noop(),
        }
    }

    pub fn add_purchase_error_listener(
        &self,
        listener: PurchaseErrorListener,
    ) -> ListenerSubscription {
        match self.native() {
            Some(native) => native.purchase_error_listener(listener),
            None => ListenerSubscription::noop(),
        }
    }
}
