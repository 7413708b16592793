//! UI-facing state holder.
//!
//! [`SubxView`] wraps a [`SubxMobile`] with the state a UI layer renders:
//! readiness, the mirrored customer info, "pro" status and purchase progress.
//! Host bindings (SwiftUI observable, Compose state, React context) read
//! [`SubxView::snapshot`] after each call or listener notification.

use std::sync::{Arc, RwLock};

use tracing::error;

use crate::config::SubxMobileConfig;
use crate::customer_info::CustomerInfo;
use crate::facade::{PurchaseOutcome, SubxMobile};
use crate::listeners::ListenerId;
use crate::Result;

/// Point-in-time copy of the view state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewSnapshot {
    pub is_ready: bool,
    pub app_user_id: Option<String>,
    pub customer_info: Option<Arc<CustomerInfo>>,
    pub is_pro: bool,
    pub is_purchasing: bool,
    /// Message of the last failed purchase, cleared when a new one starts.
    pub last_error: Option<String>,
}

#[derive(Default)]
struct ViewState {
    is_ready: bool,
    customer_info: Option<Arc<CustomerInfo>>,
    entitlement_ids: Vec<String>,
    is_purchasing: bool,
    last_error: Option<String>,
    listener: Option<ListenerId>,
}

pub struct SubxView {
    subx: SubxMobile,
    state: Arc<RwLock<ViewState>>,
}

impl SubxView {
    pub fn new(subx: SubxMobile) -> Self {
        Self {
            subx,
            state: Arc::default(),
        }
    }

    pub fn subx(&self) -> &SubxMobile {
        &self.subx
    }

    /// Configure the facade and start mirroring customer info.
    ///
    /// A failed configure is logged; the view still becomes ready so the UI
    /// can render its logged-out state. When the facade was already
    /// configured, its entitlement ids win over the ones in `config`.
    pub async fn init(&self, config: SubxMobileConfig) {
        let requested_ids = config.entitlement_ids.clone();

        match self.subx.configure(config).await {
            Ok(()) => {
                self.write().entitlement_ids = self.subx.entitlement_ids();
                let state = self.state.clone();
                let id = self
                    .subx
                    .add_customer_info_listener(Arc::new(move |info: &CustomerInfo| {
                        state
                            .write()
                            .unwrap_or_else(|e| e.into_inner())
                            .customer_info = Some(Arc::new(info.clone()));
                    }));
                self.write().listener = Some(id);
            }
            Err(e) => {
                error!("SubX init failed: {}", e);
                self.write().entitlement_ids = requested_ids;
            }
        }

        self.write().is_ready = true;
    }

    pub async fn identify(&self, app_user_id: &str) -> Result<Arc<CustomerInfo>> {
        let info = self.subx.identify(app_user_id).await?;
        self.write().customer_info = Some(info.clone());
        Ok(info)
    }

    /// Purchase `product_id`, tracking progress.
    ///
    /// Failures are recorded in [`ViewSnapshot::last_error`] and reported as
    /// an unsuccessful outcome without customer info.
    pub async fn purchase(&self, product_id: &str) -> PurchaseOutcome {
        {
            let mut state = self.write();
            state.is_purchasing = true;
            state.last_error = None;
        }

        let result = self.subx.purchase(product_id).await;

        let mut state = self.write();
        state.is_purchasing = false;
        match result {
            Ok(outcome) => {
                if let Some(info) = &outcome.customer_info {
                    state.customer_info = Some(info.clone());
                }
                outcome
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                PurchaseOutcome {
                    success: false,
                    customer_info: None,
                }
            }
        }
    }

    pub async fn restore(&self) -> Result<Option<Arc<CustomerInfo>>> {
        let info = self.subx.restore().await?;
        if let Some(info) = &info {
            self.write().customer_info = Some(info.clone());
        }
        Ok(info)
    }

    pub async fn logout(&self) {
        self.subx.logout().await;
        self.write().customer_info = None;
    }

    pub fn is_entitled(&self, lookup_key: &str) -> bool {
        self.read()
            .customer_info
            .as_ref()
            .map_or(false, |info| info.is_entitled(lookup_key))
    }

    pub fn is_pro(&self) -> bool {
        let state = self.read();
        state
            .customer_info
            .as_ref()
            .map_or(false, |info| info.qualifies_as_pro(&state.entitlement_ids))
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let is_pro = self.is_pro();
        let state = self.read();
        ViewSnapshot {
            is_ready: state.is_ready,
            app_user_id: self.subx.app_user_id(),
            customer_info: state.customer_info.clone(),
            is_pro,
            is_purchasing: state.is_purchasing,
            last_error: state.last_error.clone(),
        }
    }

    /// Stop mirroring and tear the facade down.
    pub async fn shutdown(&self) {
        let listener = self.write().listener.take();
        if let Some(id) = listener {
            self.subx.remove_customer_info_listener(id);
        }
        if let Err(e) = self.subx.destroy().await {
            error!("SubX shutdown failed: {}", e);
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ViewState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ViewState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
