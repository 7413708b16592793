//! Purchase-reconciliation facade.
//!
//! [`SubxMobile`] owns the active identity and the last known
//! [`CustomerInfo`], and sequences the API client and the native store:
//!
//! ```text
//! request_purchase ─▶ map receipt ─▶ submit_receipt ─▶ finish_transaction ─▶ refresh
//! ```
//!
//! A transaction is finished only after the backend accepted its receipt. When
//! submission fails the transaction stays open in the store, so a later
//! restore or purchase-updated event can reconcile it.
//!
//! Operations that change identity or customer info run one at a time, in call
//! order. That covers `configure`, `identify`, `purchase`, `restore`,
//! `logout`, `get_customer_info`, foreground refreshes, purchases delivered
//! through the store's purchase-updated events and `destroy`.
//!
//! Each transaction id is reconciled at most once per identified user. Stores
//! that echo a `request_purchase` result through the purchase-updated event
//! therefore do not cause a second submission or finish.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use subx_lib::{SubxApi, SubxClient};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::config::SubxMobileConfig;
use crate::customer_info::CustomerInfo;
use crate::lifecycle::{AppState, AppStateListener, AppStateSource};
use crate::listeners::{CustomerInfoListener, CustomerInfoListeners, ListenerId};
use crate::offerings::{merge_offerings, store_product_ids, OfferingsWithStoreProducts};
use crate::platform::Platform;
use crate::receipt::map_purchase_to_receipt;
use crate::store::{NativeStoreError, Purchase, PurchaseUpdatedListener, StoreService};
use crate::subscription::ListenerSubscription;
use crate::{Result, SubxMobileError};

/// Setup progress of a [`SubxMobile`] instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigState {
    Unconfigured,
    Configuring,
    Ready,
}

/// Result of [`SubxMobile::purchase`].
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseOutcome {
    /// False when the user cancelled or the store reported nothing.
    pub success: bool,
    pub customer_info: Option<Arc<CustomerInfo>>,
}

struct Setup {
    state: ConfigState,
    api: Option<Arc<dyn SubxApi>>,
    entitlement_ids: Vec<String>,
}

#[derive(Default)]
struct Session {
    app_user_id: Option<String>,
    customer_info: Option<Arc<CustomerInfo>>,
    /// Transaction ids already submitted and finished for `app_user_id`.
    reconciled: HashSet<String>,
}

struct Shared {
    store: Arc<StoreService>,
    app_state: Arc<dyn AppStateSource>,
    platform: Platform,
    setup: RwLock<Setup>,
    session: RwLock<Session>,
    subscriptions: Mutex<Vec<ListenerSubscription>>,
    listeners: CustomerInfoListeners,
    op_lock: tokio::sync::Mutex<()>,
}

/// Subscription state for one app process.
///
/// Construct one at the app's composition root and pass clones around; all
/// clones share the same state.
#[derive(Clone)]
pub struct SubxMobile {
    inner: Arc<Shared>,
}

impl SubxMobile {
    pub fn new(store: StoreService, app_state: Arc<dyn AppStateSource>, platform: Platform) -> Self {
        Self {
            inner: Arc::new(Shared {
                store: Arc::new(store),
                app_state,
                platform,
                setup: RwLock::new(Setup {
                    state: ConfigState::Unconfigured,
                    api: None,
                    entitlement_ids: Vec::new(),
                }),
                session: RwLock::new(Session::default()),
                subscriptions: Mutex::new(Vec::new()),
                listeners: CustomerInfoListeners::new(),
                op_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Build the HTTP client, connect the store and start listening for
    /// purchase and foreground events. Later calls are no-ops.
    pub async fn configure(&self, config: SubxMobileConfig) -> Result<()> {
        if self.is_configured() {
            debug!("configure called on a configured instance; ignoring");
            return Ok(());
        }
        let client = SubxClient::new(config.client_config())?;
        self.configure_with_api(config, Arc::new(client)).await
    }

    /// Like [`configure`](Self::configure) with a caller-supplied API.
    ///
    /// Only `entitlement_ids` is read from `config`.
    pub async fn configure_with_api(
        &self,
        config: SubxMobileConfig,
        api: Arc<dyn SubxApi>,
    ) -> Result<()> {
        let _op = self.inner.op_lock.lock().await;
        {
            let mut setup = self.inner.setup.write().unwrap_or_else(|e| e.into_inner());
            if setup.state != ConfigState::Unconfigured {
                return Ok(());
            }
            setup.state = ConfigState::Configuring;
            setup.api = Some(api);
            setup.entitlement_ids = config.entitlement_ids;
        }

        let started = self.start().await;

        let mut setup = self.inner.setup.write().unwrap_or_else(|e| e.into_inner());
        match started {
            Ok(()) => {
                setup.state = ConfigState::Ready;
                info!(platform = %self.inner.platform, "SubX configured");
                Ok(())
            }
            Err(e) => {
                setup.state = ConfigState::Unconfigured;
                setup.api = None;
                Err(e)
            }
        }
    }

    async fn start(&self) -> Result<()> {
        let runtime = Handle::try_current().map_err(|e| SubxMobileError::Internal(e.to_string()))?;

        self.inner.store.connect().await?;

        let subscriptions = vec![
            self.inner
                .store
                .add_purchase_updated_listener(self.purchase_updated_handler(runtime.clone())),
            self.inner
                .store
                .add_purchase_error_listener(Arc::new(log_purchase_error)),
            self.inner
                .app_state
                .add_listener(self.app_state_handler(runtime)),
        ];
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(subscriptions);
        Ok(())
    }

    fn purchase_updated_handler(&self, runtime: Handle) -> PurchaseUpdatedListener {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |purchase: Purchase| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            runtime.spawn(async move {
                SubxMobile { inner }.on_purchase_updated(purchase).await;
            });
        })
    }

    fn app_state_handler(&self, runtime: Handle) -> AppStateListener {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |state: AppState| {
            if !state.is_foreground() {
                return;
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            runtime.spawn(async move {
                SubxMobile { inner }.on_foreground().await;
            });
        })
    }

    /// Remove event subscriptions, disconnect the store and drop all
    /// customer info listeners.
    ///
    /// Waits for the operation in progress, including a pending configure.
    /// The identity and last snapshot are kept. The instance can be
    /// configured again afterwards.
    pub async fn destroy(&self) -> Result<()> {
        let _op = self.inner.op_lock.lock().await;
        let subscriptions = std::mem::take(
            &mut *self
                .inner
                .subscriptions
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );
        for mut subscription in subscriptions {
            subscription.remove();
        }

        let disconnected = self.inner.store.disconnect().await;

        {
            let mut setup = self.inner.setup.write().unwrap_or_else(|e| e.into_inner());
            setup.state = ConfigState::Unconfigured;
            setup.api = None;
        }
        self.inner.listeners.clear();
        debug!("SubX destroyed");
        disconnected
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Make `app_user_id` the active user and load their customer info.
    pub async fn identify(&self, app_user_id: &str) -> Result<Arc<CustomerInfo>> {
        self.identify_with_attributes(app_user_id, None).await
    }

    /// [`identify`](Self::identify), also storing subscriber attributes.
    pub async fn identify_with_attributes(
        &self,
        app_user_id: &str,
        attributes: Option<&HashMap<String, String>>,
    ) -> Result<Arc<CustomerInfo>> {
        let _op = self.inner.op_lock.lock().await;
        let api = self.api()?;

        {
            let mut session = self.inner.session.write().unwrap_or_else(|e| e.into_inner());
            if session.app_user_id.as_deref() != Some(app_user_id) {
                session.customer_info = None;
                session.reconciled.clear();
            }
            session.app_user_id = Some(app_user_id.to_string());
        }
        debug!("Identifying {}", app_user_id);

        let subscriber = api.upsert_subscriber(app_user_id, attributes).await?;
        let info = Arc::new(CustomerInfo::from(subscriber));
        self.publish(info.clone());
        Ok(info)
    }

    /// Forget the active user and their customer info.
    ///
    /// Listeners are not called; they only ever receive snapshots.
    pub async fn logout(&self) {
        let _op = self.inner.op_lock.lock().await;
        let mut session = self.inner.session.write().unwrap_or_else(|e| e.into_inner());
        session.app_user_id = None;
        session.customer_info = None;
        session.reconciled.clear();
        debug!("Logged out");
    }

    // ========================================================================
    // Purchases
    // ========================================================================

    /// Buy `product_id` through the native store and reconcile it.
    pub async fn purchase(&self, product_id: &str) -> Result<PurchaseOutcome> {
        let _op = self.inner.op_lock.lock().await;
        let app_user_id = self.require_user()?;
        let api = self.api()?;

        let Some(purchase) = self.inner.store.request_purchase(product_id).await? else {
            debug!("Purchase of {} did not complete", product_id);
            return Ok(PurchaseOutcome {
                success: false,
                customer_info: self.customer_info(),
            });
        };

        self.reconcile(api.as_ref(), &app_user_id, &purchase).await?;
        let customer_info = self.refresh_or_keep(api.as_ref(), &app_user_id).await;
        Ok(PurchaseOutcome {
            success: true,
            customer_info,
        })
    }

    /// Submit and finish every unfinished purchase, in store order.
    ///
    /// The first failure stops the loop and is returned; purchases after it
    /// are left untouched.
    pub async fn restore(&self) -> Result<Option<Arc<CustomerInfo>>> {
        let _op = self.inner.op_lock.lock().await;
        let app_user_id = self.require_user()?;
        let api = self.api()?;

        let purchases = self.inner.store.get_available_purchases().await?;
        debug!("Restoring {} purchases for {}", purchases.len(), app_user_id);
        for purchase in &purchases {
            self.reconcile(api.as_ref(), &app_user_id, purchase).await?;
        }

        Ok(self.refresh_or_keep(api.as_ref(), &app_user_id).await)
    }

    /// Submit and finish `purchase`. Returns `false` when its transaction was
    /// already reconciled for this user.
    async fn reconcile(
        &self,
        api: &dyn SubxApi,
        app_user_id: &str,
        purchase: &Purchase,
    ) -> Result<bool> {
        if self.is_reconciled(purchase) {
            debug!("Transaction {} already reconciled; skipping", purchase.label());
            return Ok(false);
        }

        let receipt = map_purchase_to_receipt(purchase, self.inner.platform);
        api.submit_receipt(app_user_id, &receipt).await?;
        debug!("Receipt for {} accepted", purchase.label());
        self.inner.store.finish_transaction(purchase, false).await?;

        if let Some(transaction_id) = &purchase.transaction_id {
            self.inner
                .session
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .reconciled
                .insert(transaction_id.clone());
        }
        Ok(true)
    }

    fn is_reconciled(&self, purchase: &Purchase) -> bool {
        let Some(transaction_id) = &purchase.transaction_id else {
            return false;
        };
        self.inner
            .session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .reconciled
            .contains(transaction_id)
    }

    async fn on_purchase_updated(&self, purchase: Purchase) {
        let _op = self.inner.op_lock.lock().await;
        let Some(app_user_id) = self.app_user_id() else {
            debug!("Dropping purchase {}: no identified user", purchase.label());
            return;
        };
        let api = match self.api() {
            Ok(api) => api,
            Err(e) => {
                warn!("Dropping purchase {}: {}", purchase.label(), e);
                return;
            }
        };

        match self.reconcile(api.as_ref(), &app_user_id, &purchase).await {
            Ok(true) => {
                self.refresh_or_keep(api.as_ref(), &app_user_id).await;
            }
            Ok(false) => {}
            Err(e) => error!("Failed to process purchase {}: {}", purchase.label(), e),
        }
    }

    async fn on_foreground(&self) {
        let _op = self.inner.op_lock.lock().await;
        let (Some(app_user_id), Ok(api)) = (self.app_user_id(), self.api()) else {
            return;
        };
        debug!("App returned to foreground; refreshing {}", app_user_id);
        self.refresh_or_keep(api.as_ref(), &app_user_id).await;
    }

    // ========================================================================
    // Customer info
    // ========================================================================

    /// Fetch fresh customer info for the active user.
    ///
    /// Returns `None` when nobody is identified. A failed fetch returns the
    /// previous snapshot.
    pub async fn get_customer_info(&self) -> Result<Option<Arc<CustomerInfo>>> {
        let _op = self.inner.op_lock.lock().await;
        let Some(app_user_id) = self.app_user_id() else {
            return Ok(None);
        };
        let api = self.api()?;
        Ok(self.refresh_or_keep(api.as_ref(), &app_user_id).await)
    }

    /// Fetch fresh customer info, reporting failures.
    ///
    /// On error the current snapshot is left untouched.
    pub async fn refresh_customer_info(&self) -> Result<Option<Arc<CustomerInfo>>> {
        let _op = self.inner.op_lock.lock().await;
        let Some(app_user_id) = self.app_user_id() else {
            return Ok(None);
        };
        let api = self.api()?;
        self.try_refresh(api.as_ref(), &app_user_id).await.map(Some)
    }

    async fn try_refresh(&self, api: &dyn SubxApi, app_user_id: &str) -> Result<Arc<CustomerInfo>> {
        let subscriber = api.get_subscriber(app_user_id).await?;
        let info = Arc::new(CustomerInfo::from(subscriber));
        self.publish(info.clone());
        Ok(info)
    }

    async fn refresh_or_keep(
        &self,
        api: &dyn SubxApi,
        app_user_id: &str,
    ) -> Option<Arc<CustomerInfo>> {
        match self.try_refresh(api, app_user_id).await {
            Ok(info) => Some(info),
            Err(e) => {
                error!("Failed to refresh customer info for {}: {}", app_user_id, e);
                self.customer_info()
            }
        }
    }

    fn publish(&self, info: Arc<CustomerInfo>) {
        self.inner
            .session
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .customer_info = Some(info.clone());
        self.inner.listeners.notify(&info);
    }

    /// Register a callback for every new customer info snapshot.
    pub fn add_customer_info_listener(&self, listener: CustomerInfoListener) -> ListenerId {
        self.inner.listeners.register(listener)
    }

    pub fn remove_customer_info_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.unregister(id)
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Offerings with store prices attached.
    pub async fn get_offerings(&self) -> Result<OfferingsWithStoreProducts> {
        let api = self.api()?;
        let response = api.get_offerings().await?;
        let skus = store_product_ids(&response.all_offerings);
        let products = self.inner.store.get_products(&skus).await?;
        Ok(merge_offerings(response.all_offerings, &products))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config_state(&self) -> ConfigState {
        self.inner.setup.read().unwrap_or_else(|e| e.into_inner()).state
    }

    pub fn is_configured(&self) -> bool {
        self.config_state() == ConfigState::Ready
    }

    pub fn app_user_id(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .app_user_id
            .clone()
    }

    /// Last known snapshot, without fetching.
    pub fn customer_info(&self) -> Option<Arc<CustomerInfo>> {
        self.inner
            .session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .customer_info
            .clone()
    }

    pub fn entitlement_ids(&self) -> Vec<String> {
        self.inner
            .setup
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .entitlement_ids
            .clone()
    }

    pub fn platform(&self) -> Platform {
        self.inner.platform
    }

    /// The API client in use.
    pub fn client(&self) -> Result<Arc<dyn SubxApi>> {
        self.api()
    }

    pub fn store(&self) -> &Arc<StoreService> {
        &self.inner.store
    }

    fn api(&self) -> Result<Arc<dyn SubxApi>> {
        let setup = self.inner.setup.read().unwrap_or_else(|e| e.into_inner());
        match (&setup.state, &setup.api) {
            (ConfigState::Ready, Some(api)) => Ok(api.clone()),
            _ => Err(SubxMobileError::NotConfigured),
        }
    }

    fn require_user(&self) -> Result<String> {
        self.app_user_id().ok_or(SubxMobileError::NotIdentified)
    }
}

impl fmt::Debug for SubxMobile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubxMobile")
            .field("state", &self.config_state())
            .field("app_user_id", &self.app_user_id())
            .field("platform", &self.inner.platform)
            .finish()
    }
}

fn log_purchase_error(err: NativeStoreError) {
    if err.is_user_cancelled() {
        debug!("Purchase cancelled: {}", err.message);
    } else {
        error!("Purchase error: {}", err);
    }
}
