//! Test doubles for the native store and host lifecycle.
//!
//! Both doubles can share a [`EventLog`] with
//! [`MockSubxApi`](subx_lib::test_utils::MockSubxApi) so tests can assert the
//! relative order of API and store calls.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Notify;
pub use subx_lib::test_utils::EventLog;

use crate::lifecycle::{AppState, AppStateListener, AppStateSource};
use crate::store::{
    NativeIap, NativeProduct, NativeStoreError, Purchase, PurchaseErrorListener,
    PurchaseUpdatedListener,
};
use crate::subscription::ListenerSubscription;

/// What [`MockNativeIap::request_purchase`] does.
#[derive(Clone, Debug)]
pub enum PurchaseBehavior {
    /// Return one purchase for the requested SKU carrying both a receipt and a token.
    Complete,
    /// Return these records as-is.
    CompleteMany(Vec<Purchase>),
    /// Return no records.
    Empty,
    /// Fail with the iOS cancellation code.
    Cancel,
    Fail(NativeStoreError),
}

type Registry<L> = Arc<RwLock<BTreeMap<u64, L>>>;

fn subscribe<L: Send + Sync + 'static>(
    registry: &Registry<L>,
    next_id: &AtomicU64,
    listener: L,
) -> ListenerSubscription {
    let id = next_id.fetch_add(1, Ordering::Relaxed);
    registry.write().unwrap().insert(id, listener);
    let registry = registry.clone();
    ListenerSubscription::new(move || {
        registry.write().unwrap().remove(&id);
    })
}

/// Scriptable [`NativeIap`].
///
/// Calls are logged as `store:<operation>[:<detail>]`, where the detail is the
/// SKU for purchases and the product id for finished transactions.
pub struct MockNativeIap {
    log: EventLog,
    products: RwLock<Vec<NativeProduct>>,
    available: RwLock<Vec<Purchase>>,
    behavior: RwLock<PurchaseBehavior>,
    connect_failure: RwLock<Option<NativeStoreError>>,
    finish_failure: RwLock<Option<NativeStoreError>>,
    connect_gate: RwLock<Option<Arc<Notify>>>,
    echo_purchases: AtomicBool,
    finished: RwLock<Vec<Purchase>>,
    updated_listeners: Registry<PurchaseUpdatedListener>,
    error_listeners: Registry<PurchaseErrorListener>,
    next_id: AtomicU64,
    connects: AtomicU32,
    disconnects: AtomicU32,
    purchases: AtomicU32,
}

impl Default for MockNativeIap {
    fn default() -> Self {
        Self::with_log(EventLog::new())
    }
}

impl MockNativeIap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            products: RwLock::new(Vec::new()),
            available: RwLock::new(Vec::new()),
            behavior: RwLock::new(PurchaseBehavior::Complete),
            connect_failure: RwLock::new(None),
            finish_failure: RwLock::new(None),
            connect_gate: RwLock::new(None),
            echo_purchases: AtomicBool::new(false),
            finished: RwLock::new(Vec::new()),
            updated_listeners: Arc::default(),
            error_listeners: Arc::default(),
            next_id: AtomicU64::new(0),
            connects: AtomicU32::new(0),
            disconnects: AtomicU32::new(0),
            purchases: AtomicU32::new(0),
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn set_products(&self, products: Vec<NativeProduct>) {
        *self.products.write().unwrap() = products;
    }

    /// Purchases returned by `get_available_purchases`.
    pub fn set_available_purchases(&self, purchases: Vec<Purchase>) {
        *self.available.write().unwrap() = purchases;
    }

    pub fn set_purchase_behavior(&self, behavior: PurchaseBehavior) {
        *self.behavior.write().unwrap() = behavior;
    }

    pub fn fail_connect(&self, error: Option<NativeStoreError>) {
        *self.connect_failure.write().unwrap() = error;
    }

    /// Make `init_connection` wait until the returned gate is notified.
    pub fn hold_connect(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.connect_gate.write().unwrap() = Some(gate.clone());
        gate
    }

    /// Also deliver every `request_purchase` result to the purchase-updated
    /// listeners, as some native bridges do.
    pub fn echo_purchases(&self, echo: bool) {
        self.echo_purchases.store(echo, Ordering::SeqCst);
    }

    pub fn fail_finish(&self, error: Option<NativeStoreError>) {
        *self.finish_failure.write().unwrap() = error;
    }

    /// Purchases passed to `finish_transaction`, in call order.
    pub fn finished(&self) -> Vec<Purchase> {
        self.finished.read().unwrap().clone()
    }

    pub fn connect_calls(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn updated_listener_count(&self) -> usize {
        self.updated_listeners.read().unwrap().len()
    }

    pub fn error_listener_count(&self) -> usize {
        self.error_listeners.read().unwrap().len()
    }

    /// Deliver a purchase to every purchase-updated listener.
    pub fn emit_purchase_updated(&self, purchase: Purchase) {
        let listeners: Vec<_> = self.updated_listeners.read().unwrap().values().cloned().collect();
        for listener in listeners {
            listener(purchase.clone());
        }
    }

    /// Deliver an error to every purchase-error listener.
    pub fn emit_purchase_error(&self, error: NativeStoreError) {
        let listeners: Vec<_> = self.error_listeners.read().unwrap().values().cloned().collect();
        for listener in listeners {
            listener(error.clone());
        }
    }
}

#[async_trait]
impl NativeIap for MockNativeIap {
    async fn init_connection(&self) -> Result<(), NativeStoreError> {
        self.log.push("store:init_connection");
        let gate = self.connect_gate.read().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.connect_failure.read().unwrap().clone() {
            return Err(err);
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn end_connection(&self) -> Result<(), NativeStoreError> {
        self.log.push("store:end_connection");
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_products(&self, skus: &[String]) -> Result<Vec<NativeProduct>, NativeStoreError> {
        self.log.push(format!("store:fetch_products:{}", skus.join(",")));
        Ok(self
            .products
            .read()
            .unwrap()
            .iter()
            .filter(|p| {
                let id = p.product_id.as_ref().or(p.id.as_ref());
                id.map_or(false, |id| skus.contains(id))
            })
            .cloned()
            .collect())
    }

    async fn request_purchase(&self, sku: &str) -> Result<Vec<Purchase>, NativeStoreError> {
        self.log.push(format!("store:request_purchase:{}", sku));
        let behavior = self.behavior.read().unwrap().clone();
        let purchases = match behavior {
            PurchaseBehavior::Complete => {
                let n = self.purchases.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(vec![Purchase::new(sku)
                    .with_transaction_id(format!("txn_{}_{}", sku, n))
                    .with_transaction_receipt(format!("receipt_{}", sku))
                    .with_purchase_token(format!("token_{}", sku))])
            }
            PurchaseBehavior::CompleteMany(purchases) => Ok(purchases),
            PurchaseBehavior::Empty => Ok(Vec::new()),
            PurchaseBehavior::Cancel => Err(NativeStoreError::user_cancelled()),
            PurchaseBehavior::Fail(err) => Err(err),
        }?;
        if self.echo_purchases.load(Ordering::SeqCst) {
            for purchase in &purchases {
                self.emit_purchase_updated(purchase.clone());
            }
        }
        Ok(purchases)
    }

    async fn get_available_purchases(&self) -> Result<Vec<Purchase>, NativeStoreError> {
        self.log.push("store:get_available_purchases");
        Ok(self.available.read().unwrap().clone())
    }

    async fn finish_transaction(
        &self,
        purchase: &Purchase,
        _is_consumable: bool,
    ) -> Result<(), NativeStoreError> {
        self.log
            .push(format!("store:finish_transaction:{}", purchase.product_id));
        if let Some(err) = self.finish_failure.read().unwrap().clone() {
            return Err(err);
        }
        self.finished.write().unwrap().push(purchase.clone());
        Ok(())
    }

    fn purchase_updated_listener(&self, listener: PurchaseUpdatedListener) -> ListenerSubscription {
        subscribe(&self.updated_listeners, &self.next_id, listener)
    }

    fn purchase_error_listener(&self, listener: PurchaseErrorListener) -> ListenerSubscription {
        subscribe(&self.error_listeners, &self.next_id, listener)
    }
}

/// [`AppStateSource`] driven by [`emit`](Self::emit).
#[derive(Default)]
pub struct MockAppStateSource {
    listeners: Registry<AppStateListener>,
    next_id: AtomicU64,
}

impl MockAppStateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, state: AppState) {
        let listeners: Vec<_> = self.listeners.read().unwrap().values().cloned().collect();
        for listener in listeners {
            listener(state);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap().len()
    }
}

impl AppStateSource for MockAppStateSource {
    fn add_listener(&self, listener: AppStateListener) -> ListenerSubscription {
        subscribe(&self.listeners, &self.next_id, listener)
    }
}
