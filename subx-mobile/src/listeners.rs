//! Customer info listener registry.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::customer_info::CustomerInfo;

/// Callback invoked with every new customer info snapshot.
pub type CustomerInfoListener = Arc<dyn Fn(&CustomerInfo) + Send + Sync>;

/// Opaque handle returned by [`CustomerInfoListeners::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Registry of customer info listeners.
///
/// Listeners run in registration order, on the notifying thread, with the
/// registry lock released. A listener may therefore register or unregister
/// listeners; the change applies from the next notification.
#[derive(Default)]
pub struct CustomerInfoListeners {
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<ListenerId, CustomerInfoListener>>,
}

impl CustomerInfoListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: CustomerInfoListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, listener);
        id
    }

    /// Remove a listener. Returns false when `id` was not registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some()
    }

    pub fn notify(&self, info: &CustomerInfo) {
        let snapshot: Vec<CustomerInfoListener> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();

        for listener in snapshot {
            listener(info);
        }
    }

    pub fn clear(&self) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CustomerInfoListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerInfoListeners")
            .field("len", &self.len())
            .finish()
    }
}
