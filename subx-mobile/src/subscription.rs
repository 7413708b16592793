//! Disposable handles for event registrations.

use std::fmt;

/// Handle returned when registering for store or host events.
///
/// Dropping the handle does not unregister; call [`remove`](Self::remove).
/// Removal is idempotent.
pub struct ListenerSubscription {
    remover: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ListenerSubscription {
    /// Create a handle that runs `remover` on the first call to `remove`.
    pub fn new(remover: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            remover: Some(Box::new(remover)),
        }
    }

    /// A handle with nothing to remove, used when the event source is absent.
    pub fn noop() -> Self {
        Self { remover: None }
    }

    /// Unregister the listener.
    pub fn remove(&mut self) {
        if let Some(remover) = self.remover.take() {
            remover();
        }
    }

    /// Whether `remove` still has work to do.
    pub fn is_active(&self) -> bool {
        self.remover.is_some()
    }
}

impl fmt::Debug for ListenerSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}
