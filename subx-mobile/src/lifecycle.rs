//! Host app lifecycle events.

use std::sync::Arc;

use crate::subscription::ListenerSubscription;

/// Foreground state reported by the host app.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Active,
    Background,
    Inactive,
}

impl AppState {
    pub fn is_foreground(&self) -> bool {
        matches!(self, Self::Active)
    }
}

pub type AppStateListener = Arc<dyn Fn(AppState) + Send + Sync>;

/// Source of app state changes, implemented by the host bridge.
pub trait AppStateSource: Send + Sync {
    fn add_listener(&self, listener: AppStateListener) -> ListenerSubscription;
}

/// Source for hosts that never report lifecycle changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAppStateSource;

impl AppStateSource for NoopAppStateSource {
    fn add_listener(&self, _listener: AppStateListener) -> ListenerSubscription {
        ListenerSubscription::noop()
    }
}
