//! Application state shared across handlers.

use std::sync::Arc;

use opal_core::lifecycle::TransitionPolicy;
use opal_core::store::DataStore;

use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn DataStore>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig, store: Arc<dyn DataStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn DataStore {
        self.inner.store.as_ref()
    }

    /// Which order status changes operators may make.
    #[must_use]
    pub fn transition_policy(&self) -> TransitionPolicy {
        self.inner.config.transition_policy()
    }
}

/// State over an in-memory store, returned alongside it for assertions.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, Arc<opal_core::store::MemoryStore>) {
    let store = Arc::new(opal_core::store::MemoryStore::new());
    let state = AppState::new(crate::config::test_config(), store.clone());
    (state, store)
}
