//! Application state shared across handlers.

use std::sync::Arc;

use kori_core::KoriConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: KoriConfig,
}

impl AppState {
    /// Create a new application state from a validated configuration.
    #[must_use]
    pub fn new(config: KoriConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config }),
        }
    }

    /// Get a reference to the process configuration.
    #[must_use]
    pub fn config(&self) -> &KoriConfig {
        &self.inner.config
    }
}
