//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::MarketConfig;
use crate::db::SnapshotBackend;
use crate::services::Market;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MarketConfig,
    market: Market<SnapshotBackend>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: MarketConfig, market: Market<SnapshotBackend>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, market }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.inner.config
    }

    /// Get a reference to the marketplace engine.
    #[must_use]
    pub fn market(&self) -> &Market<SnapshotBackend> {
        &self.inner.market
    }
}
