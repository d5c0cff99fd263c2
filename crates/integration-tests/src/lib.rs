//! Integration tests for Harvest Hub.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p harvest-hub-integration-tests
//! ```
//!
//! Everything runs in process against the seed dataset in an in-memory
//! snapshot store. No database or running server is needed.
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Cart, pricing and placement behavior through the engine
//! - `concurrent_placement` - Parallel buyers racing for the same stock
//! - `http_api` - The JSON API over a real socket with a cookie-carrying client

use std::net::SocketAddr;
use std::sync::Arc;

use harvest_hub_core::Address;
use harvest_hub_market::config::MarketConfig;
use harvest_hub_market::db::{InMemorySnapshots, SnapshotBackend};
use harvest_hub_market::models::ShopperSession;
use harvest_hub_market::services::{Market, RecordingNotifier, ShippingRates};
use harvest_hub_market::state::AppState;

pub use harvest_hub_market::db::seed;

/// An engine on the seed dataset with handles to its store and notices.
pub struct TestMarket {
    pub market: Market<SnapshotBackend>,
    pub store: InMemorySnapshots,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestMarket {
    /// Open a fresh engine. Empty storage falls back to the seed dataset.
    pub async fn new() -> Self {
        let store = InMemorySnapshots::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let market = Market::open(
            SnapshotBackend::Memory(store.clone()),
            notifier.clone(),
            ShippingRates::default(),
        )
        .await
        .expect("Failed to open market");
        Self {
            market,
            store,
            notifier,
        }
    }
}

/// A session logged in as `account_id`.
#[must_use]
pub fn signed_in(account_id: harvest_hub_core::AccountId) -> ShopperSession {
    ShopperSession {
        account_id: Some(account_id),
        ..ShopperSession::default()
    }
}

/// A valid delivery address in Bengaluru, Karnataka.
#[must_use]
pub fn bengaluru() -> Address {
    Address {
        full_name: "John Doe".to_string(),
        phone: "1234567890".to_string(),
        street: "123 Main St".to_string(),
        city: "Bengaluru".to_string(),
        district: "Bengaluru Urban".to_string(),
        state: "Karnataka".to_string(),
        country: "India".to_string(),
        pincode: "560001".to_string(),
    }
}

/// The HTTP API served on an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub store: InMemorySnapshots,
}

impl TestServer {
    /// Start the router on `127.0.0.1:0` in a background task.
    pub async fn start() -> Self {
        let TestMarket { market, store, .. } = TestMarket::new().await;
        let state = AppState::new(MarketConfig::local("unused"), market);
        let app = harvest_hub_market::app(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            store,
        }
    }

    /// A client with its own cookie jar, i.e. its own shopper session.
    #[must_use]
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
