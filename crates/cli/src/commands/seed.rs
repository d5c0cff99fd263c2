//! Seed the snapshot store with the demo dataset.
//!
//! Writes the demo catalog, accounts (buyer, farmer, owner, admin) and one
//! delivered order to whichever store the environment selects. Existing data
//! is left alone unless `--force` is given.

use std::sync::Arc;

use harvest_hub_market::config::MarketConfig;
use harvest_hub_market::db::{SnapshotBackend, SnapshotStore, keys, seed};
use harvest_hub_market::services::{Market, TracingNotifier};

/// Write the demo dataset.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, already holds data and
/// `force` is false, or any snapshot fails to save.
pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = MarketConfig::storage_from_env()?;
    let store = SnapshotBackend::from_config(&config).await?;

    if !force {
        for key in keys::ALL {
            if store.load(key).await?.is_some() {
                return Err(format!("snapshot '{key}' already exists; pass --force to overwrite").into());
            }
        }
    }

    let data = seed::dataset()?;
    tracing::info!(
        products = data.catalog.products().len(),
        accounts = data.accounts.accounts().len(),
        orders = data.orders.orders().len(),
        "Writing seed data"
    );

    let market = Market::from_parts(
        store,
        Arc::new(TracingNotifier),
        config.shipping_rates(),
        data,
    );
    market.save_all().await?;

    tracing::info!("Seed complete");
    Ok(())
}
