//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! hh-cli account deactivate -e buyer@example.com
//! hh-cli account activate -e buyer@example.com
//! ```
//!
//! Changes are audited with the system as actor.

use std::sync::Arc;

use thiserror::Error;

use harvest_hub_market::config::{ConfigError, MarketConfig};
use harvest_hub_market::db::{PersistenceError, SnapshotBackend};
use harvest_hub_market::models::Actor;
use harvest_hub_market::services::{Market, MarketError, TracingNotifier};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Market(#[from] MarketError),

    /// The change was applied in memory but could not be saved.
    #[error("account change for {0} could not be saved")]
    NotSaved(String),
}

/// Activate or deactivate the account with `email`.
///
/// # Errors
///
/// Returns an error if the account does not exist or the change cannot be
/// persisted.
pub async fn set_active(email: &str, active: bool) -> Result<(), AccountError> {
    let config = MarketConfig::storage_from_env()?;
    let store = SnapshotBackend::from_config(&config).await?;
    let market = Market::open(store, Arc::new(TracingNotifier), config.shipping_rates()).await?;

    let account = market.account_by_email(email).await?;
    let account = market
        .set_account_active_status(&Actor::System, account.id, active)
        .await?;

    if !market.is_healthy() {
        return Err(AccountError::NotSaved(account.email.to_string()));
    }

    tracing::info!(
        email = %account.email,
        active = account.active,
        "Account status updated"
    );
    Ok(())
}
