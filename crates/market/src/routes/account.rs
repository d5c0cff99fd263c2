//! Account route handlers.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::Shopper;
use crate::models::{AccountProfile, AccountSummary, Order};
use crate::services::MarketError;
use crate::state::AppState;

/// The logged-in account.
pub async fn show(State(state): State<AppState>, shopper: Shopper) -> Result<Json<AccountSummary>> {
    let account = state
        .market()
        .current_account(&shopper.state)
        .await
        .ok_or(MarketError::NotAuthenticated)?;
    Ok(Json(account))
}

/// Overwrite the profile of the logged-in account.
pub async fn update_profile(
    State(state): State<AppState>,
    shopper: Shopper,
    Json(profile): Json<AccountProfile>,
) -> Result<Json<AccountSummary>> {
    let account = state
        .market()
        .update_profile(&shopper.state, profile)
        .await?;
    Ok(Json(account))
}

/// Orders placed by the logged-in account, newest first.
pub async fn orders(State(state): State<AppState>, shopper: Shopper) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.market().orders_of_buyer(&shopper.state).await?))
}
