//! Admin route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use harvest_hub_core::AccountId;

use crate::error::Result;
use crate::middleware::Shopper;
use crate::models::{AccountSummary, Actor, AuditLogEntry, Order};
use crate::services::MarketError;
use crate::state::AppState;

/// Activation form.
#[derive(Debug, Deserialize)]
pub struct ActiveForm {
    pub active: bool,
}

/// Every account.
pub async fn accounts(
    State(state): State<AppState>,
    shopper: Shopper,
) -> Result<Json<Vec<AccountSummary>>> {
    Ok(Json(state.market().accounts(&shopper.state).await?))
}

/// Activate or deactivate an account.
#[instrument(skip(state, shopper), fields(account_id = %id))]
pub async fn set_status(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(id): Path<AccountId>,
    Json(form): Json<ActiveForm>,
) -> Result<Json<AccountSummary>> {
    let me = state
        .market()
        .current_account(&shopper.state)
        .await
        .ok_or(MarketError::NotAuthenticated)?;
    let actor = Actor::Account {
        id: me.id,
        name: me.full_name,
    };
    let account = state
        .market()
        .set_account_active_status(&actor, id, form.active)
        .await?;
    Ok(Json(account))
}

/// Every order, newest first.
pub async fn orders(State(state): State<AppState>, shopper: Shopper) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.market().all_orders(&shopper.state).await?))
}

/// The audit trail.
pub async fn audit(
    State(state): State<AppState>,
    shopper: Shopper,
) -> Result<Json<Vec<AuditLogEntry>>> {
    Ok(Json(state.market().audit_log(&shopper.state).await?))
}
