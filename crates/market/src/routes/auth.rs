//! Authentication route handlers.
//!
//! The session id is rotated on every change of identity.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::Shopper;
use crate::models::{AccountSummary, NewAccount};
use crate::state::AppState;

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// Forgot-password form.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Register a new account and log it in.
#[instrument(skip(state, shopper, form), fields(role = %form.role))]
pub async fn register(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(form): Json<NewAccount>,
) -> Result<(StatusCode, Json<AccountSummary>)> {
    let account = state.market().register(&mut shopper.state, form).await?;
    shopper.cycle_id().await?;
    shopper.save().await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Log in with email and password.
#[instrument(skip(state, shopper, form))]
pub async fn login(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(form): Json<LoginForm>,
) -> Result<Json<AccountSummary>> {
    let account = state
        .market()
        .login(&mut shopper.state, &form.email, &form.password, form.remember)
        .await?;
    shopper.cycle_id().await?;
    shopper.save().await?;
    Ok(Json(account))
}

/// Log out and empty the cart.
pub async fn logout(State(state): State<AppState>, mut shopper: Shopper) -> Result<StatusCode> {
    state.market().logout(&mut shopper.state).await;
    shopper.cycle_id().await?;
    shopper.save().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Request a password reset link.
///
/// Unknown emails are rejected; the link itself is only announced.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(form): Json<ForgotPasswordForm>,
) -> Result<StatusCode> {
    state.market().forgot_password(&form.email).await?;
    Ok(StatusCode::ACCEPTED)
}
