//! Cart route handlers.
//!
//! The cart lives in the HTTP session. Every mutating handler writes the
//! session back, and answers with the resulting cart.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use harvest_hub_core::{Currency, Money, ProductId};

use super::DisplayQuery;
use crate::error::Result;
use crate::middleware::Shopper;
use crate::models::{Cart, CartLine};
use crate::services::MarketError;
use crate::state::AppState;

/// Cart line as shown to the shopper. Prices come from the line snapshot.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub unit: String,
    pub price: Money,
    pub quantity: u32,
    pub line_total: Option<Money>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id(),
            name: line.snapshot.name.clone(),
            unit: line.snapshot.unit.clone(),
            price: line.snapshot.price,
            quantity: line.quantity,
            line_total: line.line_total(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub count: u32,
    pub subtotal: Money,
    pub subtotal_display: Option<String>,
}

impl CartView {
    /// # Errors
    ///
    /// Returns `Validation` when the subtotal overflows.
    pub fn new(cart: &Cart, currency: Currency) -> std::result::Result<Self, MarketError> {
        let subtotal = cart.subtotal()?;
        Ok(Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            count: cart.count(),
            subtotal,
            subtotal_display: subtotal.display_in(currency),
        })
    }
}

/// Add / buy-now form.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Set-quantity form. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Remove form.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: ProductId,
}

/// Show the cart.
pub async fn show(
    shopper: Shopper,
    Query(display): Query<DisplayQuery>,
) -> Result<Json<CartView>> {
    Ok(Json(CartView::new(&shopper.state.cart, display.currency)?))
}

/// Add to cart.
#[instrument(skip(state, shopper))]
pub async fn add(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(form): Json<AddForm>,
) -> Result<Json<CartView>> {
    state
        .market()
        .add_to_cart(&mut shopper.state, form.product_id, form.quantity)
        .await?;
    shopper.save().await?;
    Ok(Json(CartView::new(&shopper.state.cart, Currency::default())?))
}

/// Update a line's quantity.
#[instrument(skip(state, shopper))]
pub async fn update(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(form): Json<UpdateForm>,
) -> Result<Json<CartView>> {
    state
        .market()
        .update_quantity(&mut shopper.state, form.product_id, form.quantity)
        .await?;
    shopper.save().await?;
    Ok(Json(CartView::new(&shopper.state.cart, Currency::default())?))
}

/// Remove a line. Removing an absent line succeeds.
pub async fn remove(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(form): Json<RemoveForm>,
) -> Result<Json<CartView>> {
    state
        .market()
        .remove_from_cart(&mut shopper.state, form.product_id);
    shopper.save().await?;
    Ok(Json(CartView::new(&shopper.state.cart, Currency::default())?))
}

/// Replace the cart with a single line.
#[instrument(skip(state, shopper))]
pub async fn buy_now(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(form): Json<AddForm>,
) -> Result<Json<CartView>> {
    state
        .market()
        .buy_now(&mut shopper.state, form.product_id, form.quantity)
        .await?;
    shopper.save().await?;
    Ok(Json(CartView::new(&shopper.state.cart, Currency::default())?))
}

/// Empty the cart.
pub async fn clear(State(state): State<AppState>, mut shopper: Shopper) -> Result<Json<CartView>> {
    state.market().clear_cart(&mut shopper.state);
    shopper.save().await?;
    Ok(Json(CartView::new(&shopper.state.cart, Currency::default())?))
}
