//! Seller dashboard route handlers.
//!
//! Ownership checks happen in the engine: farmers only touch their own
//! listings and orders, admins touch everything.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use harvest_hub_core::{Money, OrderId, OrderStatus, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::Shopper;
use crate::models::{NewProduct, Order, Product};
use crate::services::PriceSuggestion;
use crate::state::AppState;

/// Price suggestion accepted by the seller.
#[derive(Debug, Deserialize)]
pub struct PriceForm {
    pub suggested_price: Money,
    #[serde(default)]
    pub reason: String,
}

/// Status advance form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

/// Listings owned by the logged-in seller.
pub async fn products(
    State(state): State<AppState>,
    shopper: Shopper,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.market().my_listings(&shopper.state).await?))
}

/// List a new product.
#[instrument(skip(state, shopper, form), fields(name = %form.name))]
pub async fn add_product(
    State(state): State<AppState>,
    shopper: Shopper,
    Json(form): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.market().add_product(&shopper.state, form).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a listing.
#[instrument(skip(state, shopper, product), fields(product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(id): Path<ProductId>,
    Json(product): Json<Product>,
) -> Result<Json<Product>> {
    if product.id != id {
        return Err(AppError::BadRequest(
            "product id does not match the path".to_string(),
        ));
    }
    let product = state.market().update_product(&shopper.state, product).await?;
    Ok(Json(product))
}

/// Delete a listing.
#[instrument(skip(state, shopper), fields(product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.market().delete_product(&shopper.state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply an accepted price suggestion to a listing.
pub async fn apply_price(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(id): Path<ProductId>,
    Json(form): Json<PriceForm>,
) -> Result<Json<Product>> {
    let suggestion = PriceSuggestion {
        product_id: id,
        suggested_price: form.suggested_price,
        reason: form.reason,
    };
    let product = state
        .market()
        .apply_price_suggestion(&shopper.state, &suggestion)
        .await?;
    Ok(Json(product))
}

/// Orders containing the logged-in seller's products.
pub async fn orders(State(state): State<AppState>, shopper: Shopper) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.market().orders_of_seller(&shopper.state).await?))
}

/// Move an order forward in its lifecycle.
#[instrument(skip(state, shopper), fields(order_id = %id))]
pub async fn advance_status(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(id): Path<OrderId>,
    Json(form): Json<StatusForm>,
) -> Result<Json<Order>> {
    let order = state
        .market()
        .advance_order_status(&shopper.state, id, form.status)
        .await?;
    Ok(Json(order))
}
