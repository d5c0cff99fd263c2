//! Checkout route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use harvest_hub_core::{Address, Locality, Money, PaymentMethod};

use crate::error::{AppError, Result};
use crate::middleware::Shopper;
use crate::models::Order;
use crate::state::AppState;

/// Quote for the current cart.
#[derive(Debug, Serialize)]
pub struct QuoteView {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

/// Placement form.
#[derive(Debug, Deserialize)]
pub struct PlaceForm {
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
}

/// Live shipping quote, re-requested whenever the buyer edits the locality.
pub async fn quote(
    State(state): State<AppState>,
    shopper: Shopper,
    Json(locality): Json<Locality>,
) -> Result<Json<QuoteView>> {
    let cart = &shopper.state.cart;
    let shipping_fee = state.market().shipping_quote(cart, &locality).await;
    let subtotal = cart.subtotal()?;
    let total = subtotal
        .checked_add(shipping_fee)
        .ok_or_else(|| AppError::BadRequest("order total is too large".to_string()))?;
    Ok(Json(QuoteView {
        subtotal,
        shipping_fee,
        total,
    }))
}

/// Place the order for the session cart.
///
/// Once placed, the order is returned even if the emptied cart cannot be
/// written back to the session.
#[instrument(skip(state, shopper, form), fields(payment_method = %form.payment_method))]
pub async fn place(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(form): Json<PlaceForm>,
) -> Result<Json<Order>> {
    let order = state
        .market()
        .place_order(&mut shopper.state, form.shipping_address, form.payment_method)
        .await?;
    Ok(Json(placed(order, shopper.save().await)))
}

fn placed(order: Order, session_saved: Result<()>) -> Order {
    if let Err(error) = session_saved {
        tracing::error!(
            order_id = %order.id,
            error = %error,
            "Order placed but session cart was not cleared"
        );
    }
    order
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use harvest_hub_core::{AccountId, OrderId, OrderStatus};

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::generate(),
            buyer_id: AccountId::generate(),
            seller_id: AccountId::generate(),
            items: Vec::new(),
            shipping_fee: Money::from_cents(96),
            total: Money::from_cents(694),
            placed_at: Utc::now(),
            status: OrderStatus::Confirmed,
            shipping_address: Address {
                full_name: "John Doe".to_string(),
                phone: "1234567890".to_string(),
                street: "123 Main St".to_string(),
                city: "Bengaluru".to_string(),
                district: "Bengaluru Urban".to_string(),
                state: "Karnataka".to_string(),
                country: "India".to_string(),
                pincode: "560001".to_string(),
            },
            payment_method: PaymentMethod::Cod,
        }
    }

    #[test]
    fn test_order_survives_session_write_failure() {
        let order = order();
        let failed = Err(AppError::Internal("session store down".to_string()));

        let returned = placed(order.clone(), failed);

        assert_eq!(returned, order);
    }

    #[test]
    fn test_order_returned_after_session_write() {
        let order = order();
        assert_eq!(placed(order.clone(), Ok(())), order);
    }
}
