//! Placed orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_hub_core::{AccountId, Address, Money, OrderId, OrderStatus, PaymentMethod};

use crate::models::CartLine;

/// An order created by placement.
///
/// Everything except `status` is fixed at placement: `items` and
/// `shipping_address` are copies, and `total` is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: AccountId,
    pub seller_id: AccountId,
    pub items: Vec<CartLine>,
    pub shipping_fee: Money,
    /// Item subtotal plus shipping fee.
    pub total: Money,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
}

impl Order {
    /// Short human-facing reference, e.g. for audit details.
    #[must_use]
    pub fn reference(&self) -> String {
        self.id.short()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity))
    }
}
