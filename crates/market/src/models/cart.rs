//! Shopping cart.
//!
//! The cart works on product values handed in by the caller, who reads them
//! from the catalog under its lock. Every mutation that can raise a quantity is
//! checked against that live product; the stored `snapshot` only drives display
//! and pricing.

use serde::{Deserialize, Serialize};

use harvest_hub_core::{AccountId, Money, ProductId, ValidationError};

use crate::models::Product;
use crate::services::MarketError;

/// One product and quantity in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Copy of the product taken when the line was last added or updated.
    pub snapshot: Product,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.snapshot.id
    }

    /// Snapshot price times quantity, `None` if it does not fit a decimal.
    #[must_use]
    pub fn line_total(&self) -> Option<Money> {
        self.snapshot.price.checked_times(self.quantity)
    }
}

/// Ordered cart lines, unique by product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of a product currently in the cart, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |line| line.quantity)
    }

    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == product_id)
    }

    /// Seller of the first line; the seller an order from this cart goes to.
    #[must_use]
    pub fn seller_id(&self) -> Option<AccountId> {
        self.lines.first().map(|line| line.snapshot.seller_id)
    }

    /// Whether lines from more than one seller are present.
    #[must_use]
    pub fn has_mixed_sellers(&self) -> bool {
        self.seller_id().is_some_and(|seller| {
            self.lines
                .iter()
                .any(|line| line.snapshot.seller_id != seller)
        })
    }

    /// Total number of units.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity))
    }

    /// Sum of snapshot prices times quantities.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on `total` when the sum overflows.
    pub fn subtotal(&self) -> Result<Money, MarketError> {
        self.lines
            .iter()
            .try_fold(Money::ZERO, |total, line| {
                line.line_total().and_then(|amount| total.checked_add(amount))
            })
            .ok_or_else(amount_too_large)
    }

    /// Add `quantity` units of `live`, merging with an existing line.
    ///
    /// Nothing changes unless the whole request fits in live stock.
    ///
    /// # Errors
    ///
    /// - `Validation` for a zero quantity
    /// - `OutOfStock` when the product has no stock
    /// - `InsufficientStock` when cart quantity plus `quantity` exceeds stock
    /// - `MixedSellerCart` when the cart already holds another seller's goods
    pub fn add(&mut self, live: &Product, quantity: u32) -> Result<(), MarketError> {
        if quantity == 0 {
            return Err(zero_quantity());
        }
        if !live.in_stock() {
            return Err(MarketError::OutOfStock {
                product: live.name.clone(),
            });
        }

        let wanted = u64::from(self.quantity_of(live.id)) + u64::from(quantity);
        if wanted > u64::from(live.stock) {
            return Err(MarketError::insufficient_stock(live));
        }
        if self
            .lines
            .iter()
            .any(|line| line.product_id() != live.id && line.snapshot.seller_id != live.seller_id)
        {
            return Err(MarketError::MixedSellerCart);
        }

        // `wanted` is bounded by a u32 stock here.
        let quantity = u32::try_from(wanted).unwrap_or(live.stock);
        ensure_priceable(live, quantity)?;
        match self.lines.iter_mut().find(|line| line.product_id() == live.id) {
            Some(line) => {
                line.quantity = quantity;
                line.snapshot = live.clone();
            }
            None => self.lines.push(CartLine {
                snapshot: live.clone(),
                quantity,
            }),
        }
        Ok(())
    }

    /// Set a line's quantity exactly. A quantity of zero or less removes it.
    ///
    /// `live` may be `None` when the product no longer exists; removal still
    /// works in that case.
    ///
    /// # Errors
    ///
    /// - `NotFound` when raising a quantity for a product that is gone
    /// - `InsufficientStock` when `quantity` exceeds live stock
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        live: Option<&Product>,
        quantity: i64,
    ) -> Result<(), MarketError> {
        if quantity <= 0 {
            self.remove(product_id);
            return Ok(());
        }
        let live = live.ok_or_else(|| MarketError::NotFound(format!("product {product_id}")))?;
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if quantity > live.stock {
            return Err(MarketError::insufficient_stock(live));
        }
        ensure_priceable(live, quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|line| line.product_id() == product_id) {
            line.quantity = quantity;
            line.snapshot = live.clone();
        }
        Ok(())
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id() != product_id);
        self.lines.len() != before
    }

    /// Replace the whole cart with a single line.
    ///
    /// # Errors
    ///
    /// - `Validation` for a zero quantity
    /// - `OutOfStock` when the product has no stock
    /// - `InsufficientStock` when `quantity` exceeds live stock
    pub fn buy_now(&mut self, live: &Product, quantity: u32) -> Result<(), MarketError> {
        if quantity == 0 {
            return Err(zero_quantity());
        }
        if !live.in_stock() {
            return Err(MarketError::OutOfStock {
                product: live.name.clone(),
            });
        }
        if quantity > live.stock {
            return Err(MarketError::insufficient_stock(live));
        }
        ensure_priceable(live, quantity)?;
        self.lines = vec![CartLine {
            snapshot: live.clone(),
            quantity,
        }];
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

fn ensure_priceable(live: &Product, quantity: u32) -> Result<(), MarketError> {
    live.price
        .checked_times(quantity)
        .map(|_| ())
        .ok_or_else(amount_too_large)
}

fn amount_too_large() -> MarketError {
    MarketError::Validation(ValidationError::Invalid {
        field: "total",
        reason: "amount is too large".to_string(),
    })
}

fn zero_quantity() -> MarketError {
    MarketError::Validation(ValidationError::Invalid {
        field: "quantity",
        reason: "must be at least 1".to_string(),
    })
}
