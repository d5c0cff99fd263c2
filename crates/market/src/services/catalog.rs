//! Catalog store.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use harvest_hub_core::{AccountId, ProductId};

use crate::models::product::validate_listing;
use crate::models::{PriceChange, Product, ProductFilter};
use crate::services::MarketError;

/// All products, newest first.
///
/// `stock` only goes down through [`Catalog::decrement_stock`] and only goes up
/// through product edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no product has this id.
    pub fn find(&self, id: ProductId) -> Result<&Product, MarketError> {
        self.get(id).ok_or_else(|| not_found(id))
    }

    /// Authoritative stock count for admission checks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has this id.
    pub fn live_stock_of(&self, id: ProductId) -> Result<u32, MarketError> {
        self.find(id).map(|p| p.stock)
    }

    /// Enabled products passing `filter`.
    #[must_use]
    pub fn browse(&self, filter: &ProductFilter) -> Vec<&Product> {
        self.products.iter().filter(|p| filter.matches(p)).collect()
    }

    /// All products of a seller, including disabled ones.
    #[must_use]
    pub fn of_seller(&self, seller_id: AccountId) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.seller_id == seller_id)
            .collect()
    }

    /// Insert at the head of the catalog and return the stored value.
    pub fn insert(&mut self, product: Product) -> Product {
        self.products.insert(0, product.clone());
        product
    }

    /// Replace the product with the same id.
    ///
    /// The stored price history is kept and extended when the price changes;
    /// any history on `product` itself is ignored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `Validation` for bad fields.
    pub fn update(&mut self, mut product: Product, changed_by: &str) -> Result<&Product, MarketError> {
        validate_listing(&product.name, &product.unit, &product.category, product.price)?;
        let id = product.id;
        let slot = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;

        product.price_history = std::mem::take(&mut slot.price_history);
        if slot.price != product.price {
            product.price_history.push(PriceChange {
                previous: slot.price,
                price: product.price,
                changed_at: Utc::now(),
                changed_by: changed_by.to_string(),
            });
        }
        *slot = product;
        Ok(slot)
    }

    /// Remove a product and return it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn remove(&mut self, id: ProductId) -> Result<Product, MarketError> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok(self.products.remove(index))
    }

    /// `stock = max(0, stock - quantity)`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<u32, MarketError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;
        product.stock = product.stock.saturating_sub(quantity);
        Ok(product.stock)
    }
}

fn not_found(id: ProductId) -> MarketError {
    MarketError::NotFound(format!("product {id}"))
}
