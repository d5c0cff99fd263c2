//! Catalog products.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use harvest_hub_core::address::require;
use harvest_hub_core::{AccountId, Money, ProductId, ValidationError};

/// A recorded change of a product's price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    /// The price before the change took effect.
    pub previous: Money,
    /// The new price.
    pub price: Money,
    pub changed_at: DateTime<Utc>,
    /// Display name of whoever made the change.
    pub changed_by: String,
}

/// A sellable item in the catalog.
///
/// `stock` is the live count. Cart lines hold a copy of this struct taken when
/// the line was last touched; only the catalog copy is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    /// Display unit such as `kg` or `dozen`.
    pub unit: String,
    pub category: String,
    pub stock: u32,
    pub seller_id: AccountId,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub harvest_date: Option<NaiveDate>,
    #[serde(default)]
    pub organic: bool,
    /// Disabled products are hidden from browsing but stay addressable.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub price_history: Vec<PriceChange>,
}

/// Highest unit price a listing may carry, in whole cents.
///
/// Keeps every cart total (stock is a `u32`) far inside decimal range.
pub const MAX_LISTING_PRICE_CENTS: i64 = 100_000_000;

const fn enabled_by_default() -> bool {
    true
}

impl Product {
    /// Whether the product has any stock left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Input for adding a product.
///
/// `seller_id` is ignored for farmers, whose products always belong to
/// themselves; admins must name the seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub unit: String,
    pub category: String,
    pub stock: u32,
    #[serde(default)]
    pub seller_id: Option<AccountId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub harvest_date: Option<NaiveDate>,
    #[serde(default)]
    pub organic: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl NewProduct {
    /// Check required fields and that the price is not negative.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_listing(&self.name, &self.unit, &self.category, self.price)
    }

    /// Build the product with a fresh id.
    #[must_use]
    pub fn into_product(self, seller_id: AccountId) -> Product {
        Product {
            id: ProductId::generate(),
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            unit: self.unit.trim().to_string(),
            category: self.category.trim().to_string(),
            stock: self.stock,
            seller_id,
            image_url: self.image_url,
            harvest_date: self.harvest_date,
            organic: self.organic,
            enabled: self.enabled,
            price_history: Vec::new(),
        }
    }
}

/// Field checks shared by new and edited products.
///
/// # Errors
///
/// Returns `Required` for a blank name, unit or category and `Invalid` for a
/// negative price or one above [`MAX_LISTING_PRICE_CENTS`].
pub fn validate_listing(
    name: &str,
    unit: &str,
    category: &str,
    price: Money,
) -> Result<(), ValidationError> {
    require("name", name)?;
    require("unit", unit)?;
    require("category", category)?;
    if price.is_negative() {
        return Err(ValidationError::Invalid {
            field: "price",
            reason: "must not be negative".to_string(),
        });
    }
    let ceiling = Money::from_cents(MAX_LISTING_PRICE_CENTS);
    if price > ceiling {
        return Err(ValidationError::Invalid {
            field: "price",
            reason: format!("must not exceed {ceiling}"),
        });
    }
    Ok(())
}

/// Catalog browsing filter. Empty fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub organic: Option<bool>,
    /// Case-insensitive substring of the product name.
    #[serde(default)]
    pub search: Option<String>,
}

impl ProductFilter {
    /// Whether an enabled product passes this filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !product.enabled {
            return false;
        }
        if let Some(category) = self.category.as_deref().map(str::trim)
            && !category.is_empty()
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(organic) = self.organic
            && product.organic != organic
        {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            return product
                .name
                .to_lowercase()
                .contains(&search.to_lowercase());
        }
        true
    }
}
