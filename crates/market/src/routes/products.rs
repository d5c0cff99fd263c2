//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use harvest_hub_core::{Currency, ProductId};

use super::DisplayQuery;
use crate::error::Result;
use crate::models::{AccountSummary, Product, ProductFilter};
use crate::state::AppState;

/// A product with its price rendered in the display currency.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// `None` when the converted price does not fit a decimal.
    pub price_display: Option<String>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: Product, currency: Currency) -> Self {
        let price_display = product.price.display_in(currency);
        Self {
            product,
            price_display,
        }
    }
}

/// Browse query: filter plus display currency.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub category: Option<String>,
    pub organic: Option<bool>,
    pub search: Option<String>,
    #[serde(default)]
    pub currency: Currency,
}

/// List enabled products.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Json<Vec<ProductView>> {
    let filter = ProductFilter {
        category: query.category,
        organic: query.organic,
        search: query.search,
    };
    let products = state.market().browse(&filter).await;
    Json(
        products
            .into_iter()
            .map(|p| ProductView::new(p, query.currency))
            .collect(),
    )
}

/// Product detail, disabled products included.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(display): Query<DisplayQuery>,
) -> Result<Json<ProductView>> {
    let product = state.market().product(id).await?;
    Ok(Json(ProductView::new(product, display.currency)))
}

/// Farmer directory.
pub async fn farmers(State(state): State<AppState>) -> Json<Vec<AccountSummary>> {
    Json(state.market().farmers().await)
}
