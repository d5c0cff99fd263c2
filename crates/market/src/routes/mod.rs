//! HTTP route handlers.
//!
//! Every endpoint speaks JSON. Rejections use the body described in
//! [`crate::error`].
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /products                        - Browse (?category, ?organic, ?search, ?currency)
//! GET    /products/{id}                   - Product detail
//! GET    /farmers                         - Farmer directory
//!
//! # Cart (session)
//! GET    /cart                            - Cart contents (?currency)
//! POST   /cart/add                        - Add to cart
//! POST   /cart/update                     - Set quantity (<= 0 removes)
//! POST   /cart/remove                     - Remove line
//! POST   /cart/buy-now                    - Replace cart with one line
//! POST   /cart/clear                      - Empty cart
//!
//! # Checkout
//! POST   /checkout/quote                  - Live shipping quote for a locality
//! POST   /checkout/place                  - Place order
//!
//! # Auth (rate limited)
//! POST   /auth/register                   - Register and log in
//! POST   /auth/login                      - Log in
//! POST   /auth/logout                     - Log out
//! POST   /auth/forgot-password            - Request reset link
//!
//! # Account (requires auth)
//! GET    /account                         - Current account
//! PUT    /account/profile                 - Overwrite profile
//! GET    /account/orders                  - Order history
//!
//! # Seller dashboard (farmers and admins)
//! GET    /seller/products                 - Own products
//! POST   /seller/products                 - List product
//! PUT    /seller/products/{id}            - Edit product
//! DELETE /seller/products/{id}            - Delete product
//! POST   /seller/products/{id}/price      - Apply price suggestion
//! GET    /seller/orders                   - Orders to fulfil
//! POST   /seller/orders/{id}/status       - Advance order status
//!
//! # Admin
//! GET    /admin/accounts                  - All accounts
//! POST   /admin/accounts/{id}/status      - Activate / deactivate
//! GET    /admin/orders                    - All orders
//! GET    /admin/audit                     - Audit trail
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod seller;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Deserialize;

use harvest_hub_core::Currency;

use crate::state::AppState;

/// `?currency=` display selection shared by read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DisplayQuery {
    #[serde(default)]
    pub currency: Currency,
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
}

/// Create the main routes router (everything except `/auth`).
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::show))
        .route("/farmers", get(products::farmers))
        // Cart
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/update", post(cart::update))
        .route("/cart/remove", post(cart::remove))
        .route("/cart/buy-now", post(cart::buy_now))
        .route("/cart/clear", post(cart::clear))
        // Checkout
        .route("/checkout/quote", post(checkout::quote))
        .route("/checkout/place", post(checkout::place))
        // Account
        .route("/account", get(account::show))
        .route("/account/profile", put(account::update_profile))
        .route("/account/orders", get(account::orders))
        // Seller dashboard
        .route(
            "/seller/products",
            get(seller::products).post(seller::add_product),
        )
        .route(
            "/seller/products/{id}",
            put(seller::update_product).delete(seller::delete_product),
        )
        .route("/seller/products/{id}/price", post(seller::apply_price))
        .route("/seller/orders", get(seller::orders))
        .route("/seller/orders/{id}/status", post(seller::advance_status))
        // Admin
        .route("/admin/accounts", get(admin::accounts))
        .route("/admin/accounts/{id}/status", post(admin::set_status))
        .route("/admin/orders", get(admin::orders))
        .route("/admin/audit", get(admin::audit))
}
