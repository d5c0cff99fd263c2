//! The marketplace engine.
//!
//! [`Market`] owns the process-wide stores and is the only way to mutate
//! them. Shopper sessions are plain values owned by the caller and passed in
//! by reference.
//!
//! # Locking
//!
//! Stores sit behind separate `RwLock`s that are always acquired in the order
//! catalog, accounts, orders, audit. Order placement holds all four for the
//! whole check-then-write sequence, so two placements can never both pass the
//! stock check for the same units.
//!
//! # Persistence
//!
//! Every mutation saves the snapshots it touched before releasing its locks.
//! A failed save does not undo the mutation: it is logged, reported as a
//! `persistence.saveFailed` notice, and marks the engine unhealthy until a
//! later save succeeds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::instrument;

use harvest_hub_core::{
    AccountId, Address, Email, Locality, Money, OrderId, OrderStatus, PaymentMethod, ProductId,
    ValidationError,
};

use crate::db::{PersistenceError, Snapshot, SnapshotStore, keys, seed};
use crate::models::{
    Account, AccountProfile, AccountSummary, Actor, AuditAction, AuditLogEntry, Cart, NewAccount,
    NewProduct, Order, Product, ProductFilter, ShopperSession,
};
use crate::services::generative::PriceSuggestion;
use crate::services::{
    AccountStore, AuditTrail, Catalog, MarketError, Notice, Notifier, OrderBook, Placement,
    ShippingRates, commit_order,
};

/// The four stores as one value, for seeding and bulk saves.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub catalog: Catalog,
    pub accounts: AccountStore,
    pub orders: OrderBook,
    pub audit: AuditTrail,
}

/// Marketplace engine over a snapshot store `S`.
pub struct Market<S> {
    store: S,
    notifier: Arc<dyn Notifier>,
    rates: ShippingRates,
    catalog: RwLock<Catalog>,
    accounts: RwLock<AccountStore>,
    orders: RwLock<OrderBook>,
    audit: RwLock<AuditTrail>,
    healthy: AtomicBool,
}

impl<S> std::fmt::Debug for Market<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Market")
            .field("rates", &self.rates)
            .field("healthy", &self.healthy)
            .finish_non_exhaustive()
    }
}

impl<S: SnapshotStore> Market<S> {
    /// Load every store from `store`.
    ///
    /// Stores with no snapshot, or an unreadable one, start from the seed
    /// dataset (the audit trail starts empty).
    ///
    /// # Errors
    ///
    /// Returns `Persistence` when the store itself fails, and `PasswordHash`
    /// if seed accounts cannot be built.
    pub async fn open(
        store: S,
        notifier: Arc<dyn Notifier>,
        rates: ShippingRates,
    ) -> Result<Self, MarketError> {
        let catalog: Option<Catalog> = load_store(&store, keys::CATALOG).await?;
        let accounts: Option<AccountStore> = load_store(&store, keys::ACCOUNTS).await?;
        let orders: Option<OrderBook> = load_store(&store, keys::ORDERS).await?;
        let audit: Option<AuditTrail> = load_store(&store, keys::AUDIT).await?;

        let seed = if catalog.is_none() || accounts.is_none() || orders.is_none() {
            seed::dataset()?
        } else {
            MarketData::default()
        };

        let data = MarketData {
            catalog: catalog.unwrap_or(seed.catalog),
            accounts: accounts.unwrap_or(seed.accounts),
            orders: orders.unwrap_or(seed.orders),
            audit: audit.unwrap_or_default(),
        };
        tracing::info!(
            products = data.catalog.products().len(),
            accounts = data.accounts.accounts().len(),
            orders = data.orders.orders().len(),
            "Marketplace loaded"
        );
        Ok(Self::from_parts(store, notifier, rates, data))
    }

    /// Build an engine from explicit data without touching `store`.
    pub fn from_parts(
        store: S,
        notifier: Arc<dyn Notifier>,
        rates: ShippingRates,
        data: MarketData,
    ) -> Self {
        Self {
            store,
            notifier,
            rates,
            catalog: RwLock::new(data.catalog),
            accounts: RwLock::new(data.accounts),
            orders: RwLock::new(data.orders),
            audit: RwLock::new(data.audit),
            healthy: AtomicBool::new(true),
        }
    }

    /// False after a failed save until the next successful one.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn rates(&self) -> &ShippingRates {
        &self.rates
    }

    /// Save every store, failing on the first error.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if any save fails.
    pub async fn save_all(&self) -> Result<(), MarketError> {
        let catalog = self.catalog.read().await;
        let accounts = self.accounts.read().await;
        let orders = self.orders.read().await;
        let audit = self.audit.read().await;

        self.store.save(keys::CATALOG, &Snapshot::encode(&*catalog)?).await?;
        self.store.save(keys::ACCOUNTS, &Snapshot::encode(&*accounts)?).await?;
        self.store.save(keys::ORDERS, &Snapshot::encode(&*orders)?).await?;
        self.store.save(keys::AUDIT, &Snapshot::encode(&*audit)?).await?;
        self.healthy.store(true, Ordering::SeqCst);
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Enabled products matching `filter`, newest first.
    pub async fn browse(&self, filter: &ProductFilter) -> Vec<Product> {
        self.catalog
            .read()
            .await
            .browse(filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn product(&self, id: ProductId) -> Result<Product, MarketError> {
        self.catalog.read().await.find(id).cloned()
    }

    /// Authoritative stock for admission control.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn live_stock_of(&self, id: ProductId) -> Result<u32, MarketError> {
        self.catalog.read().await.live_stock_of(id)
    }

    /// Every product of a seller, disabled ones included.
    pub async fn products_of_seller(&self, seller_id: AccountId) -> Vec<Product> {
        self.catalog
            .read()
            .await
            .of_seller(seller_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Listings of the session account, for the seller dashboard.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` or `AccountBlocked`.
    pub async fn my_listings(&self, session: &ShopperSession) -> Result<Vec<Product>, MarketError> {
        let account = self.session_account(session).await?;
        Ok(self.products_of_seller(account.id).await)
    }

    /// List a new product.
    ///
    /// Farmers always list under their own account. Admins must name an
    /// existing seller.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` / `AccountBlocked` for the session
    /// - `Forbidden` for buyers
    /// - `Validation` for bad fields or a missing seller id
    /// - `NotFound` for an unknown seller
    #[instrument(skip(self, session, new), fields(name = %new.name))]
    pub async fn add_product(
        &self,
        session: &ShopperSession,
        new: NewProduct,
    ) -> Result<Product, MarketError> {
        let result = async {
            new.validate()?;
            let (actor, seller_id) = {
                let accounts = self.accounts.read().await;
                let actor = live_account(&accounts, session)?;
                let seller_id = if actor.is_admin() {
                    let seller_id = new
                        .seller_id
                        .ok_or(ValidationError::Required { field: "seller_id" })?;
                    accounts.find(seller_id)?;
                    seller_id
                } else if actor.is_farmer() {
                    actor.id
                } else {
                    return Err(MarketError::Forbidden);
                };
                (actor, seller_id)
            };

            let mut catalog = self.catalog.write().await;
            let mut audit = self.audit.write().await;
            let product = catalog.insert(new.into_product(seller_id));
            audit.record(
                &actor_of(&actor),
                AuditAction::ProductAdded,
                format!("Product '{}' added by {}.", product.name, actor.full_name),
            );
            self.persist(keys::CATALOG, &*catalog).await;
            self.persist(keys::AUDIT, &*audit).await;
            tracing::info!(product_id = %product.id, seller_id = %seller_id, "Product added");
            Ok::<_, MarketError>(product)
        }
        .await;

        self.report(result, |p| Notice::success("product.added").with("product", &p.name))
    }

    /// Overwrite a product.
    ///
    /// Farmers may only edit their own products and may not hand them to
    /// another seller.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` / `AccountBlocked` for the session
    /// - `Forbidden` when the account may not edit this product
    /// - `NotFound` for an unknown id
    /// - `Validation` for bad fields
    #[instrument(skip(self, session, product), fields(product_id = %product.id))]
    pub async fn update_product(
        &self,
        session: &ShopperSession,
        product: Product,
    ) -> Result<Product, MarketError> {
        let result = async {
            let actor = self.session_account(session).await?;
            let mut catalog = self.catalog.write().await;
            let mut audit = self.audit.write().await;

            let existing = catalog.find(product.id)?;
            if !actor.is_admin()
                && (existing.seller_id != actor.id || product.seller_id != actor.id)
            {
                return Err(MarketError::Forbidden);
            }
            let updated = catalog.update(product, &actor.full_name)?.clone();
            audit.record(
                &actor_of(&actor),
                AuditAction::ProductUpdated,
                format!("Product '{}' updated by {}.", updated.name, actor.full_name),
            );
            self.persist(keys::CATALOG, &*catalog).await;
            self.persist(keys::AUDIT, &*audit).await;
            Ok::<_, MarketError>(updated)
        }
        .await;

        self.report(result, |p| Notice::success("product.updated").with("product", &p.name))
    }

    /// Remove a product from the catalog.
    ///
    /// Cart lines that still reference it fail at placement.
    ///
    /// # Errors
    ///
    /// Same as [`Market::update_product`].
    #[instrument(skip(self, session), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        session: &ShopperSession,
        id: ProductId,
    ) -> Result<Product, MarketError> {
        let result = async {
            let actor = self.session_account(session).await?;
            let mut catalog = self.catalog.write().await;
            let mut audit = self.audit.write().await;

            if !actor.is_admin() && catalog.find(id)?.seller_id != actor.id {
                return Err(MarketError::Forbidden);
            }
            let removed = catalog.remove(id)?;
            audit.record(
                &actor_of(&actor),
                AuditAction::ProductDeleted,
                format!("Product '{}' deleted by {}.", removed.name, actor.full_name),
            );
            self.persist(keys::CATALOG, &*catalog).await;
            self.persist(keys::AUDIT, &*audit).await;
            Ok::<_, MarketError>(removed)
        }
        .await;

        self.report(result, |p| Notice::success("product.deleted").with("product", &p.name))
    }

    /// Apply a price suggestion as an ordinary product edit.
    ///
    /// # Errors
    ///
    /// Same as [`Market::update_product`].
    pub async fn apply_price_suggestion(
        &self,
        session: &ShopperSession,
        suggestion: &PriceSuggestion,
    ) -> Result<Product, MarketError> {
        let mut product = match self.product(suggestion.product_id).await {
            Ok(product) => product,
            Err(err) => return self.report_failure(Err(err)),
        };
        product.price = suggestion.suggested_price;
        self.update_product(session, product).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `quantity` of a product to the session cart.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown product
    /// - `Validation` for a zero quantity
    /// - `OutOfStock` / `InsufficientStock` against live stock
    /// - `MixedSellerCart` when the cart holds another seller's products
    #[instrument(skip(self, session), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        session: &mut ShopperSession,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), MarketError> {
        let catalog = self.catalog.read().await;
        let result = catalog.find(product_id).and_then(|live| {
            session.cart.add(live, quantity)?;
            Ok(live.name.clone())
        });
        drop(catalog);
        self.report(result, |name| Notice::success("cart.added").with("product", name))
            .map(|_| ())
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// - `NotFound` when raising the quantity of a product that is gone
    /// - `InsufficientStock` when `quantity` exceeds live stock
    pub async fn update_quantity(
        &self,
        session: &mut ShopperSession,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), MarketError> {
        let catalog = self.catalog.read().await;
        let result = session
            .cart
            .update_quantity(product_id, catalog.get(product_id), quantity);
        drop(catalog);
        self.report_failure(result)
    }

    /// Remove a line. Absent lines are a no-op.
    pub fn remove_from_cart(&self, session: &mut ShopperSession, product_id: ProductId) -> bool {
        session.cart.remove(product_id)
    }

    /// Replace the whole cart with one line.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown product
    /// - `Validation` for a zero quantity
    /// - `OutOfStock` / `InsufficientStock` against live stock
    pub async fn buy_now(
        &self,
        session: &mut ShopperSession,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), MarketError> {
        let catalog = self.catalog.read().await;
        let result = catalog
            .find(product_id)
            .and_then(|live| session.cart.buy_now(live, quantity));
        drop(catalog);
        self.report_failure(result)
    }

    pub fn clear_cart(&self, session: &mut ShopperSession) {
        session.cart.clear();
    }

    // =========================================================================
    // Shipping & placement
    // =========================================================================

    /// Live shipping quote for `cart` delivered to `buyer`.
    pub async fn shipping_quote(&self, cart: &Cart, buyer: &Locality) -> Money {
        let accounts = self.accounts.read().await;
        self.rates
            .compute_fee(cart, buyer, |seller_id| accounts.seller_locality(seller_id))
    }

    /// Turn the session cart into a confirmed order.
    ///
    /// On success the cart is cleared. On failure nothing changes anywhere.
    ///
    /// # Errors
    ///
    /// - `EmptyCartOrNoSession` without an account or with an empty cart
    /// - `Validation` for a malformed address
    /// - `NotAuthenticated` / `AccountBlocked` for a vanished or blocked account
    /// - anything [`commit_order`] returns
    #[instrument(skip(self, session, shipping_address), fields(payment_method = %payment_method))]
    pub async fn place_order(
        &self,
        session: &mut ShopperSession,
        shipping_address: Address,
        payment_method: PaymentMethod,
    ) -> Result<Order, MarketError> {
        let result = async {
            let buyer_id = match session.account_id {
                Some(id) if !session.cart.is_empty() => id,
                _ => return Err(MarketError::EmptyCartOrNoSession),
            };
            shipping_address.validate()?;

            let mut catalog = self.catalog.write().await;
            let mut accounts = self.accounts.write().await;
            let mut orders = self.orders.write().await;
            let mut audit = self.audit.write().await;

            let shipping_fee = self.rates.compute_fee(
                &session.cart,
                &shipping_address.locality(),
                |seller_id| accounts.seller_locality(seller_id),
            );

            let buyer = accounts
                .find_mut(buyer_id)
                .map_err(|_| MarketError::NotAuthenticated)?;
            if !buyer.active {
                return Err(MarketError::AccountBlocked);
            }
            let actor = actor_of(buyer);

            let order = commit_order(
                &mut catalog,
                buyer,
                &mut orders,
                Placement {
                    cart: &session.cart,
                    shipping_fee,
                    shipping_address,
                    payment_method,
                },
            )?;

            audit.record(
                &actor,
                AuditAction::OrderPlaced,
                format!("User {} placed order #{}.", actor.name(), order.reference()),
            );
            self.persist(keys::CATALOG, &*catalog).await;
            self.persist(keys::ACCOUNTS, &*accounts).await;
            self.persist(keys::ORDERS, &*orders).await;
            self.persist(keys::AUDIT, &*audit).await;

            session.cart.clear();
            tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
            Ok::<_, MarketError>(order)
        }
        .await;

        self.report(result, |order| {
            Notice::success("order.placed").with("reference", order.reference())
        })
    }

    // =========================================================================
    // Accounts & sessions
    // =========================================================================

    /// Create an account and log the session into it.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed fields, a short password or the admin role
    /// - `DuplicateAccount` if the email is taken
    #[instrument(skip(self, session, new), fields(role = %new.role))]
    pub async fn register(
        &self,
        session: &mut ShopperSession,
        new: NewAccount,
    ) -> Result<AccountSummary, MarketError> {
        let result = async {
            let mut accounts = self.accounts.write().await;
            let mut audit = self.audit.write().await;

            let account = accounts.register(new)?;
            audit.record(
                &actor_of(&account),
                AuditAction::UserSignup,
                format!("New user {} registered as a {}.", account.full_name, account.role),
            );
            self.persist(keys::ACCOUNTS, &*accounts).await;
            self.persist(keys::AUDIT, &*audit).await;

            session.account_id = Some(account.id);
            tracing::info!(account_id = %account.id, "Account registered");
            Ok::<_, MarketError>(account.summary())
        }
        .await;

        self.report(result, |a| {
            Notice::success("auth.signupSuccess").with("name", &a.full_name)
        })
    }

    /// Log the session into an account.
    ///
    /// With `remember` the email is kept on the session for the next login
    /// form; without it any remembered email is forgotten.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for an unknown email or wrong password
    /// - `AccountBlocked` for a deactivated account
    #[instrument(skip(self, session, password))]
    pub async fn login(
        &self,
        session: &mut ShopperSession,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<AccountSummary, MarketError> {
        let result = async {
            let account = {
                let accounts = self.accounts.read().await;
                accounts.authenticate(email, password)?.clone()
            };

            let mut audit = self.audit.write().await;
            audit.record(
                &actor_of(&account),
                AuditAction::UserLogin,
                format!("User {} logged in.", account.full_name),
            );
            self.persist(keys::AUDIT, &*audit).await;

            session.account_id = Some(account.id);
            session.remembered_email = remember.then(|| account.email.clone());
            Ok::<_, MarketError>(account.summary())
        }
        .await;

        self.report(result, |a| {
            Notice::success("auth.welcomeBack").with("name", &a.full_name)
        })
    }

    /// End the session's login and empty its cart.
    pub async fn logout(&self, session: &mut ShopperSession) {
        if let Some(id) = session.account_id.take() {
            let actor = {
                let accounts = self.accounts.read().await;
                accounts.get(id).map_or(Actor::System, actor_of)
            };
            let mut audit = self.audit.write().await;
            audit.record(
                &actor,
                AuditAction::UserLogout,
                format!("User {} logged out.", actor.name()),
            );
            self.persist(keys::AUDIT, &*audit).await;
        }
        session.cart.clear();
        self.notifier.notify(&Notice::success("auth.loggedOut"));
    }

    /// Acknowledge a password reset request. No email is sent.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email
    /// - `NotFound` when no account uses the email
    pub async fn forgot_password(&self, email: &str) -> Result<(), MarketError> {
        let result = async {
            let email = Email::parse(email)?;
            let accounts = self.accounts.read().await;
            if accounts.by_email(&email).is_none() {
                return Err(MarketError::NotFound("account".to_string()));
            }
            Ok::<_, MarketError>(email)
        }
        .await;

        self.report(result, |email| {
            Notice::success("auth.resetLinkSent").with("email", email)
        })
        .map(|_| ())
    }

    /// Overwrite the session account's profile.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` / `AccountBlocked` for the session
    /// - `Forbidden` when `profile.id` is not the session account
    /// - `Validation` for malformed fields
    #[instrument(skip(self, session, profile), fields(account_id = %profile.id))]
    pub async fn update_profile(
        &self,
        session: &ShopperSession,
        profile: AccountProfile,
    ) -> Result<AccountSummary, MarketError> {
        let result = async {
            let mut accounts = self.accounts.write().await;
            let mut audit = self.audit.write().await;

            let current = live_account(&accounts, session)?;
            if current.id != profile.id {
                return Err(MarketError::Forbidden);
            }
            let updated = accounts.update_profile(profile)?;
            audit.record(
                &actor_of(updated),
                AuditAction::ProfileUpdate,
                format!("User {} updated their profile.", updated.full_name),
            );
            let summary = updated.summary();
            self.persist(keys::ACCOUNTS, &*accounts).await;
            self.persist(keys::AUDIT, &*audit).await;
            Ok::<_, MarketError>(summary)
        }
        .await;

        self.report(result, |_| Notice::success("profile.updated"))
    }

    /// Activate or deactivate an account.
    ///
    /// Open sessions of the target see the change on their next operation.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless `actor` is an active admin or the system
    /// - `NotFound` for an unknown target
    #[instrument(skip(self, actor), fields(account_id = %id))]
    pub async fn set_account_active_status(
        &self,
        actor: &Actor,
        id: AccountId,
        active: bool,
    ) -> Result<AccountSummary, MarketError> {
        let result = async {
            let mut accounts = self.accounts.write().await;
            let mut audit = self.audit.write().await;

            if let Some(actor_id) = actor.id() {
                let admin = accounts
                    .get(actor_id)
                    .is_some_and(|a| a.active && a.is_admin());
                if !admin {
                    return Err(MarketError::Forbidden);
                }
            }

            let target = accounts.set_active(id, active)?.summary();
            let verb = if active { "activated" } else { "deactivated" };
            audit.record(
                actor,
                AuditAction::UserStatusUpdated,
                format!("User {} was {verb} by {}.", target.full_name, actor.name()),
            );
            self.persist(keys::ACCOUNTS, &*accounts).await;
            self.persist(keys::AUDIT, &*audit).await;
            tracing::info!(active, "Account status updated");
            Ok::<_, MarketError>(target)
        }
        .await;

        self.report(result, |a| {
            Notice::success("admin.userStatusUpdated").with("name", &a.full_name)
        })
    }

    /// The live account behind a session, if it still exists.
    pub async fn current_account(&self, session: &ShopperSession) -> Option<AccountSummary> {
        let id = session.account_id?;
        self.accounts.read().await.get(id).map(Account::summary)
    }

    /// # Errors
    ///
    /// Returns `NotFound` when no account uses the email.
    pub async fn account_by_email(&self, email: &str) -> Result<AccountSummary, MarketError> {
        let email = Email::parse(email)?;
        self.accounts
            .read()
            .await
            .by_email(&email)
            .map(Account::summary)
            .ok_or_else(|| MarketError::NotFound(format!("account {email}")))
    }

    /// All farmer accounts.
    pub async fn farmers(&self) -> Vec<AccountSummary> {
        self.accounts
            .read()
            .await
            .farmers()
            .into_iter()
            .map(Account::summary)
            .collect()
    }

    /// Every account. Admins only.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated`, `AccountBlocked` or `Forbidden`.
    pub async fn accounts(
        &self,
        session: &ShopperSession,
    ) -> Result<Vec<AccountSummary>, MarketError> {
        let accounts = self.accounts.read().await;
        require_admin(&live_account(&accounts, session)?)?;
        Ok(accounts.accounts().iter().map(Account::summary).collect())
    }

    /// The audit trail, newest first. Admins only.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated`, `AccountBlocked` or `Forbidden`.
    pub async fn audit_log(
        &self,
        session: &ShopperSession,
    ) -> Result<Vec<AuditLogEntry>, MarketError> {
        require_admin(&self.session_account(session).await?)?;
        Ok(self.audit.read().await.entries().to_vec())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Orders placed by the session account.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` or `AccountBlocked`.
    pub async fn orders_of_buyer(
        &self,
        session: &ShopperSession,
    ) -> Result<Vec<Order>, MarketError> {
        let account = self.session_account(session).await?;
        let orders = self.orders.read().await;
        Ok(orders.of_buyer(account.id).into_iter().cloned().collect())
    }

    /// Orders sold by the session account.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` or `AccountBlocked`.
    pub async fn orders_of_seller(
        &self,
        session: &ShopperSession,
    ) -> Result<Vec<Order>, MarketError> {
        let account = self.session_account(session).await?;
        let orders = self.orders.read().await;
        Ok(orders.of_seller(account.id).into_iter().cloned().collect())
    }

    /// Every order. Admins only.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated`, `AccountBlocked` or `Forbidden`.
    pub async fn all_orders(&self, session: &ShopperSession) -> Result<Vec<Order>, MarketError> {
        require_admin(&self.session_account(session).await?)?;
        Ok(self.orders.read().await.orders().to_vec())
    }

    /// Move an order forward. Its seller or an admin only.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` / `AccountBlocked` for the session
    /// - `NotFound` for an unknown order
    /// - `Forbidden` for anyone else
    /// - `InvalidStatusTransition` unless `status` is ahead of the current one
    #[instrument(skip(self, session), fields(order_id = %id, status = %status))]
    pub async fn advance_order_status(
        &self,
        session: &ShopperSession,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, MarketError> {
        let result = async {
            let actor = self.session_account(session).await?;
            let mut orders = self.orders.write().await;
            let mut audit = self.audit.write().await;

            let seller_id = orders
                .get(id)
                .map(|o| o.seller_id)
                .ok_or_else(|| MarketError::NotFound(format!("order {id}")))?;
            if !actor.is_admin() && seller_id != actor.id {
                return Err(MarketError::Forbidden);
            }
            let order = orders.advance_status(id, status)?.clone();
            audit.record(
                &actor_of(&actor),
                AuditAction::OrderStatusUpdated,
                format!(
                    "Order #{} marked {status} by {}.",
                    order.reference(),
                    actor.full_name
                ),
            );
            self.persist(keys::ORDERS, &*orders).await;
            self.persist(keys::AUDIT, &*audit).await;
            Ok::<_, MarketError>(order)
        }
        .await;

        self.report(result, |order| {
            Notice::success("order.statusUpdated")
                .with("reference", order.reference())
                .with("status", order.status)
        })
    }

    // =========================================================================
    // Helper Functions
    // =========================================================================

    /// Live, active account behind the session.
    async fn session_account(&self, session: &ShopperSession) -> Result<Account, MarketError> {
        live_account(&*self.accounts.read().await, session)
    }

    /// Save one store, recording the outcome in the health flag.
    async fn persist<T: Serialize + Sync>(&self, key: &'static str, value: &T) {
        let outcome = match Snapshot::encode(value) {
            Ok(snapshot) => self.store.save(key, &snapshot).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => self.healthy.store(true, Ordering::SeqCst),
            Err(error) => {
                tracing::error!(key, error = %error, "Failed to save snapshot");
                self.healthy.store(false, Ordering::SeqCst);
                self.notifier
                    .notify(&Notice::error("persistence.saveFailed").with("store", key));
            }
        }
    }

    /// Notify the outcome of an operation and pass it through.
    fn report<T>(
        &self,
        result: Result<T, MarketError>,
        success: impl FnOnce(&T) -> Notice,
    ) -> Result<T, MarketError> {
        match &result {
            Ok(value) => self.notifier.notify(&success(value)),
            Err(err) => self.notifier.notify(&err.notice()),
        }
        result
    }

    /// Notify only on failure.
    fn report_failure<T>(&self, result: Result<T, MarketError>) -> Result<T, MarketError> {
        if let Err(err) = &result {
            self.notifier.notify(&err.notice());
        }
        result
    }
}

async fn load_store<S, T>(store: &S, key: &str) -> Result<Option<T>, PersistenceError>
where
    S: SnapshotStore,
    T: DeserializeOwned,
{
    let decoded = match store.load(key).await? {
        Some(snapshot) => snapshot.decode(key),
        None => {
            tracing::warn!(key, "No snapshot found, using seed data");
            return Ok(None);
        }
    };
    match decoded {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_unreadable_data() => {
            tracing::warn!(key, error = %error, "Unreadable snapshot, using seed data");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

fn live_account(accounts: &AccountStore, session: &ShopperSession) -> Result<Account, MarketError> {
    let id = session.account_id.ok_or(MarketError::NotAuthenticated)?;
    let account = accounts.get(id).ok_or(MarketError::NotAuthenticated)?;
    if !account.active {
        return Err(MarketError::AccountBlocked);
    }
    Ok(account.clone())
}

fn require_admin(account: &Account) -> Result<(), MarketError> {
    if account.is_admin() {
        Ok(())
    } else {
        Err(MarketError::Forbidden)
    }
}

fn actor_of(account: &Account) -> Actor {
    Actor::Account {
        id: account.id,
        name: account.full_name.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use harvest_hub_core::AccountRole;

    use super::*;
    use crate::db::InMemorySnapshots;
    use crate::db::seed::{
        ADMIN_ID, APPLES_ID, BUYER_ID, CARROTS_ID, FARMER_ID, STRAWBERRIES_ID,
    };
    use crate::services::RecordingNotifier;

    async fn market() -> (Market<InMemorySnapshots>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let market = Market::open(
            InMemorySnapshots::new(),
            notifier.clone(),
            ShippingRates::default(),
        )
        .await
        .unwrap();
        (market, notifier)
    }

    fn signed_in(id: AccountId) -> ShopperSession {
        ShopperSession {
            account_id: Some(id),
            ..ShopperSession::default()
        }
    }

    fn bengaluru() -> Address {
        Address {
            full_name: "John Doe".to_string(),
            phone: "1234567890".to_string(),
            street: "123 Main St".to_string(),
            city: "Bengaluru".to_string(),
            district: "Bengaluru Urban".to_string(),
            state: "Karnataka".to_string(),
            country: "India".to_string(),
            pincode: "560001".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_falls_back_to_seed() {
        let (market, _) = market().await;
        assert_eq!(market.browse(&ProductFilter::default()).await.len(), 11);
        assert_eq!(market.live_stock_of(CARROTS_ID).await.unwrap(), 5);
        assert!(market.is_healthy());
    }

    #[tokio::test]
    async fn test_open_ignores_version_mismatch() {
        let store = InMemorySnapshots::new();
        let mut snapshot = Snapshot::encode(&Catalog::default()).unwrap();
        snapshot.schema_version = 99;
        store.insert(keys::CATALOG, snapshot);

        let market = Market::open(store, Arc::new(RecordingNotifier::new()), ShippingRates::default())
            .await
            .unwrap();
        assert_eq!(market.browse(&ProductFilter::default()).await.len(), 11);
    }

    #[tokio::test]
    async fn test_open_prefers_saved_snapshot() {
        let store = InMemorySnapshots::new();
        store.insert(keys::CATALOG, Snapshot::encode(&Catalog::default()).unwrap());

        let market = Market::open(store, Arc::new(RecordingNotifier::new()), ShippingRates::default())
            .await
            .unwrap();
        assert!(market.browse(&ProductFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_happy_path() {
        let (market, notifier) = market().await;
        let mut session = signed_in(BUYER_ID);
        market.add_to_cart(&mut session, APPLES_ID, 2).await.unwrap();

        let order = market
            .place_order(&mut session, bengaluru(), PaymentMethod::Card)
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.seller_id, FARMER_ID);
        // Bengaluru buyer, Mysuru seller: state tier (80 INR).
        assert_eq!(order.shipping_fee, Money::from_cents(96));
        assert_eq!(order.total, Money::from_cents(598 + 96));
        assert!(session.cart.is_empty());
        assert_eq!(market.live_stock_of(APPLES_ID).await.unwrap(), 8);
        assert_eq!(notifier.last().unwrap().key, "order.placed");

        let saved = market.store().get(keys::ORDERS).unwrap();
        let book: OrderBook = saved.decode(keys::ORDERS).unwrap();
        assert_eq!(book.orders()[0].id, order.id);
    }

    #[tokio::test]
    async fn test_place_order_requires_session_and_cart() {
        let (market, notifier) = market().await;

        let mut anonymous = ShopperSession::anonymous();
        market.add_to_cart(&mut anonymous, APPLES_ID, 1).await.unwrap();
        assert!(matches!(
            market
                .place_order(&mut anonymous, bengaluru(), PaymentMethod::Cod)
                .await,
            Err(MarketError::EmptyCartOrNoSession)
        ));

        let mut empty = signed_in(BUYER_ID);
        assert!(matches!(
            market.place_order(&mut empty, bengaluru(), PaymentMethod::Cod).await,
            Err(MarketError::EmptyCartOrNoSession)
        ));
        assert_eq!(notifier.last().unwrap().key, "checkout.emptyCartOrNoSession");
    }

    #[tokio::test]
    async fn test_wallet_debit() {
        let (market, _) = market().await;
        let mut session = signed_in(BUYER_ID);
        market.add_to_cart(&mut session, STRAWBERRIES_ID, 2).await.unwrap();

        let order = market
            .place_order(&mut session, bengaluru(), PaymentMethod::Wallet)
            .await
            .unwrap();

        let buyer = market.current_account(&session).await.unwrap();
        assert_eq!(
            buyer.wallet_balance,
            Some(Money::from_cents(10_000) - order.total)
        );
        assert_eq!(order.payment_method, PaymentMethod::Wallet);
    }

    #[tokio::test]
    async fn test_blocked_buyer_cannot_place() {
        let (market, _) = market().await;
        let mut session = signed_in(BUYER_ID);
        market.add_to_cart(&mut session, APPLES_ID, 1).await.unwrap();

        market
            .set_account_active_status(&Actor::System, BUYER_ID, false)
            .await
            .unwrap();

        assert!(matches!(
            market.place_order(&mut session, bengaluru(), PaymentMethod::Cod).await,
            Err(MarketError::AccountBlocked)
        ));
        assert_eq!(market.live_stock_of(APPLES_ID).await.unwrap(), 10);
        assert!(!session.cart.is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_keeps_mutation() {
        let (market, notifier) = market().await;
        market.store().set_fail_saves(true);

        let mut session = signed_in(BUYER_ID);
        market.add_to_cart(&mut session, APPLES_ID, 1).await.unwrap();
        let order = market
            .place_order(&mut session, bengaluru(), PaymentMethod::Cod)
            .await
            .unwrap();

        assert!(!market.is_healthy());
        assert!(notifier.keys().contains(&"persistence.saveFailed"));
        assert_eq!(market.live_stock_of(APPLES_ID).await.unwrap(), 9);
        assert_eq!(market.orders_of_buyer(&session).await.unwrap()[0].id, order.id);

        market.store().set_fail_saves(false);
        market.save_all().await.unwrap();
        assert!(market.is_healthy());
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (market, notifier) = market().await;
        let mut session = ShopperSession::anonymous();

        let account = market
            .login(&mut session, "buyer@example.com", "password123", true)
            .await
            .unwrap();
        assert_eq!(account.id, BUYER_ID);
        assert_eq!(notifier.last().unwrap().message(), "Welcome back, John Doe!");
        assert_eq!(
            session.remembered_email.as_ref().map(Email::as_str),
            Some("buyer@example.com")
        );

        market.add_to_cart(&mut session, APPLES_ID, 1).await.unwrap();
        market.logout(&mut session).await;
        assert!(!session.is_authenticated());
        assert!(session.cart.is_empty());
        assert!(session.remembered_email.is_some());

        let admin = signed_in(ADMIN_ID);
        let log = market.audit_log(&admin).await.unwrap();
        assert_eq!(log[0].action, AuditAction::UserLogout);
        assert_eq!(log[1].action, AuditAction::UserLogin);
    }

    #[tokio::test]
    async fn test_blocked_login_establishes_no_session() {
        let (market, _) = market().await;
        market
            .set_account_active_status(&Actor::System, BUYER_ID, false)
            .await
            .unwrap();

        let mut session = ShopperSession::anonymous();
        assert!(matches!(
            market
                .login(&mut session, "buyer@example.com", "password123", false)
                .await,
            Err(MarketError::AccountBlocked)
        ));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_logs_in() {
        let (market, _) = market().await;
        let mut session = ShopperSession::anonymous();
        let account = market
            .register(
                &mut session,
                NewAccount {
                    full_name: "Asha Rao".to_string(),
                    email: "asha@example.com".to_string(),
                    mobile: "9876543210".to_string(),
                    password: "harvest2026".to_string(),
                    role: AccountRole::Buyer,
                    delivery_address: None,
                    farm: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(session.account_id, Some(account.id));
        assert_eq!(account.wallet_balance, Some(Money::ZERO));
    }

    #[tokio::test]
    async fn test_only_seller_or_admin_edits_product() {
        let (market, _) = market().await;
        let admin = signed_in(ADMIN_ID);
        let buyer = signed_in(BUYER_ID);

        let mut apples = market.product(APPLES_ID).await.unwrap();
        apples.stock = 500;
        assert!(matches!(
            market.update_product(&buyer, apples.clone()).await,
            Err(MarketError::Forbidden)
        ));

        let updated = market.update_product(&admin, apples).await.unwrap();
        assert_eq!(updated.stock, 500);
    }

    #[tokio::test]
    async fn test_farmer_lists_under_own_account() {
        let (market, _) = market().await;
        let farmer = signed_in(FARMER_ID);

        let product = market
            .add_product(
                &farmer,
                NewProduct {
                    name: "Sweet Corn".to_string(),
                    description: String::new(),
                    price: Money::from_cents(150),
                    unit: "kg".to_string(),
                    category: "Vegetables".to_string(),
                    stock: 30,
                    seller_id: Some(BUYER_ID),
                    image_url: None,
                    harvest_date: None,
                    organic: false,
                    enabled: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(product.seller_id, FARMER_ID);
        assert_eq!(market.browse(&ProductFilter::default()).await[0].id, product.id);
        assert_eq!(market.my_listings(&farmer).await.unwrap().len(), 12);
        assert!(market.my_listings(&signed_in(BUYER_ID)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_advance_order_status() {
        let (market, _) = market().await;
        let mut buyer = signed_in(BUYER_ID);
        market.add_to_cart(&mut buyer, APPLES_ID, 1).await.unwrap();
        let order = market
            .place_order(&mut buyer, bengaluru(), PaymentMethod::Upi)
            .await
            .unwrap();

        assert!(matches!(
            market
                .advance_order_status(&buyer, order.id, OrderStatus::Delivered)
                .await,
            Err(MarketError::Forbidden)
        ));

        let farmer = signed_in(FARMER_ID);
        let delivered = market
            .advance_order_status(&farmer, order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);

        assert!(matches!(
            market
                .advance_order_status(&farmer, order.id, OrderStatus::Confirmed)
                .await,
            Err(MarketError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_apply_price_suggestion() {
        let (market, _) = market().await;
        let farmer = signed_in(FARMER_ID);
        let updated = market
            .apply_price_suggestion(
                &farmer,
                &PriceSuggestion {
                    product_id: APPLES_ID,
                    suggested_price: Money::from_cents(349),
                    reason: "Seasonal demand".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price, Money::from_cents(349));
        assert_eq!(updated.price_history.len(), 1);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_toggle_accounts() {
        let (market, _) = market().await;
        let actor = Actor::Account {
            id: FARMER_ID,
            name: "Jane Farmer".to_string(),
        };
        assert!(matches!(
            market.set_account_active_status(&actor, BUYER_ID, false).await,
            Err(MarketError::Forbidden)
        ));
        assert!(matches!(
            market.accounts(&signed_in(FARMER_ID)).await,
            Err(MarketError::Forbidden)
        ));
    }
}
