//! Order book and the placement commit.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use harvest_hub_core::{
    AccountId, Address, Money, OrderId, OrderStatus, PaymentMethod, ValidationError,
};

use crate::models::{Account, Cart, Order};
use crate::services::{Catalog, MarketError};

/// All orders, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    #[must_use]
    pub const fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn of_buyer(&self, buyer_id: AccountId) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.buyer_id == buyer_id).collect()
    }

    #[must_use]
    pub fn of_seller(&self, seller_id: AccountId) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.seller_id == seller_id)
            .collect()
    }

    fn insert(&mut self, order: Order) {
        self.orders.insert(0, order);
    }

    /// Move an order forward in its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `InvalidStatusTransition` when
    /// `status` is not ahead of the current one.
    pub fn advance_status(&mut self, id: OrderId, status: OrderStatus) -> Result<&Order, MarketError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| MarketError::NotFound(format!("order {id}")))?;
        if !order.status.can_advance_to(status) {
            return Err(MarketError::InvalidStatusTransition {
                from: order.status,
                to: status,
            });
        }
        order.status = status;
        Ok(order)
    }
}

/// Checkout input for [`commit_order`].
#[derive(Debug)]
pub struct Placement<'a> {
    pub cart: &'a Cart,
    /// Fee quoted for `shipping_address`.
    pub shipping_fee: Money,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
}

/// Turn a cart into an order.
///
/// Every check runs before the first write, so a failure leaves the catalog,
/// the buyer and the order book untouched. The caller must hold all three for
/// the whole call so that no other placement can interleave between the stock
/// check and the decrement. The cart itself is left for the caller to clear.
///
/// # Errors
///
/// - `EmptyCartOrNoSession` for an empty cart
/// - `MixedSellerCart` when lines belong to different sellers
/// - `InsufficientStock` naming the first line live stock cannot cover
/// - `WalletUnavailable` / `InsufficientWalletBalance` for wallet payment
/// - `Validation` on `total` when the order total overflows
pub fn commit_order(
    catalog: &mut Catalog,
    buyer: &mut Account,
    orders: &mut OrderBook,
    placement: Placement<'_>,
) -> Result<Order, MarketError> {
    let Placement {
        cart,
        shipping_fee,
        shipping_address,
        payment_method,
    } = placement;

    let seller_id = cart.seller_id().ok_or(MarketError::EmptyCartOrNoSession)?;
    if cart.has_mixed_sellers() {
        return Err(MarketError::MixedSellerCart);
    }

    for line in cart.lines() {
        match catalog.get(line.product_id()) {
            Some(live) if live.stock >= line.quantity => {}
            Some(live) => return Err(MarketError::insufficient_stock(live)),
            None => {
                return Err(MarketError::InsufficientStock {
                    product: line.snapshot.name.clone(),
                    available: 0,
                    unit: line.snapshot.unit.clone(),
                });
            }
        }
    }

    let total = cart
        .subtotal()?
        .checked_add(shipping_fee)
        .ok_or_else(|| {
            MarketError::Validation(ValidationError::Invalid {
                field: "total",
                reason: "amount is too large".to_string(),
            })
        })?;

    if payment_method == PaymentMethod::Wallet {
        let balance = buyer.wallet_balance.ok_or(MarketError::WalletUnavailable)?;
        if balance < total {
            return Err(MarketError::InsufficientWalletBalance { balance, total });
        }
        buyer.wallet_balance = Some(balance - total);
    }

    let order = Order {
        id: OrderId::generate(),
        buyer_id: buyer.id,
        seller_id,
        items: cart.lines().to_vec(),
        shipping_fee,
        total,
        placed_at: Utc::now(),
        status: OrderStatus::Confirmed,
        shipping_address,
        payment_method,
    };

    for line in cart.lines() {
        catalog.decrement_stock(line.product_id(), line.quantity)?;
    }
    orders.insert(order.clone());

    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use harvest_hub_core::{AccountRole, Email};

    use super::*;
    use crate::models::product::tests::product;

    fn buyer(wallet: Option<Money>) -> Account {
        Account {
            id: AccountId::generate(),
            full_name: "John Doe".to_string(),
            email: Email::parse("buyer@example.com").unwrap(),
            mobile: "1234567890".to_string(),
            password_hash: String::new(),
            role: AccountRole::Buyer,
            active: true,
            owner: false,
            wallet_balance: wallet,
            delivery_address: None,
            farm: None,
        }
    }

    fn address() -> Address {
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

    fn placement(cart: &Cart, method: PaymentMethod) -> Placement<'_> {
        Placement {
            cart,
            shipping_fee: Money::from_cents(96),
            shipping_address: address(),
            payment_method: method,
        }
    }

    #[test]
    fn test_commit_decrements_and_records() {
        let seller = AccountId::generate();
        let mut catalog = Catalog::default();
        let apples = catalog.insert(product(10, 299, seller));
        let mut cart = Cart::new();
        cart.add(&apples, 3).unwrap();
        let mut buyer = buyer(None);
        let mut orders = OrderBook::default();

        let order = commit_order(
            &mut catalog,
            &mut buyer,
            &mut orders,
            placement(&cart, PaymentMethod::Cod),
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.seller_id, seller);
        assert_eq!(order.total, Money::from_cents(897 + 96));
        assert_eq!(catalog.live_stock_of(apples.id).unwrap(), 7);
        assert_eq!(orders.orders().len(), 1);
    }

    #[test]
    fn test_short_line_aborts_everything() {
        let seller = AccountId::generate();
        let mut catalog = Catalog::default();
        let apples = catalog.insert(product(10, 299, seller));
        let mut carrots = product(5, 249, seller);
        carrots.name = "Fresh Carrots".to_string();
        let carrots = catalog.insert(carrots);

        let mut cart = Cart::new();
        cart.add(&apples, 2).unwrap();
        cart.add(&carrots, 5).unwrap();
        catalog.decrement_stock(carrots.id, 3).unwrap();

        let mut buyer = buyer(Some(Money::from_cents(100_000)));
        let mut orders = OrderBook::default();
        let err = commit_order(
            &mut catalog,
            &mut buyer,
            &mut orders,
            placement(&cart, PaymentMethod::Wallet),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            MarketError::InsufficientStock { ref product, available: 2, .. } if product == "Fresh Carrots"
        ));
        assert_eq!(catalog.live_stock_of(apples.id).unwrap(), 10);
        assert_eq!(buyer.wallet_balance, Some(Money::from_cents(100_000)));
        assert!(orders.orders().is_empty());
    }

    #[test]
    fn test_wallet_debit_exact() {
        let mut catalog = Catalog::default();
        let apples = catalog.insert(product(10, 299, AccountId::generate()));
        let mut cart = Cart::new();
        cart.add(&apples, 2).unwrap();
        let mut buyer = buyer(Some(Money::from_cents(10_000)));
        let mut orders = OrderBook::default();

        let order = commit_order(
            &mut catalog,
            &mut buyer,
            &mut orders,
            placement(&cart, PaymentMethod::Wallet),
        )
        .unwrap();

        assert_eq!(order.payment_method, PaymentMethod::Wallet);
        assert_eq!(
            buyer.wallet_balance,
            Some(Money::from_cents(10_000) - order.total)
        );
    }

    #[test]
    fn test_wallet_insufficient_and_unavailable() {
        let mut catalog = Catalog::default();
        let apples = catalog.insert(product(10, 299, AccountId::generate()));
        let mut cart = Cart::new();
        cart.add(&apples, 2).unwrap();
        let mut orders = OrderBook::default();

        let mut poor = buyer(Some(Money::from_cents(100)));
        assert!(matches!(
            commit_order(&mut catalog, &mut poor, &mut orders, placement(&cart, PaymentMethod::Wallet)),
            Err(MarketError::InsufficientWalletBalance { .. })
        ));
        assert_eq!(poor.wallet_balance, Some(Money::from_cents(100)));

        let mut walletless = buyer(None);
        assert!(matches!(
            commit_order(&mut catalog, &mut walletless, &mut orders, placement(&cart, PaymentMethod::Wallet)),
            Err(MarketError::WalletUnavailable)
        ));
        assert_eq!(catalog.live_stock_of(apples.id).unwrap(), 10);
    }

    #[test]
    fn test_overflowing_total_is_rejected_without_changes() {
        let mut catalog = Catalog::default();
        let mut gold = product(10, 299, AccountId::generate());
        gold.price = Money::new(rust_decimal::Decimal::MAX);
        let gold = catalog.insert(gold);
        let mut cart = Cart::new();
        cart.add(&gold, 1).unwrap();
        let mut orders = OrderBook::default();

        let err = commit_order(
            &mut catalog,
            &mut buyer(None),
            &mut orders,
            placement(&cart, PaymentMethod::Cod),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            MarketError::Validation(ValidationError::Invalid { field: "total", .. })
        ));
        assert_eq!(catalog.live_stock_of(gold.id).unwrap(), 10);
        assert!(orders.orders().is_empty());
    }

    #[test]
    fn test_empty_cart() {
        let mut catalog = Catalog::default();
        let mut orders = OrderBook::default();
        let cart = Cart::new();
        assert!(matches!(
            commit_order(&mut catalog, &mut buyer(None), &mut orders, placement(&cart, PaymentMethod::Upi)),
            Err(MarketError::EmptyCartOrNoSession)
        ));
    }

    #[test]
    fn test_status_only_advances() {
        let mut catalog = Catalog::default();
        let apples = catalog.insert(product(10, 299, AccountId::generate()));
        let mut cart = Cart::new();
        cart.add(&apples, 1).unwrap();
        let mut orders = OrderBook::default();
        let order = commit_order(
            &mut catalog,
            &mut buyer(None),
            &mut orders,
            placement(&cart, PaymentMethod::Card),
        )
        .unwrap();

        assert!(matches!(
            orders.advance_status(order.id, OrderStatus::Pending),
            Err(MarketError::InvalidStatusTransition { .. })
        ));
        let delivered = orders.advance_status(order.id, OrderStatus::Delivered).unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.total, order.total);
    }
}
