//! Built-in seed dataset.
//!
//! Used when a store has no usable snapshot, and by `hh-cli seed`. Ids are
//! fixed so that seeded references stay stable across runs.

use chrono::{NaiveDate, TimeZone, Utc};

use harvest_hub_core::{
    AccountId, AccountRole, Address, Email, FarmerType, Locality, Money, OrderId, OrderStatus,
    PaymentMethod, ProductId, Uuid,
};

use crate::models::{Account, CartLine, FarmProfile, Order, PaymentDetails, Product};
use crate::services::accounts::hash_password;
use crate::services::{AccountStore, AuditTrail, Catalog, MarketData, MarketError, OrderBook};

pub const BUYER_ID: AccountId = AccountId::from_uuid(Uuid::from_u128(0x1));
pub const FARMER_ID: AccountId = AccountId::from_uuid(Uuid::from_u128(0x2));
pub const OWNER_ID: AccountId = AccountId::from_uuid(Uuid::from_u128(0x3));
pub const ADMIN_ID: AccountId = AccountId::from_uuid(Uuid::from_u128(0xad));

const fn product_id(n: u128) -> ProductId {
    ProductId::from_uuid(Uuid::from_u128(0x100 + n))
}

pub const STRAWBERRIES_ID: ProductId = product_id(1);
pub const APPLES_ID: ProductId = product_id(2);
pub const CARROTS_ID: ProductId = product_id(5);

/// The full seed dataset.
///
/// # Errors
///
/// Returns `PasswordHash` if a seed password cannot be hashed, or
/// `Validation` if a seed email is malformed.
pub fn dataset() -> Result<MarketData, MarketError> {
    let catalog = catalog();
    let accounts = accounts()?;
    let orders = orders(&catalog);
    Ok(MarketData {
        catalog,
        accounts,
        orders,
        audit: AuditTrail::default(),
    })
}

/// Seed accounts. Every seed password is `password123` except the admin's.
///
/// # Errors
///
/// See [`dataset`].
pub fn accounts() -> Result<AccountStore, MarketError> {
    let buyer = Account {
        id: BUYER_ID,
        full_name: "John Doe".to_string(),
        email: Email::parse("buyer@example.com")?,
        mobile: "1234567890".to_string(),
        password_hash: hash_password("password123")?,
        role: AccountRole::Buyer,
        active: true,
        owner: false,
        wallet_balance: Some(Money::from_cents(10_000)),
        delivery_address: Some(Address {
            full_name: "John Doe".to_string(),
            phone: "1234567890".to_string(),
            street: "123 Main St".to_string(),
            city: "Bengaluru".to_string(),
            district: "Bengaluru Urban".to_string(),
            state: "Karnataka".to_string(),
            country: "India".to_string(),
            pincode: "560001".to_string(),
        }),
        farm: None,
    };

    let farmer = Account {
        id: FARMER_ID,
        full_name: "Jane Farmer".to_string(),
        email: Email::parse("farmer@example.com")?,
        mobile: "0987654321".to_string(),
        password_hash: hash_password("password123")?,
        role: AccountRole::Farmer,
        active: true,
        owner: false,
        wallet_balance: Some(Money::ZERO),
        delivery_address: None,
        farm: Some(FarmProfile {
            location: "Green Valley, Mysuru".to_string(),
            locality: Locality::new("Mysuru", "Mysuru", "Karnataka"),
            farmer_type: Some(FarmerType::Vegetables),
            payment: Some(PaymentDetails {
                upi_id: "jane@farm".to_string(),
                qr_code_url: None,
            }),
        }),
    };

    let owner = Account {
        id: OWNER_ID,
        full_name: "Market Owner".to_string(),
        email: Email::parse("owner@example.com")?,
        mobile: "5555555555".to_string(),
        password_hash: hash_password("password123")?,
        role: AccountRole::Buyer,
        active: true,
        owner: true,
        wallet_balance: Some(Money::ZERO),
        delivery_address: Some(Address {
            full_name: "Market Owner".to_string(),
            phone: "5555555555".to_string(),
            street: "1 Market Square".to_string(),
            city: "Big City".to_string(),
            district: "Big District".to_string(),
            state: "New York".to_string(),
            country: "USA".to_string(),
            pincode: "543210".to_string(),
        }),
        farm: None,
    };

    let admin = Account {
        id: ADMIN_ID,
        full_name: "Admin User".to_string(),
        email: Email::parse("admin@example.com")?,
        mobile: "1112223334".to_string(),
        password_hash: hash_password("admin@123")?,
        role: AccountRole::Admin,
        active: true,
        owner: true,
        wallet_balance: None,
        delivery_address: None,
        farm: None,
    };

    Ok(AccountStore::new(vec![buyer, farmer, owner, admin]))
}

/// Seed catalog, all sold by the seed farmer.
#[must_use]
pub fn catalog() -> Catalog {
    let harvested = NaiveDate::from_ymd_opt(2026, 3, 1);
    let item = |n: u128, name: &str, cents: i64, unit: &str, category: &str, stock: u32| {
        Product {
            id: product_id(n),
            name: name.to_string(),
            description: String::new(),
            price: Money::from_cents(cents),
            unit: unit.to_string(),
            category: category.to_string(),
            stock,
            seller_id: FARMER_ID,
            image_url: None,
            harvest_date: harvested,
            organic: name.starts_with("Organic"),
            enabled: true,
            price_history: Vec::new(),
        }
    };

    Catalog::new(vec![
        item(1, "Organic Strawberries", 499, "kg", "Fruits", 50),
        item(2, "Organic Apples", 299, "kg", "Fruits", 10),
        item(3, "Juicy Oranges", 325, "kg", "Fruits", 80),
        item(4, "Organic Bananas", 199, "kg", "Fruits", 120),
        item(5, "Fresh Carrots", 249, "kg", "Vegetables", 5),
        item(6, "Heirloom Tomatoes", 399, "kg", "Vegetables", 60),
        item(7, "Leafy Spinach", 250, "kg", "Vegetables", 90),
        item(8, "Fresh Broccoli", 229, "kg", "Vegetables", 65),
        item(9, "Whole Wheat Bread", 399, "loaf", "Bakery", 40),
        item(10, "Organic Oats", 425, "kg", "Grains", 60),
        item(11, "Farm-Fresh Eggs", 599, "dozen", "Dairy & Eggs", 150),
    ])
}

/// One delivered order from the seed buyer.
#[must_use]
pub fn orders(catalog: &Catalog) -> OrderBook {
    let Some(strawberries) = catalog.get(STRAWBERRIES_ID) else {
        return OrderBook::default();
    };
    let items = vec![CartLine {
        snapshot: strawberries.clone(),
        quantity: 2,
    }];
    let shipping_fee = Money::from_cents(250);
    let total = items.iter().filter_map(CartLine::line_total).sum::<Money>() + shipping_fee;

    OrderBook::new(vec![Order {
        id: OrderId::from_uuid(Uuid::from_u128(0x1001)),
        buyer_id: BUYER_ID,
        seller_id: FARMER_ID,
        items,
        shipping_fee,
        total,
        placed_at: Utc
            .with_ymd_and_hms(2026, 3, 2, 10, 30, 0)
            .single()
            .unwrap_or_else(Utc::now),
        status: OrderStatus::Delivered,
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
        payment_method: PaymentMethod::Card,
    }])
}
