//! Domain models for the marketplace.
//!
//! These are the values the engine stores, snapshots and hands out over
//! HTTP. Behavior that needs more than one model lives in `services`.

pub mod account;
pub mod audit;
pub mod cart;
pub mod order;
pub mod product;
pub mod session;

pub use account::{
    Account, AccountProfile, AccountSummary, FarmProfile, NewAccount, PaymentDetails,
};
pub use audit::{Actor, AuditAction, AuditLogEntry};
pub use cart::{Cart, CartLine};
pub use order::Order;
pub use product::{NewProduct, PriceChange, Product, ProductFilter};
pub use session::{ShopperSession, session_keys};
