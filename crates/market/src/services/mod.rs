//! Marketplace services.
//!
//! Each store is a plain value with synchronous, all-or-nothing operations.
//! [`Market`] wraps them with locking, authorization, auditing, notices and
//! persistence.

pub mod accounts;
pub mod audit;
pub mod catalog;
pub mod error;
pub mod generative;
pub mod marketplace;
pub mod notify;
pub mod orders;
pub mod shipping;

pub use accounts::AccountStore;
pub use audit::AuditTrail;
pub use catalog::Catalog;
pub use error::MarketError;
pub use generative::{Generation, PriceSuggestion, RecipeFeed, RecipeView};
pub use marketplace::{Market, MarketData};
pub use notify::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use orders::{OrderBook, Placement, commit_order};
pub use shipping::{ShippingRates, ShippingTier};
