//! Marketplace error taxonomy.
//!
//! Every variant is a terminal result for one attempt: the operation has made
//! no change, and retrying with the same input gives the same answer.
//! `Persistence` and `PasswordHash` are the only server-side faults.

use thiserror::Error;

use harvest_hub_core::{EmailError, Money, OrderStatus, Severity, ValidationError};

use crate::db::PersistenceError;
use crate::models::Product;
use crate::services::notify::Notice;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum MarketError {
    /// The product has no stock at all.
    #[error("{product} is out of stock")]
    OutOfStock {
        /// Product name.
        product: String,
    },

    /// The requested quantity exceeds live stock.
    #[error("only {available} {unit} of {product} available")]
    InsufficientStock {
        /// Product name.
        product: String,
        /// Live stock at the time of the check.
        available: u32,
        /// Display unit.
        unit: String,
    },

    /// Registration with an email that is already taken.
    #[error("an account with this email already exists")]
    DuplicateAccount,

    /// The account has been deactivated.
    #[error("account is blocked")]
    AccountBlocked,

    /// Email or password mismatch.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Placement without a logged-in account or with an empty cart.
    #[error("no active session or empty cart")]
    EmptyCartOrNoSession,

    /// Wallet payment with a balance below the order total.
    #[error("insufficient wallet balance: {balance} < {total}")]
    InsufficientWalletBalance {
        /// Balance before the attempt.
        balance: Money,
        /// Order total.
        total: Money,
    },

    /// Wallet payment for an account that has no wallet.
    #[error("wallet payment is not available for this account")]
    WalletUnavailable,

    /// Malformed user input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation needs a logged-in account.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The logged-in account may not perform the operation.
    #[error("forbidden")]
    Forbidden,

    /// The cart holds products from more than one seller.
    #[error("cart contains products from more than one seller")]
    MixedSellerCart,

    /// Order status may only move forward.
    #[error("cannot move order from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// Snapshot storage failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl From<EmailError> for MarketError {
    fn from(err: EmailError) -> Self {
        Self::Validation(ValidationError::Invalid {
            field: "email",
            reason: err.to_string(),
        })
    }
}

impl MarketError {
    /// Stock shortfall for `product` at its current live stock.
    #[must_use]
    pub fn insufficient_stock(product: &Product) -> Self {
        Self::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
            unit: product.unit.clone(),
        }
    }

    /// Stable message key for clients and translation lookup.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::OutOfStock { .. } => "cart.outOfStock",
            Self::InsufficientStock { .. } => "cart.onlyAvailable",
            Self::DuplicateAccount => "auth.duplicateAccount",
            Self::AccountBlocked => "auth.accountBlocked",
            Self::InvalidCredentials => "auth.invalidCredentials",
            Self::EmptyCartOrNoSession => "checkout.emptyCartOrNoSession",
            Self::InsufficientWalletBalance { .. } => "checkout.insufficientWallet",
            Self::WalletUnavailable => "checkout.walletUnavailable",
            Self::Validation(_) => "form.invalid",
            Self::NotFound(_) => "notFound",
            Self::NotAuthenticated => "auth.required",
            Self::Forbidden => "auth.forbidden",
            Self::MixedSellerCart => "cart.mixedSellers",
            Self::InvalidStatusTransition { .. } => "order.invalidStatus",
            Self::PasswordHash | Self::Persistence(_) => "system.error",
        }
    }

    /// Whether this is a server-side fault rather than a rejected request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::PasswordHash | Self::Persistence(_))
    }

    /// The user-facing notice for this error.
    #[must_use]
    pub fn notice(&self) -> Notice {
        let notice = Notice::new(self.key(), Severity::Error);
        match self {
            Self::OutOfStock { product } => notice.with("product", product),
            Self::InsufficientStock {
                product,
                available,
                unit,
            } => notice
                .with("product", product)
                .with("count", available)
                .with("unit", unit),
            Self::InsufficientWalletBalance { balance, total } => {
                notice.with("balance", balance).with("total", total)
            }
            Self::Validation(err) => notice
                .with("field", err.field())
                .with("reason", err),
            Self::NotFound(what) => notice.with("what", what),
            Self::InvalidStatusTransition { from, to } => {
                notice.with("from", from).with("to", to)
            }
            _ => notice,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_notice() {
        let err = MarketError::InsufficientStock {
            product: "Organic Apples".to_string(),
            available: 3,
            unit: "kg".to_string(),
        };
        let notice = err.notice();
        assert_eq!(notice.key, "cart.onlyAvailable");
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(notice.message(), "Only 3 kg of Organic Apples available.");
    }

    #[test]
    fn test_email_error_is_validation() {
        let err = MarketError::from(EmailError::AtSymbol);
        assert!(matches!(
            err,
            MarketError::Validation(ValidationError::Invalid { field: "email", .. })
        ));
    }

    #[test]
    fn test_internal_errors() {
        assert!(MarketError::PasswordHash.is_internal());
        assert!(!MarketError::Forbidden.is_internal());
        assert_eq!(MarketError::PasswordHash.key(), "system.error");
    }
}
