//! Status and role enums for marketplace entities.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Status only ever advances: `Pending` → `Confirmed` → `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivered,
}

impl OrderStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::Delivered => 2,
        }
    }

    /// Whether an order in this status may move to `next`.
    ///
    /// Staying in the same status is not a transition.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

/// Account role.
///
/// The marketplace owner flag on an account is orthogonal to the role and
/// grants full admin access regardless of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountRole {
    Buyer,
    Farmer,
    Admin,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "Buyer"),
            Self::Farmer => write!(f, "Farmer"),
            Self::Admin => write!(f, "Admin"),
        }
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "farmer" => Ok(Self::Farmer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid account role: {s}")),
        }
    }
}

/// What a farmer mainly grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FarmerType {
    Vegetables,
    Fruits,
    Grains,
    Mixed,
}

/// Checkout payment method.
///
/// Only `Wallet` has a precondition (sufficient balance); every method is
/// confirmed immediately since no payment gateway is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Upi,
    Card,
    Cod,
    Wallet,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upi => write!(f, "upi"),
            Self::Card => write!(f, "card"),
            Self::Cod => write!(f, "cod"),
            Self::Wallet => write!(f, "wallet"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            "cod" => Ok(Self::Cod),
            "wallet" => Ok(Self::Wallet),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_only_advances() {
        assert!(OrderStatus::Pending.can_advance_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.can_advance_to(OrderStatus::Delivered));
        assert!(OrderStatus::Confirmed.can_advance_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Confirmed.can_advance_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Delivered.can_advance_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Confirmed.can_advance_to(OrderStatus::Pending));
    }

    #[test]
    fn test_account_role_round_trip() {
        for role in [AccountRole::Buyer, AccountRole::Farmer, AccountRole::Admin] {
            assert_eq!(role.to_string().parse::<AccountRole>().unwrap(), role);
        }
        assert!("owner".parse::<AccountRole>().is_err());
    }

    #[test]
    fn test_payment_method_serde() {
        let json = serde_json::to_string(&PaymentMethod::Wallet).unwrap();
        assert_eq!(json, "\"wallet\"");
        assert_eq!("cod".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
    }
}
