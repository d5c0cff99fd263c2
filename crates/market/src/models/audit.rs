//! Audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_hub_core::{AccountId, AuditLogId};

/// Who performed an audited action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Account { id: AccountId, name: String },
    /// Operator tooling acting outside any session.
    System,
}

impl Actor {
    #[must_use]
    pub const fn id(&self) -> Option<AccountId> {
        match self {
            Self::Account { id, .. } => Some(*id),
            Self::System => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Account { name, .. } => name,
            Self::System => "System",
        }
    }
}

/// Audited action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "User Signup")]
    UserSignup,
    #[serde(rename = "User Login")]
    UserLogin,
    #[serde(rename = "User Logout")]
    UserLogout,
    #[serde(rename = "Profile Update")]
    ProfileUpdate,
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    #[serde(rename = "Order Status Updated")]
    OrderStatusUpdated,
    #[serde(rename = "Product Added")]
    ProductAdded,
    #[serde(rename = "Product Updated")]
    ProductUpdated,
    #[serde(rename = "Product Deleted")]
    ProductDeleted,
    #[serde(rename = "User Status Updated")]
    UserStatusUpdated,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::UserSignup => "User Signup",
            Self::UserLogin => "User Login",
            Self::UserLogout => "User Logout",
            Self::ProfileUpdate => "Profile Update",
            Self::OrderPlaced => "Order Placed",
            Self::OrderStatusUpdated => "Order Status Updated",
            Self::ProductAdded => "Product Added",
            Self::ProductUpdated => "Product Updated",
            Self::ProductDeleted => "Product Deleted",
            Self::UserStatusUpdated => "User Status Updated",
        };
        f.write_str(label)
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub timestamp: DateTime<Utc>,
    /// `None` for system actions.
    pub actor_id: Option<AccountId>,
    pub actor_name: String,
    pub action: AuditAction,
    pub details: String,
}
