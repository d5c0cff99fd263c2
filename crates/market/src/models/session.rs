//! Per-shopper session state.

use serde::{Deserialize, Serialize};

use harvest_hub_core::{AccountId, Email};

use crate::models::Cart;

/// State owned by one shopper session.
///
/// Only the account id is kept; the engine re-reads the live account on every
/// use, so admin status changes apply to open sessions immediately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopperSession {
    /// `None` while anonymous.
    pub account_id: Option<AccountId>,
    pub cart: Cart,
    /// Set by a "remember me" login; survives logout.
    #[serde(default)]
    pub remembered_email: Option<Email>,
}

impl ShopperSession {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.account_id.is_some()
    }
}

/// Session keys used with the HTTP session store.
pub mod session_keys {
    /// Key for the serialized [`ShopperSession`](super::ShopperSession).
    pub const SHOPPER: &str = "shopper";
}
