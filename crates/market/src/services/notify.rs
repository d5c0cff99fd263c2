//! User-facing notices.
//!
//! The engine reports every outcome as a [`Notice`]: a message key, its
//! parameters and a severity. How a notice is rendered or translated is up to
//! the [`Notifier`] the engine was built with.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Mutex;

use serde::Serialize;

use harvest_hub_core::Severity;

/// A keyed, parameterized message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub key: &'static str,
    pub params: BTreeMap<&'static str, String>,
    pub severity: Severity,
}

impl Notice {
    #[must_use]
    pub const fn new(key: &'static str, severity: Severity) -> Self {
        Self {
            key,
            params: BTreeMap::new(),
            severity,
        }
    }

    #[must_use]
    pub const fn success(key: &'static str) -> Self {
        Self::new(key, Severity::Success)
    }

    #[must_use]
    pub const fn error(key: &'static str) -> Self {
        Self::new(key, Severity::Error)
    }

    /// Add a parameter.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl Display) -> Self {
        self.params.insert(name, value.to_string());
        self
    }

    /// Default English rendering.
    #[must_use]
    pub fn message(&self) -> String {
        let mut text = template(self.key).to_string();
        for (name, value) in &self.params {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

fn template(key: &str) -> &'static str {
    match key {
        "cart.added" => "{product} added to cart.",
        "cart.outOfStock" => "{product} is out of stock.",
        "cart.onlyAvailable" => "Only {count} {unit} of {product} available.",
        "cart.mixedSellers" => "Your cart can only hold products from one farmer.",
        "auth.welcomeBack" => "Welcome back, {name}!",
        "auth.signupSuccess" => "Welcome to Harvest Hub, {name}!",
        "auth.loggedOut" => "You have been logged out.",
        "auth.resetLinkSent" => "Password reset link sent to {email}.",
        "auth.duplicateAccount" => "An account with this email already exists.",
        "auth.accountBlocked" => "Your account has been blocked.",
        "auth.invalidCredentials" => "Invalid credentials.",
        "auth.required" => "Please log in to continue.",
        "auth.forbidden" => "You are not allowed to do that.",
        "checkout.emptyCartOrNoSession" => "Log in and add items to your cart to place an order.",
        "checkout.insufficientWallet" => "Insufficient wallet balance.",
        "checkout.walletUnavailable" => "Wallet payment is not available for this account.",
        "order.placed" => "Order #{reference} placed successfully!",
        "order.statusUpdated" => "Order #{reference} is now {status}.",
        "order.invalidStatus" => "An order cannot move from {from} to {to}.",
        "profile.updated" => "Profile updated successfully.",
        "product.added" => "Product added successfully.",
        "product.updated" => "Product updated.",
        "product.deleted" => "Product deleted.",
        "admin.userStatusUpdated" => "User status updated.",
        "form.invalid" => "{reason}.",
        "notFound" => "{what} not found.",
        "persistence.saveFailed" => "Your change was applied but could not be saved.",
        _ => "Something went wrong.",
    }
}

/// Receiver of engine notices. Fire and forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Logs notices through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.severity {
            Severity::Success => {
                tracing::info!(key = notice.key, message = %notice.message(), "notice");
            }
            Severity::Error => {
                tracing::warn!(key = notice.key, message = %notice.message(), "notice");
            }
        }
    }
}

/// Keeps every notice in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    /// Keys received so far, oldest first.
    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        self.notices().iter().map(|notice| notice.key).collect()
    }

    /// The most recent notice.
    #[must_use]
    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}
