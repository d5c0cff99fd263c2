//! Monetary amounts in the marketplace reference currency.
//!
//! All arithmetic (prices, subtotals, shipping fees, wallet balances) happens
//! in a single reference currency, US dollars. [`Currency`] only exists to
//! render an amount for a shopper who picked a different display currency.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub, SubAssign};
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of money in the reference currency (USD).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from whole cents (e.g. `499` is `4.99`).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Round half away from zero to whole cents.
    #[must_use]
    pub fn round_to_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply a unit price by a quantity, `None` on overflow.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Add two amounts, `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Convert an amount quoted in `currency` into the reference currency.
    #[must_use]
    pub fn from_foreign(amount: Decimal, currency: Currency) -> Self {
        Self(amount / currency.exchange_rate())
    }

    /// Format for display in the given currency (e.g. `₹416.67`).
    ///
    /// Returns `None` when the converted amount does not fit a decimal.
    #[must_use]
    pub fn display_in(self, currency: Currency) -> Option<String> {
        let converted = self
            .0
            .checked_mul(currency.exchange_rate())?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Some(format!("{}{converted:.2}", currency.symbol()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Error returned when parsing an unknown currency code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency: {0}")]
pub struct CurrencyError(pub String);

/// Display currencies offered to shoppers.
///
/// Exchange rates are fixed and expressed as units of the currency per one
/// reference dollar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    INR,
    GBP,
}

impl Currency {
    /// All supported display currencies.
    pub const ALL: [Self; 4] = [Self::USD, Self::EUR, Self::INR, Self::GBP];

    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::INR => "₹",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::INR => "INR",
            Self::GBP => "GBP",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::USD => "United States Dollar",
            Self::EUR => "Euro",
            Self::INR => "Indian Rupee",
            Self::GBP => "British Pound",
        }
    }

    /// Units of this currency per reference dollar.
    #[must_use]
    pub fn exchange_rate(&self) -> Decimal {
        match self {
            Self::USD => Decimal::ONE,
            Self::EUR => Decimal::new(93, 2),
            Self::INR => Decimal::new(8350, 2),
            Self::GBP => Decimal::new(79, 2),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CurrencyError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let price = Money::from_cents(499);
        let total: Money = [price.checked_times(2).unwrap(), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(1248));
    }

    #[test]
    fn test_overflow_is_reported_not_panicked() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.checked_times(2), None);
        assert_eq!(huge.checked_times(1), Some(huge));
        assert_eq!(huge.checked_add(Money::from_cents(1)), None);
        assert_eq!(huge.display_in(Currency::INR), None);
        assert!(huge.display_in(Currency::USD).is_some());
    }

    #[test]
    fn test_round_to_cents() {
        let fee = Money::from_foreign(Decimal::from(120), Currency::INR).round_to_cents();
        assert_eq!(fee, Money::from_cents(144));
    }

    #[test]
    fn test_is_negative() {
        assert!(!Money::ZERO.is_negative());
        assert!((Money::ZERO - Money::from_cents(1)).is_negative());
    }

    #[test]
    fn test_display_in_currency() {
        let price = Money::from_cents(1000);
        assert_eq!(price.display_in(Currency::USD).unwrap(), "$10.00");
        assert_eq!(price.display_in(Currency::INR).unwrap(), "₹835.00");
        assert_eq!(price.display_in(Currency::EUR).unwrap(), "€9.30");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("inr".parse::<Currency>().unwrap(), Currency::INR);
        assert!("JPY".parse::<Currency>().is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_cents(299)).unwrap();
        assert_eq!(json, "\"2.99\"");
        let parsed: Money = serde_json::from_str("\"2.99\"").unwrap();
        assert_eq!(parsed, Money::from_cents(299));
    }
}
