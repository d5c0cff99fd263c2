//! Shipping fee calculation.
//!
//! Fees are quoted in rupees by how close the buyer is to the seller's farm,
//! then converted to the reference currency every other amount is kept in.

use rust_decimal::Decimal;

use harvest_hub_core::{AccountId, Currency, Locality, Money};

use crate::models::Cart;

/// Locality tier between a buyer and a seller. The most specific match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingTier {
    City,
    District,
    State,
    /// No locality in common.
    Base,
}

impl ShippingTier {
    /// Classify a buyer/seller pair.
    #[must_use]
    pub fn between(buyer: &Locality, seller: &Locality) -> Self {
        if same_place(&buyer.city, &seller.city) {
            Self::City
        } else if same_place(&buyer.district, &seller.district) {
            Self::District
        } else if same_place(&buyer.state, &seller.state) {
            Self::State
        } else {
            Self::Base
        }
    }

    /// Fee in rupees.
    #[must_use]
    pub const fn fee_inr(self) -> u32 {
        match self {
            Self::City => 30,
            Self::District => 50,
            Self::State => 80,
            Self::Base => 120,
        }
    }

    /// Fee in the reference currency, rounded to cents.
    #[must_use]
    pub fn fee(self) -> Money {
        Money::from_foreign(Decimal::from(self.fee_inr()), Currency::INR).round_to_cents()
    }
}

/// Trimmed, case-insensitive equality where both sides must be non-empty.
fn same_place(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && !b.is_empty() && a.to_lowercase() == b.to_lowercase()
}

/// Shipping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingRates {
    /// Charged when the cart's seller cannot be resolved. Already in the
    /// reference currency.
    pub fallback_fee: Money,
}

impl Default for ShippingRates {
    fn default() -> Self {
        Self {
            fallback_fee: Money::from_cents(60),
        }
    }
}

impl ShippingRates {
    /// Fee for shipping `cart` to `buyer`.
    ///
    /// `seller_locality` resolves the cart's seller; `None` means the seller
    /// is unknown and the fallback fee applies.
    pub fn compute_fee<F>(&self, cart: &Cart, buyer: &Locality, seller_locality: F) -> Money
    where
        F: FnOnce(AccountId) -> Option<Locality>,
    {
        let Some(seller_id) = cart.seller_id() else {
            return Money::ZERO;
        };
        seller_locality(seller_id).map_or(self.fallback_fee, |seller| {
            ShippingTier::between(buyer, &seller).fee()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::tests::product;

    fn mysuru() -> Locality {
        Locality::new("Mysuru", "Mysuru", "Karnataka")
    }

    #[test]
    fn test_tiers() {
        let seller = mysuru();
        assert_eq!(
            ShippingTier::between(&Locality::new(" mysuru ", "", ""), &seller),
            ShippingTier::City
        );
        assert_eq!(
            ShippingTier::between(&Locality::new("Nanjangud", "MYSURU", "Karnataka"), &seller),
            ShippingTier::District
        );
        assert_eq!(
            ShippingTier::between(
                &Locality::new("Bengaluru", "Bengaluru Urban", "Karnataka"),
                &seller
            ),
            ShippingTier::State
        );
        assert_eq!(
            ShippingTier::between(&Locality::new("Pune", "Pune", "Maharashtra"), &seller),
            ShippingTier::Base
        );
    }

    #[test]
    fn test_blank_fields_never_match() {
        assert_eq!(
            ShippingTier::between(&Locality::default(), &Locality::default()),
            ShippingTier::Base
        );
    }

    #[test]
    fn test_converted_fees() {
        assert_eq!(ShippingTier::City.fee(), Money::from_cents(36));
        assert_eq!(ShippingTier::District.fee(), Money::from_cents(60));
        assert_eq!(ShippingTier::State.fee(), Money::from_cents(96));
        assert_eq!(ShippingTier::Base.fee(), Money::from_cents(144));
    }

    #[test]
    fn test_compute_fee() {
        let rates = ShippingRates::default();
        let seller = AccountId::generate();
        let mut cart = Cart::new();

        assert_eq!(rates.compute_fee(&cart, &mysuru(), |_| None), Money::ZERO);

        cart.add(&product(5, 100, seller), 1).unwrap();
        let fee = rates.compute_fee(&cart, &Locality::new("Mysuru", "", ""), |id| {
            (id == seller).then(mysuru)
        });
        assert_eq!(fee, Money::from_cents(36));

        assert_eq!(
            rates.compute_fee(&cart, &mysuru(), |_| None),
            Money::from_cents(60)
        );
    }
}
