//! Marketplace accounts.

use serde::{Deserialize, Serialize};

use harvest_hub_core::address::{require, validate_phone};
use harvest_hub_core::{
    AccountId, AccountRole, Address, Email, FarmerType, Locality, Money, ValidationError,
};

/// Where a farmer receives payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub upi_id: String,
    #[serde(default)]
    pub qr_code_url: Option<String>,
}

/// Farm-specific attributes of a farmer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmProfile {
    /// Free-form description such as "Green Valley, Mysuru".
    #[serde(default)]
    pub location: String,
    /// Structured locality used for shipping tiers.
    #[serde(default)]
    pub locality: Locality,
    #[serde(default)]
    pub farmer_type: Option<FarmerType>,
    #[serde(default)]
    pub payment: Option<PaymentDetails>,
}

/// A registered account as held by the account store.
///
/// Never serialized to clients; see [`AccountSummary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub full_name: String,
    pub email: Email,
    pub mobile: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: AccountRole,
    pub active: bool,
    /// Marketplace owner. Grants full admin access whatever the role.
    #[serde(default)]
    pub owner: bool,
    /// `None` means wallet payment is unavailable for this account.
    #[serde(default)]
    pub wallet_balance: Option<Money>,
    #[serde(default)]
    pub delivery_address: Option<Address>,
    #[serde(default)]
    pub farm: Option<FarmProfile>,
}

impl Account {
    /// Admins and the marketplace owner.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.owner || self.role == AccountRole::Admin
    }

    #[must_use]
    pub fn is_farmer(&self) -> bool {
        self.role == AccountRole::Farmer
    }

    /// Locality used when this account is the seller of a cart.
    ///
    /// An account without a farm profile resolves to an empty locality, which
    /// never matches any tier.
    #[must_use]
    pub fn farm_locality(&self) -> Locality {
        self.farm
            .as_ref()
            .map(|farm| farm.locality.clone())
            .unwrap_or_default()
    }

    /// Client-facing view without credentials.
    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            mobile: self.mobile.clone(),
            role: self.role,
            active: self.active,
            owner: self.owner,
            wallet_balance: self.wallet_balance,
            delivery_address: self.delivery_address.clone(),
            farm: self.farm.clone(),
        }
    }
}

/// Account data safe to hand to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub full_name: String,
    pub email: Email,
    pub mobile: String,
    pub role: AccountRole,
    pub active: bool,
    pub owner: bool,
    pub wallet_balance: Option<Money>,
    pub delivery_address: Option<Address>,
    pub farm: Option<FarmProfile>,
}

/// Registration input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub role: AccountRole,
    #[serde(default)]
    pub delivery_address: Option<Address>,
    #[serde(default)]
    pub farm: Option<FarmProfile>,
}

impl NewAccount {
    /// Check the profile fields. Email and password are checked separately.
    ///
    /// # Errors
    ///
    /// Returns the first failing field. Admin accounts cannot self-register.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.role == AccountRole::Admin {
            return Err(ValidationError::Invalid {
                field: "role",
                reason: "admin accounts cannot be registered".to_string(),
            });
        }
        validate_profile_fields(
            &self.full_name,
            &self.mobile,
            self.delivery_address.as_ref(),
        )
    }
}

/// Profile update. Overwrites every profile field of the account.
///
/// `id` must name the account of the session making the update.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountProfile {
    pub id: AccountId,
    pub full_name: String,
    pub mobile: String,
    #[serde(default)]
    pub delivery_address: Option<Address>,
    #[serde(default)]
    pub farm: Option<FarmProfile>,
}

impl AccountProfile {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_profile_fields(
            &self.full_name,
            &self.mobile,
            self.delivery_address.as_ref(),
        )
    }

    /// Apply to an account, replacing all profile fields.
    pub fn apply_to(self, account: &mut Account) {
        account.full_name = self.full_name.trim().to_string();
        account.mobile = self.mobile.trim().to_string();
        account.delivery_address = self.delivery_address;
        account.farm = self.farm;
    }
}

fn validate_profile_fields(
    full_name: &str,
    mobile: &str,
    address: Option<&Address>,
) -> Result<(), ValidationError> {
    require("full_name", full_name)?;
    validate_phone("mobile", mobile)?;
    if let Some(address) = address {
        address.validate()?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(role: AccountRole, owner: bool) -> Account {
        Account {
            id: AccountId::generate(),
            full_name: "Jane Farmer".to_string(),
            email: Email::parse("farmer@example.com").unwrap(),
            mobile: "0987654321".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role,
            active: true,
            owner,
            wallet_balance: None,
            delivery_address: None,
            farm: None,
        }
    }

    #[test]
    fn test_owner_is_admin_whatever_the_role() {
        assert!(account(AccountRole::Buyer, true).is_admin());
        assert!(account(AccountRole::Admin, false).is_admin());
        assert!(!account(AccountRole::Farmer, false).is_admin());
    }

    #[test]
    fn test_summary_omits_password_hash() {
        let json = serde_json::to_string(&account(AccountRole::Farmer, false).summary()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("farmer@example.com"));
    }

    #[test]
    fn test_farm_locality_defaults_to_empty() {
        let mut farmer = account(AccountRole::Farmer, false);
        assert_eq!(farmer.farm_locality(), Locality::default());

        farmer.farm = Some(FarmProfile {
            location: "Green Valley, Mysuru".to_string(),
            locality: Locality::new("Mysuru", "Mysuru", "Karnataka"),
            farmer_type: Some(FarmerType::Vegetables),
            payment: None,
        });
        assert_eq!(farmer.farm_locality().city, "Mysuru");
    }

    #[test]
    fn test_admin_cannot_self_register() {
        let new = NewAccount {
            full_name: "Eve".to_string(),
            email: "eve@example.com".to_string(),
            mobile: "1112223334".to_string(),
            password: "password123".to_string(),
            role: AccountRole::Admin,
            delivery_address: None,
            farm: None,
        };
        assert!(matches!(
            new.validate(),
            Err(ValidationError::Invalid { field: "role", .. })
        ));
    }

    #[test]
    fn test_profile_mobile_digits() {
        let profile = AccountProfile {
            id: AccountId::generate(),
            full_name: "John Doe".to_string(),
            mobile: "12345".to_string(),
            delivery_address: None,
            farm: None,
        };
        assert_eq!(
            profile.validate(),
            Err(ValidationError::DigitCount {
                field: "mobile",
                digits: 10
            })
        );
    }

    #[test]
    fn test_profile_overwrites_fields() {
        let mut acct = account(AccountRole::Farmer, false);
        acct.farm = Some(FarmProfile {
            location: "Old".to_string(),
            locality: Locality::default(),
            farmer_type: None,
            payment: None,
        });
        AccountProfile {
            id: acct.id,
            full_name: " Jane F. ".to_string(),
            mobile: "0987654321".to_string(),
            delivery_address: None,
            farm: None,
        }
        .apply_to(&mut acct);
        assert_eq!(acct.full_name, "Jane F.");
        assert!(acct.farm.is_none());
    }
}
