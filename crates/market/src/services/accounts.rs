//! Account store and password handling.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};

use harvest_hub_core::{AccountId, Email, Locality, Money, ValidationError};

use crate::models::{Account, AccountProfile, NewAccount};
use crate::services::MarketError;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// All registered accounts. Emails are unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountStore {
    accounts: Vec<Account>,
}

impl AccountStore {
    #[must_use]
    pub const fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no account has this id.
    pub fn find(&self, id: AccountId) -> Result<&Account, MarketError> {
        self.get(id)
            .ok_or_else(|| MarketError::NotFound(format!("account {id}")))
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no account has this id.
    pub fn find_mut(&mut self, id: AccountId) -> Result<&mut Account, MarketError> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| MarketError::NotFound(format!("account {id}")))
    }

    #[must_use]
    pub fn by_email(&self, email: &Email) -> Option<&Account> {
        self.accounts.iter().find(|a| &a.email == email)
    }

    #[must_use]
    pub fn farmers(&self) -> Vec<&Account> {
        self.accounts.iter().filter(|a| a.is_farmer()).collect()
    }

    /// Farm locality of a seller, `None` if the account does not exist.
    #[must_use]
    pub fn seller_locality(&self, id: AccountId) -> Option<Locality> {
        self.get(id).map(Account::farm_locality)
    }

    /// Create an active account with an empty wallet.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed fields or a short password
    /// - `DuplicateAccount` if the email is taken
    /// - `PasswordHash` if hashing fails
    pub fn register(&mut self, new: NewAccount) -> Result<Account, MarketError> {
        new.validate()?;
        let email = Email::parse(&new.email)?;
        validate_password(&new.password)?;
        if self.by_email(&email).is_some() {
            return Err(MarketError::DuplicateAccount);
        }

        let account = Account {
            id: AccountId::generate(),
            full_name: new.full_name.trim().to_string(),
            email,
            mobile: new.mobile.trim().to_string(),
            password_hash: hash_password(&new.password)?,
            role: new.role,
            active: true,
            owner: false,
            wallet_balance: Some(Money::ZERO),
            delivery_address: new.delivery_address,
            farm: new.farm,
        };
        self.accounts.push(account.clone());
        Ok(account)
    }

    /// Check credentials.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` on an unknown email or wrong password
    /// - `AccountBlocked` when the credentials match a deactivated account
    pub fn authenticate(&self, email: &str, password: &str) -> Result<&Account, MarketError> {
        let email = Email::parse(email).map_err(|_| MarketError::InvalidCredentials)?;
        let account = self
            .by_email(&email)
            .ok_or(MarketError::InvalidCredentials)?;
        verify_password(password, &account.password_hash)?;
        if !account.active {
            return Err(MarketError::AccountBlocked);
        }
        Ok(account)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no account has this id.
    pub fn set_active(&mut self, id: AccountId, active: bool) -> Result<&Account, MarketError> {
        let account = self.find_mut(id)?;
        account.active = active;
        Ok(account)
    }

    /// Overwrite the profile fields of `profile.id`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for malformed fields and `NotFound` for an unknown id.
    pub fn update_profile(&mut self, profile: AccountProfile) -> Result<&Account, MarketError> {
        profile.validate()?;
        let account = self.find_mut(profile.id)?;
        profile.apply_to(account);
        Ok(account)
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::Invalid {
            field: "password",
            reason: format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        });
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, MarketError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| MarketError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), MarketError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| MarketError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| MarketError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use harvest_hub_core::AccountRole;

    use super::*;

    fn new_buyer(email: &str) -> NewAccount {
        NewAccount {
            full_name: "John Doe".to_string(),
            email: email.to_string(),
            mobile: "1234567890".to_string(),
            password: "password123".to_string(),
            role: AccountRole::Buyer,
            delivery_address: None,
            farm: None,
        }
    }

    #[test]
    fn test_register_defaults() {
        let mut store = AccountStore::default();
        let account = store.register(new_buyer("buyer@example.com")).unwrap();

        assert!(account.active);
        assert!(!account.owner);
        assert_eq!(account.wallet_balance, Some(Money::ZERO));
        assert_ne!(account.password_hash, "password123");
    }

    #[test]
    fn test_duplicate_email_ignores_case() {
        let mut store = AccountStore::default();
        store.register(new_buyer("buyer@example.com")).unwrap();

        assert!(matches!(
            store.register(new_buyer("Buyer@Example.com")),
            Err(MarketError::DuplicateAccount)
        ));
        assert_eq!(store.accounts().len(), 1);
    }

    #[test]
    fn test_short_password_rejected() {
        let mut store = AccountStore::default();
        let mut new = new_buyer("buyer@example.com");
        new.password = "short".to_string();
        assert!(matches!(
            store.register(new),
            Err(MarketError::Validation(ValidationError::Invalid { field: "password", .. }))
        ));
    }

    #[test]
    fn test_authenticate() {
        let mut store = AccountStore::default();
        let id = store.register(new_buyer("buyer@example.com")).unwrap().id;

        assert_eq!(
            store.authenticate("BUYER@example.com", "password123").unwrap().id,
            id
        );
        assert!(matches!(
            store.authenticate("buyer@example.com", "wrong-password"),
            Err(MarketError::InvalidCredentials)
        ));
        assert!(matches!(
            store.authenticate("nobody@example.com", "password123"),
            Err(MarketError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_blocked_only_with_correct_password() {
        let mut store = AccountStore::default();
        let id = store.register(new_buyer("buyer@example.com")).unwrap().id;
        store.set_active(id, false).unwrap();

        assert!(matches!(
            store.authenticate("buyer@example.com", "password123"),
            Err(MarketError::AccountBlocked)
        ));
        assert!(matches!(
            store.authenticate("buyer@example.com", "wrong-password"),
            Err(MarketError::InvalidCredentials)
        ));
    }
}
