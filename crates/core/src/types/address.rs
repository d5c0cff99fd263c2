//! Delivery addresses and the locality used for shipping quotes.

use serde::{Deserialize, Serialize};

/// Required digit count of a phone number.
const PHONE_DIGITS: usize = 10;

/// Required digit count of a postal pincode.
const PINCODE_DIGITS: usize = 6;

/// Errors produced when validating user-supplied address or profile input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was left empty.
    #[error("{field} is required")]
    Required {
        /// Field name.
        field: &'static str,
    },
    /// A numeric field has the wrong number of digits.
    #[error("{field} must be exactly {digits} digits")]
    DigitCount {
        /// Field name.
        field: &'static str,
        /// Expected digit count.
        digits: usize,
    },
    /// A field holds a value outside its allowed range.
    #[error("{field} is invalid: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ValidationError {
    /// Name of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Required { field } | Self::DigitCount { field, .. } | Self::Invalid { field, .. } => {
                field
            }
        }
    }
}

/// The city/district/state triple that drives shipping tiers.
///
/// Any field may be blank while a shopper is still filling in a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locality {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub state: String,
}

impl Locality {
    /// Build a locality from its parts.
    #[must_use]
    pub fn new(city: impl Into<String>, district: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            district: district.into(),
            state: state.into(),
        }
    }
}

/// A full delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub district: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

impl Address {
    /// The shipping-relevant part of this address.
    #[must_use]
    pub fn locality(&self) -> Locality {
        Locality::new(&self.city, &self.district, &self.state)
    }

    /// Check required fields and digit counts.
    ///
    /// # Errors
    ///
    /// Returns the first failing field: a blank required field, a phone
    /// number that is not exactly 10 digits, or a pincode that is not
    /// exactly 6 digits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("full_name", &self.full_name)?;
        require("phone", &self.phone)?;
        require_digits("phone", &self.phone, PHONE_DIGITS)?;
        require("street", &self.street)?;
        require("city", &self.city)?;
        require("district", &self.district)?;
        require("state", &self.state)?;
        require("pincode", &self.pincode)?;
        require_digits("pincode", &self.pincode, PINCODE_DIGITS)?;
        Ok(())
    }
}

/// Fail with [`ValidationError::Required`] when `value` is blank.
///
/// # Errors
///
/// Returns `Required` for an empty or whitespace-only value.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

/// Fail unless `value` is exactly `digits` ASCII digits.
///
/// # Errors
///
/// Returns `DigitCount` on any other length or non-digit character.
pub fn require_digits(
    field: &'static str,
    value: &str,
    digits: usize,
) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.len() != digits || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::DigitCount { field, digits });
    }
    Ok(())
}

/// Validate a 10-digit mobile number.
///
/// # Errors
///
/// Returns `Required` or `DigitCount` for the `field`.
pub fn validate_phone(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    require_digits(field, value, PHONE_DIGITS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            full_name: "John Doe".to_string(),
            phone: "1234567890".to_string(),
            street: "123 Main St".to_string(),
            city: "Bengaluru".to_string(),
            district: "Bengaluru Urban".to_string(),
            state: "Karnataka".to_string(),
            country: "India".to_string(),
            pincode: "560001".to_string(),
        }
    }

    #[test]
    fn test_valid_address() {
        assert_eq!(address().validate(), Ok(()));
    }

    #[test]
    fn test_missing_city() {
        let mut a = address();
        a.city = "  ".to_string();
        assert_eq!(a.validate(), Err(ValidationError::Required { field: "city" }));
    }

    #[test]
    fn test_phone_digit_count() {
        let mut a = address();
        a.phone = "12345".to_string();
        let err = a.validate().unwrap_err();
        assert_eq!(err.field(), "phone");
        assert_eq!(err.to_string(), "phone must be exactly 10 digits");

        a.phone = "12345678ab".to_string();
        assert!(matches!(a.validate(), Err(ValidationError::DigitCount { field: "phone", .. })));
    }

    #[test]
    fn test_pincode_digit_count() {
        let mut a = address();
        a.pincode = "5600011".to_string();
        assert_eq!(
            a.validate(),
            Err(ValidationError::DigitCount {
                field: "pincode",
                digits: 6
            })
        );
    }

    #[test]
    fn test_locality() {
        let locality = address().locality();
        assert_eq!(locality.city, "Bengaluru");
        assert_eq!(locality.district, "Bengaluru Urban");
        assert_eq!(locality.state, "Karnataka");
    }
}
