//! # Validation Module
//!
//! Input validation for Codemart.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation                                                 │
//! │  └── Form hints (out of scope here)                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Client core                                                  │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: checkout / identity / search rules                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Gateway                                                      │
//! │  └── Stock, coupon validity, payment (authoritative)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use codemart_core::validation::{validate_email, validate_search_query};
//!
//! validate_email("ada@example.com").unwrap();
//! assert_eq!(validate_search_query("  steam ").unwrap(), "steam");
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Billing;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn require(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - One `@` with a non-empty local part and a dotted domain
/// - At most 254 characters
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    require("email", email)?;

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::invalid_format(
            "email",
            "must look like name@example.com",
        ));
    }

    Ok(())
}

/// Validates the billing fields checkout requires.
///
/// ## Rules
/// - `first_name`, `last_name` and `email` are required
/// - `email` must be well formed
pub fn validate_billing(billing: &Billing) -> ValidationResult<()> {
    require("first_name", &billing.first_name)?;
    require("last_name", &billing.last_name)?;
    validate_email(&billing.email)
}

/// Validates a search query and returns it trimmed. Empty is allowed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a coupon code and returns it trimmed and lowercased, the way
/// the gateway stores codes.
pub fn validate_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();
    require("coupon", code)?;

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "coupon".to_string(),
            max: 50,
        });
    }

    if code.contains(char::is_whitespace) {
        return Err(ValidationError::invalid_format(
            "coupon",
            "must not contain spaces",
        ));
    }

    Ok(code.to_lowercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested bundle target amount.
pub fn validate_target_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates a cart quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email(" ada@mail.example.org ").is_ok());
        assert!(matches!(
            validate_email(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_email("ada").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("ada@@example.com").is_err());
        assert!(validate_email("a da@example.com").is_err());
    }

    #[test]
    fn test_validate_billing() {
        let mut billing = Billing {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            ..Billing::default()
        };
        assert!(validate_billing(&billing).is_ok());

        billing.last_name = "  ".to_string();
        assert_eq!(
            validate_billing(&billing),
            Err(ValidationError::required("last_name"))
        );
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_coupon_code() {
        assert_eq!(validate_coupon_code(" SAVE10 ").unwrap(), "save10");
        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("SAVE 10").is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_target_amount(Money::from_major(25)).is_ok());
        assert!(validate_target_amount(Money::zero()).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
    }
}
