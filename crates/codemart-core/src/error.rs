//! # Error Types
//!
//! Domain-specific error types for codemart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  codemart-core errors (this file)                                      │
//! │  ├── CoreError        - Pricing / coupon / cart rule failures          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  codemart-db errors       └── DbError       (always swallowed)         │
//! │  codemart-gateway errors  └── GatewayError  (reads degrade, writes     │
//! │                                              propagate)                │
//! │  codemart-cli errors      └── CliError      (code + message)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → Session/Checkout → CliError       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A bundle calculation was asked to price zero items.
    #[error("Bundle must contain at least one item")]
    EmptyBundle,

    /// The requested target cannot be covered by the offered denominations.
    ///
    /// ## When This Occurs
    /// ```text
    /// User asks for $25 of Steam Wallet
    ///      │
    ///      ▼
    /// Gateway offers $10 + $10 = $20
    ///      │
    ///      ▼
    /// InsufficientTarget { requested: "25.00", covered: "20.00" }
    /// ```
    #[error("Selected denominations cover {covered}, less than the requested {requested}")]
    InsufficientTarget { requested: String, covered: String },

    /// Coupon uses a discount type the storefront does not apply locally.
    #[error("Unsupported coupon discount type: {0}")]
    UnsupportedDiscount(String),

    /// Arithmetic left the representable money range.
    #[error("Amount out of range while computing {0}")]
    AmountOverflow(&'static str),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are surfaced to the user as human-readable messages, never
/// swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. malformed decimal, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientTarget {
            requested: "25.00".to_string(),
            covered: "20.00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Selected denominations cover 20.00, less than the requested 25.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("email");
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("sku").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
