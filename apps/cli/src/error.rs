//! # CLI Error Type
//!
//! Every failure a command can hit ends up as a [`CliError`]: a stable code
//! plus a message fit for the terminal.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  codemart checkout ...                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Validation? ──── ValidationError ─────────────┐                        │
//! │  Gateway?    ──── GatewayError ────────────────┤                        │
//! │  Storage?    ──── DbError (logged) ────────────┼──► CliError            │
//! │  Store?      ──── Session/Checkout/Quote ──────┘    { code, message }   │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                 stderr: "error[GATEWAY_ERROR]: ..."     │
//! │                                 exit status from ErrorCode              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged in full and shown with a generic message.

use serde::Serialize;

use codemart_core::{CoreError, ValidationError};
use codemart_db::DbError;
use codemart_gateway::GatewayError;

use crate::state::{CheckoutError, ConfigError, QuoteError, SessionError};

pub type CliResult<T> = Result<T, CliError>;

/// Error returned by every command.
///
/// ## Serialization
/// ```json
/// { "code": "NOT_LOGGED_IN", "message": "Not logged in" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad arguments or input
    ValidationError,

    /// Product, order or coupon doesn't exist
    NotFound,

    /// Command needs a signed-in user
    NotLoggedIn,

    /// Checkout with nothing in the cart
    CartEmpty,

    /// Bundle couldn't be priced
    PricingError,

    /// Backend unreachable, failing or rejecting the request
    GatewayError,

    /// Local state database failed
    DatabaseError,

    /// codemart.toml unreadable or invalid
    ConfigError,

    Internal,
}

impl ErrorCode {
    /// The serialized name, e.g. `NOT_LOGGED_IN`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::NotLoggedIn => "NOT_LOGGED_IN",
            ErrorCode::CartEmpty => "CART_EMPTY",
            ErrorCode::PricingError => "PRICING_ERROR",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Process exit status for this code.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCode::ValidationError | ErrorCode::CartEmpty | ErrorCode::PricingError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::NotLoggedIn => 4,
            ErrorCode::GatewayError => 5,
            ErrorCode::ConfigError => 78,
            ErrorCode::DatabaseError | ErrorCode::Internal => 1,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::EmptyBundle | CoreError::InsufficientTarget { .. } => {
                CliError::new(ErrorCode::PricingError, err.to_string())
            }
            CoreError::UnsupportedDiscount(_) => CliError::validation(err.to_string()),
            CoreError::AmountOverflow(_) => CliError::validation(err.to_string()),
        }
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(_) => {
                tracing::error!("Database connection failed: {}", err);
                CliError::new(ErrorCode::DatabaseError, "Could not open local state database")
            }
            DbError::MigrationFailed(_) => {
                tracing::error!("Database migration failed: {}", err);
                CliError::new(ErrorCode::DatabaseError, "Local state database migration failed")
            }
            DbError::PoolExhausted => {
                CliError::new(ErrorCode::DatabaseError, "Local state database is busy")
            }
            DbError::QueryFailed(_) | DbError::CorruptSnapshot { .. } | DbError::Internal(_) => {
                tracing::error!("Database error: {}", err);
                CliError::new(ErrorCode::DatabaseError, "Local state operation failed")
            }
        }
    }
}

impl From<GatewayError> for CliError {
    fn from(err: GatewayError) -> Self {
        match &err {
            GatewayError::Http { status: 404, .. } => {
                CliError::new(ErrorCode::NotFound, "Not found on the store backend")
            }
            GatewayError::Http { status: 401 | 403, .. } => CliError::new(
                ErrorCode::GatewayError,
                "The store backend refused access to this resource",
            ),
            GatewayError::Rejected(message) => CliError::new(ErrorCode::GatewayError, message.clone()),
            GatewayError::InvalidConfig(_) | GatewayError::InvalidUrl(_) => {
                CliError::new(ErrorCode::ConfigError, err.to_string())
            }
            GatewayError::Decode(_) => {
                tracing::error!("Gateway response could not be decoded: {}", err);
                CliError::new(ErrorCode::GatewayError, "Unexpected response from the store backend")
            }
            GatewayError::Network(_) | GatewayError::Timeout | GatewayError::Http { .. } => {
                CliError::new(ErrorCode::GatewayError, err.to_string())
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotLoggedIn => CliError::new(ErrorCode::NotLoggedIn, "Not logged in"),
            SessionError::Validation(e) => e.into(),
            SessionError::Gateway(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for CliError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => CliError::new(ErrorCode::CartEmpty, "Cart is empty"),
            CheckoutError::Validation(e) => e.into(),
            CheckoutError::Coupon(e) => e.into(),
            CheckoutError::Gateway(e) => e.into(),
        }
    }
}

impl From<QuoteError> for CliError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::Validation(e) => e.into(),
            QuoteError::Pricing(e) => e.into(),
            QuoteError::Gateway(e) => e.into(),
            QuoteError::UnknownVariation { .. } => CliError::validation(err.to_string()),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}
