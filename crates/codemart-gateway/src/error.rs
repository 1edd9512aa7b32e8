//! # Gateway Error Types
//!
//! Error types for calls to the remote commerce gateway.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gateway Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Response            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Network        │  │  Http { status, body }  │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Decode                 │ │
//! │  │                 │  │                 │  │  Rejected (success=false│ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Retried on reads: Network, Timeout, Http 5xx, Http 429                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Longest response body kept in an [`GatewayError::Http`] error.
const MAX_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum GatewayError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid gateway configuration.
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),

    /// Base URL or endpoint could not be built.
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Connection refused, DNS failure, reset, TLS failure.
    #[error("Gateway unreachable: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("Gateway request timed out")]
    Timeout,

    // =========================================================================
    // Response Errors
    // =========================================================================
    /// Non-success HTTP status.
    #[error("Gateway returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body was not the expected JSON shape.
    #[error("Malformed gateway response: {0}")]
    Decode(String),

    /// The gateway answered `success: false` with a message for the user
    /// (wrong password, unknown coupon, out of stock).
    #[error("{0}")]
    Rejected(String),
}

impl GatewayError {
    /// Builds an [`GatewayError::Http`], truncating long bodies.
    pub fn http(status: u16, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_BODY_CHARS) {
            Some((idx, _)) => format!("{}…", &body[..idx]),
            None => body.to_string(),
        };
        GatewayError::Http { status, body }
    }

    /// Returns true if a read may succeed when repeated.
    ///
    /// ## Retryable Errors
    /// - Network failures and timeouts
    /// - 5xx responses and 429 Too Many Requests
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - 4xx responses, decode failures, rejections
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network(_) | GatewayError::Timeout => true,
            GatewayError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Http { status: 404, .. })
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidConfig(_) | GatewayError::InvalidUrl(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            GatewayError::http(status.as_u16(), &err.to_string())
        } else if err.is_builder() {
            GatewayError::InvalidConfig(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}
