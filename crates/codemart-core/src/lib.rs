//! # codemart-core: Pure Storefront Logic
//!
//! This crate holds the pieces of the Codemart storefront client that do not
//! touch the network or the disk. Everything else (local storage, the remote
//! commerce gateway, the stores that tie them together) builds on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Codemart Storefront Client                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             codemart-cli (CartStore, SessionStore, CLI)         │   │
//! │  └───────────────┬───────────────────────────┬─────────────────────┘   │
//! │                  │                           │                          │
//! │  ┌───────────────▼──────────┐   ┌────────────▼────────────────────┐    │
//! │  │  codemart-db (SQLite)    │   │  codemart-gateway (REST client) │    │
//! │  │  cart/session snapshots  │   │  products, orders, users, ...   │    │
//! │  └───────────────┬──────────┘   └────────────┬────────────────────┘    │
//! │                  │                           │                          │
//! │  ┌───────────────▼───────────────────────────▼─────────────────────┐   │
//! │  │               ★ codemart-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────┐  │   │
//! │  │   │  money  │  │  types  │  │  cart   │  │ pricing │  │coupon│  │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘  └──────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and decimal-string codec
//! - [`types`] - Gateway domain types (Product, Variation, User, Order, ...)
//! - [`cart`] - Cart lines keyed by composite key, derived totals
//! - [`pricing`] - Bundle price calculator
//! - [`coupon`] - Coupon discount math
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use codemart_core::money::Money;
//! use codemart_core::pricing::{calculate_bundle_price, BundleItem, PricingPolicy};
//! use codemart_core::types::{ExchangeRate, Variation};
//!
//! let variation = Variation::new(11, "$10 Steam Wallet", Money::from_major(1300));
//! let items = vec![BundleItem::new(variation, Money::from_major(10))];
//!
//! let calc = calculate_bundle_price(
//!     &items,
//!     Money::from_major(10),
//!     Money::from_major(10),
//!     "NPR",
//!     Some(ExchangeRate::from_whole(110)),
//!     Some(Money::from_major(50)),
//!     &PricingPolicy::default(),
//! )
//! .unwrap();
//!
//! // ceil(10 × 110 + 50) = 1150, cheaper than the 1300 catalog price
//! assert_eq!(calc.final_price, Money::from_major(1150));
//! assert_eq!(calc.savings, Money::from_major(150));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod coupon;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartKey, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{BundleCalculation, BundleItem, BundleKind, PricingPolicy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default exchange rate from face-value currency to the shop currency,
/// in whole units (1 face unit = 110 shop units).
///
/// Used when a bundle calculation is not given a positive rate.
pub const DEFAULT_BASE_RATE: u64 = 110;

/// Default fixed profit added to every bundle, in whole shop currency units.
pub const DEFAULT_PROFIT: i64 = 50;

/// Key segment used in a [`CartKey`] when the line has no variation.
pub const NO_VARIATION_KEY: &str = "default";

/// Key segment used in a [`CartKey`] when the line has no custom price.
pub const STANDARD_PRICE_KEY: &str = "standard";
