//! # State Module
//!
//! Long-lived objects built once at startup and shared by every command.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                  │
//! │  │  CartStore   │  │ SessionStore │  │ BundleQuoter │                  │
//! │  │  Mutex<Cart> │  │ Mutex<User?> │  │ generation   │                  │
//! │  │  + snapshot  │  │ + snapshot   │  │ tickets      │                  │
//! │  └──────┬───────┘  └──────────────┘  └──────────────┘                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                  │
//! │  │   Checkout   │  │   Catalog    │  │  AppConfig   │                  │
//! │  │ orders +     │  │ reads that   │  │ toml + env   │                  │
//! │  │ coupons      │  │ degrade      │  │              │                  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘                  │
//! │                                                                         │
//! │  Stores persist through codemart-db and talk to the backend through    │
//! │  codemart-gateway traits.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod bundle;
mod cart;
mod catalog;
mod checkout;
mod config;
mod session;

pub use bundle::{BundleQuoter, Quote, QuoteError, QuoteResult};
pub use cart::{CartEvent, CartStore, QuantityUpdate};
pub use catalog::Catalog;
pub use checkout::{Checkout, CheckoutError, CheckoutRequest, CheckoutResult};
pub use config::{AppConfig, ConfigError, ConfigResult, PricingSettings, StorageSettings};
pub use session::{SessionError, SessionResult, SessionStore};
