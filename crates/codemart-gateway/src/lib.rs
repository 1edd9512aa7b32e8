//! # codemart-gateway: Commerce Gateway Client
//!
//! Typed access to the remote WooCommerce-style backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          codemart-gateway                               │
//! │                                                                         │
//! │   api.rs (traits)            endpoints/                                 │
//! │   ┌────────────────┐         ┌──────────────────────────────────────┐   │
//! │   │ CatalogGateway │◄────────│ catalog.rs   products, categories    │   │
//! │   │ CouponGateway  │◄────────│ coupons.rs   coupon by code          │   │
//! │   │ OrderGateway   │◄────────│ orders.rs    create, track, notes    │   │
//! │   │ AccountGateway │◄────────│ accounts.rs  login, register, update │   │
//! │   │ BundleGateway  │◄────────│ bundle.rs    calculateBundle         │   │
//! │   └────────────────┘         └──────────────────┬───────────────────┘   │
//! │                                                 │                       │
//! │                              client.rs (reqwest + backoff)              │
//! │                                                 │                       │
//! └─────────────────────────────────────────────────┼───────────────────────┘
//!                                                   ▼
//!                                         HTTPS REST backend
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use codemart_gateway::{CatalogGateway, GatewayClient, GatewayConfig, ProductFilter};
//!
//! let client = GatewayClient::new(GatewayConfig::new("https://shop.example.com/wp-json/codemart/v1"))?;
//! let products = client.list_products(&ProductFilter::default().search("steam")).await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;

pub use api::{AccountGateway, BundleGateway, CatalogGateway, CouponGateway, OrderGateway};
pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use endpoints::bundle::{BundleOffer, OfferedItem};
pub use endpoints::catalog::{ProductFilter, ProductLookup};
pub use endpoints::orders::{OrderAccess, OrderReceipt};
pub use error::{GatewayError, GatewayResult};
