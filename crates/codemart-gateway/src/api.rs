//! # Gateway Seams
//!
//! One trait per backend concern. [`GatewayClient`](crate::GatewayClient)
//! implements all of them; stores depend on the traits so tests can swap
//! in fakes.

use async_trait::async_trait;
use serde_json::{Map, Value};

use codemart_core::{Category, Coupon, Money, NewOrder, Order, OrderNote, Product, Registration, User};

use crate::endpoints::bundle::BundleOffer;
use crate::endpoints::catalog::{ProductFilter, ProductLookup};
use crate::endpoints::orders::{OrderAccess, OrderReceipt};
use crate::error::GatewayResult;

/// Products and categories.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> GatewayResult<Vec<Product>>;

    async fn product(&self, lookup: &ProductLookup, with_variations: bool) -> GatewayResult<Product>;

    async fn categories(&self) -> GatewayResult<Vec<Category>>;
}

#[async_trait]
pub trait CouponGateway: Send + Sync {
    /// Looks a coupon up by code. `Ok(None)` when the code is unknown.
    async fn coupon(&self, code: &str) -> GatewayResult<Option<Coupon>>;
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> GatewayResult<OrderReceipt>;

    /// Fetches one order. Guests prove ownership with email or guest token.
    async fn order(&self, order_id: u64, access: &OrderAccess) -> GatewayResult<Order>;

    async fn order_notes(&self, order_id: u64) -> GatewayResult<Vec<OrderNote>>;

    async fn customer_orders(&self, customer_id: u64) -> GatewayResult<Vec<Order>>;
}

/// Identity operations.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Verifies credentials. A missing password is passed through as-is.
    async fn login(&self, email: &str, password: Option<&str>) -> GatewayResult<User>;

    async fn register(&self, registration: &Registration) -> GatewayResult<User>;

    /// Pushes a partial profile. The response body is not used.
    async fn update_profile(&self, user_id: u64, patch: &Map<String, Value>) -> GatewayResult<()>;

    async fn user_by_email(&self, email: &str) -> GatewayResult<Option<User>>;
}

#[async_trait]
pub trait BundleGateway: Send + Sync {
    /// Asks the backend to pick denominations covering `amount`.
    async fn calculate_bundle(
        &self,
        product_id: u64,
        amount: Money,
        currency: &str,
    ) -> GatewayResult<BundleOffer>;
}
