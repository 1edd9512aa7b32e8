//! # Checkout
//!
//! Turns the cart into a gateway order and answers order lookups.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate billing ──► cart lines ──► POST /orders ──► clear cart       │
//! │        │                  │               │                             │
//! │        ▼                  ▼               ▼                             │
//! │   Validation          EmptyCart        Gateway (cart kept)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use codemart_core::coupon::{self, CouponPreview};
use codemart_core::validation::{validate_billing, validate_coupon_code};
use codemart_core::{Billing, CoreError, NewOrder, Order, OrderNote, ValidationError};
use codemart_gateway::{CouponGateway, GatewayError, OrderAccess, OrderGateway, OrderReceipt};

use super::cart::CartStore;

pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The coupon exists but can't be previewed locally.
    #[error(transparent)]
    Coupon(#[from] CoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Everything the shopper supplies at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub billing: Billing,
    pub payment_method: String,
    pub coupon_code: Option<String>,
    /// Signed-in shopper; guests get a guest token instead.
    pub customer_id: Option<u64>,
}

pub struct Checkout {
    cart: Arc<CartStore>,
    orders: Arc<dyn OrderGateway>,
    coupons: Arc<dyn CouponGateway>,
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout").field("cart", &self.cart).finish_non_exhaustive()
    }
}

impl Checkout {
    pub fn new(
        cart: Arc<CartStore>,
        orders: Arc<dyn OrderGateway>,
        coupons: Arc<dyn CouponGateway>,
    ) -> Self {
        Checkout { cart, orders, coupons }
    }

    /// Previews a coupon against the current cart total.
    ///
    /// An unknown code is a validation error. So is a failed lookup, which
    /// is logged.
    pub async fn apply_coupon(&self, code: &str) -> CheckoutResult<CouponPreview> {
        let code = validate_coupon_code(code)?;

        let found = match self.coupons.coupon(&code).await {
            Ok(found) => found,
            Err(e) => {
                warn!(code = %code, error = %e, "Coupon lookup failed");
                None
            }
        };
        let matched = found.ok_or_else(|| {
            ValidationError::invalid_format("coupon", format!("no coupon named {code}"))
        })?;

        let preview = coupon::preview(&matched, self.cart.cart_total().await)?;
        debug!(code = %preview.code, discount = %preview.discount, "Coupon applied");
        Ok(preview)
    }

    /// Places an order for the current cart.
    ///
    /// The cart is cleared only after the gateway accepts the order.
    pub async fn checkout(&self, request: CheckoutRequest) -> CheckoutResult<OrderReceipt> {
        validate_billing(&request.billing)?;

        let payment_method = request.payment_method.trim();
        if payment_method.is_empty() {
            return Err(ValidationError::required("payment_method").into());
        }

        let coupon_code = request
            .coupon_code
            .as_deref()
            .map(validate_coupon_code)
            .transpose()?;

        let line_items = self.cart.order_lines().await;
        if line_items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = NewOrder {
            billing: request.billing,
            line_items,
            payment_method: payment_method.to_string(),
            coupon_code,
            customer_id: request.customer_id,
        };

        debug!(lines = order.line_items.len(), "Creating order");
        let receipt = self.orders.create_order(&order).await?;

        self.cart.clear_cart().await;
        info!(order_id = receipt.order_id, "Order placed");
        Ok(receipt)
    }

    /// Fetches an order. Guests pass the billing email or guest token.
    pub async fn track_order(&self, order_id: u64, access: &OrderAccess) -> CheckoutResult<Order> {
        Ok(self.orders.order(order_id, access).await?)
    }

    pub async fn order_notes(&self, order_id: u64) -> Vec<OrderNote> {
        self.orders.order_notes(order_id).await.unwrap_or_else(|e| {
            warn!(order_id, error = %e, "Failed to load order notes");
            Vec::new()
        })
    }

    pub async fn customer_orders(&self, customer_id: u64) -> Vec<Order> {
        self.orders
            .customer_orders(customer_id)
            .await
            .unwrap_or_else(|e| {
                warn!(customer_id, error = %e, "Failed to load customer orders");
                Vec::new()
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
