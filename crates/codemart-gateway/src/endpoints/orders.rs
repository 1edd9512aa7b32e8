//! Order creation and lookup.
//!
//! ## Payment URL Resolution
//! Backends disagree on where the payment link lives. The first non-empty
//! string among these fields wins:
//!
//! ```text
//! payment_url → redirect_url → checkout_url → order_pay_url
//! ```

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use codemart_core::{NewOrder, Order, OrderNote};

use crate::api::OrderGateway;
use crate::client::{take_list, take_object, GatewayClient};
use crate::error::{GatewayError, GatewayResult};

const PAYMENT_URL_FIELDS: [&str; 4] = ["payment_url", "redirect_url", "checkout_url", "order_pay_url"];

/// What the gateway reports after creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: u64,
    pub payment_url: Option<String>,
    /// Lets a guest look the order up later without an account.
    pub guest_token: Option<String>,
    pub status: Option<String>,
}

impl OrderReceipt {
    /// Reads a receipt from the order creation response.
    pub fn from_value(value: &Value) -> GatewayResult<Self> {
        let order = value.get("order").filter(|o| o.is_object()).unwrap_or(value);

        let order_id = ["id", "order_id"]
            .iter()
            .find_map(|field| id_field(value, field).or_else(|| id_field(order, field)))
            .ok_or_else(|| GatewayError::Decode("order response has no id".into()))?;

        let payment_url = PAYMENT_URL_FIELDS
            .iter()
            .find_map(|field| text_field(value, field).or_else(|| text_field(order, field)));

        Ok(OrderReceipt {
            order_id,
            payment_url,
            guest_token: text_field(value, "guest_token").or_else(|| text_field(order, "guest_token")),
            status: text_field(order, "status"),
        })
    }
}

fn id_field(value: &Value, field: &str) -> Option<u64> {
    match value.get(field)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Proof of ownership for guest order lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderAccess {
    pub email: Option<String>,
    pub token: Option<String>,
}

impl OrderAccess {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            pairs.push(("email", email.to_string()));
        }
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            pairs.push(("token", token.to_string()));
        }
        pairs
    }
}

#[async_trait]
impl OrderGateway for GatewayClient {
    async fn create_order(&self, order: &NewOrder) -> GatewayResult<OrderReceipt> {
        let value: Value = self.send_json(Method::POST, &["orders"], order).await?;
        let receipt = OrderReceipt::from_value(&value)?;

        info!(
            order_id = receipt.order_id,
            has_payment_url = receipt.payment_url.is_some(),
            "Order created"
        );
        Ok(receipt)
    }

    async fn order(&self, order_id: u64, access: &OrderAccess) -> GatewayResult<Order> {
        let id = order_id.to_string();
        let value: Value = self
            .get_json(&["orders", id.as_str()], &access.query_pairs())
            .await?;
        take_object(value, "order")
    }

    async fn order_notes(&self, order_id: u64) -> GatewayResult<Vec<OrderNote>> {
        let id = order_id.to_string();
        let value: Value = self.get_json(&["orders", id.as_str(), "notes"], &[]).await?;
        take_list(value, "notes")
    }

    async fn customer_orders(&self, customer_id: u64) -> GatewayResult<Vec<Order>> {
        let id = customer_id.to_string();
        let value: Value = self
            .get_json(&["customers", id.as_str(), "orders"], &[])
            .await?;
        take_list(value, "orders")
    }
}
