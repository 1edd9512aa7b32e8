//! Server-side bundle selection (`POST /calculateBundle`).
//!
//! The backend picks which denominations cover the requested amount; the
//! local pricing engine then prices that selection.
//!
//! ```json
//! {
//!   "success": true,
//!   "currency": "USD",
//!   "total": "2300.00",
//!   "exchange_rate": "110",
//!   "profit_margin": "50",
//!   "items": [
//!     { "variation": { "id": 11, "name": "$10", "price": "1300" }, "face_value": "10", "quantity": 2 }
//!   ]
//! }
//! ```

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use codemart_core::money::{decimal, decimal_opt};
use codemart_core::{BundleItem, ExchangeRate, Money, Variation};

use crate::api::BundleGateway;
use crate::client::GatewayClient;
use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleRequest<'a> {
    pub product_id: u64,
    #[serde(with = "decimal")]
    pub amount: Money,
    pub currency: &'a str,
}

/// One selected denomination, possibly repeated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfferedItem {
    pub variation: Variation,
    #[serde(default, with = "decimal_opt")]
    pub face_value: Option<Money>,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

/// The backend's bundle selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleOffer {
    #[serde(default, alias = "variations")]
    pub items: Vec<OfferedItem>,

    /// The backend's own price for the selection, when it sends one.
    #[serde(default, with = "decimal_opt")]
    pub total: Option<Money>,

    #[serde(default)]
    pub exchange_rate: Option<Value>,

    #[serde(default, with = "decimal_opt")]
    pub profit_margin: Option<Money>,

    #[serde(default)]
    pub currency: Option<String>,
}

impl BundleOffer {
    /// The rate the backend priced with, if it sent a readable one.
    pub fn exchange_rate(&self) -> Option<ExchangeRate> {
        match self.exchange_rate.as_ref()? {
            Value::String(s) => ExchangeRate::parse_decimal(s).ok(),
            Value::Number(n) => ExchangeRate::parse_decimal(&n.to_string()).ok(),
            _ => None,
        }
    }

    /// Expands quantities into one [`BundleItem`] per unit.
    ///
    /// Face values come from the item, then the variation's denomination.
    pub fn bundle_items(&self) -> GatewayResult<Vec<BundleItem>> {
        let mut items = Vec::new();
        for offered in &self.items {
            let face_value = offered
                .face_value
                .or_else(|| offered.variation.denomination())
                .ok_or_else(|| {
                    GatewayError::Decode(format!(
                        "variation {} has no face value",
                        offered.variation.id
                    ))
                })?;

            for _ in 0..offered.quantity {
                items.push(BundleItem::new(offered.variation.clone(), face_value));
            }
        }
        Ok(items)
    }

    pub fn total_face_value(&self) -> GatewayResult<Money> {
        Ok(self.bundle_items()?.iter().map(|i| i.face_value).sum())
    }
}

#[async_trait]
impl BundleGateway for GatewayClient {
    async fn calculate_bundle(
        &self,
        product_id: u64,
        amount: Money,
        currency: &str,
    ) -> GatewayResult<BundleOffer> {
        let request = BundleRequest {
            product_id,
            amount,
            currency,
        };
        let offer: BundleOffer = self
            .send_json(Method::POST, &["calculateBundle"], &request)
            .await?;

        debug!(
            product_id,
            amount = %amount,
            items = offer.items.len(),
            "Bundle offer received"
        );
        Ok(offer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::serve;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "success": true,
            "currency": "USD",
            "total": "2300.00",
            "exchange_rate": 132.5,
            "profit_margin": "50",
            "items": [
                { "variation": { "id": 11, "name": "$10 Card", "price": "1300" }, "quantity": 2 },
                { "variation": { "id": 12, "name": "Five", "price": "700" }, "face_value": "5" }
            ]
        })
    }

    #[test]
    fn test_request_wire_shape() {
        let request = BundleRequest {
            product_id: 42,
            amount: Money::from_major(25),
            currency: "USD",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "product_id": 42, "amount": "25.00", "currency": "USD" })
        );
    }

    #[test]
    fn test_offer_expansion() {
        let offer: BundleOffer = serde_json::from_value(fixture()).unwrap();

        let items = offer.bundle_items().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].face_value, Money::from_major(10));
        assert_eq!(items[2].face_value, Money::from_major(5));
        assert_eq!(offer.total_face_value().unwrap(), Money::from_major(25));
        assert_eq!(offer.exchange_rate().map(|r| r.e4()), Some(1_325_000));
        assert_eq!(offer.profit_margin, Some(Money::from_major(50)));
    }

    #[test]
    fn test_offer_missing_face_value() {
        let offer: BundleOffer = serde_json::from_value(json!({
            "variations": [{ "variation": { "id": 3, "name": "Mystery", "price": "10" } }]
        }))
        .unwrap();
        assert!(matches!(offer.bundle_items(), Err(GatewayError::Decode(_))));
        assert!(offer.exchange_rate().is_none());
    }

    async fn calculate(Json(body): Json<Value>) -> Json<Value> {
        if body["amount"] == "0.00" {
            return Json(json!({ "success": false, "message": "Enter an amount" }));
        }
        Json(fixture())
    }

    #[tokio::test]
    async fn test_calculate_bundle() {
        let client = serve(Router::new().route("/api/calculateBundle", post(calculate))).await;

        let offer = client
            .calculate_bundle(42, Money::from_major(25), "USD")
            .await
            .unwrap();
        assert_eq!(offer.items.len(), 2);
        assert_eq!(offer.currency.as_deref(), Some("USD"));

        let err = client
            .calculate_bundle(42, Money::zero(), "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
    }
}
