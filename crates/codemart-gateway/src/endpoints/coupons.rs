//! Coupon lookup.

use async_trait::async_trait;
use serde_json::Value;

use codemart_core::Coupon;

use crate::api::CouponGateway;
use crate::client::{take_list, take_object, GatewayClient};
use crate::error::GatewayResult;

#[async_trait]
impl CouponGateway for GatewayClient {
    async fn coupon(&self, code: &str) -> GatewayResult<Option<Coupon>> {
        let value = match self.get_json::<Value>(&["coupons", code], &[]).await {
            Ok(value) => value,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };

        // Some backends answer a code lookup with a (possibly empty) list
        if value.is_array() || value.get("coupons").is_some() {
            let mut coupons: Vec<Coupon> = take_list(value, "coupons")?;
            return Ok(if coupons.is_empty() {
                None
            } else {
                Some(coupons.swap_remove(0))
            });
        }

        take_object(value, "coupon").map(Some)
    }
}
