//! Coupon discount math.
//!
//! The gateway stays the authority on whether a coupon is valid and what the
//! order finally costs. This module only previews the discount locally for
//! the two types the storefront understands.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Coupon, DiscountType};

/// A coupon previewed against a cart subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponPreview {
    pub code: String,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Discount a coupon grants on `subtotal`.
///
/// - `percent`: `amount` percent of the subtotal (capped at 100%), rounded
///   half up
/// - `fixed_cart`: `amount`, capped at the subtotal
pub fn discount_for(coupon: &Coupon, subtotal: Money) -> CoreResult<Money> {
    if coupon.amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "coupon amount".to_string(),
        }
        .into());
    }
    let subtotal = subtotal.max(Money::zero());

    match &coupon.discount_type {
        DiscountType::Percent => {
            // "10" parses to 1000 cents, which is exactly 1000 bps
            let bps = coupon.amount.cents().min(10_000) as u32;
            Ok(subtotal.percentage(bps))
        }
        DiscountType::FixedCart => Ok(coupon.amount.min(subtotal)),
        DiscountType::Other(kind) => Err(CoreError::UnsupportedDiscount(kind.clone())),
    }
}

pub fn preview(coupon: &Coupon, subtotal: Money) -> CoreResult<CouponPreview> {
    let discount = discount_for(coupon, subtotal)?;
    Ok(CouponPreview {
        code: coupon.code.clone(),
        subtotal,
        discount,
        total: subtotal - discount,
    })
}
