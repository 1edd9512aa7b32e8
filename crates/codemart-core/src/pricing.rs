//! # Bundle Pricing
//!
//! Computes the price of several gift-card denominations sold as one
//! bundle. Which denominations to combine is decided elsewhere (the gateway's
//! bundle endpoint); this module only prices a given selection.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  total_price  = Σ item catalog price                                   │
//! │  rate         = exchange_rate if > 0        else policy.base_rate      │
//! │  margin       = profit_margin if >= 0       else policy.profit         │
//! │                                                                         │
//! │  raw          = ceil_whole_unit(total_face_value × rate + margin)      │
//! │  final_price  = min(total_price, raw)                                  │
//! │  savings      = max(0, total_price − final_price)                      │
//! │                                                                         │
//! │  Example: face 10, rate 110, margin 50 → raw 1150                      │
//! │           catalog 1300 → final 1150, savings 150                       │
//! │           catalog 1100 → final 1100, savings 0                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding is always upward so the margin is never under-collected, and the
//! catalog sum caps the result so a bundle is never dearer than its parts.
//!
//! All arithmetic is integer: money in cents, rates in ten-thousandths,
//! intermediate products in `i128`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ExchangeRate, Variation};
use crate::{DEFAULT_BASE_RATE, DEFAULT_PROFIT};

// =============================================================================
// Policy
// =============================================================================

/// Fallback rate and margin used when a calculation is not given valid ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub base_rate: ExchangeRate,
    pub profit: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            base_rate: ExchangeRate::from_whole(DEFAULT_BASE_RATE),
            profit: Money::from_major(DEFAULT_PROFIT),
        }
    }
}

// =============================================================================
// Inputs and Results
// =============================================================================

/// One denomination selected for a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleItem {
    pub variation: Variation,
    /// Nominal value in face-value currency.
    pub face_value: Money,
}

impl BundleItem {
    pub fn new(variation: Variation, face_value: Money) -> Self {
        BundleItem {
            variation,
            face_value,
        }
    }

    /// Catalog price of this item in shop currency.
    #[inline]
    pub fn price(&self) -> Money {
        self.variation.price
    }
}

/// Display tag derived from the number of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Single,
    Pair,
    Triple,
    /// Four or more items.
    Quad,
}

impl BundleKind {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 | 1 => BundleKind::Single,
            2 => BundleKind::Pair,
            3 => BundleKind::Triple,
            _ => BundleKind::Quad,
        }
    }
}

/// A selected variation with its share of the bundle price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleSelection {
    pub variation: Variation,
    pub face_value: Money,
    /// Share of `final_price` allocated to this item.
    pub price: Money,
}

/// Result of [`calculate_bundle_price`]. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleCalculation {
    pub selections: Vec<BundleSelection>,
    pub total_face_value: Money,
    /// Σ catalog prices of the selected items.
    pub total_price: Money,
    /// Formula price before capping by `total_price`.
    pub bundle_price_raw: Money,
    pub final_price: Money,
    pub savings: Money,
    pub kind: BundleKind,
    /// Face value the shopper asked for.
    pub requested: Money,
    pub currency: String,
}

// =============================================================================
// Calculation
// =============================================================================

/// Cents × ten-thousandths per whole currency unit.
const UNIT_SCALE: i128 = 100 * ExchangeRate::SCALE as i128;

/// Prices a bundle of already-selected denominations.
///
/// ## Errors
/// - [`CoreError::EmptyBundle`] when `items` is empty
/// - [`ValidationError::MustNotBeNegative`] for negative face values,
///   targets or catalog prices
/// - [`CoreError::InsufficientTarget`] when the selection covers less face
///   value than `raw_target`
pub fn calculate_bundle_price(
    items: &[BundleItem],
    total_face_value: Money,
    raw_target: Money,
    currency: &str,
    exchange_rate: Option<ExchangeRate>,
    profit_margin: Option<Money>,
    policy: &PricingPolicy,
) -> CoreResult<BundleCalculation> {
    if items.is_empty() {
        return Err(CoreError::EmptyBundle);
    }
    ensure_not_negative("total_face_value", total_face_value)?;
    ensure_not_negative("target", raw_target)?;
    for item in items {
        ensure_not_negative("face_value", item.face_value)?;
        ensure_not_negative("price", item.price())?;
    }

    if total_face_value < raw_target {
        return Err(CoreError::InsufficientTarget {
            requested: raw_target.to_decimal_string(),
            covered: total_face_value.to_decimal_string(),
        });
    }

    let total_price: Money = items.iter().map(BundleItem::price).sum();

    let rate = exchange_rate
        .filter(ExchangeRate::is_positive)
        .unwrap_or(policy.base_rate);
    let margin = profit_margin
        .filter(|m| !m.is_negative())
        .unwrap_or(policy.profit);

    let bundle_price_raw = formula_price(total_face_value, rate, margin)?;
    let final_price = total_price.min(bundle_price_raw);
    let savings = (total_price - final_price).max(Money::zero());

    let shares = allocate(final_price, items)?;
    let selections = items
        .iter()
        .zip(shares)
        .map(|(item, price)| BundleSelection {
            variation: item.variation.clone(),
            face_value: item.face_value,
            price,
        })
        .collect();

    Ok(BundleCalculation {
        selections,
        total_face_value,
        total_price,
        bundle_price_raw,
        final_price,
        savings,
        kind: BundleKind::from_count(items.len()),
        requested: raw_target,
        currency: currency.to_string(),
    })
}

/// `ceil_whole_unit(face × rate + margin)`.
fn formula_price(face: Money, rate: ExchangeRate, margin: Money) -> CoreResult<Money> {
    let numerator = face.cents() as i128 * rate.e4() as i128
        + margin.cents() as i128 * ExchangeRate::SCALE as i128;
    let units = (numerator + UNIT_SCALE - 1) / UNIT_SCALE;
    i64::try_from(units * 100)
        .map(Money::from_cents)
        .map_err(|_| CoreError::AmountOverflow("bundle price"))
}

/// Splits `total` across items in proportion to their catalog prices.
///
/// Shares are floored and the remainder goes to the last item, so they sum
/// exactly to `total`. Free items split evenly.
fn allocate(total: Money, items: &[BundleItem]) -> CoreResult<Vec<Money>> {
    let count = items.len() as i128;
    let weight_sum: i128 = items.iter().map(|i| i.price().cents() as i128).sum();

    let mut shares = Vec::with_capacity(items.len());
    let mut assigned: i128 = 0;
    for (idx, item) in items.iter().enumerate() {
        let share = if idx + 1 == items.len() {
            total.cents() as i128 - assigned
        } else if weight_sum == 0 {
            total.cents() as i128 / count
        } else {
            total.cents() as i128 * item.price().cents() as i128 / weight_sum
        };
        assigned += share;
        let share = i64::try_from(share).map_err(|_| CoreError::AmountOverflow("bundle share"))?;
        shares.push(Money::from_cents(share));
    }
    Ok(shares)
}

fn ensure_not_negative(field: &str, value: Money) -> Result<(), ValidationError> {
    if value.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
