//! # Cart Model
//!
//! The pure cart: a flat, ordered list of lines keyed by a composite key.
//! Persistence and notifications live in the app's `CartStore`; this module
//! only enforces the line rules.
//!
//! ## Line Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartKey = "{product_id}-{variation_id | default}-{custom | standard}" │
//! │                                                                         │
//! │  add(A, 1)              ──► "42-default-standard"   qty 1   (new)      │
//! │  add(A, 2)              ──► "42-default-standard"   qty 3   (merged)   │
//! │  add(A, 1, var 11)      ──► "42-11-standard"        qty 1   (new)      │
//! │  add(A, 1, var 11, 1150)──► "42-11-1150.00"         qty 1   (new)      │
//! │                                                                         │
//! │  The key is the ONLY identity. Variation and custom price are part of  │
//! │  it, so they can never change on an existing line.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Effective Unit Price
//! `custom_price` → `selected_variation.price` → `sale_price` (when on sale)
//! → `price`. Totals are recomputed from the lines on every read.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{decimal_opt, Money};
use crate::types::{NewOrderLine, Product, Variation};
use crate::validation::validate_quantity;
use crate::{NO_VARIATION_KEY, STANDARD_PRICE_KEY};

// =============================================================================
// Cart Key
// =============================================================================

/// Composite identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct CartKey(String);

impl CartKey {
    pub fn new(product_id: u64, variation_id: Option<u64>, custom_price: Option<Money>) -> Self {
        let variation = variation_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| NO_VARIATION_KEY.to_string());
        let price = custom_price
            .map(|p| p.to_decimal_string())
            .unwrap_or_else(|| STANDARD_PRICE_KEY.to_string());
        CartKey(format!("{}-{}-{}", product_id, variation, price))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CartKey {
    fn from(s: &str) -> Self {
        CartKey(s.to_string())
    }
}

impl From<String> for CartKey {
    fn from(s: String) -> Self {
        CartKey(s)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A product snapshot plus the shopper's choices.
///
/// ## Design Notes
/// - `product`: frozen copy of the gateway product at add time
/// - `selected_variation`: immutable once the line exists
/// - `custom_price`: overrides every catalog price (bundle pricing)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product: Product,

    pub quantity: i64,

    #[serde(default)]
    pub selected_variation: Option<Variation>,

    #[serde(default, with = "decimal_opt")]
    #[ts(type = "string | null")]
    pub custom_price: Option<Money>,

    #[serde(default = "Utc::now")]
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Derives this line's composite key.
    pub fn key(&self) -> CartKey {
        CartKey::new(
            self.product.id,
            self.selected_variation.as_ref().map(|v| v.id),
            self.custom_price,
        )
    }

    /// Resolves the price of one unit.
    pub fn unit_price(&self) -> Money {
        if let Some(custom) = self.custom_price {
            return custom;
        }
        if let Some(variation) = &self.selected_variation {
            return variation.price;
        }
        self.product.catalog_price()
    }

    /// Unit price × quantity. Lines held by a [`Cart`] never overflow.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }

    pub fn checked_line_total(&self) -> Option<Money> {
        self.unit_price().checked_mul(self.quantity)
    }

    /// Name shown to the shopper, including the variation when present.
    pub fn display_name(&self) -> String {
        match &self.selected_variation {
            Some(v) if !v.name.is_empty() => format!("{} ({})", self.product.name, v.name),
            _ => self.product.name.clone(),
        }
    }
}

/// Derived cart figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub subtotal: Money,
    /// Sum of all line quantities.
    pub item_count: i64,
    pub line_count: usize,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart. Serializes as the ordered list of its lines.
///
/// ## Invariants
/// - Keys are unique across lines
/// - Every line has `quantity >= 1`
/// - Every line total, the cart total and the item count fit in an `i64`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuilds a cart from stored lines, merging any duplicate keys and
    /// dropping lines with a non-positive quantity or whose amounts would
    /// overflow.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Cart::new();
        for line in lines.into_iter().filter(|l| l.quantity >= 1) {
            let key = line.key();
            let quantity = line.quantity;
            let _ = match cart.lines.iter().position(|l| l.key() == key) {
                Some(index) => cart.grow_line(index, quantity),
                None => cart.push_line(line),
            };
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn get(&self, key: &CartKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.key() == key)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a product or merges into the existing line with the same key.
    ///
    /// ## Behavior
    /// - Same key: quantities are summed (no upper bound)
    /// - New key: a line is appended
    ///
    /// ## Returns
    /// - `Ok(key)` of the affected line
    /// - `Err(MustBePositive)` when `quantity < 1`
    pub fn add(
        &mut self,
        product: &Product,
        quantity: i64,
        variation: Option<&Variation>,
        custom_price: Option<Money>,
    ) -> CoreResult<CartKey> {
        validate_quantity(quantity)?;

        let key = CartKey::new(product.id, variation.map(|v| v.id), custom_price);

        if let Some(index) = self.lines.iter().position(|l| l.key() == key) {
            self.grow_line(index, quantity)?;
            return Ok(key);
        }

        self.push_line(CartLine {
            product: product.clone(),
            quantity,
            selected_variation: variation.cloned(),
            custom_price,
            added_at: Utc::now(),
        })?;
        Ok(key)
    }

    /// Removes the line with exactly this key. Returns whether one existed.
    pub fn remove(&mut self, key: &CartKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.key() != key);
        self.lines.len() != before
    }

    /// Sets a line's quantity.
    ///
    /// ## Returns
    /// - `Ok(true)` when the line was updated
    /// - `Ok(false)` when no line has this key
    /// - `Err(MustBePositive)` when `quantity < 1`; the line is unchanged
    /// - `Err(AmountOverflow)` when the new totals don't fit; the line is unchanged
    pub fn update_quantity(&mut self, key: &CartKey, quantity: i64) -> CoreResult<bool> {
        validate_quantity(quantity)?;

        let Some(index) = self.lines.iter().position(|l| &l.key() == key) else {
            return Ok(false);
        };

        let previous = std::mem::replace(&mut self.lines[index].quantity, quantity);
        if self.checked_totals().is_none() {
            self.lines[index].quantity = previous;
            return Err(CoreError::AmountOverflow("cart total"));
        }
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Σ effective unit price × quantity, computed from scratch.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Σ quantities.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Total and item count, or `None` if either overflows.
    fn checked_totals(&self) -> Option<(Money, i64)> {
        self.lines
            .iter()
            .try_fold((Money::zero(), 0i64), |(total, count), line| {
                Some((
                    total.checked_add(line.checked_line_total()?)?,
                    count.checked_add(line.quantity)?,
                ))
            })
    }

    /// Adds `quantity` to an existing line, undoing it on overflow.
    fn grow_line(&mut self, index: usize, quantity: i64) -> CoreResult<()> {
        let line = &mut self.lines[index];
        let previous = line.quantity;
        line.quantity = previous
            .checked_add(quantity)
            .ok_or(CoreError::AmountOverflow("line quantity"))?;

        if self.checked_totals().is_none() {
            self.lines[index].quantity = previous;
            return Err(CoreError::AmountOverflow("cart total"));
        }
        Ok(())
    }

    /// Appends a line, undoing it on overflow.
    fn push_line(&mut self, line: CartLine) -> CoreResult<()> {
        self.lines.push(line);
        if self.checked_totals().is_none() {
            self.lines.pop();
            return Err(CoreError::AmountOverflow("cart total"));
        }
        Ok(())
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            subtotal: self.total(),
            item_count: self.item_count(),
            line_count: self.lines.len(),
        }
    }

    /// Converts the lines into order lines.
    ///
    /// Custom-priced lines carry an explicit line total so the gateway
    /// charges the bundle price instead of the catalog price.
    pub fn order_lines(&self) -> Vec<NewOrderLine> {
        self.lines
            .iter()
            .map(|line| NewOrderLine {
                product_id: line.product.id,
                variation_id: line.selected_variation.as_ref().map(|v| v.id),
                quantity: line.quantity,
                total: line.custom_price.map(|p| p * line.quantity),
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};

    fn product_a() -> Product {
        let mut p = Product::new(42, "Steam Wallet", Money::from_major(1300));
        p.variations = vec![
            Variation::new(11, "$10 Steam Wallet", Money::from_major(1300)),
            Variation::new(12, "$20 Steam Wallet", Money::from_major(2500)),
        ];
        p
    }

    #[test]
    fn test_key_format() {
        assert_eq!(CartKey::new(42, None, None).as_str(), "42-default-standard");
        assert_eq!(
            CartKey::new(42, Some(11), Some(Money::from_major(1150))).as_str(),
            "42-11-1150.00"
        );
    }

    #[test]
    fn test_same_key_merges() {
        let mut cart = Cart::new();
        let p = product_a();

        let k1 = cart.add(&p, 2, None, None).unwrap();
        let k2 = cart.add(&p, 5, None, None).unwrap();

        assert_eq!(k1, k2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(&k1).unwrap().quantity, 7);
    }

    #[test]
    fn test_different_variations_are_distinct() {
        let mut cart = Cart::new();
        let p = product_a();

        cart.add(&p, 1, Some(&p.variations[0]), None).unwrap();
        cart.add(&p, 1, Some(&p.variations[1]), None).unwrap();

        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_add_add_add_scenario() {
        let mut cart = Cart::new();
        let p = product_a();

        cart.add(&p, 1, None, None).unwrap();
        cart.add(&p, 2, None, None).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);

        cart.add(&p, 1, Some(&p.variations[0]), None).unwrap();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_effective_price_resolution() {
        let mut p = product_a();
        p.on_sale = true;
        p.sale_price = Some(Money::from_major(1200));

        let mut cart = Cart::new();
        let plain = cart.add(&p, 1, None, None).unwrap();
        let var = cart.add(&p, 1, Some(&p.variations[1]), None).unwrap();
        let custom = cart
            .add(&p, 1, Some(&p.variations[1]), Some(Money::from_major(2300)))
            .unwrap();

        assert_eq!(cart.get(&plain).unwrap().unit_price(), Money::from_major(1200));
        assert_eq!(cart.get(&var).unwrap().unit_price(), Money::from_major(2500));
        assert_eq!(cart.get(&custom).unwrap().unit_price(), Money::from_major(2300));
        assert_eq!(cart.total(), Money::from_major(1200 + 2500 + 2300));
    }

    #[test]
    fn test_quantity_floor() {
        let mut cart = Cart::new();
        let key = cart.add(&product_a(), 3, None, None).unwrap();

        for qty in [0, -5] {
            let err = cart.update_quantity(&key, qty).unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::MustBePositive { .. })
            ));
            assert_eq!(cart.get(&key).unwrap().quantity, 3);
        }

        assert!(cart.update_quantity(&key, 8).unwrap());
        assert_eq!(cart.get(&key).unwrap().quantity, 8);
        assert!(!cart.update_quantity(&CartKey::from("nope"), 2).unwrap());
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        assert!(cart.add(&product_a(), 0, None, None).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut cart = Cart::new();
        let key = cart.add(&product_a(), 1, None, None).unwrap();

        assert!(!cart.remove(&CartKey::from("1-default-standard")));
        assert_eq!(cart.lines().len(), 1);
        assert!(cart.remove(&key));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_consistency_after_mixed_mutations() {
        let mut cart = Cart::new();
        let p = product_a();

        let a = cart.add(&p, 2, None, None).unwrap();
        let b = cart.add(&p, 1, Some(&p.variations[1]), None).unwrap();
        cart.update_quantity(&a, 4).unwrap();
        cart.add(&p, 1, None, Some(Money::from_major(999))).unwrap();
        cart.remove(&b);

        let recomputed: Money = cart
            .lines()
            .iter()
            .map(|l| l.unit_price() * l.quantity)
            .sum();
        assert_eq!(cart.total(), recomputed);
        assert_eq!(cart.total(), Money::from_major(4 * 1300 + 999));
    }

    #[test]
    fn test_snapshot_round_trip_and_repair() {
        let mut cart = Cart::new();
        let p = product_a();
        cart.add(&p, 2, Some(&p.variations[0]), Some(Money::from_major(1150)))
            .unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.starts_with('['));
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);

        let mut lines = restored.lines().to_vec();
        lines.push(lines[0].clone());
        let mut zero = lines[0].clone();
        zero.custom_price = None;
        zero.quantity = 0;
        lines.push(zero);

        let repaired = Cart::from_lines(lines);
        assert_eq!(repaired.lines().len(), 1);
        assert_eq!(repaired.item_count(), 4);
    }

    #[test]
    fn test_overflowing_quantity_is_rejected() {
        let mut cart = Cart::new();
        let mut free = product_a();
        free.price = Money::zero();

        let key = cart.add(&free, i64::MAX, None, None).unwrap();
        let err = cart.add(&free, 1, None, None).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow(_)));
        assert_eq!(cart.get(&key).unwrap().quantity, i64::MAX);

        // Item count across lines overflows too
        let err = cart.add(&free, 1, None, Some(Money::zero())).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow(_)));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let mut cart = Cart::new();
        let p = product_a();
        let key = cart.add(&p, 1, None, None).unwrap();

        let err = cart.update_quantity(&key, i64::MAX / 100).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow(_)));
        assert_eq!(cart.get(&key).unwrap().quantity, 1);

        assert!(cart.add(&p, i64::MAX / 1000, None, None).is_err());
        assert_eq!(cart.total(), Money::from_major(1300));
    }

    #[test]
    fn test_from_lines_drops_overflowing_duplicates() {
        let mut cart = Cart::new();
        let p = product_a();
        cart.add(&p, 1, None, None).unwrap();

        let mut lines = cart.lines().to_vec();
        let mut huge = lines[0].clone();
        huge.quantity = i64::MAX;
        lines.push(huge);

        let repaired = Cart::from_lines(lines);
        assert_eq!(repaired.item_count(), 1);
        assert_eq!(repaired.total(), Money::from_major(1300));
    }

    #[test]
    fn test_order_lines_carry_custom_totals() {
        let mut cart = Cart::new();
        let p = product_a();
        cart.add(&p, 2, None, None).unwrap();
        cart.add(&p, 2, Some(&p.variations[0]), Some(Money::from_major(1150)))
            .unwrap();

        let lines = cart.order_lines();
        assert_eq!(lines[0].total, None);
        assert_eq!(lines[1].variation_id, Some(11));
        assert_eq!(lines[1].total, Some(Money::from_major(2300)));
    }
}
