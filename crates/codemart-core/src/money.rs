//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The gateway sends prices as decimal strings: "10.00", "9.5", "".      │
//! │  Parsing them into floats and summing a cart drifts:                   │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    "10.00" ──parse──► 1000 ──sum/multiply──► exact ──render──► "20.00" │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use codemart_core::money::Money;
//!
//! let price = Money::parse_decimal("10.99").unwrap();
//! assert_eq!(price.cents(), 1099);
//!
//! let total = price * 2 + Money::from_cents(2);
//! assert_eq!(total.to_decimal_string(), "22.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents, paisa, ...).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Product.price ─┬─► CartLine effective unit price ─► Cart.total        │
/// │  Variation.price┤                                                       │
/// │  custom_price ──┘                                                       │
/// │                                                                         │
/// │  Variation face value ─► bundle pricing ─► custom_price ─► CartLine    │
/// │                                                                         │
/// │  Cart.total ─► coupon discount ─► order total                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// ```rust
    /// use codemart_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(1150).cents(), 115_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Adds, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Rounds up to the next whole currency unit.
    ///
    /// Bundle prices are never rounded down, so the configured margin is
    /// never under-collected.
    ///
    /// ```rust
    /// use codemart_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(114_901).ceil_to_whole_unit().cents(), 115_000);
    /// assert_eq!(Money::from_cents(115_000).ceil_to_whole_unit().cents(), 115_000);
    /// ```
    pub const fn ceil_to_whole_unit(&self) -> Self {
        let rem = self.0.rem_euclid(100);
        if rem == 0 {
            *self
        } else {
            Money(self.0 - rem + 100)
        }
    }

    /// Returns `bps` basis points of this amount, rounded half up.
    ///
    /// ```rust
    /// use codemart_core::money::Money;
    ///
    /// // 10% of 100.00
    /// assert_eq!(Money::from_cents(10_000).percentage(1000).cents(), 1000);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        *self - self.percentage(discount_bps)
    }

    /// Parses a gateway decimal string (`"10"`, `"10.5"`, `"-3.25"`).
    ///
    /// ## Rules
    /// - Surrounding whitespace is ignored
    /// - More than two fraction digits are rounded half up
    /// - Empty input is rejected (use the serde codecs for lenient parsing)
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let not_a_number =
            || ValidationError::invalid_format("amount", format!("'{}' is not a number", input));

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(not_a_number());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(not_a_number());
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| {
                ValidationError::invalid_format("amount", format!("'{}' is out of range", input))
            })?
        };

        let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
        let tenths = frac_digits.next().unwrap_or(0);
        let hundredths = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().is_some_and(|d| d >= 5);

        let cents = whole_value
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(|| {
                ValidationError::invalid_format("amount", format!("'{}' is out of range", input))
            })?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Renders the amount the way the gateway expects it (`"1150.00"`).
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the plain decimal amount; currency formatting belongs to
/// the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_decimal_string())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Gateway Decimal Codecs
// =============================================================================

/// Lenient visitor shared by [`decimal`] and [`decimal_opt`].
///
/// Accepts `"10.00"`, `10`, `10.5`, `""` and `null`; the last two mean
/// "no amount".
struct DecimalVisitor;

impl<'de> serde::de::Visitor<'de> for DecimalVisitor {
    type Value = Option<Money>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.trim().is_empty() {
            return Ok(None);
        }
        Money::parse_decimal(v).map(Some).map_err(E::custom)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(100)
            .map(|c| Some(Money(c)))
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map_err(|_| E::custom("amount out of range"))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Money::parse_decimal(&v.to_string())
            .map(Some)
            .map_err(E::custom)
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: serde::Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(DecimalVisitor)
    }
}

/// `#[serde(with = "decimal")]` for required gateway amounts.
///
/// Serializes as a decimal string; missing/empty values deserialize as zero.
pub mod decimal {
    use super::{DecimalVisitor, Money};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_decimal_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer
            .deserialize_any(DecimalVisitor)
            .map(Option::unwrap_or_default)
    }
}

/// `#[serde(with = "decimal_opt")]` for optional gateway amounts.
///
/// `""` and `null` both deserialize as `None`. Pair with `#[serde(default)]`.
pub mod decimal_opt {
    use super::{DecimalVisitor, Money};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Money>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(m) => serializer.serialize_some(&m.to_decimal_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Money>, D::Error> {
        deserializer.deserialize_option(DecimalVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_from_cents_and_major() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.cents_part(), 99);
        assert_eq!(Money::from_major(50).cents(), 5000);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse_decimal("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse_decimal(" 10.99 ").unwrap().cents(), 1099);
        assert_eq!(Money::parse_decimal(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal("-3.25").unwrap().cents(), -325);
        // Third fraction digit rounds half up
        assert_eq!(Money::parse_decimal("1.005").unwrap().cents(), 101);
        assert_eq!(Money::parse_decimal("1.004").unwrap().cents(), 100);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal("1.2.3").is_err());
        assert!(Money::parse_decimal(".").is_err());
        assert!(Money::parse_decimal("NaN").is_err());
        assert!(Money::parse_decimal("99999999999999999999").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_ceil_to_whole_unit() {
        assert_eq!(Money::from_cents(1).ceil_to_whole_unit().cents(), 100);
        assert_eq!(Money::from_cents(100).ceil_to_whole_unit().cents(), 100);
        assert_eq!(Money::from_cents(199).ceil_to_whole_unit().cents(), 200);
        assert_eq!(Money::from_cents(-150).ceil_to_whole_unit().cents(), -100);
    }

    #[test]
    fn test_percentage() {
        let subtotal = Money::from_cents(10000);
        assert_eq!(subtotal.percentage(1000).cents(), 1000);
        assert_eq!(subtotal.apply_percentage_discount(1000).cents(), 9000);
        // 8.25% of 10.00 = 0.825 → 0.83
        assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83);
    }

    #[derive(Serialize, Deserialize)]
    struct Priced {
        #[serde(with = "decimal")]
        price: Money,
        #[serde(default, with = "decimal_opt")]
        sale_price: Option<Money>,
    }

    #[test]
    fn test_decimal_codec_accepts_gateway_shapes() {
        let p: Priced = serde_json::from_str(r#"{"price":"12.50","sale_price":""}"#).unwrap();
        assert_eq!(p.price.cents(), 1250);
        assert_eq!(p.sale_price, None);

        let p: Priced = serde_json::from_str(r#"{"price":12,"sale_price":9.5}"#).unwrap();
        assert_eq!(p.price.cents(), 1200);
        assert_eq!(p.sale_price, Some(Money::from_cents(950)));

        let p: Priced = serde_json::from_str(r#"{"price":""}"#).unwrap();
        assert!(p.price.is_zero());
        assert_eq!(p.sale_price, None);
    }

    #[test]
    fn test_decimal_codec_serializes_strings() {
        let p = Priced {
            price: Money::from_cents(115_000),
            sale_price: None,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"price":"1150.00","sale_price":null}"#);
    }

    #[test]
    fn test_decimal_codec_rejects_garbage() {
        assert!(serde_json::from_str::<Priced>(r#"{"price":"ten"}"#).is_err());
    }
}
