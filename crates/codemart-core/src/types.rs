//! # Domain Types
//!
//! Gateway-owned domain types used throughout Codemart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Variation     │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (u64)       │──►│  id (u64)       │   │  id (u64)       │       │
//! │  │  price          │   │  price          │   │  status         │       │
//! │  │  sale_price?    │   │  face_value?    │   │  line_items     │       │
//! │  │  variations     │   │  stock_status   │   │  guest_token?   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ExchangeRate   │   │     Coupon      │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  e4 (u64)       │   │  code, amount   │   │  id, email      │       │
//! │  │  110 = 1100000  │   │  discount_type  │   │  extra fields   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! Everything here except [`ExchangeRate`] is owned by the gateway. The client
//! reads these records and never mutates them, with one exception: the
//! session's [`User`] is shallow-merged by profile updates.
//!
//! Prices arrive as decimal strings and are decoded into [`Money`] through
//! [`crate::money::decimal`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{decimal, decimal_opt, Money};

// =============================================================================
// Exchange Rate
// =============================================================================

/// Conversion rate from face-value currency to shop currency.
///
/// ## Why Ten-Thousandths?
/// Rates like `110` or `132.75` must multiply money without floats.
/// 1 unit = 0.0001, so `110` is stored as `1_100_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExchangeRate(u64);

impl ExchangeRate {
    /// Scale factor between the stored value and one whole unit.
    pub const SCALE: u64 = 10_000;

    /// Creates a rate from a whole number (`110` → 110.0000).
    #[inline]
    pub const fn from_whole(rate: u64) -> Self {
        ExchangeRate(rate * Self::SCALE)
    }

    /// Creates a rate from ten-thousandths.
    #[inline]
    pub const fn from_e4(e4: u64) -> Self {
        ExchangeRate(e4)
    }

    /// Returns the rate in ten-thousandths.
    #[inline]
    pub const fn e4(&self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Parses `"110"`, `"132.75"` or `"0.0085"` (at most four fraction digits).
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError::required("exchange_rate"));
        }

        let invalid = || {
            ValidationError::invalid_format(
                "exchange_rate",
                format!("'{}' is not a non-negative decimal with at most 4 places", input),
            )
        };

        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if (whole.is_empty() && frac.is_empty())
            || frac.len() > 4
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_value: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_value: u64 = format!("{:0<4}", frac).parse().map_err(|_| invalid())?;

        whole_value
            .checked_mul(Self::SCALE)
            .and_then(|v| v.checked_add(frac_value))
            .map(ExchangeRate)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:04}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A category reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryRef {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// A category as listed by the gateway, with its product count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(default)]
    pub image: Option<ProductImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductImage {
    #[serde(default)]
    pub id: u64,
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// One purchasable denomination of a product (e.g. "$10 Steam Wallet").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Variation {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    /// Catalog price in shop currency.
    #[serde(default, with = "decimal")]
    #[ts(type = "string")]
    pub price: Money,

    /// Pre-discount price, when the gateway reports one.
    #[serde(default, with = "decimal_opt")]
    #[ts(type = "string | null")]
    pub regular_price: Option<Money>,

    #[serde(default = "default_stock_status")]
    pub stock_status: String,

    /// Nominal value in face-value currency. Falls back to the number in
    /// the name when absent (see [`Variation::denomination`]).
    #[serde(default, with = "decimal_opt")]
    #[ts(type = "string | null")]
    pub face_value: Option<Money>,
}

impl Variation {
    pub fn new(id: u64, name: impl Into<String>, price: Money) -> Self {
        Variation {
            id,
            name: name.into(),
            price,
            regular_price: None,
            stock_status: default_stock_status(),
            face_value: None,
        }
    }

    /// Sets an explicit face value.
    pub fn with_face_value(mut self, face_value: Money) -> Self {
        self.face_value = Some(face_value);
        self
    }

    /// Returns the face value, reading the first number in the name
    /// (`"$10 Steam Wallet"` → 10.00) when none was given.
    pub fn denomination(&self) -> Option<Money> {
        if self.face_value.is_some() {
            return self.face_value;
        }

        let start = self.name.find(|c: char| c.is_ascii_digit())?;
        let number: String = self.name[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .filter(|c| *c != ',')
            .collect();
        Money::parse_decimal(number.trim_end_matches('.')).ok()
    }

    pub fn in_stock(&self) -> bool {
        self.stock_status != "outofstock"
    }
}

/// A product as served by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: u64,

    pub name: String,

    #[serde(default)]
    pub slug: String,

    /// Current price (already the sale price when on sale, per gateway).
    #[serde(with = "decimal")]
    #[ts(type = "string")]
    pub price: Money,

    #[serde(default, with = "decimal_opt")]
    #[ts(type = "string | null")]
    pub regular_price: Option<Money>,

    #[serde(default, with = "decimal_opt")]
    #[ts(type = "string | null")]
    pub sale_price: Option<Money>,

    #[serde(default)]
    pub on_sale: bool,

    /// Expanded variations. The gateway sends bare ids unless asked to
    /// include variations; those entries are skipped.
    #[serde(default, deserialize_with = "variations_lenient")]
    pub variations: Vec<Variation>,

    #[serde(default)]
    pub categories: Vec<CategoryRef>,

    #[serde(default)]
    pub tags: Vec<CategoryRef>,

    #[serde(default = "default_stock_status")]
    pub stock_status: String,

    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl Product {
    /// Creates a simple product with no variations, for tests and fixtures.
    pub fn new(id: u64, name: impl Into<String>, price: Money) -> Self {
        Product {
            id,
            name: name.into(),
            slug: String::new(),
            price,
            regular_price: None,
            sale_price: None,
            on_sale: false,
            variations: Vec::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            stock_status: default_stock_status(),
            images: Vec::new(),
        }
    }

    /// Price a shopper pays for the product itself, ignoring variations.
    pub fn catalog_price(&self) -> Money {
        match (self.on_sale, self.sale_price) {
            (true, Some(sale)) => sale,
            _ => self.price,
        }
    }

    pub fn variation(&self, variation_id: u64) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == variation_id)
    }
}

fn default_stock_status() -> String {
    "instock".to_string()
}

fn variations_lenient<'de, D>(deserializer: D) -> Result<Vec<Variation>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .filter(Value::is_object)
        .map(|v| serde_json::from_value(v).map_err(serde::de::Error::custom))
        .collect()
}

// =============================================================================
// Identity
// =============================================================================

/// The authenticated shopper.
///
/// Fields the client does not model are kept in `extra`, so a profile
/// update can merge arbitrary keys and round-trip them through storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,

    #[serde(default)]
    pub username: String,

    pub email: String,

    #[serde(default, alias = "avatar")]
    pub avatar_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Shallow-merges `patch` into this user.
    ///
    /// Keys matching a known field replace it; everything else lands in
    /// `extra`. No canonical re-fetch happens, so a patch shaped differently
    /// from the session leaves stale fields behind.
    pub fn merge_profile(&mut self, patch: &Map<String, Value>) -> Result<(), serde_json::Error> {
        let mut merged = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            let key = if key == "avatar" { "avatar_url" } else { key.as_str() };
            merged.insert(key.to_string(), value.clone());
        }
        *self = serde_json::from_value(Value::Object(merged))?;
        Ok(())
    }

    /// First and last name joined, falling back to the username.
    pub fn display_name(&self) -> String {
        let field = |k: &str| self.extra.get(k).and_then(Value::as_str).unwrap_or("");
        let full = format!("{} {}", field("first_name"), field("last_name"));
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Account creation payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

// =============================================================================
// Coupons
// =============================================================================

/// How a coupon's `amount` is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscountType {
    /// `amount` is a percentage of the cart subtotal.
    Percent,
    /// `amount` is a fixed reduction of the cart subtotal.
    FixedCart,
    /// Anything else (e.g. `fixed_product`); applied by the gateway only.
    Other(String),
}

impl From<String> for DiscountType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "percent" => DiscountType::Percent,
            "fixed_cart" => DiscountType::FixedCart,
            _ => DiscountType::Other(s),
        }
    }
}

impl From<DiscountType> for String {
    fn from(d: DiscountType) -> Self {
        match d {
            DiscountType::Percent => "percent".to_string(),
            DiscountType::FixedCart => "fixed_cart".to_string(),
            DiscountType::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: u64,
    pub code: String,
    #[serde(with = "decimal")]
    pub amount: Money,
    pub discount_type: DiscountType,
}

// =============================================================================
// Orders
// =============================================================================

/// Billing details required at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Billing {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

/// A line of an order about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<u64>,
    pub quantity: i64,
    /// Line total, sent only when a custom (bundle) price applies.
    #[serde(default, with = "decimal_opt", skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
}

/// Order creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub billing: Billing,
    pub line_items: Vec<NewOrderLine>,
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub product_id: u64,
    #[serde(default)]
    pub variation_id: Option<u64>,
    pub quantity: i64,
    #[serde(default, with = "decimal")]
    pub total: Money,
}

/// An order as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default, with = "decimal")]
    pub total: Money,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
    #[serde(default)]
    pub billing: Option<Billing>,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub guest_token: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub customer_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNote {
    pub id: u64,
    pub note: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub customer_note: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
