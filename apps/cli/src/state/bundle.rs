//! # Bundle Quoter
//!
//! Asks the gateway which denominations cover a target amount, prices the
//! selection locally and turns the result into cart lines.
//!
//! ## Superseded Quotes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quote(25) ── ticket 1 ──► gateway ·········· slow ··········► result  │
//! │  quote(30) ── ticket 2 ──► gateway ──► result                          │
//! │                                                                         │
//! │  ticket 2 is current when it resolves  ──► Quote::Ready                │
//! │  ticket 1 resolves after ticket 2 was issued ──► Quote::Superseded     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A superseded result never reaches the caller's state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use codemart_core::pricing::calculate_bundle_price;
use codemart_core::validation::validate_target_amount;
use codemart_core::{
    BundleCalculation, CartKey, CoreError, Money, PricingPolicy, Product, ValidationError,
};
use codemart_gateway::{BundleGateway, GatewayError};

use super::cart::CartStore;

pub type QuoteResult<T> = Result<T, QuoteError>;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pricing(#[from] CoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A selected variation does not belong to the product being added.
    #[error("Variation {variation_id} is not part of product {product_id}")]
    UnknownVariation { product_id: u64, variation_id: u64 },
}

/// Result of a quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quote {
    Ready(BundleCalculation),
    /// A newer request was issued while this one was in flight.
    Superseded,
}

pub struct BundleQuoter {
    gateway: Arc<dyn BundleGateway>,
    policy: PricingPolicy,
    generation: AtomicU64,
}

impl std::fmt::Debug for BundleQuoter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleQuoter")
            .field("policy", &self.policy)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl BundleQuoter {
    pub fn new(gateway: Arc<dyn BundleGateway>, policy: PricingPolicy) -> Self {
        BundleQuoter {
            gateway,
            policy,
            generation: AtomicU64::new(0),
        }
    }

    /// Quotes a bundle covering `target` face value.
    ///
    /// ## Errors
    /// - Validation: `target` not positive
    /// - Gateway: the backend failed or rejected the amount
    /// - Pricing: empty selection or a selection short of `target`
    pub async fn quote(&self, product_id: u64, target: Money, currency: &str) -> QuoteResult<Quote> {
        validate_target_amount(target)?;

        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(product_id, target = %target, ticket, "Requesting bundle");

        let result = self.gateway.calculate_bundle(product_id, target, currency).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Discarding superseded bundle quote");
            return Ok(Quote::Superseded);
        }

        let offer = result?;
        let items = offer.bundle_items()?;
        let total_face_value = items.iter().map(|i| i.face_value).sum();

        let calculation = calculate_bundle_price(
            &items,
            total_face_value,
            target,
            offer.currency.as_deref().unwrap_or(currency),
            offer.exchange_rate(),
            offer.profit_margin,
            &self.policy,
        )?;

        debug!(
            final_price = %calculation.final_price,
            savings = %calculation.savings,
            kind = ?calculation.kind,
            "Bundle priced"
        );
        Ok(Quote::Ready(calculation))
    }

    /// Adds a priced bundle to the cart.
    ///
    /// Each selected variation becomes a line whose custom price is its
    /// share of the bundle price, so the cart total equals the bundle price.
    /// Every variation is resolved before the cart is touched; a bundle is
    /// added whole or not at all.
    pub async fn add_quote_to_cart(
        &self,
        cart: &CartStore,
        product: &Product,
        calculation: &BundleCalculation,
    ) -> QuoteResult<Vec<CartKey>> {
        let lines = calculation
            .selections
            .iter()
            .map(|selection| {
                let variation = match product.variation(selection.variation.id) {
                    Some(variation) => variation,
                    None if product.variations.is_empty() => &selection.variation,
                    None => {
                        return Err(QuoteError::UnknownVariation {
                            product_id: product.id,
                            variation_id: selection.variation.id,
                        })
                    }
                };
                Ok((variation, selection.price))
            })
            .collect::<QuoteResult<Vec<_>>>()?;

        Ok(cart.add_bundle_lines(product, &lines).await?)
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
