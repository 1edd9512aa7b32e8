//! # Cart Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart add 42 --variation 11 --qty 2                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fetch product (with variations) ──► CartStore::add_to_cart            │
//! │                                           │                             │
//! │                                           ▼                             │
//! │  cart show ◄───────────── snapshot persisted in local_state            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use codemart_core::{Cart, CartKey};

use super::find_product;
use crate::cli::CartCommand;
use crate::error::{CliError, CliResult};
use crate::state::QuantityUpdate;
use crate::AppContext;

pub async fn run(ctx: &AppContext, command: CartCommand) -> CliResult<String> {
    match command {
        CartCommand::Show => Ok(render_cart(&ctx.cart.snapshot().await)),
        CartCommand::Add {
            product,
            variation,
            qty,
        } => add(ctx, &product, variation, qty).await,
        CartCommand::Remove { key } => {
            let key = CartKey::from(key);
            if ctx.cart.remove_from_cart(&key).await {
                Ok(format!("Removed {key}"))
            } else {
                Err(CliError::not_found("Cart line", key.as_str()))
            }
        }
        CartCommand::Qty { key, quantity } => {
            let key = CartKey::from(key);
            match ctx.cart.update_quantity(&key, quantity).await {
                QuantityUpdate::Updated => Ok(format!("{key} quantity set to {quantity}")),
                QuantityUpdate::Rejected(e) => Err(e.into()),
                QuantityUpdate::NotFound => Err(CliError::not_found("Cart line", key.as_str())),
            }
        }
        CartCommand::Clear => {
            ctx.cart.clear_cart().await;
            Ok("Cart cleared".to_string())
        }
    }
}

async fn add(ctx: &AppContext, input: &str, variation_id: Option<u64>, qty: i64) -> CliResult<String> {
    let product = find_product(ctx, input).await?;

    let variation = match variation_id {
        Some(id) => Some(
            product
                .variation(id)
                .ok_or_else(|| CliError::not_found("Variation", &id.to_string()))?,
        ),
        None => None,
    };
    debug!(product_id = product.id, ?variation_id, qty, "cart add command");

    let key = ctx.cart.add_to_cart(&product, qty, variation, None).await?;
    let count = ctx.cart.item_count().await;
    Ok(format!("Added {} x{} ({key}). Cart has {count} item(s).", product.name, qty))
}

/// Cart lines and totals as plain text.
pub(crate) fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut lines: Vec<String> = cart
        .lines()
        .iter()
        .map(|line| {
            let bundle = if line.custom_price.is_some() { " [bundle]" } else { "" };
            format!(
                "{:<28} {} x{} @ {} = {}{}",
                line.key().as_str(),
                line.display_name(),
                line.quantity,
                line.unit_price(),
                line.line_total(),
                bundle
            )
        })
        .collect();

    let totals = cart.totals();
    lines.push(format!(
        "Total: {} ({} item(s) in {} line(s))",
        totals.subtotal, totals.item_count, totals.line_count
    ));
    lines.join("\n")
}
