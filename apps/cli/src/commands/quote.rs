//! # Quote Command
//!
//! ```text
//! quote steam-wallet 25 --add
//!      │
//!      ▼
//! POST /calculateBundle ──► [$10, $10, $5] ──► price locally ──► print
//!                                                   │
//!                                          --add ───┴──► one cart line per
//!                                                        variation and share
//! ```

use codemart_core::{BundleCalculation, BundleKind};

use super::find_product;
use crate::cli::QuoteArgs;
use crate::error::{CliError, CliResult};
use crate::state::Quote;
use crate::AppContext;

pub async fn quote(ctx: &AppContext, args: QuoteArgs) -> CliResult<String> {
    let product = find_product(ctx, &args.product).await?;
    let currency = args
        .currency
        .unwrap_or_else(|| ctx.config.pricing.currency.clone());

    let calculation = match ctx.quoter.quote(product.id, args.amount, &currency).await? {
        Quote::Ready(calculation) => calculation,
        Quote::Superseded => {
            return Err(CliError::internal("Quote was superseded by a newer request"))
        }
    };

    let mut output = render_quote(&product.name, &calculation);
    if args.add {
        ctx.quoter
            .add_quote_to_cart(&ctx.cart, &product, &calculation)
            .await?;
        output.push_str(&format!(
            "\nAdded to cart. Cart total: {}",
            ctx.cart.cart_total().await
        ));
    }
    Ok(output)
}

fn render_quote(product_name: &str, calc: &BundleCalculation) -> String {
    let kind = match calc.kind {
        BundleKind::Single => "single card",
        BundleKind::Pair => "pair",
        BundleKind::Triple => "triple",
        BundleKind::Quad => "four or more cards",
    };

    let mut out = format!(
        "{product_name}: {} {} requested, {} {} selected ({kind})",
        calc.requested, calc.currency, calc.total_face_value, calc.currency
    );
    for selection in &calc.selections {
        out.push_str(&format!(
            "\n  {:<24} face {:>8}  price {:>10}",
            selection.variation.name, selection.face_value, selection.price
        ));
    }
    out.push_str(&format!(
        "\nCatalog total: {}\nBundle price:  {}\nYou save:      {}",
        calc.total_price, calc.final_price, calc.savings
    ));
    out
}
