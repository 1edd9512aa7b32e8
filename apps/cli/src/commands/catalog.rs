//! Catalog commands.

use codemart_core::Product;
use codemart_gateway::ProductFilter;

use super::find_product;
use crate::cli::ProductsArgs;
use crate::error::CliResult;
use crate::AppContext;

pub async fn products(ctx: &AppContext, args: ProductsArgs) -> CliResult<String> {
    let mut filter = ProductFilter::default().page(args.page.unwrap_or(1), args.per_page);
    if let Some(category) = args.category {
        filter = filter.category(category);
    }
    if let Some(search) = args.search {
        filter = filter.search(search);
    }

    let products = ctx.catalog.list_products(filter).await?;
    if products.is_empty() {
        return Ok("No products found".to_string());
    }

    Ok(products.iter().map(summary).collect::<Vec<_>>().join("\n"))
}

pub async fn product(ctx: &AppContext, input: &str) -> CliResult<String> {
    let product = find_product(ctx, input).await?;

    let mut lines = vec![summary(&product)];
    lines.extend(product.variations.iter().map(|v| {
        let stock = if v.in_stock() { "" } else { " (out of stock)" };
        format!("  variation {:>6}  {:<24} {}{}", v.id, v.name, v.price, stock)
    }));
    Ok(lines.join("\n"))
}

pub async fn categories(ctx: &AppContext) -> CliResult<String> {
    let categories = ctx.catalog.list_categories().await;
    if categories.is_empty() {
        return Ok("No categories found".to_string());
    }

    Ok(categories
        .iter()
        .map(|c| format!("{:<24} {:<32} {} product(s)", c.slug, c.name, c.count))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn summary(product: &Product) -> String {
    let sale = if product.on_sale { " (on sale)" } else { "" };
    format!(
        "{:>6}  {:<32} {}{}",
        product.id,
        product.name,
        product.catalog_price(),
        sale
    )
}
