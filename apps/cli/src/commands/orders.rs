//! Coupon, checkout and order lookup commands.

use codemart_core::{Billing, Order};
use codemart_gateway::OrderAccess;

use crate::cli::{CheckoutArgs, TrackArgs};
use crate::error::{CliError, CliResult, ErrorCode};
use crate::state::CheckoutRequest;
use crate::AppContext;

pub async fn coupon(ctx: &AppContext, code: &str) -> CliResult<String> {
    let preview = ctx.checkout.apply_coupon(code).await?;
    Ok(format!(
        "Coupon {}: subtotal {} - discount {} = {}",
        preview.code, preview.subtotal, preview.discount, preview.total
    ))
}

/// Places the order. Signed-in shoppers are attached as the customer.
pub async fn checkout(ctx: &AppContext, args: CheckoutArgs) -> CliResult<String> {
    let customer_id = ctx.session.current_user().await.map(|user| user.id);

    let request = CheckoutRequest {
        billing: Billing {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            country: args.country,
            ..Billing::default()
        },
        payment_method: args.payment_method,
        coupon_code: args.coupon,
        customer_id,
    };

    let receipt = ctx.checkout.checkout(request).await?;

    let mut lines = vec![format!("Order #{} placed", receipt.order_id)];
    if let Some(status) = receipt.status {
        lines.push(format!("Status: {status}"));
    }
    if let Some(url) = receipt.payment_url {
        lines.push(format!("Pay at: {url}"));
    }
    if let Some(token) = receipt.guest_token {
        lines.push(format!("Guest token: {token}"));
    }
    Ok(lines.join("\n"))
}

pub async fn track(ctx: &AppContext, args: TrackArgs) -> CliResult<String> {
    let access = OrderAccess {
        email: args.email,
        token: args.token,
    };
    let order = ctx.checkout.track_order(args.order_id, &access).await?;

    let mut lines = vec![order_line(&order)];
    lines.extend(
        order
            .line_items
            .iter()
            .map(|item| format!("  {} x{} = {}", item.name, item.quantity, item.total)),
    );

    if args.notes {
        let notes = ctx.checkout.order_notes(order.id).await;
        lines.extend(notes.iter().map(|note| format!("  note: {}", note.note)));
    }
    Ok(lines.join("\n"))
}

pub async fn orders(ctx: &AppContext) -> CliResult<String> {
    let user = ctx
        .session
        .current_user()
        .await
        .ok_or_else(|| CliError::new(ErrorCode::NotLoggedIn, "Not logged in"))?;

    let orders = ctx.checkout.customer_orders(user.id).await;
    if orders.is_empty() {
        return Ok("No orders found".to_string());
    }
    Ok(orders.iter().map(order_line).collect::<Vec<_>>().join("\n"))
}

fn order_line(order: &Order) -> String {
    let date = order.date_created.as_deref().unwrap_or("-");
    format!(
        "Order #{}  {}  {} {}  {}",
        order.id, order.status, order.total, order.currency, date
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CartCommand;
    use crate::commands::{cart, tests::context};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_coupon_preview() {
        let (ctx, _) = context().await;
        cart::run(
            &ctx,
            CartCommand::Add {
                product: "42".into(),
                variation: Some(12),
                qty: 1,
            },
        )
        .await
        .unwrap();

        let output = coupon(&ctx, "FLAT100").await.unwrap();
        assert_eq!(output, "Coupon flat100: subtotal 700.00 - discount 100.00 = 600.00");

        let err = coupon(&ctx, "bogus").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_track_with_notes() {
        let (ctx, _) = context().await;
        let output = track(
            &ctx,
            TrackArgs {
                order_id: 1001,
                email: Some("ada@example.com".into()),
                token: None,
                notes: true,
            },
        )
        .await
        .unwrap();
        assert!(output.starts_with("Order #1001  processing  1150.00 NPR"), "{output}");
        assert!(output.contains("note: Code delivered by email"), "{output}");
    }

    #[tokio::test]
    async fn test_orders_requires_login() {
        let (ctx, _) = context().await;
        let err = orders(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotLoggedIn);
    }
}
