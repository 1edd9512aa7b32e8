//! # Commands Module
//!
//! One function per CLI command. Each takes the [`AppContext`] and its
//! parsed arguments and returns the text to print.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (dispatch, shared lookups)
//! ├── cart.rs     ◄─── cart show|add|remove|qty|clear
//! ├── account.rs  ◄─── login, register, logout, whoami, profile
//! ├── catalog.rs  ◄─── products, product, categories
//! ├── quote.rs    ◄─── quote [--add]
//! └── orders.rs   ◄─── coupon, checkout, track, orders
//! ```

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod quote;

use codemart_core::Product;
use codemart_gateway::ProductLookup;

use crate::cli::Command;
use crate::error::{CliError, CliResult};
use crate::AppContext;

/// Runs one command.
pub async fn dispatch(ctx: &AppContext, command: Command) -> CliResult<String> {
    match command {
        Command::Cart(cmd) => cart::run(ctx, cmd).await,
        Command::Login(args) => account::login(ctx, args).await,
        Command::Register(args) => account::register(ctx, args).await,
        Command::Logout => account::logout(ctx).await,
        Command::Whoami => account::whoami(ctx).await,
        Command::Profile(args) => account::profile(ctx, args).await,
        Command::Products(args) => catalog::products(ctx, args).await,
        Command::Product { product } => catalog::product(ctx, &product).await,
        Command::Categories => catalog::categories(ctx).await,
        Command::Quote(args) => quote::quote(ctx, args).await,
        Command::Coupon { code } => orders::coupon(ctx, &code).await,
        Command::Checkout(args) => orders::checkout(ctx, args).await,
        Command::Track(args) => orders::track(ctx, args).await,
        Command::Orders => orders::orders(ctx).await,
    }
}

/// Fetches a product with variations by id or slug.
pub(crate) async fn find_product(ctx: &AppContext, input: &str) -> CliResult<Product> {
    ctx.catalog
        .get_product(&ProductLookup::parse(input), true)
        .await
        .ok_or_else(|| CliError::not_found("Product", input))
}

// =============================================================================
// Unit Tests
// =============================================================================
