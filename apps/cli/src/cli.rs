//! Command line definition.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use codemart_core::Money;

#[derive(Debug, Parser)]
#[command(name = "codemart", version, about = "Codemart storefront client")]
pub struct Cli {
    /// Config file (defaults to codemart.toml in the platform config directory)
    #[arg(long, global = true, env = "CODEMART_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show or change the cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Sign in
    Login(LoginArgs),

    /// Create an account and sign in
    Register(RegisterArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Update profile fields of the signed-in user
    Profile(ProfileArgs),

    /// List products
    Products(ProductsArgs),

    /// Show one product with its variations
    Product {
        /// Product id or slug
        product: String,
    },

    /// List categories
    Categories,

    /// Price a bundle of denominations covering an amount
    Quote(QuoteArgs),

    /// Preview a coupon against the cart
    Coupon { code: String },

    /// Place an order for the cart
    Checkout(CheckoutArgs),

    /// Look up an order
    Track(TrackArgs),

    /// List the signed-in user's orders
    Orders,
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Print cart lines and totals
    Show,

    /// Add a product
    Add {
        /// Product id or slug
        product: String,

        #[arg(long)]
        variation: Option<u64>,

        #[arg(long, default_value_t = 1)]
        qty: i64,
    },

    /// Remove a line by key
    Remove { key: String },

    /// Set a line's quantity
    Qty { key: String, quantity: i64 },

    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "CODEMART_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub username: String,

    #[arg(long, env = "CODEMART_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Field to change, as key=value (repeatable)
    #[arg(long = "set", value_parser = parse_key_value, required = true)]
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct ProductsArgs {
    /// Category slug
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, default_value_t = 20)]
    pub per_page: u32,
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Product id or slug
    pub product: String,

    /// Face value to cover
    #[arg(value_parser = parse_money)]
    pub amount: Money,

    /// Face-value currency (defaults to pricing.currency)
    #[arg(long)]
    pub currency: Option<String>,

    /// Add the priced bundle to the cart
    #[arg(long)]
    pub add: bool,
}

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub country: String,

    #[arg(long, default_value = "cod")]
    pub payment_method: String,

    #[arg(long)]
    pub coupon: Option<String>,
}

#[derive(Debug, Args)]
pub struct TrackArgs {
    pub order_id: u64,

    /// Billing email, for guest orders
    #[arg(long)]
    pub email: Option<String>,

    /// Guest token printed at checkout
    #[arg(long)]
    pub token: Option<String>,

    /// Also print order notes
    #[arg(long)]
    pub notes: bool,
}

fn parse_money(s: &str) -> Result<Money, String> {
    Money::parse_decimal(s).map_err(|e| e.to_string())
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quote() {
        let cli = Cli::try_parse_from(["codemart", "quote", "steam-wallet", "25", "--add"]).unwrap();
        match cli.command {
            Command::Quote(args) => {
                assert_eq!(args.product, "steam-wallet");
                assert_eq!(args.amount, Money::from_major(25));
                assert!(args.add);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_cart_add() {
        let cli = Cli::try_parse_from(["codemart", "cart", "add", "42", "--variation", "11", "--qty", "2"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Cart(CartCommand::Add { variation: Some(11), qty: 2, .. })
        ));
    }

    #[test]
    fn test_profile_fields() {
        let cli = Cli::try_parse_from(["codemart", "profile", "--set", "nickname=ada", "--set", "city=London"])
            .unwrap();
        match cli.command {
            Command::Profile(args) => assert_eq!(
                args.fields,
                vec![
                    ("nickname".to_string(), "ada".to_string()),
                    ("city".to_string(), "London".to_string())
                ]
            ),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["codemart", "profile", "--set", "novalue"]).is_err());
    }
}
