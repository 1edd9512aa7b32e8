//! # Codemart CLI Library
//!
//! Wires configuration, local storage and the gateway client into the
//! stores, then runs one command against them.
//!
//! ## Module Organization
//! ```text
//! codemart_cli/
//! ├── lib.rs          ◄─── You are here (startup, AppContext, run)
//! ├── cli.rs          ◄─── clap definitions
//! ├── commands/       ◄─── One file per command group, text output
//! ├── state/
//! │   ├── cart.rs     ◄─── CartStore
//! │   ├── session.rs  ◄─── SessionStore
//! │   ├── bundle.rs   ◄─── BundleQuoter
//! │   ├── checkout.rs ◄─── Checkout, coupons, order lookups
//! │   ├── catalog.rs  ◄─── Catalog reads
//! │   └── config.rs   ◄─── AppConfig
//! └── error.rs        ◄─── CliError for command failures
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use codemart_db::{Database, DbConfig};
use codemart_gateway::{
    AccountGateway, BundleGateway, CatalogGateway, CouponGateway, GatewayClient, OrderGateway,
};

use cli::Cli;
use error::{CliError, CliResult, ErrorCode};
use state::{AppConfig, BundleQuoter, CartStore, Catalog, Checkout, SessionStore};

/// Everything a command can touch, built once per process.
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub cart: Arc<CartStore>,
    pub session: SessionStore,
    pub quoter: BundleQuoter,
    pub checkout: Checkout,
    pub catalog: Catalog,
    db: Database,
}

impl AppContext {
    /// Opens the local database and the gateway client described by `config`.
    ///
    /// ## Startup Sequence
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────────┐
    /// │  1. Resolve database path (storage.database_path or data directory)    │
    /// │  2. Connect to SQLite and run migrations                               │
    /// │  3. Build the gateway client (validates gateway.*)                     │
    /// │  4. Hydrate CartStore and SessionStore from their snapshots            │
    /// └─────────────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn open(config: AppConfig) -> CliResult<Self> {
        let path = config.database_path().ok_or_else(|| {
            CliError::new(
                ErrorCode::ConfigError,
                "No data directory available; set storage.database_path",
            )
        })?;
        info!(?path, "Opening local state");

        let db = Database::new(DbConfig::new(path)).await?;
        let gateway = Arc::new(GatewayClient::new(config.gateway.clone())?);

        Self::assemble(config, db, gateway).await
    }

    /// Builds the stores over an already opened database and any backend
    /// that implements every gateway seam.
    pub async fn assemble<G>(config: AppConfig, db: Database, gateway: Arc<G>) -> CliResult<Self>
    where
        G: CatalogGateway + CouponGateway + OrderGateway + AccountGateway + BundleGateway + 'static,
    {
        let policy = config.pricing_policy()?;

        let cart = Arc::new(CartStore::hydrate(db.snapshots()).await);
        let session = SessionStore::hydrate(gateway.clone(), db.snapshots()).await;
        let quoter = BundleQuoter::new(gateway.clone(), policy);
        let checkout = Checkout::new(cart.clone(), gateway.clone(), gateway.clone());
        let catalog = Catalog::new(gateway);

        debug!("Stores ready");
        Ok(AppContext {
            config,
            cart,
            session,
            quoter,
            checkout,
            catalog,
            db,
        })
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// Loads configuration, runs the parsed command and returns its output.
pub async fn run(cli: Cli) -> CliResult<String> {
    let config = AppConfig::load(cli.config)?;
    let ctx = AppContext::open(config).await?;

    let result = commands::dispatch(&ctx, cli.command).await;
    ctx.close().await;
    result
}

/// Installs the tracing subscriber. Logs go to stderr so command output on
/// stdout stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Everything at debug
/// - `RUST_LOG=codemart_gateway=trace` - One crate only
/// - Default: `info,codemart=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,codemart=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
