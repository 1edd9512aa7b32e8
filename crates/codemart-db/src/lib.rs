//! # codemart-db: Durable Local Storage for Codemart
//!
//! This crate mirrors client-owned state (the cart and the session) to a
//! local SQLite database so it survives restarts.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Codemart Persistence Flow                          │
//! │                                                                         │
//! │  CartStore / SessionStore mutation                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   codemart-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │  SnapshotRepository│  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│  get / put / delete│  │ (embedded) │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   local_state (key, value, updated_at)                         │   │
//! │  │   ~/.local/share/codemart/codemart.db                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Snapshot repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codemart_db::{Database, DbConfig, CART_KEY};
//!
//! let db = Database::new(DbConfig::new("codemart.db")).await?;
//! db.snapshots().put(CART_KEY, &cart).await?;
//! let cart: Option<Cart> = db.snapshots().get(CART_KEY).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::snapshot::SnapshotRepository;

/// Storage key of the cart snapshot.
pub const CART_KEY: &str = "cart";

/// Storage key of the session snapshot.
pub const SESSION_KEY: &str = "session";
