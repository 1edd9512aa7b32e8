//! # Repository Module
//!
//! Database repository implementations for Codemart.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartStore / SessionStore                                              │
//! │       │                                                                 │
//! │       │  db.snapshots().put("cart", &cart)                             │
//! │       ▼                                                                 │
//! │  SnapshotRepository                                                    │
//! │  ├── get(&self, key)                                                   │
//! │  ├── put(&self, key, value)                                            │
//! │  └── delete(&self, key)                                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  local_state                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`snapshot::SnapshotRepository`] - Whole-value JSON snapshots by key

pub mod snapshot;
