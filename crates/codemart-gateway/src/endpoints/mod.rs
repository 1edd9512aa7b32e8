//! Endpoint modules: wire types plus the [`crate::api`] trait impls for
//! [`crate::GatewayClient`].

pub mod accounts;
pub mod bundle;
pub mod catalog;
pub mod coupons;
pub mod orders;
