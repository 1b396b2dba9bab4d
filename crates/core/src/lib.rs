//! Gogi Direct Core - Shared domain types.
//!
//! This crate provides the types shared by every Gogi Direct component:
//! - `storefront` - Public marketplace API (catalog, cart, checkout, orders)
//! - `cli` - Command-line tools for migrations, seeding and role assignment
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The optional `postgres` feature adds `sqlx` encoding
//! so the same types can be bound and decoded directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, amounts, quantities, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
