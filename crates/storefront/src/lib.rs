//! Gogi Direct storefront library.
//!
//! The marketplace JSON API: social login, catalog, cart, address book,
//! orders and payment-verified checkout. Built as a library so the server
//! binary, the CLI and the integration tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod iamport;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
