//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Social login providers and sign-in role assignment
//! - `checkout` - Cart and direct orders, payment-verified checkout

pub mod auth;
pub mod checkout;

pub use checkout::{CheckoutError, CheckoutService};
