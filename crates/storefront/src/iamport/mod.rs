//! Iamport payment verification.
//!
//! Verified checkout never trusts the browser's word that a payment went
//! through. The server looks the transaction up with the provider and
//! compares the reported amount with its own order total.
//!
//! # Flow
//!
//! 1. `POST {base}/users/getToken` with `{imp_key, imp_secret}` for an access token
//! 2. `GET {base}/payments/{imp_uid}` with the token in the `Authorization` header
//!
//! A fresh token is requested for every lookup and nothing is retried; a
//! failed lookup fails the checkout attempt.

mod client;
mod types;

pub use client::IamportClient;
pub use types::{Payment, PaymentStatus};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum IamportError {
    /// API key or secret is not configured.
    #[error("payment verification is not configured")]
    NotConfigured,

    /// HTTP request failed (connection, timeout, or body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-zero `code` or no `response`.
    #[error("payment provider error: {0}")]
    Provider(String),

    /// The response body was not the expected JSON envelope.
    #[error("unexpected response from payment provider: {0}")]
    UnexpectedResponse(String),
}

/// Looks up payment records by provider transaction id.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Fetch the payment record for `imp_uid`.
    async fn fetch_payment(&self, imp_uid: &str) -> Result<Payment, IamportError>;
}
