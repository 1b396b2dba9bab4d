//! Checkout error types.

use thiserror::Error;

use gogi_core::Won;

use crate::db::{CreateOrderError, RepositoryError};
use crate::iamport::{IamportError, PaymentStatus};

/// Errors that can occur while placing or updating an order.
///
/// Every variant leaves storage untouched: no order row, no cart change.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// The shipping address does not exist or belongs to someone else.
    #[error("invalid shipping address")]
    InvalidAddress,

    /// The product to order does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// The order does not exist or is not visible to the caller.
    #[error("order not found")]
    OrderNotFound,

    /// The provider reports a status other than paid.
    #[error("payment not completed (status: {0})")]
    PaymentNotCompleted(PaymentStatus),

    /// The verified amount differs from the order total.
    #[error("paid amount {paid} does not match order total {expected}")]
    AmountMismatch { paid: Won, expected: Won },

    /// The cart changed between pricing and writing the order.
    #[error("cart changed during checkout")]
    CartChanged,

    /// The payment is already attached to another user's order.
    #[error("payment already used")]
    PaymentAlreadyUsed,

    /// The payment provider could not be reached or rejected the lookup.
    #[error("payment verification failed: {0}")]
    Payment(#[from] IamportError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<CreateOrderError> for CheckoutError {
    fn from(err: CreateOrderError) -> Self {
        match err {
            CreateOrderError::CartChanged => Self::CartChanged,
            CreateOrderError::DuplicatePayment(_) => Self::PaymentAlreadyUsed,
            CreateOrderError::Repository(e) => Self::Repository(e),
        }
    }
}
