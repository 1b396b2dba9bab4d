//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error is rendered as `{"message": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::iamport::IamportError;
use crate::services::CheckoutError;
use crate::services::auth::OAuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Checkout or order operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Social login failed.
    #[error("Login error: {0}")]
    OAuth(#[from] OAuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but may not perform the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::InvalidAddress
                | CheckoutError::PaymentNotCompleted(_)
                | CheckoutError::AmountMismatch { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::ProductNotFound | CheckoutError::OrderNotFound => {
                    StatusCode::NOT_FOUND
                }
                CheckoutError::CartChanged | CheckoutError::PaymentAlreadyUsed => {
                    StatusCode::CONFLICT
                }
                CheckoutError::Payment(IamportError::NotConfigured) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                CheckoutError::Payment(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::OAuth(err) => match err {
                OAuthError::UnknownProvider(_) | OAuthError::NotConfigured(_) => {
                    StatusCode::NOT_FOUND
                }
                OAuthError::StateMismatch | OAuthError::Denied(_) => StatusCode::BAD_REQUEST,
                OAuthError::Http(_) | OAuthError::TokenExchange(_) | OAuthError::Profile(_) => {
                    StatusCode::BAD_GATEWAY
                }
                OAuthError::Repository(_) | OAuthError::Session(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(_)) => "Already exists".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => "Your cart is empty".to_string(),
                CheckoutError::InvalidAddress => "Invalid shipping address".to_string(),
                CheckoutError::ProductNotFound => "Product not found".to_string(),
                CheckoutError::OrderNotFound => "Order not found".to_string(),
                CheckoutError::PaymentNotCompleted(_) => "Payment was not completed".to_string(),
                CheckoutError::AmountMismatch { .. } => {
                    "Paid amount does not match the order total".to_string()
                }
                CheckoutError::CartChanged => {
                    "Your cart changed during checkout, please try again".to_string()
                }
                CheckoutError::PaymentAlreadyUsed => {
                    "This payment has already been used".to_string()
                }
                CheckoutError::Payment(IamportError::NotConfigured) => {
                    "Payment verification is unavailable".to_string()
                }
                CheckoutError::Payment(_) => "Payment verification failed".to_string(),
                CheckoutError::Repository(RepositoryError::NotFound) => "Not found".to_string(),
                CheckoutError::Repository(_) => "Internal server error".to_string(),
            },
            Self::OAuth(err) => match err {
                OAuthError::UnknownProvider(_) | OAuthError::NotConfigured(_) => {
                    "Login provider not available".to_string()
                }
                OAuthError::StateMismatch => "Login session expired, please try again".to_string(),
                OAuthError::Denied(_) => "Login was cancelled".to_string(),
                OAuthError::Http(_) | OAuthError::TokenExchange(_) | OAuthError::Profile(_) => {
                    "Login provider error".to_string()
                }
                OAuthError::Repository(_) | OAuthError::Session(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server and upstream errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        let body = ErrorBody {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use gogi_core::Won;

    use super::*;
    use crate::iamport::PaymentStatus;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_error_status_codes() {
        let cases = [
            (CheckoutError::EmptyCart, StatusCode::BAD_REQUEST),
            (CheckoutError::InvalidAddress, StatusCode::BAD_REQUEST),
            (
                CheckoutError::PaymentNotCompleted(PaymentStatus::Failed),
                StatusCode::BAD_REQUEST,
            ),
            (
                CheckoutError::AmountMismatch {
                    paid: Won::new(14_999),
                    expected: Won::new(15_000),
                },
                StatusCode::BAD_REQUEST,
            ),
            (CheckoutError::ProductNotFound, StatusCode::NOT_FOUND),
            (CheckoutError::CartChanged, StatusCode::CONFLICT),
            (CheckoutError::PaymentAlreadyUsed, StatusCode::CONFLICT),
            (
                CheckoutError::Payment(IamportError::NotConfigured),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CheckoutError::Payment(IamportError::Provider("down".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("connection refused at 10.0.0.3".to_string());
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::from(CheckoutError::Payment(IamportError::Provider(
            "imp_secret rejected".to_string(),
        )));
        assert_eq!(err.public_message(), "Payment verification failed");
    }
}
