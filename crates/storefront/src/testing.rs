//! Shared fixtures for unit and route tests.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gogi_core::Email;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;

use crate::config::{IamportConfig, OAuthProviderConfig, StorefrontConfig};
use crate::db::memory::MemoryCheckoutStore;
use crate::iamport::{IamportError, Payment, PaymentStatus, PaymentVerifier};
use crate::services::CheckoutService;
use crate::services::auth::OAuthProvider;
use crate::state::AppState;

/// Payment verifier that answers every lookup with a canned result.
pub struct StubVerifier {
    outcome: Result<Payment, String>,
    calls: AtomicUsize,
}

impl StubVerifier {
    /// Answer with a payment in `status` for `amount` won.
    pub fn paying(status: &str, amount: f64) -> Self {
        Self {
            outcome: Ok(Payment {
                imp_uid: String::new(),
                merchant_uid: "merchant_1".to_string(),
                status: PaymentStatus::from(status.to_string()),
                amount,
                buyer_email: None,
                buyer_name: None,
                paid_at: None,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer with a provider error.
    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentVerifier for StubVerifier {
    async fn fetch_payment(&self, imp_uid: &str) -> Result<Payment, IamportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(payment) => Ok(Payment {
                imp_uid: imp_uid.to_string(),
                ..payment.clone()
            }),
            Err(message) => Err(IamportError::Provider(message.clone())),
        }
    }
}

/// Configuration for route tests: plain HTTP, no payment credentials, Kakao
/// login enabled, one admin email.
#[allow(clippy::unwrap_used)]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/gogi_test"),
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        admin_emails: vec![Email::parse("admin@gogi.kr").unwrap()],
        iamport: IamportConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            credentials: None,
        },
        oauth: vec![OAuthProviderConfig {
            provider: OAuthProvider::Kakao,
            client_id: "kakao-client".to_string(),
            client_secret: SecretString::from("kakao-secret"),
        }],
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Application state whose checkout runs against in-memory fakes.
///
/// The pool never connects; handlers that reach the database directly fail
/// with a 500, so route tests stop before that point.
#[allow(clippy::unwrap_used)]
pub fn test_state(store: Arc<MemoryCheckoutStore>, payments: Arc<StubVerifier>) -> AppState {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(100))
        .connect_lazy(config.database_url.expose_secret())
        .unwrap();
    let checkout = CheckoutService::new(store, payments);
    AppState::with_checkout(config, pool, checkout).unwrap()
}
