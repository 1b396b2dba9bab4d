//! Integration tests for Gogi Direct against a real `PostgreSQL`.
//!
//! # Running Tests
//!
//! ```bash
//! export GOGI_TEST_DATABASE_URL=postgres://localhost/gogi_test
//! cargo test -p gogi-integration-tests -- --ignored
//! ```
//!
//! Migrations are applied on connect. Every test creates its own users and
//! products with random identifiers, so tests can share one database.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use gogi_core::{ProductId, Won};
use gogi_storefront::db::users::OAuthIdentity;
use gogi_storefront::db::{PgCheckoutStore, ProductRepository, UserRepository};
use gogi_storefront::iamport::{IamportError, Payment, PaymentStatus, PaymentVerifier};
use gogi_storefront::models::User;
use gogi_storefront::models::product::NewProduct;
use gogi_storefront::services::CheckoutService;

/// Connect to the test database and apply migrations.
///
/// # Panics
///
/// Panics if `GOGI_TEST_DATABASE_URL` is unset or the database is unreachable.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("GOGI_TEST_DATABASE_URL")
        .unwrap_or_else(|_| panic!("GOGI_TEST_DATABASE_URL must be set"));
    let pool = PgPool::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to test database: {e}"));
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to run migrations: {e}"));
    pool
}

/// Create a user through the social login path.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn create_user(pool: &PgPool) -> User {
    let account_id = Uuid::new_v4().to_string();
    UserRepository::new(pool)
        .upsert_from_oauth(&OAuthIdentity {
            provider: "kakao",
            account_id: &account_id,
            email: None,
            name: Some("Integration Buyer"),
        })
        .await
        .unwrap_or_else(|e| panic!("Failed to create user: {e}"))
}

/// Create an ownerless product.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn create_product(pool: &PgPool, price: i64) -> ProductId {
    ProductRepository::new(pool)
        .create(
            None,
            &NewProduct {
                name: format!("Test cut {}", Uuid::new_v4()),
                description: None,
                price: Won::new(price),
                image_url: None,
            },
        )
        .await
        .unwrap_or_else(|e| panic!("Failed to create product: {e}"))
        .id
}

/// Payment verifier that reports every payment as paid for a fixed amount.
pub struct PaidVerifier {
    pub amount: f64,
}

#[async_trait]
impl PaymentVerifier for PaidVerifier {
    async fn fetch_payment(&self, imp_uid: &str) -> Result<Payment, IamportError> {
        Ok(Payment {
            imp_uid: imp_uid.to_owned(),
            merchant_uid: format!("merchant_{imp_uid}"),
            status: PaymentStatus::Paid,
            amount: self.amount,
            buyer_email: None,
            buyer_name: None,
            paid_at: None,
        })
    }
}

/// Checkout service backed by `PostgreSQL` and a [`PaidVerifier`].
#[must_use]
pub fn checkout_service(pool: &PgPool, paid_amount: f64) -> CheckoutService {
    CheckoutService::new(
        Arc::new(PgCheckoutStore::new(pool.clone())),
        Arc::new(PaidVerifier {
            amount: paid_amount,
        }),
    )
}

/// Random payment id for verified checkouts.
#[must_use]
pub fn random_imp_uid() -> String {
    format!("imp_{}", Uuid::new_v4().simple())
}
