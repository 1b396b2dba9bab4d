//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::PgCheckoutStore;
use crate::iamport::{IamportClient, IamportError};
use crate::services::CheckoutService;
use crate::services::auth::{AdminAllowList, OAuthClient, OAuthError, OAuthProvider};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("payment client: {0}")]
    Payment(#[from] IamportError),
    #[error("login client: {0}")]
    OAuth(#[from] OAuthError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    checkout: CheckoutService,
    oauth: Vec<OAuthClient>,
    admins: AdminAllowList,
}

impl AppState {
    /// Create a new application state backed by `PostgreSQL` and the Iamport
    /// REST API.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let payments = IamportClient::new(&config.iamport)?;
        if !payments.is_configured() {
            tracing::warn!("Iamport credentials not set, verified checkout will be unavailable");
        }
        let store = PgCheckoutStore::new(pool.clone());
        let checkout = CheckoutService::new(Arc::new(store), Arc::new(payments));
        Self::with_checkout(config, pool, checkout)
    }

    /// Create an application state around an existing checkout service.
    ///
    /// # Errors
    ///
    /// Returns an error if an OAuth client cannot be built.
    pub fn with_checkout(
        config: StorefrontConfig,
        pool: PgPool,
        checkout: CheckoutService,
    ) -> Result<Self, StateError> {
        let oauth = config
            .oauth
            .iter()
            .map(OAuthClient::new)
            .collect::<Result<Vec<_>, _>>()?;
        let admins = AdminAllowList::new(config.admin_emails.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                checkout,
                oauth,
                admins,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Get the login client for a provider, if it is configured.
    #[must_use]
    pub fn oauth_client(&self, provider: OAuthProvider) -> Option<&OAuthClient> {
        self.inner.oauth.iter().find(|c| c.provider() == provider)
    }

    /// Get the admin allow-list applied at sign-in.
    #[must_use]
    pub fn admins(&self) -> &AdminAllowList {
        &self.inner.admins
    }
}
