//! Social login and sign-in role assignment.
//!
//! # OAuth Flow
//!
//! 1. `GET /auth/{provider}/login` stores a random `state` in the session and
//!    redirects to [`OAuthClient::authorization_url`]
//! 2. The provider redirects back to `/auth/{provider}/callback` with a code
//! 3. [`OAuthClient::exchange_code`] trades the code for an access token
//! 4. [`OAuthClient::fetch_profile`] reads the account id, email and name
//! 5. [`sign_in`] links the identity to a local user and applies the admin
//!    allow-list

mod client;
mod provider;

pub use client::OAuthClient;
pub use provider::{OAuthEndpoints, OAuthProfile, OAuthProvider};

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use gogi_core::{Email, UserRole};

use crate::db::RepositoryError;
use crate::db::users::{OAuthIdentity, UserRepository};
use crate::models::User;

/// Errors that can occur during social login.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Route names a provider that does not exist.
    #[error("unknown login provider: {0}")]
    UnknownProvider(String),

    /// Provider exists but has no credentials configured.
    #[error("login provider {0} is not configured")]
    NotConfigured(OAuthProvider),

    /// Callback `state` is missing or does not match the session.
    #[error("login state mismatch")]
    StateMismatch,

    /// Provider redirected back with an error instead of a code.
    #[error("login was denied: {0}")]
    Denied(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token endpoint rejected the authorization code.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Userinfo endpoint failed or returned an unusable profile.
    #[error("profile lookup failed: {0}")]
    Profile(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Session state could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Emails that are promoted to ADMIN when they sign in.
///
/// Matching is case-insensitive. The list only ever promotes; demotion is a
/// seed-time operation (`gogi-cli admin revoke`) and lasts only if the email
/// is also removed from the list.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: Vec<Email>,
}

impl AdminAllowList {
    /// Create an allow-list from configured emails.
    #[must_use]
    pub const fn new(emails: Vec<Email>) -> Self {
        Self { emails }
    }

    /// Whether `email` is on the list.
    #[must_use]
    pub fn contains(&self, email: &Email) -> bool {
        self.emails.iter().any(|e| e.eq_ignore_case(email))
    }

    /// The role a user should end up with after signing in.
    #[must_use]
    pub fn role_on_sign_in(&self, current: UserRole, email: Option<&Email>) -> UserRole {
        match email {
            Some(email) if self.contains(email) => UserRole::Admin,
            _ => current,
        }
    }
}

/// Link a provider identity to a local user, creating it on first login, and
/// apply the admin allow-list.
///
/// # Errors
///
/// Returns `OAuthError::Repository` if a database operation fails.
pub async fn sign_in(
    pool: &PgPool,
    admins: &AdminAllowList,
    profile: &OAuthProfile,
) -> Result<User, OAuthError> {
    let users = UserRepository::new(pool);
    let user = users
        .upsert_from_oauth(&OAuthIdentity {
            provider: profile.provider.as_str(),
            account_id: &profile.account_id,
            email: profile.email.as_ref(),
            name: profile.name.as_deref(),
        })
        .await?;

    let role = admins.role_on_sign_in(user.role, user.email.as_ref());
    if role == user.role {
        return Ok(user);
    }

    info!(user_id = %user.id, "Promoting allow-listed user to ADMIN");
    Ok(users.set_role(user.id, role).await?)
}
