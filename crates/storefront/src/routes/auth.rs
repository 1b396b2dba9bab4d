//! Social login route handlers.
//!
//! - Login: stores a random `state` in the session and redirects to the provider
//! - Callback: checks `state`, exchanges the code, signs the user in
//! - Logout: drops the session

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::{self as login, OAuthClient, OAuthError, OAuthProvider};
use crate::state::AppState;

/// Length of the CSRF `state` value.
const STATE_LENGTH: usize = 32;

/// Query parameters of the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Generate a random alphanumeric string.
fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn configured_client(state: &AppState, provider: &str) -> Result<(OAuthProvider, OAuthClient)> {
    let provider: OAuthProvider = provider.parse()?;
    let client = state
        .oauth_client(provider)
        .cloned()
        .ok_or(OAuthError::NotConfigured(provider))?;
    Ok((provider, client))
}

fn redirect_uri(state: &AppState, provider: OAuthProvider) -> String {
    format!("{}/auth/{provider}/callback", state.config().base_url)
}

/// `GET /auth/{provider}/login`
#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
) -> Result<Redirect> {
    let (provider, client) = configured_client(&state, &provider)?;

    let oauth_state = generate_random_string(STATE_LENGTH);
    session
        .insert(session_keys::OAUTH_STATE, &oauth_state)
        .await?;
    session
        .insert(session_keys::OAUTH_PROVIDER, provider)
        .await?;

    let url = client.authorization_url(&redirect_uri(&state, provider), &oauth_state);
    Ok(Redirect::to(&url))
}

/// `GET /auth/{provider}/callback`
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    let (provider, client) = configured_client(&state, &provider)?;

    // One-time use, whatever the outcome
    let stored_state: Option<String> = session.remove(session_keys::OAUTH_STATE).await?;
    let stored_provider: Option<OAuthProvider> =
        session.remove(session_keys::OAUTH_PROVIDER).await?;

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        warn!(%provider, %error, %description, "Provider denied login");
        return Err(OAuthError::Denied(error).into());
    }

    let state_matches = stored_provider == Some(provider)
        && stored_state.is_some()
        && stored_state == query.state;
    if !state_matches {
        warn!(%provider, "OAuth state mismatch");
        return Err(OAuthError::StateMismatch.into());
    }

    let Some(code) = query.code else {
        warn!(%provider, "OAuth callback missing code");
        return Err(OAuthError::Denied("missing authorization code".to_string()).into());
    };
    let oauth_state = stored_state.unwrap_or_default();

    let redirect_uri = redirect_uri(&state, provider);
    let access_token = client
        .exchange_code(&code, &redirect_uri, &oauth_state)
        .await?;
    let profile = client.fetch_profile(&access_token).await?;

    let user = login::sign_in(state.pool(), state.admins(), &profile).await?;
    set_current_user(&session, &CurrentUser::from(&user)).await?;

    info!(user_id = %user.id, %provider, role = %user.role, "User signed in");
    Ok(Redirect::to("/"))
}

/// `POST /auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/session`
pub async fn current_session(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_string() {
        let a = generate_random_string(STATE_LENGTH);
        let b = generate_random_string(STATE_LENGTH);
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
