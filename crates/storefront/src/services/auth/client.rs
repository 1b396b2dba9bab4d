//! OAuth 2.0 authorization-code client for a single provider.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Deserialize;

use super::{OAuthEndpoints, OAuthError, OAuthProfile, OAuthProvider};
use crate::config::OAuthProviderConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Client for one social login provider.
#[derive(Clone)]
pub struct OAuthClient {
    inner: Arc<OAuthClientInner>,
}

struct OAuthClientInner {
    client: reqwest::Client,
    provider: OAuthProvider,
    endpoints: OAuthEndpoints,
    client_id: String,
    client_secret: String,
}

impl OAuthClient {
    /// Create a client using the provider's production endpoints.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Http` if the HTTP client cannot be built.
    pub fn new(config: &OAuthProviderConfig) -> Result<Self, OAuthError> {
        Self::with_endpoints(config, config.provider.endpoints())
    }

    /// Create a client against explicit endpoints.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Http` if the HTTP client cannot be built.
    pub fn with_endpoints(
        config: &OAuthProviderConfig,
        endpoints: OAuthEndpoints,
    ) -> Result<Self, OAuthError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(OAuthClientInner {
                client,
                provider: config.provider,
                endpoints,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.expose_secret().to_string(),
            }),
        })
    }

    /// The provider this client talks to.
    #[must_use]
    pub fn provider(&self) -> OAuthProvider {
        self.inner.provider
    }

    /// Build the URL that starts the login at the provider.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL to redirect to after authentication
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let mut url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&state={}",
            self.inner.endpoints.authorize_url,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        );
        let scope = self.inner.provider.scope();
        if !scope.is_empty() {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(scope));
        }
        url
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::TokenExchange` if the provider rejects the code.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
            // Naver requires the state echoed back; others ignore it.
            ("state", state),
        ];

        let response = self
            .inner
            .client
            .post(&self.inner.endpoints.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&text).map_err(|e| {
            OAuthError::TokenExchange(format!("unreadable token response (HTTP {status}): {e}"))
        })?;

        match token.access_token {
            Some(access_token) if status.is_success() => Ok(access_token),
            _ => Err(OAuthError::TokenExchange(
                token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| format!("HTTP {status}")),
            )),
        }
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Profile` if the request fails or lacks an account id.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<OAuthProfile, OAuthError> {
        let response = self
            .inner
            .client
            .get(&self.inner.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::Profile(format!(
                "userinfo request failed ({status}): {text}"
            )));
        }

        let body: serde_json::Value = response.json().await?;
        self.inner.provider.parse_profile(&body)
    }
}
