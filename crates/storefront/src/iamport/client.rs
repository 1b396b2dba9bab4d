//! Iamport REST API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{AccessToken, Envelope, Payment};
use super::{IamportError, PaymentVerifier};
use crate::config::{IamportConfig, IamportCredentials};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct TokenRequest<'a> {
    imp_key: &'a str,
    imp_secret: &'a str,
}

/// Client for the Iamport REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct IamportClient {
    inner: Arc<IamportClientInner>,
}

struct IamportClientInner {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<IamportCredentials>,
}

impl IamportClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `IamportError::Http` if the HTTP client cannot be built.
    pub fn new(config: &IamportConfig) -> Result<Self, IamportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(IamportClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                credentials: config.credentials.clone(),
            }),
        })
    }

    /// Whether API credentials are configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.credentials.is_some()
    }

    /// Exchange the API key and secret for an access token.
    async fn access_token(&self) -> Result<String, IamportError> {
        let credentials = self
            .inner
            .credentials
            .as_ref()
            .ok_or(IamportError::NotConfigured)?;

        let response = self
            .inner
            .client
            .post(format!("{}/users/getToken", self.inner.base_url))
            .json(&TokenRequest {
                imp_key: &credentials.api_key,
                imp_secret: credentials.api_secret.expose_secret(),
            })
            .send()
            .await?;

        let envelope: Envelope<AccessToken> = read_envelope(response).await?;
        Ok(envelope
            .into_result("failed to obtain payment provider access token")?
            .access_token)
    }
}

#[async_trait]
impl PaymentVerifier for IamportClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_payment(&self, imp_uid: &str) -> Result<Payment, IamportError> {
        let token = self.access_token().await?;

        let response = self
            .inner
            .client
            .get(format!(
                "{}/payments/{}",
                self.inner.base_url,
                urlencoding::encode(imp_uid)
            ))
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await?;

        let envelope: Envelope<Payment> = read_envelope(response).await?;
        let payment = envelope.into_result("failed to look up payment")?;

        tracing::info!(
            imp_uid = %payment.imp_uid,
            status = %payment.status,
            amount = payment.amount,
            "Fetched payment record"
        );
        Ok(payment)
    }
}

/// Decode an envelope regardless of HTTP status; the provider reports
/// failures through `code` and `message`.
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Envelope<T>, IamportError> {
    let status = response.status();
    let body = response.text().await?;

    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(%status, error = %e, "Payment provider returned an unreadable body");
        IamportError::UnexpectedResponse(format!("HTTP {status}: {e}"))
    })
}
