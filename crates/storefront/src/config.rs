//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used for OAuth redirects)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_ADMIN_EMAILS` - Comma-separated emails promoted to ADMIN on sign-in
//! - `IAMPORT_API_KEY` / `IAMPORT_API_SECRET` - Payment verification credentials
//! - `IAMPORT_API_BASE_URL` - Payment API base URL (default: <https://api.iamport.kr>)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - Google login
//! - `NAVER_CLIENT_ID` / `NAVER_CLIENT_SECRET` - Naver login
//! - `KAKAO_CLIENT_ID` / `KAKAO_CLIENT_SECRET` - Kakao login
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use gogi_core::Email;
use secrecy::SecretString;
use thiserror::Error;

use crate::services::auth::OAuthProvider;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_IAMPORT_BASE_URL: &str = "https://api.iamport.kr";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Emails that receive the ADMIN role when they sign in
    pub admin_emails: Vec<Email>,
    /// Payment verification settings
    pub iamport: IamportConfig,
    /// Social login providers that have credentials configured
    pub oauth: Vec<OAuthProviderConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Iamport payment verification settings.
///
/// Credentials are optional so the storefront can run without payments; the
/// verifier reports a configuration error on use when they are absent.
#[derive(Clone)]
pub struct IamportConfig {
    /// REST API base URL
    pub base_url: String,
    /// API key/secret pair
    pub credentials: Option<IamportCredentials>,
}

/// Iamport REST API credentials.
#[derive(Clone)]
pub struct IamportCredentials {
    /// `imp_key`
    pub api_key: String,
    /// `imp_secret`
    pub api_secret: SecretString,
}

impl std::fmt::Debug for IamportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamportConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &self.credentials.as_ref().map(|c| c.api_key.as_str()),
            )
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// OAuth client registration for one social login provider.
#[derive(Clone)]
pub struct OAuthProviderConfig {
    pub provider: OAuthProvider,
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for OAuthProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthProviderConfig")
            .field("provider", &self.provider)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if a provided secret fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let admin_emails = parse_admin_emails(
            "STOREFRONT_ADMIN_EMAILS",
            &get_env_or_default("STOREFRONT_ADMIN_EMAILS", ""),
        )?;

        let iamport = IamportConfig::from_env()?;
        let oauth = OAuthProvider::ALL
            .iter()
            .filter_map(|&provider| OAuthProviderConfig::from_env(provider).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin_emails,
            iamport,
            oauth,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the OAuth registration for a provider, if it is enabled.
    #[must_use]
    pub fn oauth_provider(&self, provider: OAuthProvider) -> Option<&OAuthProviderConfig> {
        self.oauth.iter().find(|p| p.provider == provider)
    }
}

impl IamportConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_env_or_default("IAMPORT_API_BASE_URL", DEFAULT_IAMPORT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let credentials = match (
            get_optional_env("IAMPORT_API_KEY"),
            get_optional_env("IAMPORT_API_SECRET"),
        ) {
            (Some(api_key), Some(_)) => Some(IamportCredentials {
                api_key,
                api_secret: get_validated_secret("IAMPORT_API_SECRET")?,
            }),
            (None, None) => {
                tracing::warn!(
                    "IAMPORT_API_KEY and IAMPORT_API_SECRET are not set; payment verification will fail"
                );
                None
            }
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("IAMPORT_API_SECRET".to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("IAMPORT_API_KEY".to_string()));
            }
        };

        Ok(Self {
            base_url,
            credentials,
        })
    }
}

impl OAuthProviderConfig {
    /// Returns `Ok(None)` when the provider has no client ID configured.
    fn from_env(provider: OAuthProvider) -> Result<Option<Self>, ConfigError> {
        let prefix = provider.env_prefix();
        let id_key = format!("{prefix}_CLIENT_ID");
        let secret_key = format!("{prefix}_CLIENT_SECRET");

        let Some(client_id) = get_optional_env(&id_key) else {
            return Ok(None);
        };
        let client_secret = get_validated_secret(&secret_key)?;

        Ok(Some(Self {
            provider,
            client_id,
            client_secret,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a sampling rate in `[0, 1]`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0 and 1".to_string(),
        ));
    }
    Ok(rate)
}

/// Parse the comma-separated admin allow-list.
fn parse_admin_emails(key: &str, raw: &str) -> Result<Vec<Email>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Email::parse(s).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-iamport-secret", "IAMPORT_API_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "IAMPORT_API_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_admin_emails() {
        let emails =
            parse_admin_emails("STOREFRONT_ADMIN_EMAILS", " owner@gogi.kr, ,ops@gogi.kr").unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[1].as_str(), "ops@gogi.kr");

        assert!(parse_admin_emails("STOREFRONT_ADMIN_EMAILS", "").unwrap().is_empty());
        assert!(matches!(
            parse_admin_emails("STOREFRONT_ADMIN_EMAILS", "not-an-email"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_iamport_config_debug_redacts_secret() {
        let config = IamportConfig {
            base_url: DEFAULT_IAMPORT_BASE_URL.to_string(),
            credentials: Some(IamportCredentials {
                api_key: "imp_key_value".to_string(),
                api_secret: SecretString::from("super_secret_imp_secret"),
            }),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("imp_key_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_imp_secret"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/gogi"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            admin_emails: Vec::new(),
            iamport: IamportConfig {
                base_url: DEFAULT_IAMPORT_BASE_URL.to_string(),
                credentials: None,
            },
            oauth: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(config.oauth_provider(OAuthProvider::Kakao).is_none());
    }
}
