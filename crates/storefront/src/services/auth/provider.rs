//! Supported social login providers and their profile formats.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use gogi_core::Email;

use super::OAuthError;

/// A social login provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Naver,
    Kakao,
}

/// Provider endpoints for the authorization-code flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl OAuthProvider {
    /// Every supported provider.
    pub const ALL: [Self; 3] = [Self::Google, Self::Naver, Self::Kakao];

    /// Lowercase name used in routes and `oauth_account.provider`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Naver => "naver",
            Self::Kakao => "kakao",
        }
    }

    /// Prefix of the `{PREFIX}_CLIENT_ID` / `{PREFIX}_CLIENT_SECRET` variables.
    #[must_use]
    pub const fn env_prefix(&self) -> &'static str {
        match self {
            Self::Google => "GOOGLE",
            Self::Naver => "NAVER",
            Self::Kakao => "KAKAO",
        }
    }

    /// Scopes requested at authorization time.
    #[must_use]
    pub const fn scope(&self) -> &'static str {
        match self {
            Self::Google => "openid email profile",
            Self::Naver => "",
            Self::Kakao => "profile_nickname account_email",
        }
    }

    /// Production endpoints.
    #[must_use]
    pub fn endpoints(&self) -> OAuthEndpoints {
        let (authorize, token, userinfo) = match self {
            Self::Google => (
                "https://accounts.google.com/o/oauth2/v2/auth",
                "https://oauth2.googleapis.com/token",
                "https://openidconnect.googleapis.com/v1/userinfo",
            ),
            Self::Naver => (
                "https://nid.naver.com/oauth2.0/authorize",
                "https://nid.naver.com/oauth2.0/token",
                "https://openapi.naver.com/v1/nid/me",
            ),
            Self::Kakao => (
                "https://kauth.kakao.com/oauth/authorize",
                "https://kauth.kakao.com/oauth/token",
                "https://kapi.kakao.com/v2/user/me",
            ),
        };
        OAuthEndpoints {
            authorize_url: authorize.to_owned(),
            token_url: token.to_owned(),
            userinfo_url: userinfo.to_owned(),
        }
    }

    /// Extract the account id, email and name from a userinfo response.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Profile` if the response lacks an account id.
    pub fn parse_profile(&self, body: &serde_json::Value) -> Result<OAuthProfile, OAuthError> {
        let (account_id, email, name) = match self {
            Self::Google => (
                body.get("sub").and_then(json_id),
                str_at(body, &["email"]),
                str_at(body, &["name"]),
            ),
            Self::Naver => {
                let response = body.get("response").unwrap_or(&serde_json::Value::Null);
                (
                    response.get("id").and_then(json_id),
                    str_at(response, &["email"]),
                    str_at(response, &["name"]).or_else(|| str_at(response, &["nickname"])),
                )
            }
            Self::Kakao => (
                body.get("id").and_then(json_id),
                str_at(body, &["kakao_account", "email"]),
                str_at(body, &["kakao_account", "profile", "nickname"])
                    .or_else(|| str_at(body, &["properties", "nickname"])),
            ),
        };

        let account_id = account_id
            .ok_or_else(|| OAuthError::Profile(format!("{self} profile has no account id")))?;

        let email = email.and_then(|raw| match Email::parse(&raw) {
            Ok(email) => Some(email),
            Err(e) => {
                tracing::warn!(provider = %self, error = %e, "Ignoring invalid email from provider");
                None
            }
        });

        Ok(OAuthProfile {
            provider: *self,
            account_id,
            email,
            name,
        })
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OAuthError::UnknownProvider(s.to_owned()))
    }
}

/// Identity returned by a provider after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider: OAuthProvider,
    pub account_id: String,
    pub email: Option<Email>,
    pub name: Option<String>,
}

/// Provider ids arrive as strings (Google, Naver) or numbers (Kakao).
fn json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn str_at(value: &serde_json::Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
