//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use gogi_core::{Email, UserId, UserRole};

use super::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user. The
/// role is captured at sign-in; a role change takes effect on the next login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Email reported by the login provider, if any.
    pub email: Option<Email>,
    /// Display name reported by the login provider, if any.
    pub name: Option<String>,
    /// Role at sign-in time.
    pub role: UserRole,
}

impl CurrentUser {
    /// Whether the user carries administrator rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the OAuth `state` value (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for the provider the pending OAuth flow was started with.
    pub const OAUTH_PROVIDER: &str = "oauth_provider";
}
