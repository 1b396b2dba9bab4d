//! Marketplace users.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gogi_core::{Email, UserId, UserRole};

/// A user signed in through one or more social login providers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Option<Email>,
    pub name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
