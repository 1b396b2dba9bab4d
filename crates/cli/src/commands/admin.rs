//! Administrator role management.
//!
//! Roles are otherwise assigned at sign-in from `STOREFRONT_ADMIN_EMAILS`.
//! These commands change the role of users that already exist.
//!
//! # Usage
//!
//! ```bash
//! gogi-cli admin grant -e seller@gogi.kr
//! gogi-cli admin revoke -e seller@gogi.kr
//! ```

use gogi_core::{Email, UserRole};
use gogi_storefront::db::UserRepository;
use thiserror::Error;

/// Errors that can occur during role changes.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Nobody with this email has signed in yet.
    #[error("No user with email {0}; they must sign in once first")]
    UserNotFound(String),
}

/// Set the role of every user whose email matches (case-insensitive).
///
/// # Errors
///
/// Returns an error if the email is invalid, no user matches, or the
/// database is unreachable.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool)
        .set_role_by_email(&email, role)
        .await?;

    if users.is_empty() {
        return Err(AdminError::UserNotFound(email.to_string()).into());
    }

    for user in &users {
        tracing::info!(user_id = %user.id, %email, %role, "Role updated");
    }
    tracing::warn!("Role changes apply to existing sessions at the next sign-in");
    Ok(())
}
