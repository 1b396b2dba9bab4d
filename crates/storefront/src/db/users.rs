//! User repository for database operations.
//!
//! Users are created on first social login and keyed by their
//! `(provider, provider_account_id)` pair in `storefront.oauth_account`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gogi_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: Option<String>,
    name: Option<String>,
    role: UserRole,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
        })
    }
}

/// Profile data reported by a login provider.
#[derive(Debug, Clone)]
pub struct OAuthIdentity<'a> {
    /// Provider name, e.g. `"kakao"`.
    pub provider: &'a str,
    /// Stable account id at the provider.
    pub account_id: &'a str,
    pub email: Option<&'a Email>,
    pub name: Option<&'a str>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, role, created_at
            FROM storefront."user"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Find the user linked to a provider account, creating both on first login.
    ///
    /// Email and name are refreshed from the provider on every login when the
    /// provider reports them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn upsert_from_oauth(
        &self,
        identity: &OAuthIdentity<'_>,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i32> = sqlx::query_scalar(
            r"
            SELECT user_id
            FROM storefront.oauth_account
            WHERE provider = $1 AND provider_account_id = $2
            FOR UPDATE
            ",
        )
        .bind(identity.provider)
        .bind(identity.account_id)
        .fetch_optional(&mut *tx)
        .await?;

        let email = identity.email.map(Email::as_str);

        let row = if let Some(user_id) = existing {
            sqlx::query_as::<_, UserRow>(
                r#"
                UPDATE storefront."user"
                SET email = COALESCE($2, email),
                    name = COALESCE($3, name),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING id, email, name, role, created_at
                "#,
            )
            .bind(user_id)
            .bind(email)
            .bind(identity.name)
            .fetch_one(&mut *tx)
            .await?
        } else {
            let row = sqlx::query_as::<_, UserRow>(
                r#"
                INSERT INTO storefront."user" (email, name)
                VALUES ($1, $2)
                RETURNING id, email, name, role, created_at
                "#,
            )
            .bind(email)
            .bind(identity.name)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r"
                INSERT INTO storefront.oauth_account (user_id, provider, provider_account_id)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(row.id)
            .bind(identity.provider)
            .bind(identity.account_id)
            .execute(&mut *tx)
            .await?;

            row
        };

        tx.commit().await?;
        User::try_from(row)
    }

    /// Set a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE storefront."user"
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, role, created_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Set the role of every user with a matching email (case-insensitive).
    ///
    /// Returns the updated users; empty when nobody has that email yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_role_by_email(
        &self,
        email: &Email,
        role: UserRole,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE storefront."user"
            SET role = $2, updated_at = NOW()
            WHERE LOWER(email) = LOWER($1)
            RETURNING id, email, name, role, created_at
            "#,
        )
        .bind(email.as_str())
        .bind(role)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// List all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, role, created_at
            FROM storefront."user"
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}
