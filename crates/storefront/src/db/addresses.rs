//! Address book repository for database operations.
//!
//! Changing the default address locks all of the user's address rows, clears
//! the old default and sets the new one inside a single transaction. The
//! partial unique index `address_one_default_per_user` backs the same rule.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use gogi_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::Address;
use crate::models::address::{AddressUpdate, NewAddress};

/// Internal row type for `PostgreSQL` address queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: String,
    receiver_name: String,
    phone: String,
    postal_code: String,
    address1: String,
    address2: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            receiver_name: row.receiver_name,
            phone: row.phone,
            postal_code: row.postal_code,
            address1: row.address1,
            address2: row.address2,
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

pub(super) const ADDRESS_COLUMNS: &str = "id, user_id, label, receiver_name, phone, postal_code, \
     address1, address2, is_default, created_at";

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses: the default first, then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address \
             WHERE user_id = $1 \
             ORDER BY is_default DESC, created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get an address only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Create an address, making it the default if requested.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO storefront.address \
                 (user_id, label, receiver_name, phone, postal_code, address1, address2) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&address.label)
        .bind(&address.receiver_name)
        .bind(&address.phone)
        .bind(&address.postal_code)
        .bind(&address.address1)
        .bind(&address.address2)
        .fetch_one(&mut *tx)
        .await?;

        let row = if address.is_default {
            make_default(&mut tx, user_id, row.id).await?
        } else {
            row
        };

        tx.commit().await?;
        Ok(row.into())
    }

    /// Apply a partial update to one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        update: &AddressUpdate,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE storefront.address \
             SET label = COALESCE($3, label), \
                 receiver_name = COALESCE($4, receiver_name), \
                 phone = COALESCE($5, phone), \
                 postal_code = COALESCE($6, postal_code), \
                 address1 = COALESCE($7, address1), \
                 address2 = COALESCE($8, address2) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&update.label)
        .bind(&update.receiver_name)
        .bind(&update.phone)
        .bind(&update.postal_code)
        .bind(&update.address1)
        .bind(&update.address2)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let row = match update.is_default {
            Some(true) if !row.is_default => make_default(&mut tx, user_id, id).await?,
            Some(false) if row.is_default => {
                sqlx::query_as::<_, AddressRow>(&format!(
                    "UPDATE storefront.address SET is_default = FALSE \
                     WHERE id = $1 RETURNING {ADDRESS_COLUMNS}"
                ))
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
            }
            _ => row,
        };

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete one of the user's addresses. Deleting an absent address is not an error.
    ///
    /// Orders that shipped to it keep their row with no shipping address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// Make `id` the user's only default address.
async fn make_default(
    conn: &mut PgConnection,
    user_id: UserId,
    id: AddressId,
) -> Result<AddressRow, RepositoryError> {
    // Serializes concurrent default changes for the same user.
    sqlx::query("SELECT id FROM storefront.address WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "UPDATE storefront.address SET is_default = FALSE \
         WHERE user_id = $1 AND is_default AND id <> $2",
    )
    .bind(user_id)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, AddressRow>(&format!(
        "UPDATE storefront.address SET is_default = TRUE \
         WHERE id = $1 AND user_id = $2 RETURNING {ADDRESS_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(row)
}
