//! Cart repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gogi_core::{CartItemId, ProductId, Quantity, UserId, Won};

use super::RepositoryError;
use crate::models::{CartItem, CartLine, Product};

/// Cart row left-joined with its product. Product columns are all `NULL`
/// when the product is gone.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: Quantity,
    created_at: DateTime<Utc>,
    p_id: Option<ProductId>,
    p_name: Option<String>,
    p_description: Option<String>,
    p_price: Option<Won>,
    p_image_url: Option<String>,
    p_owner_id: Option<UserId>,
    p_created_at: Option<DateTime<Utc>>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let product = match (row.p_id, row.p_name, row.p_price, row.p_created_at) {
            (Some(id), Some(name), Some(price), Some(created_at)) => Some(Product {
                id,
                name,
                description: row.p_description,
                price,
                image_url: row.p_image_url,
                owner_id: row.p_owner_id,
                created_at,
            }),
            _ => None,
        };

        Self {
            item: CartItem {
                id: row.id,
                user_id: row.user_id,
                product_id: row.product_id,
                quantity: row.quantity,
                created_at: row.created_at,
            },
            product,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: Quantity,
    created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's cart with products, newest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.id, c.user_id, c.product_id, c.quantity, c.created_at,
                   p.id AS p_id, p.name AS p_name, p.description AS p_description,
                   p.price AS p_price, p.image_url AS p_image_url,
                   p.owner_id AS p_owner_id, p.created_at AS p_created_at
            FROM storefront.cart_item c
            LEFT JOIN storefront.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Insert or replace the quantity of a product in a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        // Selecting from product turns an unknown product into zero rows
        // instead of a foreign key error.
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO storefront.cart_item (user_id, product_id, quantity)
            SELECT $1, p.id, $3
            FROM storefront.product p
            WHERE p.id = $2
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            RETURNING id, user_id, product_id, quantity, created_at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Remove a product from a user's cart. Removing an absent line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
