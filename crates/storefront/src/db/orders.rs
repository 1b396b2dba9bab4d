//! Order repository for database operations.
//!
//! Order creation is the one multi-table write in the storefront: the order
//! header, its items and (for cart checkouts) the cart clear commit together
//! or not at all.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use gogi_core::{AddressId, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, UserId, Won};

use super::addresses::{ADDRESS_COLUMNS, AddressRow};
use super::{RepositoryError, is_unique_violation};
use crate::models::{Address, NewOrder, Order, OrderDetails, OrderItem};

/// Reasons an order could not be written.
#[derive(Debug, Error)]
pub enum CreateOrderError {
    /// The cart no longer matches the lines the order was priced from.
    #[error("cart changed since it was read")]
    CartChanged,

    /// Another order already carries this payment id.
    #[error("payment {0} is already attached to an order")]
    DuplicatePayment(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CreateOrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    total_amount: Won,
    shipping_address_id: Option<AddressId>,
    payment_uid: Option<String>,
    merchant_uid: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            total_amount: row.total_amount,
            shipping_address_id: row.shipping_address_id,
            payment_uid: row.payment_uid,
            merchant_uid: row.merchant_uid,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    product_name: Option<String>,
    quantity: Quantity,
    price: Won,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartSnapshotRow {
    product_id: ProductId,
    quantity: Quantity,
}

const ORDER_COLUMNS: &str = "id, user_id, status, total_amount, shipping_address_id, \
     payment_uid, merchant_uid, created_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Write an order and its items in a single transaction.
    ///
    /// When `order.consumes_cart` is set, the user's cart rows are locked and
    /// must match `order.items` exactly; they are deleted before commit.
    ///
    /// # Errors
    ///
    /// Returns `CreateOrderError::CartChanged` if the cart no longer matches.
    /// Returns `CreateOrderError::DuplicatePayment` if the payment id is taken.
    /// Returns `CreateOrderError::Repository` for other database errors.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, CreateOrderError> {
        let mut tx = self.pool.begin().await?;

        if order.consumes_cart {
            let locked = sqlx::query_as::<_, CartSnapshotRow>(
                r"
                SELECT product_id, quantity
                FROM storefront.cart_item
                WHERE user_id = $1
                ORDER BY product_id
                FOR UPDATE
                ",
            )
            .bind(order.user_id)
            .fetch_all(&mut *tx)
            .await?;

            let mut expected: Vec<(ProductId, Quantity)> = order
                .items
                .iter()
                .map(|item| (item.product_id, item.quantity))
                .collect();
            expected.sort_unstable();
            let current: Vec<(ProductId, Quantity)> = locked
                .into_iter()
                .map(|row| (row.product_id, row.quantity))
                .collect();

            if current != expected {
                return Err(CreateOrderError::CartChanged);
            }
        }

        let payment_uid = order.payment.as_ref().map(|p| p.imp_uid.as_str());
        let merchant_uid = order
            .payment
            .as_ref()
            .and_then(|p| p.merchant_uid.as_deref());

        let inserted = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO storefront."order"
                (user_id, status, total_amount, shipping_address_id, payment_uid, merchant_uid)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.user_id)
        .bind(&order.status)
        .bind(order.total_amount)
        .bind(order.shipping_address_id)
        .bind(payment_uid)
        .bind(merchant_uid)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => {
                return Err(CreateOrderError::DuplicatePayment(
                    payment_uid.unwrap_or_default().to_owned(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        if order.consumes_cart {
            sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
                .bind(order.user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(row.into())
    }

    /// Change an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE storefront."order"
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Find the order created for a payment provider transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_payment_uid(
        &self,
        payment_uid: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM storefront."order" WHERE payment_uid = $1"#
        ))
        .bind(payment_uid)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Get an order with its items and shipping address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM storefront."order" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_details(vec![row.into()]).await?.pop())
    }

    /// List a user's orders with items and addresses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM storefront."order"
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_details(rows.into_iter().map(Order::from).collect())
            .await
    }

    /// Load items and addresses for a batch of orders, preserving order.
    async fn attach_details(
        &self,
        orders: Vec<Order>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let address_ids: Vec<i32> = orders
            .iter()
            .filter_map(|o| o.shipping_address_id.map(|id| id.as_i32()))
            .collect();

        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
                   oi.quantity, oi.price
            FROM storefront.order_item oi
            LEFT JOIN storefront.product p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            ",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let address_rows = if address_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, AddressRow>(&format!(
                "SELECT {ADDRESS_COLUMNS} FROM storefront.address WHERE id = ANY($1)"
            ))
            .bind(&address_ids)
            .fetch_all(self.pool)
            .await?
        };

        let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let item = OrderItem::from(row);
            items.entry(item.order_id).or_default().push(item);
        }
        let addresses: HashMap<AddressId, Address> = address_rows
            .into_iter()
            .map(Address::from)
            .map(|a| (a.id, a))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| OrderDetails {
                items: items.remove(&order.id).unwrap_or_default(),
                shipping_address: order
                    .shipping_address_id
                    .and_then(|id| addresses.get(&id).cloned()),
                order,
            })
            .collect())
    }
}
