//! Persistence seam used by the checkout service.
//!
//! [`CheckoutStore`] is the narrow set of reads and writes checkout needs.
//! [`PgCheckoutStore`] implements it on top of the repositories; unit tests
//! use an in-memory implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use gogi_core::{AddressId, OrderId, OrderStatus, ProductId, UserId};

use super::{AddressRepository, CartRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::models::{Address, CartLine, NewOrder, Order, OrderDetails, Product};

pub use super::orders::CreateOrderError;

/// Storage operations required by checkout.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// All cart lines for a user, joined with their products.
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// A product by ID.
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// An address, only if it belongs to `user_id`.
    async fn address_for_user(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Atomically write an order with its items, clearing the cart when
    /// `order.consumes_cart` is set.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, CreateOrderError>;

    /// Change an order's status. `None` if the order doesn't exist.
    async fn set_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError>;

    /// An order with items and shipping address.
    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError>;

    /// The order created for a payment provider transaction, if any.
    async fn order_by_payment_uid(&self, imp_uid: &str) -> Result<Option<Order>, RepositoryError>;

    /// A user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetails>, RepositoryError>;
}

/// `PostgreSQL` implementation of [`CheckoutStore`].
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    /// Create a store backed by `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutStore for PgCheckoutStore {
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        CartRepository::new(&self.pool).lines_for_user(user_id).await
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_id(id).await
    }

    async fn address_for_user(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        AddressRepository::new(&self.pool)
            .get_for_user(user_id, id)
            .await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, CreateOrderError> {
        OrderRepository::new(&self.pool).create(order).await
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).set_status(id, status).await
    }

    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        OrderRepository::new(&self.pool).get_details(id).await
    }

    async fn order_by_payment_uid(&self, imp_uid: &str) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .find_by_payment_uid(imp_uid)
            .await
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetails>, RepositoryError> {
        OrderRepository::new(&self.pool).list_for_user(user_id).await
    }
}
