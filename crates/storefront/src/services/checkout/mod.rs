//! Checkout: turning a cart or a single product into an order.
//!
//! One [`CheckoutService`] serves all three entry points:
//!
//! - direct order for one product ([`CheckoutService::create_direct_order`])
//! - cart order without payment verification ([`CheckoutService::create_cart_order`])
//! - cart order confirmed by the payment provider
//!   ([`CheckoutService::complete_verified_cart_order`])
//!
//! Cart orders are priced once by [`CheckoutService::load_cart_order_context`]
//! and written by [`CheckoutService::persist_order_from_context`]. The written
//! item prices are the ones captured in the context, never re-read.

mod error;

pub use error::CheckoutError;

use std::sync::Arc;

use tracing::{info, instrument, warn};

use gogi_core::{AddressId, OrderId, OrderStatus, ProductId, Quantity, UserId, Won};

use crate::db::CheckoutStore;
use crate::iamport::PaymentVerifier;
use crate::models::{CurrentUser, NewOrder, NewOrderItem, Order, OrderDetails, PaymentReference};

/// A priced snapshot of a user's cart, ready to become an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartOrderContext {
    pub user_id: UserId,
    /// One entry per cart line, with the unit price at load time.
    pub lines: Vec<NewOrderItem>,
    pub total_amount: Won,
    /// Validated to belong to `user_id` when present.
    pub shipping_address_id: Option<AddressId>,
}

/// Input for a payment-verified cart checkout.
#[derive(Debug, Clone)]
pub struct VerifiedCheckout {
    pub imp_uid: String,
    pub merchant_uid: Option<String>,
    pub shipping_address_id: Option<AddressId>,
}

/// Places orders against a [`CheckoutStore`], verifying payments with a
/// [`PaymentVerifier`].
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn CheckoutStore>,
    payments: Arc<dyn PaymentVerifier>,
}

impl CheckoutService {
    /// Create a checkout service.
    #[must_use]
    pub fn new(store: Arc<dyn CheckoutStore>, payments: Arc<dyn PaymentVerifier>) -> Self {
        Self { store, payments }
    }

    /// Price the user's cart and validate the shipping address.
    ///
    /// Read-only. A line whose product no longer exists prices at zero and is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no items.
    /// Returns `CheckoutError::InvalidAddress` if the address is not the user's.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn load_cart_order_context(
        &self,
        user_id: UserId,
        shipping_address_id: Option<AddressId>,
    ) -> Result<CartOrderContext, CheckoutError> {
        let cart = self.store.cart_lines(user_id).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let lines: Vec<NewOrderItem> = cart
            .iter()
            .map(|line| {
                if line.product.is_none() {
                    warn!(
                        cart_item_id = %line.item.id,
                        product_id = %line.item.product_id,
                        "Cart line references a missing product, pricing it at zero"
                    );
                }
                NewOrderItem {
                    product_id: line.item.product_id,
                    quantity: line.item.quantity,
                    price: line.unit_price(),
                }
            })
            .collect();
        let total_amount: Won = lines.iter().map(|l| l.price.times(l.quantity)).sum();

        self.check_address(user_id, shipping_address_id).await?;

        Ok(CartOrderContext {
            user_id,
            lines,
            total_amount,
            shipping_address_id,
        })
    }

    /// Write an order from a context and empty the cart, atomically.
    ///
    /// The order is `PAID` when a verified `payment` is attached and
    /// `PENDING` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CartChanged` if the cart no longer matches the context.
    /// Returns `CheckoutError::PaymentAlreadyUsed` if `payment` is already attached to an order.
    pub async fn persist_order_from_context(
        &self,
        context: &CartOrderContext,
        payment: Option<PaymentReference>,
    ) -> Result<Order, CheckoutError> {
        let order = self
            .store
            .create_order(&NewOrder {
                user_id: context.user_id,
                status: if payment.is_some() {
                    OrderStatus::Paid
                } else {
                    OrderStatus::Pending
                },
                total_amount: context.total_amount,
                shipping_address_id: context.shipping_address_id,
                items: context.lines.clone(),
                payment,
                consumes_cart: true,
            })
            .await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = %order.total_amount,
            items = context.lines.len(),
            "Created order from cart"
        );
        Ok(order)
    }

    /// Order `quantity` units of one product. The cart is not touched.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::ProductNotFound` if the product doesn't exist.
    /// Returns `CheckoutError::InvalidAddress` if the address is not the user's.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn create_direct_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
        shipping_address_id: Option<AddressId>,
    ) -> Result<OrderDetails, CheckoutError> {
        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound)?;

        self.check_address(user_id, shipping_address_id).await?;

        let order = self
            .store
            .create_order(&NewOrder {
                user_id,
                status: OrderStatus::Pending,
                total_amount: product.price.times(quantity),
                shipping_address_id,
                items: vec![NewOrderItem {
                    product_id,
                    quantity,
                    price: product.price,
                }],
                payment: None,
                consumes_cart: false,
            })
            .await?;

        info!(order_id = %order.id, total = %order.total_amount, "Created direct order");
        self.details(order.id).await
    }

    /// Turn the cart into a `PENDING` order without payment verification.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::InvalidAddress`
    /// from context loading, and `CheckoutError::CartChanged` if the cart
    /// changed concurrently.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn create_cart_order(
        &self,
        user_id: UserId,
        shipping_address_id: Option<AddressId>,
    ) -> Result<OrderDetails, CheckoutError> {
        let context = self
            .load_cart_order_context(user_id, shipping_address_id)
            .await?;
        let order = self.persist_order_from_context(&context, None).await?;
        self.details(order.id).await
    }

    /// Turn the cart into a `PAID` order after the provider confirms payment
    /// of exactly the cart total.
    ///
    /// Replaying an `imp_uid` that already produced an order for this user
    /// returns that order without contacting the provider.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Payment` if the provider lookup fails.
    /// Returns `CheckoutError::PaymentNotCompleted` if the payment is not paid.
    /// Returns `CheckoutError::AmountMismatch` if the paid amount differs from the cart total.
    /// Returns `CheckoutError::PaymentAlreadyUsed` if another user's order holds the payment.
    #[instrument(
        skip(self, checkout),
        fields(user_id = %user_id, imp_uid = %checkout.imp_uid)
    )]
    pub async fn complete_verified_cart_order(
        &self,
        user_id: UserId,
        checkout: VerifiedCheckout,
    ) -> Result<OrderDetails, CheckoutError> {
        if let Some(existing) = self.store.order_by_payment_uid(&checkout.imp_uid).await? {
            return self.resolve_replay(user_id, &existing).await;
        }

        let payment = self.payments.fetch_payment(&checkout.imp_uid).await?;
        if !payment.is_paid() {
            warn!(status = %payment.status, "Payment not completed");
            return Err(CheckoutError::PaymentNotCompleted(payment.status));
        }

        let context = self
            .load_cart_order_context(user_id, checkout.shipping_address_id)
            .await?;

        let paid = Won::from_reported(payment.amount);
        if paid != context.total_amount {
            warn!(
                paid = %paid,
                expected = %context.total_amount,
                "Paid amount does not match cart total"
            );
            return Err(CheckoutError::AmountMismatch {
                paid,
                expected: context.total_amount,
            });
        }

        let reference = PaymentReference {
            imp_uid: checkout.imp_uid.clone(),
            merchant_uid: checkout
                .merchant_uid
                .or_else(|| Some(payment.merchant_uid.clone()).filter(|m| !m.is_empty())),
        };

        let order = match self
            .persist_order_from_context(&context, Some(reference))
            .await
        {
            Ok(order) => order,
            Err(CheckoutError::PaymentAlreadyUsed) => {
                // A concurrent request for the same payment won the race.
                let existing = self
                    .store
                    .order_by_payment_uid(&checkout.imp_uid)
                    .await?
                    .ok_or(CheckoutError::PaymentAlreadyUsed)?;
                return self.resolve_replay(user_id, &existing).await;
            }
            Err(e) => return Err(e),
        };

        info!(order_id = %order.id, amount = %paid, "Payment verified, order paid");
        self.details(order.id).await
    }

    /// Set an order's status. Only the owner or an administrator may do so;
    /// anyone else sees the order as missing.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't exist or the
    /// caller may not see it.
    #[instrument(skip(self, caller), fields(user_id = %caller.id, status = %status))]
    pub async fn update_order_status(
        &self,
        caller: &CurrentUser,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let current = self
            .store
            .order_details(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if current.order.user_id != caller.id && !caller.is_admin() {
            return Err(CheckoutError::OrderNotFound);
        }

        let order = self
            .store
            .set_order_status(order_id, &status)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        info!(order_id = %order.id, "Order status updated");
        Ok(order)
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the store fails.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetails>, CheckoutError> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// One of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't exist or
    /// belongs to another user.
    pub async fn order_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderDetails, CheckoutError> {
        self.store
            .order_details(order_id)
            .await?
            .filter(|details| details.order.user_id == user_id)
            .ok_or(CheckoutError::OrderNotFound)
    }

    async fn check_address(
        &self,
        user_id: UserId,
        shipping_address_id: Option<AddressId>,
    ) -> Result<(), CheckoutError> {
        let Some(address_id) = shipping_address_id else {
            return Ok(());
        };
        self.store
            .address_for_user(user_id, address_id)
            .await?
            .map(|_| ())
            .ok_or(CheckoutError::InvalidAddress)
    }

    async fn resolve_replay(
        &self,
        user_id: UserId,
        existing: &Order,
    ) -> Result<OrderDetails, CheckoutError> {
        if existing.user_id != user_id {
            warn!(order_id = %existing.id, "Payment belongs to another user's order");
            return Err(CheckoutError::PaymentAlreadyUsed);
        }
        if existing.status == OrderStatus::Pending {
            // The payment was verified when this order was written.
            self.store
                .set_order_status(existing.id, &OrderStatus::Paid)
                .await?
                .ok_or(CheckoutError::OrderNotFound)?;
            info!(order_id = %existing.id, "Promoted verified order to paid");
        }
        info!(order_id = %existing.id, "Payment already completed, returning existing order");
        self.details(existing.id).await
    }

    async fn details(&self, order_id: OrderId) -> Result<OrderDetails, CheckoutError> {
        self.store
            .order_details(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)
    }
}
