//! Orders and their line items.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gogi_core::{AddressId, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, UserId, Won};

use super::Address;

/// An order header.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Won,
    pub shipping_address_id: Option<AddressId>,
    /// Payment provider transaction id for verified checkouts.
    pub payment_uid: Option<String>,
    /// Merchant reference supplied with a verified checkout.
    pub merchant_uid: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A purchased line. `price` is the unit price frozen at order time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    /// Current product name, when the product still exists.
    pub product_name: Option<String>,
    pub quantity: Quantity,
    pub price: Won,
}

/// An order with its items and shipping address.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<Address>,
}

/// Payment identifiers attached to a verified checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReference {
    pub imp_uid: String,
    pub merchant_uid: Option<String>,
}

/// A line to be written with a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Won,
}

/// Everything needed to persist an order in one unit of work.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    /// Status the order is written with.
    pub status: OrderStatus,
    pub total_amount: Won,
    pub shipping_address_id: Option<AddressId>,
    pub items: Vec<NewOrderItem>,
    pub payment: Option<PaymentReference>,
    /// When set, the user's cart must still hold exactly `items` (same
    /// products, same quantities) and is emptied in the same transaction.
    pub consumes_cart: bool,
}
