//! Shopping cart lines.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gogi_core::{CartItemId, ProductId, Quantity, UserId, Won};

use super::Product;

/// A cart row: one product and how many units of it a user wants.
///
/// `(user_id, product_id)` is unique.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
}

/// A cart row joined with its product.
///
/// `product` is `None` when the referenced product no longer exists.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Option<Product>,
}

impl CartLine {
    /// Unit price used for checkout. A missing product prices at zero.
    #[must_use]
    pub fn unit_price(&self) -> Won {
        self.product.as_ref().map_or(Won::ZERO, |p| p.price)
    }
}
