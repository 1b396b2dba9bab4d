//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gogi_core::{ProductId, UserId, Won};

/// A product listed in the catalog.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Current unit price. Orders copy this value at creation time.
    pub price: Won,
    pub image_url: Option<String>,
    /// Owning seller. `None` for products seeded without an owner, which only
    /// administrators may edit.
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether `user_id` owns this product.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == Some(user_id)
    }
}

/// Fields accepted when creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Won,
    pub image_url: Option<String>,
}

/// Partial product update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Won>,
    pub image_url: Option<String>,
}
