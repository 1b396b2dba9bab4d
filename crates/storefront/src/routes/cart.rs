//! Cart route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use gogi_core::{ProductId, Quantity};

use super::extract::ApiJson;
use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CartItem, CartLine};
use crate::state::AppState;

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: Option<ProductId>,
    /// Missing or non-positive means one unit.
    pub quantity: Option<i64>,
}

/// `GET /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartLine>>> {
    let lines = CartRepository::new(state.pool())
        .lines_for_user(user.id)
        .await?;
    Ok(Json(lines))
}

/// `POST /api/cart`
///
/// Sets the quantity of a product in the cart, replacing any previous value.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddToCart>,
) -> Result<Json<CartItem>> {
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::BadRequest("productId is required".to_string()))?;
    let quantity = Quantity::or_one(body.quantity);

    let item = CartRepository::new(state.pool())
        .upsert(user.id, product_id, quantity)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
            other => other.into(),
        })?;
    Ok(Json(item))
}

/// `DELETE /api/cart/{product_id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    CartRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
