//! Order route handlers.
//!
//! All order creation goes through [`crate::services::CheckoutService`].

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use gogi_core::{AddressId, OrderId, OrderStatus, ProductId, Quantity};

use super::extract::{ApiJson, non_blank};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderDetails};
use crate::state::AppState;

/// Body of `POST /api/orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectOrderRequest {
    pub product_id: Option<ProductId>,
    /// Defaults to one unit; zero or negative is rejected.
    pub quantity: Option<i64>,
    pub shipping_address_id: Option<AddressId>,
}

impl DirectOrderRequest {
    fn quantity(&self) -> Result<Quantity> {
        match self.quantity {
            None => Ok(Quantity::ONE),
            Some(value) => {
                Quantity::try_from(value).map_err(|e| AppError::BadRequest(e.to_string()))
            }
        }
    }
}

/// Body of `POST /api/orders/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartOrderRequest {
    pub shipping_address_id: Option<AddressId>,
}

/// Body of `PATCH /api/orders/{id}`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

/// `GET /api/orders`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderDetails>>> {
    Ok(Json(state.checkout().orders_for_user(user.id).await?))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetails>> {
    Ok(Json(state.checkout().order_for_user(user.id, id).await?))
}

/// `POST /api/orders`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create_direct(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<DirectOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetails>)> {
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::BadRequest("productId is required".to_string()))?;
    let quantity = body.quantity()?;

    let details = state
        .checkout()
        .create_direct_order(user.id, product_id, quantity, body.shipping_address_id)
        .await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// `POST /api/orders/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create_from_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CartOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetails>)> {
    let details = state
        .checkout()
        .create_cart_order(user.id, body.shipping_address_id)
        .await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// `PATCH /api/orders/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Order>> {
    let status = non_blank(body.status)
        .ok_or_else(|| AppError::BadRequest("status is required".to_string()))?;

    let order = state
        .checkout()
        .update_order_status(&user, id, OrderStatus::from_label(status.trim()))
        .await?;
    Ok(Json(order))
}
