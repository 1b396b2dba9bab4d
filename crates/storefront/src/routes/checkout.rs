//! Payment-verified checkout.
//!
//! The browser completes payment with the Iamport SDK, then posts the
//! resulting `impUid` here. The order is only created once the provider
//! confirms that exactly the cart total was paid.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::{info, instrument};

use gogi_core::AddressId;

use super::extract::{ApiJson, non_blank};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::OrderDetails;
use crate::services::checkout::VerifiedCheckout;
use crate::state::AppState;

/// Body of `POST /api/checkout/cart/mobile-complete`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileCompleteRequest {
    pub imp_uid: Option<String>,
    pub merchant_uid: Option<String>,
    pub shipping_address_id: Option<AddressId>,
}

/// `POST /api/checkout/cart/mobile-complete`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mobile_complete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<MobileCompleteRequest>,
) -> Result<(StatusCode, Json<OrderDetails>)> {
    let imp_uid = non_blank(body.imp_uid)
        .ok_or_else(|| AppError::BadRequest("impUid is required".to_string()))?;

    let details = state
        .checkout()
        .complete_verified_cart_order(
            user.id,
            VerifiedCheckout {
                imp_uid,
                merchant_uid: non_blank(body.merchant_uid),
                shipping_address_id: body.shipping_address_id,
            },
        )
        .await?;

    info!(order_id = %details.order.id, "Verified checkout completed");
    Ok((StatusCode::CREATED, Json(details)))
}
