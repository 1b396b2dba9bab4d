//! Address book route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use gogi_core::AddressId;

use super::extract::ApiJson;
use crate::db::{AddressRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Address;
use crate::models::address::{AddressUpdate, NewAddress};
use crate::state::AppState;

fn address_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Address not found".to_string()),
        other => other.into(),
    }
}

/// `GET /api/addresses`
///
/// Default address first, then newest.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(addresses))
}

/// `POST /api/addresses`
#[instrument(skip(state, user, address), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(address): ApiJson<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    if let Some(field) = address.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }

    let address = AddressRepository::new(state.pool())
        .create(user.id, &address)
        .await?;

    info!(address_id = %address.id, "Address created");
    Ok((StatusCode::CREATED, Json(address)))
}

/// `PATCH /api/addresses/{id}`
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    ApiJson(update): ApiJson<AddressUpdate>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &update)
        .await
        .map_err(address_not_found)?;
    Ok(Json(address))
}

/// `DELETE /api/addresses/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
