//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use gogi_core::{ProductId, Won};

use super::extract::{ApiJson, non_blank};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::product::{NewProduct, ProductUpdate};
use crate::models::{CurrentUser, Product};
use crate::state::AppState;

/// Product fields as sent by the client. Validated before use.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub image_url: Option<String>,
}

fn positive_price(price: i64) -> Result<Won> {
    let price = Won::new(price);
    if price.is_positive() {
        Ok(price)
    } else {
        Err(AppError::BadRequest("price must be greater than zero".to_string()))
    }
}

impl ProductInput {
    fn into_new_product(self) -> Result<NewProduct> {
        let name = non_blank(self.name)
            .ok_or_else(|| AppError::BadRequest("name is required".to_string()))?;
        let price = self
            .price
            .ok_or_else(|| AppError::BadRequest("price is required".to_string()))
            .and_then(positive_price)?;

        Ok(NewProduct {
            name,
            description: self.description,
            price,
            image_url: self.image_url,
        })
    }

    fn into_update(self) -> Result<ProductUpdate> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::BadRequest("name cannot be blank".to_string()));
        }
        let price = self.price.map(positive_price).transpose()?;

        Ok(ProductUpdate {
            name: self.name,
            description: self.description,
            price,
            image_url: self.image_url,
        })
    }
}

async fn editable_product(state: &AppState, user: &CurrentUser, id: ProductId) -> Result<Product> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if !product.is_owned_by(user.id) && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only the seller or an administrator can change this product".to_string(),
        ));
    }
    Ok(product)
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// `POST /api/products`
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let new_product = input.into_new_product()?;
    let product = ProductRepository::new(state.pool())
        .create(Some(user.id), &new_product)
        .await?;

    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    let update = input.into_update()?;
    editable_product(&state, &user, id).await?;

    let product = ProductRepository::new(state.pool()).update(id, &update).await?;
    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    editable_product(&state, &user, id).await?;
    ProductRepository::new(state.pool()).delete(id).await?;

    info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_requires_name_and_positive_price() {
        let missing_name = ProductInput {
            price: Some(1_000),
            ..ProductInput::default()
        };
        assert!(matches!(
            missing_name.into_new_product(),
            Err(AppError::BadRequest(msg)) if msg == "name is required"
        ));

        let free = ProductInput {
            name: Some("Hanwoo 1++ sirloin".into()),
            price: Some(0),
            ..ProductInput::default()
        };
        assert!(matches!(free.into_new_product(), Err(AppError::BadRequest(_))));

        let ok = ProductInput {
            name: Some("Hanwoo 1++ sirloin".into()),
            price: Some(89_000),
            ..ProductInput::default()
        };
        assert_eq!(ok.into_new_product().map(|p| p.price).ok(), Some(Won::new(89_000)));
    }

    #[test]
    fn test_update_only_validates_supplied_fields() {
        let update = ProductInput::default().into_update();
        assert!(update.is_ok_and(|u| u.name.is_none() && u.price.is_none()));

        let negative = ProductInput {
            price: Some(-5),
            ..ProductInput::default()
        };
        assert!(negative.into_update().is_err());
    }
}
