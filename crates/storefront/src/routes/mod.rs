//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                - Liveness
//! GET    /health/ready                          - Database ping
//!
//! # Social login
//! GET    /auth/{provider}/login                 - Redirect to Google / Naver / Kakao
//! GET    /auth/{provider}/callback              - Finish login, redirect to /
//! POST   /auth/logout                           - Drop the session
//! GET    /api/session                           - Current user or 401
//!
//! # Catalog
//! GET    /api/products                          - Newest first
//! POST   /api/products                          - Create (signed in)
//! GET    /api/products/{id}
//! PUT    /api/products/{id}                     - Owner or admin
//! DELETE /api/products/{id}                     - Owner or admin
//!
//! # Cart (signed in)
//! GET    /api/cart
//! POST   /api/cart                              - Set quantity of a product
//! DELETE /api/cart/{product_id}
//!
//! # Address book (signed in)
//! GET    /api/addresses
//! POST   /api/addresses
//! PATCH  /api/addresses/{id}
//! DELETE /api/addresses/{id}
//!
//! # Orders (signed in)
//! GET    /api/orders
//! POST   /api/orders                            - Direct order for one product
//! POST   /api/orders/cart                       - Cart order, no payment check
//! GET    /api/orders/{id}
//! PATCH  /api/orders/{id}                       - Owner or admin
//! POST   /api/checkout/cart/mobile-complete     - Cart order after payment
//!
//! # Admin
//! GET    /api/admin/users
//! ```

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod extract;
pub mod health;
pub mod orders;
pub mod products;

#[cfg(test)]
mod tests;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

/// Social login routes, mounted under `/auth`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(auth::logout))
        .route("/{provider}/login", get(auth::login))
        .route("/{provider}/callback", get(auth::callback))
}

/// JSON API routes, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(auth::current_session))
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/cart", get(cart::show).post(cart::add))
        .route("/cart/{product_id}", delete(cart::remove))
        .route("/addresses", get(addresses::index).post(addresses::create))
        .route(
            "/addresses/{id}",
            patch(addresses::update).delete(addresses::destroy),
        )
        .route("/orders", get(orders::index).post(orders::create_direct))
        .route("/orders/cart", post(orders::create_from_cart))
        .route(
            "/orders/{id}",
            get(orders::show).patch(orders::update_status),
        )
        .route(
            "/checkout/cart/mobile-complete",
            post(checkout::mobile_complete),
        )
        .route("/admin/users", get(admin::users))
}

/// Health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create all routes for the storefront, without rate limiting.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
}
