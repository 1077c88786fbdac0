//! OpenSASE Storefront
//!
//! Single-store storefront service.
//!
//! ## Features
//! - Product catalog with admin management
//! - Per-user cart, synchronisable from a client-side copy
//! - Checkout: cart snapshot to order in one transaction
//! - Order management (cancel, fulfill, payment)
//! - Wishlist and saved addresses

pub mod checkout;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod principal;
pub mod publisher;
pub mod repository;

use axum::{routing::{get, post, put}, Json, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{Result, StoreError};
use domain::value_objects::Money;
use handlers::{addresses, cart, orders, products, wishlist};
use publisher::EventPublisher;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub events: EventPublisher,
    pub shipping_flat_rate: Money,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(products::list_products).post(products::create_product))
        .route("/api/v1/products/:slug", get(products::get_product))
        .route("/api/v1/admin/products/:id", put(products::update_product).delete(products::delete_product))
        .route("/api/v1/cart", get(cart::get_cart).post(cart::add_to_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/sync", post(cart::sync_cart))
        .route("/api/v1/cart/:product_id", put(cart::set_quantity).delete(cart::remove_from_cart))
        .route("/api/v1/orders", get(orders::list_orders).post(orders::create_order))
        .route("/api/v1/orders/:id", get(orders::get_order))
        .route("/api/v1/orders/:id/cancel", post(orders::cancel_order))
        .route("/api/v1/orders/:id/fulfill", post(orders::fulfill_order))
        .route("/api/v1/orders/:id/pay", post(orders::pay_order))
        .route("/api/v1/wishlist", get(wishlist::list_wishlist).post(wishlist::add_to_wishlist))
        .route("/api/v1/wishlist/:product_id", axum::routing::delete(wishlist::remove_from_wishlist))
        .route("/api/v1/addresses", get(addresses::list_addresses).post(addresses::create_address))
        .route("/api/v1/addresses/:id", axum::routing::delete(addresses::delete_address))
        .route("/api/v1/addresses/:id/default", post(addresses::set_default_address))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

async fn health(axum::extract::State(s): axum::extract::State<AppState>) -> Result<Json<serde_json::Value>> {
    db::health_check(&s.db).await?;
    Ok(Json(serde_json::json!({"status": "healthy", "service": "opensase-storefront"})))
}
