//! Product route definitions

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{create_product, get_product, list_products, update_product};
use crate::state::AppState;

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", post(create_product))
        .route("/api/products", get(list_products))
        .route("/api/products/:id", get(get_product))
        .route("/api/products/:id", put(update_product))
}
