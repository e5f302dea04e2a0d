//! Shop route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{create_shop, get_shop, list_shops};
use crate::state::AppState;

pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/api/shops", post(create_shop))
        .route("/api/shops", get(list_shops))
        .route("/api/shops/:id", get(get_shop))
}
