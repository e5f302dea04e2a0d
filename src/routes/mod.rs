//! Route definitions for the Rentora API

mod admin;
mod auth;
mod interval;
mod product;
mod rental;
mod shop;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::json;

use crate::db;
use crate::state::AppState;

/// Build the full application router
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::auth_routes())
        .merge(admin::admin_routes())
        .merge(shop::shop_routes())
        .merge(product::product_routes())
        .merge(rental::rental_routes())
        .merge(interval::interval_routes())
        .with_state(state)
}

/// GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match db::check_health(&state.db_pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "down" })),
            )
        }
    }
}
