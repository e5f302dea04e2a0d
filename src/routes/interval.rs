//! Manual scheduler trigger route

use axum::{routing::post, Router};

use crate::handlers::trigger_refund_batch;
use crate::state::AppState;

pub fn interval_routes() -> Router<AppState> {
    Router::new().route("/api/interval/trigger", post(trigger_refund_batch))
}
