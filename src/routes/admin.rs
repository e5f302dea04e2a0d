//! Admin route definitions

use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::{list_pending_kyc, review_kyc};
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/kyc/pending", get(list_pending_kyc))
        .route("/api/admin/kyc/:user_id", put(review_kyc))
}
