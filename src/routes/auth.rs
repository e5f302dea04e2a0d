//! Auth route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{login, me, register, submit_kyc};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/kyc", post(submit_kyc))
}
