//! Rental route definitions
//!
//! Wallet views live under /rentals/wallet because the wallet only moves
//! money for rentals.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{
    create_rental, get_rental, list_rentals, owner_approve, update_status, wallet_balance,
    wallet_transactions,
};
use crate::state::AppState;

pub fn rental_routes() -> Router<AppState> {
    Router::new()
        .route("/rentals", post(create_rental))
        .route("/rentals", get(list_rentals))
        .route("/rentals/wallet/balance", get(wallet_balance))
        .route("/rentals/wallet/transactions", get(wallet_transactions))
        .route("/rentals/:id", get(get_rental))
        .route("/rentals/:id/owner-approve", put(owner_approve))
        .route("/rentals/:id/status", put(update_status))
}
