//! Wallet handlers: balance and transaction history

use axum::{extract::State, Json};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::wallet::{BalanceResponse, LedgerError, WalletTransaction};

/// GET /rentals/wallet/balance
pub async fn wallet_balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = state
        .wallet_ledger
        .balance(user.user_id)
        .await
        .map_err(ledger_to_api)?;

    Ok(Json(BalanceResponse { balance }))
}

/// GET /rentals/wallet/transactions
pub async fn wallet_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<WalletTransaction>>> {
    let transactions = state
        .wallet_ledger
        .transactions(user.user_id)
        .await
        .map_err(ledger_to_api)?;

    Ok(Json(transactions))
}

fn ledger_to_api(err: LedgerError) -> ApiError {
    match err {
        LedgerError::WalletNotFound => ApiError::NotFound(err.to_string()),
        LedgerError::InsufficientFunds { .. } => ApiError::InsufficientFunds(err.to_string()),
        LedgerError::NonPositiveAmount(_) => ApiError::Validation(err.to_string()),
        LedgerError::Database(e) => ApiError::Database(e.to_string()),
    }
}
