//! Wallet models and data structures

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Wallet model: one per user, balance never below zero
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

/// Wallet transaction types
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "wallet_tx_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WalletTxType {
    /// Renter pays the total due (debit)
    Payment,
    /// Deposit returned to the renter (credit)
    Refund,
    /// Rent and shipping paid out to the owner (credit)
    Income,
    /// Damage fee paid to the owner out of the deposit (credit)
    Compensation,
}

/// Append-only ledger row; `amount` is signed and matches the balance delta
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount: i64,
    pub tx_type: WalletTxType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Read-only balance view
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: i64,
}
