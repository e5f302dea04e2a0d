//! Wallet ledger - the only path that moves money
//!
//! Credits and debits operate on a caller-provided transaction connection so
//! a booking transition and its wallet movements commit or roll back as one
//! unit. Every successful mutation writes exactly one wallet_transactions
//! row whose signed amount equals the balance delta.

use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use super::model::{WalletTransaction, WalletTxType};

/// Ledger errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Wallet not found for user")]
    WalletNotFound,

    #[error("Insufficient funds: balance {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Wallet ledger service
#[derive(Clone)]
pub struct WalletLedger {
    db_pool: PgPool,
}

impl WalletLedger {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Current balance for a user
    pub async fn balance(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db_pool)
                .await?;

        row.map(|(b,)| b).ok_or(LedgerError::WalletNotFound)
    }

    /// Transaction history for a user, newest first
    pub async fn transactions(&self, user_id: Uuid) -> Result<Vec<WalletTransaction>, LedgerError> {
        let rows = sqlx::query_as::<_, WalletTransaction>(
            "SELECT * FROM wallet_transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows)
    }

    /// Credit a wallet inside the caller's transaction
    pub async fn credit(
        conn: &mut PgConnection,
        user_id: Uuid,
        booking_id: Option<Uuid>,
        amount: i64,
        tx_type: WalletTxType,
        description: &str,
    ) -> Result<WalletTransaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }

        Self::lock_balance(conn, user_id).await?;

        sqlx::query("UPDATE wallets SET balance = balance + $1, updated_at = NOW() WHERE user_id = $2")
            .bind(amount)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        Self::record(conn, user_id, booking_id, amount, tx_type, description).await
    }

    /// Debit a wallet inside the caller's transaction
    ///
    /// Fails with InsufficientFunds when the row-locked balance is below
    /// the requested amount; the balance never goes negative.
    pub async fn debit(
        conn: &mut PgConnection,
        user_id: Uuid,
        booking_id: Option<Uuid>,
        amount: i64,
        tx_type: WalletTxType,
        description: &str,
    ) -> Result<WalletTransaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }

        let available = Self::lock_balance(conn, user_id).await?;

        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                available,
                requested: amount,
            });
        }

        sqlx::query("UPDATE wallets SET balance = balance - $1, updated_at = NOW() WHERE user_id = $2")
            .bind(amount)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        Self::record(conn, user_id, booking_id, -amount, tx_type, description).await
    }

    /// Lock the wallet row and return the current balance
    async fn lock_balance(conn: &mut PgConnection, user_id: Uuid) -> Result<i64, LedgerError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;

        row.map(|(b,)| b).ok_or(LedgerError::WalletNotFound)
    }

    /// Append the immutable ledger row
    async fn record(
        conn: &mut PgConnection,
        user_id: Uuid,
        booking_id: Option<Uuid>,
        amount: i64,
        tx_type: WalletTxType,
        description: &str,
    ) -> Result<WalletTransaction, LedgerError> {
        let tx = sqlx::query_as::<_, WalletTransaction>(
            r#"
            INSERT INTO wallet_transactions (id, user_id, booking_id, amount, tx_type, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(booking_id)
        .bind(amount)
        .bind(tx_type)
        .bind(description)
        .fetch_one(&mut *conn)
        .await?;

        Ok(tx)
    }
}
