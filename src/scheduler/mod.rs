//! Auto-refund scheduler
//!
//! A recurring job that finds bookings stuck in `returning` past the grace
//! period and forces the deposit refund through the wallet ledger. Each
//! booking is processed in its own transaction so one failure never aborts
//! the rest of the batch.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::wallet::{WalletLedger, WalletTxType};

/// Outcome of one scheduler run
#[derive(Debug, Default, serde::Serialize)]
pub struct RefundBatchOutcome {
    pub processed: usize,
    pub refunded: usize,
    pub failed: usize,
}

/// Background job refunding deposits the owner never inspected
pub struct AutoRefundJob {
    db_pool: PgPool,
    grace_hours: i64,
}

impl AutoRefundJob {
    pub fn new(db_pool: PgPool, grace_hours: i64) -> Self {
        Self {
            db_pool,
            grace_hours,
        }
    }

    /// Run one batch: refund every booking stuck in `returning` past the
    /// grace period. Per-booking failures are logged and skipped.
    pub async fn run_once(&self) -> Result<RefundBatchOutcome> {
        let stuck: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM bookings
            WHERE status = 'returning'
              AND returned_at <= NOW() - make_interval(hours => $1)
            ORDER BY returned_at ASC
            "#,
        )
        .bind(self.grace_hours as i32)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to query stuck returning bookings")?;

        let mut outcome = RefundBatchOutcome::default();

        for (booking_id,) in stuck {
            outcome.processed += 1;
            match self.refund_booking(booking_id).await {
                Ok(refund) => {
                    outcome.refunded += 1;
                    tracing::info!(booking_id = %booking_id, refund, "Auto-refunded booking");
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!(booking_id = %booking_id, error = %e, "Auto-refund failed");
                }
            }
        }

        Ok(outcome)
    }

    /// Refund a single booking in its own transaction
    async fn refund_booking(&self, booking_id: Uuid) -> Result<i64> {
        let mut tx = self.db_pool.begin().await?;

        // Re-check under the row lock: a concurrent owner verify may have
        // settled this booking between the scan and now.
        let row: Option<(Uuid, Uuid, i64, i64, i32)> = sqlx::query_as(
            r#"
            SELECT renter_id, product_id, deposit_fee, penalty_fee, quantity
            FROM bookings
            WHERE id = $1 AND status = 'returning'
            FOR UPDATE
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (renter_id, product_id, deposit_fee, penalty_fee, quantity) =
            row.context("Booking is no longer in returning status")?;

        let refund = (deposit_fee - penalty_fee).max(0);

        if refund > 0 {
            WalletLedger::credit(
                &mut *tx,
                renter_id,
                Some(booking_id),
                refund,
                WalletTxType::Refund,
                "Automatic deposit refund (owner did not inspect in time)",
            )
            .await?;
        }

        // The item is back: release the reserved stock.
        sqlx::query("UPDATE products SET quantity = quantity + $1, updated_at = NOW() WHERE id = $2")
            .bind(quantity)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE bookings SET status = 'completed', updated_at = NOW() WHERE id = $1")
            .bind(booking_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(refund)
    }
}

/// Run the job once at startup and then on a fixed interval
///
/// Owned by the process: main spawns this task and aborts it on shutdown.
pub async fn run_scheduler(job: Arc<AutoRefundJob>, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "Auto-refund scheduler started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        // The first tick fires immediately, giving the run-at-startup pass.
        ticker.tick().await;

        match job.run_once().await {
            Ok(outcome) if outcome.processed > 0 => {
                tracing::info!(
                    processed = outcome.processed,
                    refunded = outcome.refunded,
                    failed = outcome.failed,
                    "Auto-refund batch finished"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Auto-refund batch failed");
            }
        }
    }
}
