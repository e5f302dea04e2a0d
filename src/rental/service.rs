//! Rental service layer - the booking lifecycle engine
//!
//! Every transition runs as a single database transaction with the booking
//! row locked `FOR UPDATE` for its duration; product and wallet rows are
//! locked where touched. Either all effects of a transition commit and the
//! status advances, or everything rolls back and the status is unchanged.
//! Lock order is booking, then product, then wallet.

use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::rental::fees;
use crate::rental::{Actor, Booking, BookingStatus, CreateRentalRequest, TransitionCommand};
use crate::wallet::{LedgerError, WalletLedger, WalletTxType};

/// Rental lifecycle errors
#[derive(Error, Debug)]
pub enum RentalError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Booking must be {expected} (currently {actual})")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Booking is {0} and accepts no further updates")]
    Terminal(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Not enough stock")]
    OutOfStock,

    #[error("Payment window has passed; the booking has expired")]
    PaymentWindowExpired,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RentalError> for ApiError {
    fn from(err: RentalError) -> Self {
        match err {
            RentalError::NotFound(m) => ApiError::NotFound(m.to_string()),
            RentalError::Forbidden(m) => ApiError::Forbidden(m.to_string()),
            RentalError::InvalidState { .. } => ApiError::State(err.to_string()),
            RentalError::Terminal(_) => ApiError::State(err.to_string()),
            RentalError::Validation(m) => ApiError::Validation(m),
            RentalError::OutOfStock => ApiError::State(err.to_string()),
            RentalError::PaymentWindowExpired => ApiError::State(err.to_string()),
            RentalError::Ledger(LedgerError::InsufficientFunds { .. }) => {
                ApiError::InsufficientFunds(err.to_string())
            }
            RentalError::Ledger(e) => ApiError::Database(e.to_string()),
            RentalError::Database(e) => ApiError::Database(e.to_string()),
        }
    }
}

/// Rental service owning the booking state machine
#[derive(Clone)]
pub struct RentalService {
    db_pool: PgPool,
    payment_window_hours: i64,
}

impl RentalService {
    pub fn new(db_pool: PgPool, payment_window_hours: i64) -> Self {
        Self {
            db_pool,
            payment_window_hours,
        }
    }

    /// Create a booking in `pending_owner`
    ///
    /// Fees are computed here from the product's current price and stored on
    /// the booking; they are never re-derived later.
    pub async fn create(
        &self,
        renter_id: Uuid,
        req: CreateRentalRequest,
    ) -> Result<Booking, RentalError> {
        if req.end_date <= req.start_date {
            return Err(RentalError::Validation(
                "End date must be after start date".to_string(),
            ));
        }

        let mut tx = self.db_pool.begin().await?;

        let product: Option<(i64, i32, Uuid)> = sqlx::query_as(
            "SELECT price_per_day, quantity, shop_id FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(req.product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (price_per_day, stock, shop_id) =
            product.ok_or(RentalError::NotFound("Product not found"))?;

        let (owner_id,): (Uuid,) = sqlx::query_as("SELECT owner_id FROM shops WHERE id = $1")
            .bind(shop_id)
            .fetch_one(&mut *tx)
            .await?;

        if owner_id == renter_id {
            return Err(RentalError::Validation(
                "You cannot rent your own product".to_string(),
            ));
        }

        if stock < req.quantity {
            return Err(RentalError::OutOfStock);
        }

        let days = fees::rental_days(req.start_date, req.end_date);
        let rent_fee = fees::rent_fee(days, price_per_day, req.quantity as i64);
        let total_price = rent_fee + req.shipping_fee + req.deposit_fee;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, renter_id, owner_id, product_id, quantity,
                start_date, end_date, days, price_per_day,
                rent_fee, shipping_fee, deposit_fee, total_price, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'pending_owner')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(renter_id)
        .bind(owner_id)
        .bind(req.product_id)
        .bind(req.quantity)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(days as i32)
        .bind(price_per_day)
        .bind(rent_fee)
        .bind(req.shipping_fee)
        .bind(req.deposit_fee)
        .bind(total_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(booking_id = %booking.id, renter_id = %renter_id, "Booking created");

        Ok(booking)
    }

    /// Owner approves a pending booking, reserving stock
    ///
    /// Stock is re-checked under the product row lock; it may have changed
    /// since the booking was created.
    pub async fn owner_approve(&self, booking_id: Uuid, actor: Actor) -> Result<Booking, RentalError> {
        let mut tx = self.db_pool.begin().await?;

        let booking = Self::lock_booking(&mut tx, booking_id).await?;

        if booking.owner_id != actor.id {
            return Err(RentalError::Forbidden("Only the owner can approve"));
        }
        Self::require_status(&booking, BookingStatus::PendingOwner)?;

        let stock = Self::lock_product_stock(&mut tx, booking.product_id).await?;
        if stock < booking.quantity {
            return Err(RentalError::OutOfStock);
        }

        Self::adjust_stock(&mut tx, booking.product_id, -booking.quantity).await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'waiting_payment', approved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(booking_id = %booking.id, "Booking approved by owner");

        Ok(booking)
    }

    /// Apply a lifecycle transition command
    pub async fn apply(
        &self,
        booking_id: Uuid,
        actor: Actor,
        command: TransitionCommand,
    ) -> Result<Booking, RentalError> {
        let mut tx = self.db_pool.begin().await?;

        let booking = Self::lock_booking(&mut tx, booking_id).await?;

        if booking.status.is_terminal() {
            return Err(RentalError::Terminal(booking.status.as_str()));
        }

        let result = match command {
            TransitionCommand::Pay { proof_url } => {
                self.pay(&mut tx, &booking, actor, &proof_url).await
            }
            TransitionCommand::AdminVerify => self.admin_verify(&mut tx, &booking, actor).await,
            TransitionCommand::Ship {
                proof_url,
                shipping_company,
                tracking_number,
            } => {
                self.ship(&mut tx, &booking, actor, &proof_url, &shipping_company, &tracking_number)
                    .await
            }
            TransitionCommand::Receive { proof_url } => {
                self.receive(&mut tx, &booking, actor, &proof_url).await
            }
            TransitionCommand::Return {
                proof_url,
                shipping_company,
                tracking_number,
            } => {
                self.return_item(&mut tx, &booking, actor, &proof_url, &shipping_company, &tracking_number)
                    .await
            }
            TransitionCommand::Verify { damage_fee } => {
                self.verify_return(&mut tx, &booking, actor, damage_fee.unwrap_or(0))
                    .await
            }
            TransitionCommand::Reject => self.reject(&mut tx, &booking, actor).await,
        };

        match result {
            Ok(updated) => {
                tx.commit().await?;
                tracing::info!(
                    booking_id = %booking_id,
                    from = booking.status.as_str(),
                    to = updated.status.as_str(),
                    "Booking transition applied"
                );
                Ok(updated)
            }
            // The expiry flip must survive even though the caller gets an
            // error: the booking really is expired now.
            Err(RentalError::PaymentWindowExpired) => {
                tx.commit().await?;
                tracing::warn!(booking_id = %booking_id, "Booking expired: payment window missed");
                Err(RentalError::PaymentWindowExpired)
            }
            Err(e) => Err(e),
        }
    }

    /// Get a booking by ID
    pub async fn get(&self, booking_id: Uuid) -> Result<Option<Booking>, RentalError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(booking)
    }

    /// List bookings where the user is renter or owner, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, RentalError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE renter_id = $1 OR owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(bookings)
    }

    // ===== Transitions (each runs inside the caller's transaction) =====

    /// Renter submits the payment slip within the payment window
    async fn pay(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &Booking,
        actor: Actor,
        proof_url: &str,
    ) -> Result<Booking, RentalError> {
        if booking.renter_id != actor.id {
            return Err(RentalError::Forbidden("Only the renter can pay"));
        }
        Self::require_status(booking, BookingStatus::WaitingPayment)?;

        let approved_at = booking.approved_at.unwrap_or(booking.created_at);
        if Utc::now() > approved_at + Duration::hours(self.payment_window_hours) {
            // Window missed: release the reserved stock and close the booking.
            Self::adjust_stock(tx, booking.product_id, booking.quantity).await?;
            sqlx::query("UPDATE bookings SET status = 'expired', updated_at = NOW() WHERE id = $1")
                .bind(booking.id)
                .execute(&mut **tx)
                .await?;
            return Err(RentalError::PaymentWindowExpired);
        }

        Self::require_proof(proof_url, "Payment slip image is required")?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'waiting_admin_verify', payment_proof_url = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(proof_url)
        .bind(booking.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(booking)
    }

    /// Admin confirms the slip and debits the renter's wallet for the total due
    async fn admin_verify(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &Booking,
        actor: Actor,
    ) -> Result<Booking, RentalError> {
        if !actor.is_admin() {
            return Err(RentalError::Forbidden("Admin only"));
        }
        Self::require_status(booking, BookingStatus::WaitingAdminVerify)?;

        WalletLedger::debit(
            &mut **tx,
            booking.renter_id,
            Some(booking.id),
            booking.total_price,
            WalletTxType::Payment,
            "Rental payment (admin verified)",
        )
        .await?;

        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'paid', updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(booking.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(booking)
    }

    /// Owner ships the item with carrier details and a proof photo
    async fn ship(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &Booking,
        actor: Actor,
        proof_url: &str,
        shipping_company: &str,
        tracking_number: &str,
    ) -> Result<Booking, RentalError> {
        if booking.owner_id != actor.id {
            return Err(RentalError::Forbidden("Only the owner can ship"));
        }
        Self::require_status(booking, BookingStatus::Paid)?;
        Self::require_proof(proof_url, "Shipping proof image is required")?;
        Self::require_carrier(shipping_company, tracking_number)?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'shipped',
                proof_before_shipping = $1,
                outbound_shipping_company = $2,
                outbound_tracking_number = $3,
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(proof_url)
        .bind(shipping_company)
        .bind(tracking_number)
        .bind(booking.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(booking)
    }

    /// Renter confirms receipt; rent and shipping are paid out to the owner
    async fn receive(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &Booking,
        actor: Actor,
        proof_url: &str,
    ) -> Result<Booking, RentalError> {
        if booking.renter_id != actor.id {
            return Err(RentalError::Forbidden("Only the renter can confirm receipt"));
        }
        Self::require_status(booking, BookingStatus::Shipped)?;
        Self::require_proof(proof_url, "Receipt proof image is required")?;

        let payout = booking.rent_fee + booking.shipping_fee;
        WalletLedger::credit(
            &mut **tx,
            booking.owner_id,
            Some(booking.id),
            payout,
            WalletTxType::Income,
            "Rental income (rent + shipping)",
        )
        .await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'received', proof_after_receiving = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(proof_url)
        .bind(booking.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(booking)
    }

    /// Renter sends the item back; any late penalty is assessed here
    async fn return_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &Booking,
        actor: Actor,
        proof_url: &str,
        shipping_company: &str,
        tracking_number: &str,
    ) -> Result<Booking, RentalError> {
        if booking.renter_id != actor.id {
            return Err(RentalError::Forbidden("Only the renter can return the item"));
        }
        Self::require_status(booking, BookingStatus::Received)?;
        Self::require_proof(proof_url, "Return proof image is required")?;
        Self::require_carrier(shipping_company, tracking_number)?;

        let now = Utc::now();
        let penalty_fee = fees::late_penalty(booking.end_date, now, booking.price_per_day);

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'returning',
                proof_before_return = $1,
                inbound_shipping_company = $2,
                inbound_tracking_number = $3,
                penalty_fee = $4,
                returned_at = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(proof_url)
        .bind(shipping_company)
        .bind(tracking_number)
        .bind(penalty_fee)
        .bind(now)
        .bind(booking.id)
        .fetch_one(&mut **tx)
        .await?;

        if penalty_fee > 0 {
            tracing::info!(booking_id = %booking.id, penalty_fee, "Late return penalty assessed");
        }

        Ok(booking)
    }

    /// Owner inspects the returned item and settles the deposit
    async fn verify_return(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &Booking,
        actor: Actor,
        declared_damage: i64,
    ) -> Result<Booking, RentalError> {
        if booking.owner_id != actor.id {
            return Err(RentalError::Forbidden("Only the owner can verify the return"));
        }
        Self::require_status(booking, BookingStatus::Returning)?;

        let (refund, damage_fee) =
            fees::settle_deposit(booking.deposit_fee, booking.penalty_fee, declared_damage);

        if refund > 0 {
            WalletLedger::credit(
                &mut **tx,
                booking.renter_id,
                Some(booking.id),
                refund,
                WalletTxType::Refund,
                "Deposit refund after penalty and damage",
            )
            .await?;
        }

        if damage_fee > 0 {
            WalletLedger::credit(
                &mut **tx,
                booking.owner_id,
                Some(booking.id),
                damage_fee,
                WalletTxType::Compensation,
                "Damage fee withheld from deposit",
            )
            .await?;
        }

        // The item is back: release the reserved stock.
        Self::adjust_stock(tx, booking.product_id, booking.quantity).await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'completed', damage_fee = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(damage_fee)
        .bind(booking.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(booking)
    }

    /// Owner declines a pending request; stock was never reserved
    async fn reject(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &Booking,
        actor: Actor,
    ) -> Result<Booking, RentalError> {
        if booking.owner_id != actor.id {
            return Err(RentalError::Forbidden("Only the owner can reject"));
        }
        Self::require_status(booking, BookingStatus::PendingOwner)?;

        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'rejected', updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(booking.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(booking)
    }

    // ===== Row-lock helpers =====

    /// Lock the booking row for the duration of the transaction
    async fn lock_booking(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<Booking, RentalError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(RentalError::NotFound("Booking not found"))
    }

    /// Lock the product row and return its current stock
    async fn lock_product_stock(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
    ) -> Result<i32, RentalError> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT quantity FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id)
                .fetch_optional(&mut **tx)
                .await?;

        row.map(|(q,)| q)
            .ok_or(RentalError::NotFound("Product not found"))
    }

    /// Adjust product stock by a signed delta (the row must already be
    /// locked, or the update itself acquires the lock)
    async fn adjust_stock(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        delta: i32,
    ) -> Result<(), RentalError> {
        sqlx::query("UPDATE products SET quantity = quantity + $1, updated_at = NOW() WHERE id = $2")
            .bind(delta)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    fn require_status(booking: &Booking, expected: BookingStatus) -> Result<(), RentalError> {
        if booking.status != expected {
            return Err(RentalError::InvalidState {
                expected: expected.as_str(),
                actual: booking.status.as_str(),
            });
        }
        Ok(())
    }

    fn require_proof(proof_url: &str, message: &str) -> Result<(), RentalError> {
        if proof_url.trim().is_empty() {
            return Err(RentalError::Validation(message.to_string()));
        }
        Ok(())
    }

    fn require_carrier(shipping_company: &str, tracking_number: &str) -> Result<(), RentalError> {
        if shipping_company.trim().is_empty() || tracking_number.trim().is_empty() {
            return Err(RentalError::Validation(
                "Shipping company and tracking number are required".to_string(),
            ));
        }
        Ok(())
    }
}
