//! Fee arithmetic for the booking lifecycle
//!
//! All amounts are i64 minor units. Fees are computed once at the relevant
//! transition and stored on the booking, never re-derived later.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Number of rental days between two dates
pub fn rental_days(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days()
}

/// Rent fee: days x price per day x quantity
pub fn rent_fee(days: i64, price_per_day: i64, quantity: i64) -> i64 {
    days * price_per_day * quantity
}

/// Late-return penalty: ceil(days late) x price per day x 1.5
///
/// Zero when the item comes back on or before the rental end date. The end
/// date boundary is midnight after the last rental day.
pub fn late_penalty(
    end_date: NaiveDate,
    returned_at: DateTime<Utc>,
    price_per_day: i64,
) -> i64 {
    let deadline = end_date.and_time(NaiveTime::MIN).and_utc();
    let late_secs = (returned_at - deadline).num_seconds();
    if late_secs <= 0 {
        return 0;
    }

    let days_late = (late_secs + SECS_PER_DAY - 1) / SECS_PER_DAY;
    days_late * price_per_day * 3 / 2
}

/// Deposit settlement at verify-return
///
/// The owner-declared damage fee is capped at the deposit; the renter gets
/// back whatever the penalty and damage leave of it, floored at zero.
/// Returns (refund to renter, damage fee to owner).
pub fn settle_deposit(deposit_fee: i64, penalty_fee: i64, declared_damage: i64) -> (i64, i64) {
    let damage = declared_damage.clamp(0, deposit_fee);
    let refund = (deposit_fee - penalty_fee - damage).max(0);
    (refund, damage)
}
