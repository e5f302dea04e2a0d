//! Booking models and lifecycle transition commands

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::models::UserRole;

/// Booking lifecycle status
///
/// Transitions are monotonic; the only early exits are `Rejected` (owner
/// declines a pending request) and `Expired` (payment window missed).
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingOwner,
    WaitingPayment,
    WaitingAdminVerify,
    Paid,
    Shipped,
    Received,
    Returning,
    Completed,
    Rejected,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingOwner => "pending_owner",
            BookingStatus::WaitingPayment => "waiting_payment",
            BookingStatus::WaitingAdminVerify => "waiting_admin_verify",
            BookingStatus::Paid => "paid",
            BookingStatus::Shipped => "shipped",
            BookingStatus::Received => "received",
            BookingStatus::Returning => "returning",
            BookingStatus::Completed => "completed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Expired => "expired",
        }
    }

    /// Terminal bookings accept no further commands
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Rejected | BookingStatus::Expired
        )
    }
}

/// Booking model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub renter_id: Uuid,
    pub owner_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i32,
    pub price_per_day: i64,
    pub rent_fee: i64,
    pub shipping_fee: i64,
    pub deposit_fee: i64,
    pub total_price: i64,
    pub penalty_fee: i64,
    pub damage_fee: i64,
    pub status: BookingStatus,
    pub payment_proof_url: Option<String>,
    pub proof_before_shipping: Option<String>,
    pub outbound_shipping_company: Option<String>,
    pub outbound_tracking_number: Option<String>,
    pub proof_after_receiving: Option<String>,
    pub proof_before_return: Option<String>,
    pub inbound_shipping_company: Option<String>,
    pub inbound_tracking_number: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller applying a transition
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

/// Request DTO for creating a booking
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRentalRequest {
    pub product_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Shipping fee cannot be negative"))]
    pub shipping_fee: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Deposit fee cannot be negative"))]
    pub deposit_fee: i64,
}

/// Lifecycle transition commands, dispatched by the status route
///
/// Each variant carries exactly the fields its transition requires; an
/// unknown action fails deserialization instead of being silently ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransitionCommand {
    /// Renter submits the payment slip
    Pay { proof_url: String },
    /// Admin confirms the payment and debits the renter's wallet
    AdminVerify,
    /// Owner ships the item with carrier details
    Ship {
        proof_url: String,
        shipping_company: String,
        tracking_number: String,
    },
    /// Renter confirms receipt; owner is paid rent + shipping
    Receive { proof_url: String },
    /// Renter sends the item back; late penalty is assessed here
    Return {
        proof_url: String,
        shipping_company: String,
        tracking_number: String,
    },
    /// Owner inspects the returned item and settles the deposit
    Verify { damage_fee: Option<i64> },
    /// Owner declines a pending request
    Reject,
}

/// Response for booking creation
#[derive(Debug, Serialize)]
pub struct RentalResponse {
    pub message: String,
    pub rental: Booking,
}

/// Response for status transitions
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub current_status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_dispatch_by_action_tag() {
        let cmd: TransitionCommand =
            serde_json::from_str(r#"{"action": "pay", "proof_url": "https://img/slip.jpg"}"#)
                .unwrap();
        assert!(matches!(cmd, TransitionCommand::Pay { .. }));

        let cmd: TransitionCommand = serde_json::from_str(
            r#"{"action": "ship", "proof_url": "u", "shipping_company": "Kerry", "tracking_number": "TH123"}"#,
        )
        .unwrap();
        assert!(matches!(cmd, TransitionCommand::Ship { .. }));

        let cmd: TransitionCommand =
            serde_json::from_str(r#"{"action": "verify", "damage_fee": 100}"#).unwrap();
        assert!(matches!(
            cmd,
            TransitionCommand::Verify {
                damage_fee: Some(100)
            }
        ));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result: Result<TransitionCommand, _> =
            serde_json::from_str(r#"{"action": "teleport"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        // ship without tracking details must not deserialize
        let result: Result<TransitionCommand, _> =
            serde_json::from_str(r#"{"action": "ship", "proof_url": "u"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(BookingStatus::Expired.is_terminal());
        assert!(!BookingStatus::Returning.is_terminal());
        assert!(!BookingStatus::PendingOwner.is_terminal());
    }
}
