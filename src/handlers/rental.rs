//! Rental lifecycle handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthenticatedUser, VerifiedUser};
use crate::rental::{
    Actor, Booking, CreateRentalRequest, RentalResponse, StatusResponse, TransitionCommand,
};
use crate::state::AppState;

/// POST /rentals (KYC-verified renters only)
pub async fn create_rental(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(req): Json<CreateRentalRequest>,
) -> ApiResult<(StatusCode, Json<RentalResponse>)> {
    req.validate()?;

    let rental = state.rental_service.create(user.user_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RentalResponse {
            message: "Booking request created".to_string(),
            rental,
        }),
    ))
}

/// PUT /rentals/:id/owner-approve
pub async fn owner_approve(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    let actor = Actor {
        id: user.user_id,
        role: user.role,
    };

    let booking = state.rental_service.owner_approve(booking_id, actor).await?;

    Ok(Json(StatusResponse {
        message: "Booking approved; waiting for payment".to_string(),
        current_status: booking.status,
    }))
}

/// PUT /rentals/:id/status
///
/// A single endpoint dispatching on the `action` field of the body.
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
    Json(command): Json<TransitionCommand>,
) -> ApiResult<Json<StatusResponse>> {
    let actor = Actor {
        id: user.user_id,
        role: user.role,
    };

    let booking = state.rental_service.apply(booking_id, actor, command).await?;

    Ok(Json(StatusResponse {
        message: "Booking status updated".to_string(),
        current_status: booking.status,
    }))
}

/// GET /rentals/:id (participants and admins only)
pub async fn get_rental(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<Json<Booking>> {
    let booking = state
        .rental_service
        .get(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    let actor = Actor {
        id: user.user_id,
        role: user.role,
    };
    let is_participant = booking.renter_id == actor.id || booking.owner_id == actor.id;
    if !is_participant && !actor.is_admin() {
        return Err(ApiError::Forbidden(
            "You are not part of this booking".to_string(),
        ));
    }

    Ok(Json(booking))
}

/// GET /rentals (bookings where the caller is renter or owner)
pub async fn list_rentals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<Booking>>> {
    let bookings = state.rental_service.list_for_user(user.user_id).await?;

    Ok(Json(bookings))
}
