//! Admin-only handlers: KYC review and the manual refund trigger

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminUser;
use crate::models::UserResponse;
use crate::scheduler::RefundBatchOutcome;
use crate::state::AppState;

/// KYC review decision
#[derive(Debug, Deserialize)]
pub struct ReviewKycRequest {
    pub approve: bool,
}

#[derive(Debug, Serialize)]
pub struct ReviewKycResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct TriggerRefundResponse {
    pub message: String,
    pub outcome: RefundBatchOutcome,
}

/// GET /api/admin/kyc/pending
pub async fn list_pending_kyc(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.auth_service.list_pending_kyc().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// PUT /api/admin/kyc/:user_id
pub async fn review_kyc(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ReviewKycRequest>,
) -> ApiResult<Json<ReviewKycResponse>> {
    let user = state.auth_service.review_kyc(user_id, req.approve).await?;

    let message = if req.approve {
        "KYC approved"
    } else {
        "KYC rejected"
    };

    Ok(Json(ReviewKycResponse {
        message: message.to_string(),
        user: user.into(),
    }))
}

/// POST /api/interval/trigger
///
/// Runs the auto-refund batch immediately instead of waiting for the next
/// scheduled tick.
pub async fn trigger_refund_batch(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<TriggerRefundResponse>> {
    let outcome = state
        .auto_refund_job
        .run_once()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(TriggerRefundResponse {
        message: "Auto-refund batch executed".to_string(),
        outcome,
    }))
}
