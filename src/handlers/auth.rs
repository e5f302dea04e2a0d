//! Authentication and KYC handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::{KycStatus, UserResponse};
use crate::state::AppState;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// KYC document submission
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitKycRequest {
    #[validate(length(min = 1, message = "ID card image is required"))]
    pub id_card_image: String,
    #[validate(length(min = 1, message = "Face image is required"))]
    pub face_image: String,
}

#[derive(Debug, Serialize)]
pub struct KycStatusResponse {
    pub message: String,
    pub kyc_status: KycStatus,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let user = state
        .auth_service
        .register(
            &req.full_name,
            &req.email,
            &req.phone,
            req.address,
            &req.password,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (token, user) = state.auth_service.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth_service.get_user_by_id(user.user_id).await?;

    Ok(Json(user.into()))
}

/// POST /api/auth/kyc
pub async fn submit_kyc(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<SubmitKycRequest>,
) -> ApiResult<Json<KycStatusResponse>> {
    req.validate()?;

    let user = state
        .auth_service
        .submit_kyc(user.user_id, &req.id_card_image, &req.face_image)
        .await?;

    Ok(Json(KycStatusResponse {
        message: "KYC documents submitted for review".to_string(),
        kyc_status: user.kyc_status,
    }))
}
