//! Authentication middleware
//!
//! Extractors that verify the bearer credential and enforce role/KYC gates
//! before handlers run.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{get_user_id_from_claims, verify_token, AuthService};
use crate::models::{KycStatus, UserRole};

/// Authenticated caller extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
    pub kyc_status: KycStatus,
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthErrorBody {
    message: String,
    code: String,
}

struct AuthRejection {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl AuthRejection {
    fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code,
            message,
        }
    }

    fn forbidden(code: &'static str, message: &'static str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code,
            message,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorBody {
            message: self.message.to_string(),
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthRejection::unauthorized(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = verify_token(bearer.token(), auth_service.jwt_secret()).map_err(|e| {
            let (code, message) = match e.to_string().as_str() {
                s if s.contains("expired") => ("TOKEN_EXPIRED", "Token has expired"),
                _ => ("INVALID_TOKEN", "Invalid token"),
            };
            AuthRejection::unauthorized(code, message).into_response()
        })?;

        let user_id = get_user_id_from_claims(&claims).map_err(|_| {
            AuthRejection::unauthorized("INVALID_TOKEN", "Invalid user ID in token")
                .into_response()
        })?;

        let role = match claims.role.as_str() {
            "user" => UserRole::User,
            "admin" => UserRole::Admin,
            _ => {
                return Err(AuthRejection::unauthorized(
                    "INVALID_TOKEN",
                    "Invalid role in token",
                )
                .into_response())
            }
        };

        let kyc_status = match claims.kyc_status.as_str() {
            "not_submitted" => KycStatus::NotSubmitted,
            "pending" => KycStatus::Pending,
            "approved" => KycStatus::Approved,
            "rejected" => KycStatus::Rejected,
            _ => {
                return Err(AuthRejection::unauthorized(
                    "INVALID_TOKEN",
                    "Invalid KYC status in token",
                )
                .into_response())
            }
        };

        Ok(AuthenticatedUser {
            user_id,
            role,
            kyc_status,
        })
    }
}

/// Extractor requiring an approved KYC status
///
/// Gates privileged actions (creating shops, products, bookings).
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for VerifiedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if user.kyc_status != KycStatus::Approved {
            return Err(AuthRejection::forbidden(
                "KYC_REQUIRED",
                "Please complete KYC verification",
            )
            .into_response());
        }

        Ok(VerifiedUser(user))
    }
}

/// Extractor requiring the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !matches!(user.role, UserRole::Admin) {
            return Err(
                AuthRejection::forbidden("FORBIDDEN", "Admin access required").into_response(),
            );
        }

        Ok(AdminUser(user))
    }
}
