//! Shop handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::VerifiedUser;
use crate::shop::{CreateShopRequest, Shop, ShopWithOwner};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ShopResponse {
    pub message: String,
    pub shop: Shop,
}

/// POST /api/shops (KYC-verified users only)
pub async fn create_shop(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(req): Json<CreateShopRequest>,
) -> ApiResult<(StatusCode, Json<ShopResponse>)> {
    req.validate()?;

    let shop = state.shop_service.create(user.user_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ShopResponse {
            message: "Shop created".to_string(),
            shop,
        }),
    ))
}

/// GET /api/shops
pub async fn list_shops(State(state): State<AppState>) -> ApiResult<Json<Vec<ShopWithOwner>>> {
    let shops = state.shop_service.list().await?;

    Ok(Json(shops))
}

/// GET /api/shops/:id
pub async fn get_shop(
    State(state): State<AppState>,
    Path(shop_id): Path<Uuid>,
) -> ApiResult<Json<Shop>> {
    let shop = state
        .shop_service
        .get(shop_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Shop not found".to_string()))?;

    Ok(Json(shop))
}
