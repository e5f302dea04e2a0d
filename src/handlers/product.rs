//! Product handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::VerifiedUser;
use crate::product::{CreateProductRequest, Product, UpdateProductRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: String,
    pub product: Product,
}

/// Query filter for product listing
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub shop_id: Option<Uuid>,
}

/// POST /api/products (KYC-verified shop owners only)
pub async fn create_product(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    req.validate()?;

    let product = state.product_service.create(user.user_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created".to_string(),
            product,
        }),
    ))
}

/// GET /api/products?shop_id=...
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.product_service.list(query.shop_id).await?;

    Ok(Json(products))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    let product = state
        .product_service
        .get(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// PUT /api/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    req.validate()?;

    let product = state
        .product_service
        .update(user.user_id, product_id, req)
        .await?;

    Ok(Json(ProductResponse {
        message: "Product updated".to_string(),
        product,
    }))
}
