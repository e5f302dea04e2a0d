//! Shop models and data structures

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Shop model: one per owner
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Shop {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Shop joined with its owner's display name
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ShopWithOwner {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a shop
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShopRequest {
    #[validate(length(min = 1, max = 100, message = "Shop name is required"))]
    pub name: String,
    pub description: Option<String>,
}
