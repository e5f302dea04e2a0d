//! Shop service layer

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

use super::model::{CreateShopRequest, Shop, ShopWithOwner};

/// Shop service errors
#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Shop not found")]
    NotFound,

    #[error("You already have a shop")]
    AlreadyExists,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::NotFound => ApiError::NotFound(err.to_string()),
            ShopError::AlreadyExists => ApiError::Conflict(err.to_string()),
            ShopError::Database(e) => ApiError::Database(e.to_string()),
        }
    }
}

/// Shop service
#[derive(Clone)]
pub struct ShopService {
    db_pool: PgPool,
}

impl ShopService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Create a shop for the owner; at most one shop per user
    pub async fn create(&self, owner_id: Uuid, req: CreateShopRequest) -> Result<Shop, ShopError> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM shops WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_optional(&self.db_pool)
                .await?;
        if existing.is_some() {
            return Err(ShopError::AlreadyExists);
        }

        let description = req
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let shop = sqlx::query_as::<_, Shop>(
            r#"
            INSERT INTO shops (id, name, description, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(description)
        .bind(owner_id)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(shop_id = %shop.id, owner_id = %owner_id, "Shop created");

        Ok(shop)
    }

    /// Get a shop by ID
    pub async fn get(&self, shop_id: Uuid) -> Result<Option<Shop>, ShopError> {
        let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = $1")
            .bind(shop_id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(shop)
    }

    /// List all shops with their owner's name, newest first
    pub async fn list(&self) -> Result<Vec<ShopWithOwner>, ShopError> {
        let shops = sqlx::query_as::<_, ShopWithOwner>(
            r#"
            SELECT s.id, s.name, s.description, s.owner_id, u.full_name AS owner_name, s.created_at
            FROM shops s
            JOIN users u ON s.owner_id = u.id
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(shops)
    }
}
