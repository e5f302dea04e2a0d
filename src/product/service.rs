//! Product service layer

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

use super::model::{CreateProductRequest, Product, UpdateProductRequest};

/// Product service errors
#[derive(Error, Debug)]
pub enum ProductError {
    #[error("Product not found")]
    NotFound,

    #[error("You must open a shop before listing products")]
    NoShop,

    #[error("Only the shop owner can modify this product")]
    NotOwner,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound => ApiError::NotFound(err.to_string()),
            ProductError::NoShop => ApiError::State(err.to_string()),
            ProductError::NotOwner => ApiError::Forbidden(err.to_string()),
            ProductError::Database(e) => ApiError::Database(e.to_string()),
        }
    }
}

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db_pool: PgPool,
}

impl ProductService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Create a product under the caller's shop
    pub async fn create(
        &self,
        owner_id: Uuid,
        req: CreateProductRequest,
    ) -> Result<Product, ProductError> {
        let shop: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM shops WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(&self.db_pool)
            .await?;

        let (shop_id,) = shop.ok_or(ProductError::NoShop)?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, shop_id, name, description, price_per_day, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(shop_id)
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(req.price_per_day)
        .bind(req.quantity)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(product_id = %product.id, shop_id = %shop_id, "Product created");

        Ok(product)
    }

    /// Get a product by ID
    pub async fn get(&self, product_id: Uuid) -> Result<Option<Product>, ProductError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(product)
    }

    /// List products, optionally filtered by shop
    pub async fn list(&self, shop_id: Option<Uuid>) -> Result<Vec<Product>, ProductError> {
        let products = match shop_id {
            Some(shop_id) => {
                sqlx::query_as::<_, Product>(
                    "SELECT * FROM products WHERE shop_id = $1 ORDER BY created_at DESC",
                )
                .bind(shop_id)
                .fetch_all(&self.db_pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
                    .fetch_all(&self.db_pool)
                    .await?
            }
        };

        Ok(products)
    }

    /// Update a product; only the owning shop's owner may do this
    pub async fn update(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<Product, ProductError> {
        let current = self
            .get(product_id)
            .await?
            .ok_or(ProductError::NotFound)?;

        let shop_owner: (Uuid,) = sqlx::query_as("SELECT owner_id FROM shops WHERE id = $1")
            .bind(current.shop_id)
            .fetch_one(&self.db_pool)
            .await?;

        if shop_owner.0 != owner_id {
            return Err(ProductError::NotOwner);
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                price_per_day = COALESCE($3, price_per_day),
                quantity = COALESCE($4, quantity),
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.description)
        .bind(req.price_per_day)
        .bind(req.quantity)
        .bind(product_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(product)
    }
}
