//! Authentication service
//!
//! Core business logic for registration, login, and KYC review.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{KycStatus, User};

use super::jwt::{generate_token, JwtError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Phone number is already registered")]
    PhoneTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("KYC is not pending")]
    KycNotPending,

    #[error("KYC documents already submitted")]
    KycAlreadySubmitted,

    #[error("Token error: {0}")]
    TokenError(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::DatabaseError(e.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::TokenError(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthError::DatabaseError(format!("Password hashing failed: {}", e))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DatabaseError(m) => ApiError::Database(m),
            AuthError::InvalidInput(m) => ApiError::Validation(m),
            AuthError::EmailTaken | AuthError::PhoneTaken => ApiError::Conflict(err.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::KycNotPending | AuthError::KycAlreadySubmitted => {
                ApiError::State(err.to_string())
            }
            AuthError::TokenError(m) => ApiError::Internal(m),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    jwt_ttl_seconds: i64,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(db_pool: PgPool, jwt_secret: String, jwt_ttl_seconds: i64) -> Self {
        Self {
            db_pool,
            jwt_secret,
            jwt_ttl_seconds,
        }
    }

    /// Register a new user and open their wallet in the same transaction
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        address: Option<String>,
        password: &str,
    ) -> Result<User, AuthError> {
        validate_phone(phone)?;
        validate_password(password)?;

        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.db_pool)
                .await?;
        if existing.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.db_pool)
            .await?;
        if existing.is_some() {
            return Err(AuthError::PhoneTaken);
        }

        let password_hash = bcrypt::hash(password, 10)?;
        let user_id = Uuid::new_v4();

        let mut tx = self.db_pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, email, phone, address, password_hash, role, kyc_status)
            VALUES ($1, $2, $3, $4, $5, $6, 'user', 'not_submitted')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(&address)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO wallets (user_id, balance) VALUES ($1, 0)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    /// Verify credentials and issue a token
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        let valid = bcrypt::verify(password, &user.password_hash)?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token(&user, &self.jwt_secret, self.jwt_ttl_seconds)?;

        Ok((token, user))
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Submit KYC documents; moves the user to `pending`
    pub async fn submit_kyc(
        &self,
        user_id: Uuid,
        id_card_image: &str,
        face_image: &str,
    ) -> Result<User, AuthError> {
        let user = self.get_user_by_id(user_id).await?;

        match user.kyc_status {
            KycStatus::NotSubmitted | KycStatus::Rejected => {}
            KycStatus::Pending | KycStatus::Approved => {
                return Err(AuthError::KycAlreadySubmitted)
            }
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET kyc_status = 'pending', id_card_image = $1, face_image = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(id_card_image)
        .bind(face_image)
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(user)
    }

    /// List users awaiting KYC review
    pub async fn list_pending_kyc(&self) -> Result<Vec<User>, AuthError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE kyc_status = 'pending' ORDER BY created_at ASC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(users)
    }

    /// Approve or reject a pending KYC submission
    pub async fn review_kyc(&self, user_id: Uuid, approve: bool) -> Result<User, AuthError> {
        let user = self.get_user_by_id(user_id).await?;

        if user.kyc_status != KycStatus::Pending {
            return Err(AuthError::KycNotPending);
        }

        let next = if approve {
            KycStatus::Approved
        } else {
            KycStatus::Rejected
        };

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET kyc_status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(next)
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(user_id = %user.id, status = next.as_str(), "KYC reviewed");

        Ok(user)
    }

    /// JWT signing secret (used by the auth extractor)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }
}

/// Phone numbers are 10 digits starting with 08 or 09
fn validate_phone(phone: &str) -> Result<(), AuthError> {
    let valid = phone.len() == 10
        && phone.chars().all(|c| c.is_ascii_digit())
        && (phone.starts_with("08") || phone.starts_with("09"));

    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(
            "Phone must be 10 digits starting with 08 or 09".to_string(),
        ))
    }
}

/// Passwords need at least 8 ASCII alphanumeric characters with an
/// uppercase letter, a lowercase letter, and a digit
fn validate_password(password: &str) -> Result<(), AuthError> {
    let long_enough = password.len() >= 8;
    let ascii_alnum = password.chars().all(|c| c.is_ascii_alphanumeric());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && ascii_alnum && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(
            "Password must be at least 8 characters with uppercase, lowercase and a digit"
                .to_string(),
        ))
    }
}
