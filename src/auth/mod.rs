//! Authentication domain module
//!
//! Registration, login, KYC, and JWT handling.

pub mod jwt;
mod service;

pub use jwt::{generate_token, get_user_id_from_claims, verify_token, Claims, JwtError};
pub use service::{AuthError, AuthService};
