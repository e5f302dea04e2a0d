//! Middleware for the Rentora API
//!
//! Request tracing and authentication extractors.

pub mod auth;
mod tracing;

pub use auth::{AdminUser, AuthenticatedUser, VerifiedUser};
pub use tracing::request_tracing;
