//! API handlers for the Rentora backend

pub mod admin;
pub mod auth;
pub mod product;
pub mod rental;
pub mod shop;
pub mod wallet;

pub use admin::*;
pub use auth::*;
pub use product::*;
pub use rental::*;
pub use shop::*;
pub use wallet::*;
