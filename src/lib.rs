//! Rentora backend library
//!
//! A peer-to-peer rental marketplace backend: users with KYC verification,
//! shops and rentable products, a booking lifecycle state machine, an
//! internal wallet ledger, and an auto-refund scheduler.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod product;
pub mod rental;
pub mod routes;
pub mod scheduler;
pub mod shop;
pub mod state;
pub mod wallet;
