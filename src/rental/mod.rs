//! Rental domain module
//!
//! The booking lifecycle engine: state machine, fee arithmetic, and the
//! transactional transition service.

pub mod fees;
mod model;
mod service;

pub use model::*;
pub use service::{RentalError, RentalService};
