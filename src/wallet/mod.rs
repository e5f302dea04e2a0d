//! Wallet domain module
//!
//! The internal wallet ledger: per-user balances mutated only through
//! credit/debit, with an append-only transaction trail.

mod ledger;
mod model;

pub use ledger::{LedgerError, WalletLedger};
pub use model::*;
