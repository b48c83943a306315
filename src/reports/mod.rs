//! Reports module for Keepsake
//!
//! Provides the transaction ledger for account subtrees.

pub mod ledger;

pub use ledger::{TransactionRecord, TransactionView};
