//! Money transfers
//!
//! A transfer moves funds between two accounts in one unit of work:
//!
//! ```text
//! validate → begin → lock source/destination → check rules → debit/credit
//!          → append ledger row → commit
//!                     ↓ any failure
//!                  rollback
//! ```
//!
//! # Invariants
//!
//! 1. **No negative balances**: the source is checked under its row lock
//! 2. **All or nothing**: balances and the ledger row commit together
//! 3. **Not idempotent**: retrying a transfer moves the money again
//! 4. **Lock order**: ascending account id by default, see [`LockOrder`]

pub mod db;
pub mod engine;
pub mod error;
pub mod service;
pub mod types;

pub use db::PgTransactionLog;
pub use engine::TransferEngine;
pub use error::TransferError;
pub use service::TransferService;
pub use types::{LockOrder, TransferReceipt, TransferRequest};
