//! Bank Ledger - transactional money-transfer engine
//!
//! Accounts, balances and transfers on a single relational datastore with
//! row-level locking.
//!
//! # Modules
//!
//! - [`account`] - Account rows, currency validation, repository and service
//! - [`transfer`] - Transfer engine, ledger persistence and transfer service
//! - [`store`] - Storage capability traits, PostgreSQL and in-memory backends
//! - [`cache`] - TTL cache for account listings
//! - [`db`] - Connection pool and schema
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod account;
pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod store;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountError, AccountService, CurrencyCode, Transaction, UserId};
pub use cache::{CacheClient, TimedCacheClient};
pub use config::AppConfig;
pub use db::Database;
pub use store::{Datastore, MemoryStore, PgDatastore, StoreError, UnitOfWork};
pub use transfer::{
    LockOrder, TransferEngine, TransferError, TransferReceipt, TransferRequest, TransferService,
};
