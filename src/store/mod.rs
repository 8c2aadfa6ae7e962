//! Storage capabilities
//!
//! Narrow capability traits consumed by the transfer engine and the account
//! service. Every mutating call that must be atomic with others takes an
//! explicit unit of work (`&mut U`); nothing is threaded through ambient state.
//!
//! Two backends implement them:
//! - [`postgres`] - sqlx / PostgreSQL, row locks via `SELECT ... FOR UPDATE`
//! - [`memory`] - in-process tables with per-row async locks and fault injection

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::models::{Account, AccountId, NewTransaction, Transaction, UserId};
use crate::account::validation::CurrencyCode;

pub use memory::{Fault, MemoryStore, MemoryUnitOfWork};
pub use postgres::{PgDatastore, PgUnitOfWork};

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// One atomic unit of work.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards
/// every write made through it and releases its row locks.
#[async_trait]
pub trait UnitOfWork: Send + Sized {
    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

/// Opens units of work against a datastore
#[async_trait]
pub trait Datastore: Send + Sync {
    type Uow: UnitOfWork;

    async fn begin(&self) -> Result<Self::Uow, StoreError>;
}

/// Locked account access inside a unit of work
#[async_trait]
pub trait AccountStore<U: Send>: Send + Sync {
    /// Read an account and take its exclusive row lock.
    ///
    /// The lock is held until `uow` commits, rolls back or is dropped.
    /// Returns `Ok(None)` when the account does not exist.
    async fn get_account_for_update(
        &self,
        uow: &mut U,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError>;

    /// Overwrite the balance of an account inside `uow`
    async fn update_balance(
        &self,
        uow: &mut U,
        account_id: AccountId,
        new_balance: Decimal,
    ) -> Result<(), StoreError>;
}

/// Append-only transfer ledger
#[async_trait]
pub trait TransactionLog<U: Send>: Send + Sync {
    /// Insert one ledger row inside `uow`; the store assigns id and timestamp
    async fn append_transaction(
        &self,
        uow: &mut U,
        transaction: NewTransaction,
    ) -> Result<Transaction, StoreError>;

    /// Every transaction touching `account_id` on either side, newest first
    async fn list_by_account(&self, account_id: AccountId)
    -> Result<Vec<Transaction>, StoreError>;
}

/// Account CRUD outside the transfer path
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account with a zero balance and the next account number
    async fn create_account(
        &self,
        user_id: UserId,
        currency: &CurrencyCode,
    ) -> Result<Account, StoreError>;

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn list_accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>, StoreError>;

    async fn list_all_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Atomically add `amount` to the balance; `None` if the account is absent
    async fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Option<Account>, StoreError>;

    /// Highest assigned account number, or the base number when none exist
    async fn last_account_number(&self) -> Result<i64, StoreError>;
}
