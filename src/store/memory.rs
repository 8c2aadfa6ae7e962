//! In-memory datastore
//!
//! Implements every store capability in process. Row locks are per-account
//! async mutexes whose owned guards live inside the unit of work, so two
//! units of work touching the same account serialise exactly like
//! `SELECT ... FOR UPDATE`. Writes are staged in the unit of work and only
//! published on commit; dropping the unit of work discards them.
//!
//! Readers outside a unit of work see committed state only and never wait on
//! row locks.
//!
//! Faults can be injected per operation to exercise rollback paths.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::debug;

use super::{
    AccountRepository, AccountStore, Datastore, StoreError, TransactionLog, UnitOfWork,
};
use crate::account::models::{
    ACCOUNT_NUMBER_BASE, Account, AccountId, NewTransaction, Transaction, UserId,
};
use crate::account::validation::CurrencyCode;

/// Operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Begin,
    LockAccount(AccountId),
    UpdateBalance(AccountId),
    AppendTransaction,
    Commit,
}

struct Tables {
    /// Committed account rows
    accounts: DashMap<AccountId, Account>,
    row_locks: DashMap<AccountId, Arc<RowLock<()>>>,
    transactions: Mutex<Vec<Transaction>>,
    /// Held for writing while a commit publishes, so readers never see half of one
    publish: RwLock<()>,
    next_account_id: AtomicI64,
    next_transaction_id: AtomicI64,
    last_account_number: Mutex<i64>,
    faults: Mutex<HashSet<Fault>>,
    /// Pause before publishing, standing in for a slow COMMIT round trip
    commit_delay: Mutex<Option<Duration>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Tables {
    fn check(&self, fault: Fault) -> Result<(), StoreError> {
        if lock(&self.faults).contains(&fault) {
            debug!(?fault, "Injected fault triggered");
            return Err(StoreError::Unavailable(format!("injected fault: {:?}", fault)));
        }
        Ok(())
    }

    fn row_lock(&self, account_id: AccountId) -> Option<Arc<RowLock<()>>> {
        self.row_locks.get(&account_id).map(|l| Arc::clone(l.value()))
    }
}

/// In-process implementation of all store capabilities
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Tables {
                accounts: DashMap::new(),
                row_locks: DashMap::new(),
                transactions: Mutex::new(Vec::new()),
                publish: RwLock::new(()),
                next_account_id: AtomicI64::new(1),
                next_transaction_id: AtomicI64::new(1),
                last_account_number: Mutex::new(ACCOUNT_NUMBER_BASE),
                faults: Mutex::new(HashSet::new()),
                commit_delay: Mutex::new(None),
            }),
        }
    }

    /// Open an account with an initial balance
    pub fn open_account(&self, user_id: UserId, currency: &CurrencyCode, balance: Decimal) -> Account {
        let account_number = {
            let mut last = lock(&self.tables.last_account_number);
            *last += 1;
            *last
        };
        let account = Account {
            id: self.tables.next_account_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            account_number,
            balance,
            currency: currency.as_str().to_string(),
            created_at: Utc::now(),
        };

        self.tables
            .row_locks
            .insert(account.id, Arc::new(RowLock::new(())));
        self.tables.accounts.insert(account.id, account.clone());
        account
    }

    /// Committed state of one account
    pub fn account(&self, account_id: AccountId) -> Option<Account> {
        let _published = self.tables.publish.read().unwrap_or_else(PoisonError::into_inner);
        self.tables.accounts.get(&account_id).map(|a| a.clone())
    }

    /// Every committed ledger row in insertion order
    pub fn transactions(&self) -> Vec<Transaction> {
        lock(&self.tables.transactions).clone()
    }

    pub fn inject(&self, fault: Fault) {
        lock(&self.tables.faults).insert(fault);
    }

    pub fn clear_faults(&self) {
        lock(&self.tables.faults).clear();
    }

    pub fn set_commit_delay(&self, delay: Option<Duration>) {
        *lock(&self.tables.commit_delay) = delay;
    }

    fn sorted_accounts(&self, filter: impl Fn(&Account) -> bool) -> Vec<Account> {
        let _published = self.tables.publish.read().unwrap_or_else(PoisonError::into_inner);
        let mut accounts: Vec<Account> = self
            .tables
            .accounts
            .iter()
            .filter(|a| filter(a.value()))
            .map(|a| a.value().clone())
            .collect();
        accounts.sort_by_key(|a| a.id);
        accounts
    }
}

/// Unit of work over a [`MemoryStore`]
pub struct MemoryUnitOfWork {
    tables: Arc<Tables>,
    held: HashMap<AccountId, OwnedMutexGuard<()>>,
    staged_balances: HashMap<AccountId, Decimal>,
    staged_transactions: Vec<Transaction>,
}

impl MemoryUnitOfWork {
    /// Accounts whose row lock this unit of work holds
    pub fn locked_accounts(&self) -> usize {
        self.held.len()
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> Result<(), StoreError> {
        self.tables.check(Fault::Commit)?;

        let delay = *lock(&self.tables.commit_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let MemoryUnitOfWork {
            tables,
            held,
            staged_balances,
            staged_transactions,
        } = self;

        {
            let _publishing = tables.publish.write().unwrap_or_else(PoisonError::into_inner);
            for (account_id, balance) in &staged_balances {
                if let Some(mut account) = tables.accounts.get_mut(account_id) {
                    account.balance = *balance;
                }
            }
            lock(&tables.transactions).extend(staged_transactions);
        }

        // Row locks are released only after the writes are visible
        drop(held);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        debug!(
            locked = self.held.len(),
            staged = self.staged_balances.len(),
            "Discarding unit of work"
        );
        Ok(())
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    type Uow = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, StoreError> {
        self.tables.check(Fault::Begin)?;
        Ok(MemoryUnitOfWork {
            tables: Arc::clone(&self.tables),
            held: HashMap::new(),
            staged_balances: HashMap::new(),
            staged_transactions: Vec::new(),
        })
    }
}

#[async_trait]
impl AccountStore<MemoryUnitOfWork> for MemoryStore {
    async fn get_account_for_update(
        &self,
        uow: &mut MemoryUnitOfWork,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        self.tables.check(Fault::LockAccount(account_id))?;

        if !uow.held.contains_key(&account_id) {
            let Some(row_lock) = self.tables.row_lock(account_id) else {
                return Ok(None);
            };
            let guard = row_lock.lock_owned().await;
            uow.held.insert(account_id, guard);
        }

        let account = self.account(account_id).map(|mut account| {
            if let Some(balance) = uow.staged_balances.get(&account_id) {
                account.balance = *balance;
            }
            account
        });
        Ok(account)
    }

    async fn update_balance(
        &self,
        uow: &mut MemoryUnitOfWork,
        account_id: AccountId,
        new_balance: Decimal,
    ) -> Result<(), StoreError> {
        self.tables.check(Fault::UpdateBalance(account_id))?;

        if !uow.held.contains_key(&account_id) {
            return Err(StoreError::Unavailable(format!(
                "account {} is not locked by this unit of work",
                account_id
            )));
        }
        uow.staged_balances.insert(account_id, new_balance);
        Ok(())
    }
}

#[async_trait]
impl TransactionLog<MemoryUnitOfWork> for MemoryStore {
    async fn append_transaction(
        &self,
        uow: &mut MemoryUnitOfWork,
        transaction: NewTransaction,
    ) -> Result<Transaction, StoreError> {
        self.tables.check(Fault::AppendTransaction)?;

        let row = Transaction {
            id: self.tables.next_transaction_id.fetch_add(1, Ordering::SeqCst),
            from_account_id: transaction.from_account_id,
            to_account_id: transaction.to_account_id,
            amount: transaction.amount,
            created_at: Utc::now(),
        };
        uow.staged_transactions.push(row.clone());
        Ok(row)
    }

    async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut rows: Vec<Transaction> = lock(&self.tables.transactions)
            .iter()
            .filter(|t| t.touches(account_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create_account(
        &self,
        user_id: UserId,
        currency: &CurrencyCode,
    ) -> Result<Account, StoreError> {
        Ok(self.open_account(user_id, currency, Decimal::ZERO))
    }

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.account(account_id))
    }

    async fn list_accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        Ok(self.sorted_accounts(|a| a.user_id == user_id))
    }

    async fn list_all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.sorted_accounts(|_| true))
    }

    async fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Option<Account>, StoreError> {
        let Some(row_lock) = self.tables.row_lock(account_id) else {
            return Ok(None);
        };
        let _row = row_lock.lock().await;

        let _publishing = self
            .tables
            .publish
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(mut account) = self.tables.accounts.get_mut(&account_id) else {
            return Ok(None);
        };
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::Unavailable("balance overflow".to_string()))?;
        Ok(Some(account.clone()))
    }

    async fn last_account_number(&self) -> Result<i64, StoreError> {
        Ok(*lock(&self.tables.last_account_number))
    }
}
