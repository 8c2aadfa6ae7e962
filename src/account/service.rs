//! Account service
//!
//! Account creation, deposits and the cache-aside account listing. Every
//! write that changes what a user's listing shows invalidates that user's
//! cache entry.
//!
//! A listing read from the database can be overtaken by an invalidation
//! before it reaches the cache. Each user has a generation counter that
//! invalidation bumps; a loader that sees the counter move while it was
//! reading drops the entry it just wrote.

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::AccountError;
use super::models::{Account, AccountId, UserId};
use super::validation::CurrencyCode;
use crate::cache::{CacheClient, accounts_cache_key};
use crate::db::schema::fits_money_scale;
use crate::store::AccountRepository;

pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    cache: Arc<dyn CacheClient>,
    generations: DashMap<UserId, u64>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepository>, cache: Arc<dyn CacheClient>) -> Self {
        Self {
            repository,
            cache,
            generations: DashMap::new(),
        }
    }

    fn generation(&self, user_id: UserId) -> u64 {
        self.generations.get(&user_id).map_or(0, |g| *g)
    }

    /// Open a zero-balance account with the next account number
    pub async fn create_account(
        &self,
        user_id: UserId,
        currency: &str,
    ) -> Result<Account, AccountError> {
        let currency = CurrencyCode::new(currency)?;
        let account = self.repository.create_account(user_id, &currency).await?;

        self.invalidate_owners(&[user_id]).await;
        Ok(account)
    }

    /// Accounts of one user, served from the cache when possible
    pub async fn list_accounts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Account>, AccountError> {
        let key = accounts_cache_key(user_id);

        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_str::<Vec<Account>>(&cached) {
                Ok(accounts) => {
                    debug!(user_id, "Account listing served from cache");
                    return Ok(accounts);
                }
                Err(e) => warn!(user_id, error = %e, "Discarding undecodable cache entry"),
            }
        }

        let seen = self.generation(user_id);
        let accounts = self.repository.list_accounts_by_user(user_id).await?;
        match serde_json::to_string(&accounts) {
            Ok(encoded) => {
                self.cache.set(&key, encoded).await;
                if self.generation(user_id) != seen {
                    debug!(user_id, "Listing invalidated while loading; dropping entry");
                    self.cache.delete(&[key]).await;
                }
            }
            Err(e) => warn!(user_id, error = %e, "Failed to encode account listing"),
        }
        Ok(accounts)
    }

    /// Every account; never cached
    pub async fn list_all_accounts(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.repository.list_all_accounts().await?)
    }

    pub async fn find_account(&self, account_id: AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_account(account_id)
            .await?
            .ok_or(AccountError::AccountNotFound)
    }

    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Account, AccountError> {
        if amount <= Decimal::ZERO || !fits_money_scale(amount) {
            return Err(AccountError::InvalidAmount);
        }

        let account = self
            .repository
            .deposit(account_id, amount)
            .await?
            .ok_or(AccountError::AccountNotFound)?;

        info!(
            account_id,
            amount = %amount,
            balance = %account.balance,
            "Deposit applied"
        );
        self.invalidate_owners(&[account.user_id]).await;
        Ok(account)
    }

    /// Drop the cached listings of the given owners
    pub async fn invalidate_owners(&self, user_ids: &[UserId]) {
        let owners: BTreeSet<UserId> = user_ids.iter().copied().collect();
        // Bumped before the delete so an in-flight load sees it after its set
        for &user_id in &owners {
            *self.generations.entry(user_id).or_insert(0) += 1;
        }
        let keys: Vec<String> = owners.into_iter().map(accounts_cache_key).collect();
        if !keys.is_empty() {
            self.cache.delete(&keys).await;
        }
    }
}
