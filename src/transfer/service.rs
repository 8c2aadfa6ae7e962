//! Transfer service
//!
//! Runs the engine for an acting user and keeps the account-listing cache
//! honest: after a committed transfer both owners' listings are dropped.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use super::engine::TransferEngine;
use super::types::TransferRequest;
use crate::account::error::AccountError;
use crate::account::models::{AccountId, Transaction, UserId};
use crate::account::service::AccountService;
use crate::store::{AccountStore, Datastore, TransactionLog};

pub struct TransferService<D, A, L> {
    engine: TransferEngine<D, A, L>,
    accounts: Arc<AccountService>,
    deadline: Option<Duration>,
}

impl<D, A, L> TransferService<D, A, L>
where
    D: Datastore,
    A: AccountStore<D::Uow>,
    L: TransactionLog<D::Uow>,
{
    pub fn new(engine: TransferEngine<D, A, L>, accounts: Arc<AccountService>) -> Self {
        Self {
            engine,
            accounts,
            deadline: None,
        }
    }

    /// Bound every transfer by `deadline`
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn engine(&self) -> &TransferEngine<D, A, L> {
        &self.engine
    }

    pub async fn transfer(
        &self,
        user_id: UserId,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, AccountError> {
        let request = TransferRequest::new(user_id, from_account_id, to_account_id, amount);
        let receipt = match self.deadline {
            Some(deadline) => self.engine.transfer_money_within(request, deadline).await?,
            None => self.engine.transfer_money(request).await?,
        };

        self.accounts.invalidate_owners(&receipt.owners()).await;
        Ok(receipt.transaction)
    }

    /// Ledger rows touching an account the user owns, newest first
    pub async fn list_transactions_for_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, AccountError> {
        let account = self.accounts.find_account(account_id).await?;
        if !account.is_owned_by(user_id) {
            return Err(AccountError::PermissionDenied);
        }

        Ok(self.engine.ledger().list_by_account(account_id).await?)
    }
}
