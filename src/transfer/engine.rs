//! Transfer Engine
//!
//! Moves funds between two accounts as one unit of work. Every business
//! rule is checked after both row locks are held and before the first write;
//! any failure after that point rolls the whole unit back.

use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::types::{LockOrder, TransferReceipt, TransferRequest};
use crate::account::models::{Account, AccountId, NewTransaction};
use crate::store::{AccountStore, Datastore, StoreError, TransactionLog, UnitOfWork};

/// Transfer engine over one datastore and its two collaborators
pub struct TransferEngine<D, A, L> {
    datastore: D,
    accounts: A,
    ledger: L,
    lock_order: LockOrder,
}

impl<D, A, L> TransferEngine<D, A, L>
where
    D: Datastore,
    A: AccountStore<D::Uow>,
    L: TransactionLog<D::Uow>,
{
    pub fn new(datastore: D, accounts: A, ledger: L) -> Self {
        Self {
            datastore,
            accounts,
            ledger,
            lock_order: LockOrder::default(),
        }
    }

    pub fn with_lock_order(mut self, lock_order: LockOrder) -> Self {
        self.lock_order = lock_order;
        self
    }

    pub fn lock_order(&self) -> LockOrder {
        self.lock_order
    }

    /// Read side of the ledger
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Execute one transfer.
    ///
    /// Not idempotent: two identical calls move the money twice.
    pub async fn transfer_money(
        &self,
        request: TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        let (uow, receipt) = self.prepare(&request).await?;
        self.commit(uow, &request, receipt).await
    }

    /// [`Self::transfer_money`] bounded by a deadline.
    ///
    /// The deadline covers begin, lock waits and writes. When it elapses the
    /// unit of work is dropped, which rolls it back. Commit runs outside the
    /// deadline, so a transfer that committed is never reported as
    /// [`TransferError::DeadlineExceeded`].
    pub async fn transfer_money_within(
        &self,
        request: TransferRequest,
        deadline: Duration,
    ) -> Result<TransferReceipt, TransferError> {
        let (uow, receipt) = match tokio::time::timeout(deadline, self.prepare(&request)).await {
            Ok(prepared) => prepared?,
            Err(_) => {
                warn!(
                    from_account_id = request.from_account_id,
                    to_account_id = request.to_account_id,
                    deadline_ms = deadline.as_millis() as u64,
                    "Transfer deadline exceeded"
                );
                return Err(TransferError::DeadlineExceeded);
            }
        };
        self.commit(uow, &request, receipt).await
    }

    /// Everything up to commit; on failure the unit of work is rolled back
    async fn prepare(
        &self,
        request: &TransferRequest,
    ) -> Result<(D::Uow, TransferReceipt), TransferError> {
        request.validate()?;

        let mut uow = self.datastore.begin().await.inspect_err(|e| {
            error!(error = %e, "Failed to begin unit of work");
        })?;

        match self.execute(&mut uow, request).await {
            Ok(receipt) => Ok((uow, receipt)),
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed, unit of work dropped");
                }
                log_failure(request, &e);
                Err(e)
            }
        }
    }

    async fn commit(
        &self,
        uow: D::Uow,
        request: &TransferRequest,
        receipt: TransferReceipt,
    ) -> Result<TransferReceipt, TransferError> {
        uow.commit().await.inspect_err(|e| {
            error!(
                from_account_id = request.from_account_id,
                to_account_id = request.to_account_id,
                error = %e,
                "Commit failed, transfer rolled back"
            );
        })?;

        info!(
            transaction_id = receipt.transaction.id,
            user_id = request.user_id,
            from_account_id = request.from_account_id,
            to_account_id = request.to_account_id,
            amount = %request.amount,
            "Transfer committed"
        );
        Ok(receipt)
    }

    async fn execute(
        &self,
        uow: &mut D::Uow,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        let (source, destination) = self.lock_pair(uow, request).await?;

        if !source.is_owned_by(request.user_id) {
            return Err(TransferError::PermissionDenied);
        }
        if source.balance < request.amount {
            return Err(TransferError::InsufficientFunds {
                available: source.balance,
                requested: request.amount,
            });
        }
        if source.currency != destination.currency {
            return Err(TransferError::CurrencyMismatch {
                source_currency: source.currency,
                destination_currency: destination.currency,
            });
        }

        let debited = source.balance - request.amount;
        let credited = destination
            .balance
            .checked_add(request.amount)
            .ok_or(TransferError::BalanceOverflow)?;

        self.accounts
            .update_balance(uow, source.id, debited)
            .await?;
        self.accounts
            .update_balance(uow, destination.id, credited)
            .await?;

        let transaction = self
            .ledger
            .append_transaction(
                uow,
                NewTransaction {
                    from_account_id: source.id,
                    to_account_id: destination.id,
                    amount: request.amount,
                },
            )
            .await?;

        Ok(TransferReceipt {
            transaction,
            source_owner: source.user_id,
            destination_owner: destination.user_id,
        })
    }

    /// Lock both rows in the configured order.
    ///
    /// A missing source is reported before a missing destination whatever
    /// the lock order.
    async fn lock_pair(
        &self,
        uow: &mut D::Uow,
        request: &TransferRequest,
    ) -> Result<(Account, Account), TransferError> {
        let from = request.from_account_id;
        let [first, second] = self.lock_order.sequence(from, request.to_account_id);

        let first_row = self.lock(uow, first).await?;
        if first_row.is_none() && first == from {
            return Err(TransferError::SenderAccountNotFound);
        }
        let second_row = self.lock(uow, second).await?;

        let (source, destination) = if first == from {
            (first_row, second_row)
        } else {
            (second_row, first_row)
        };
        let source = source.ok_or(TransferError::SenderAccountNotFound)?;
        let destination = destination.ok_or(TransferError::ReceiverAccountNotFound)?;
        Ok((source, destination))
    }

    async fn lock(
        &self,
        uow: &mut D::Uow,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        debug!(account_id, "Acquiring row lock");
        self.accounts.get_account_for_update(uow, account_id).await
    }
}

fn log_failure(request: &TransferRequest, err: &TransferError) {
    if err.is_rejection() {
        debug!(
            user_id = request.user_id,
            from_account_id = request.from_account_id,
            to_account_id = request.to_account_id,
            code = err.code(),
            "Transfer rejected"
        );
    } else {
        error!(
            user_id = request.user_id,
            from_account_id = request.from_account_id,
            to_account_id = request.to_account_id,
            error = %err,
            "Transfer failed, rolled back"
        );
    }
}
