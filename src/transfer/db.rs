//! Transaction ledger persistence
//!
//! PostgreSQL `transactions` table. Rows are only ever inserted.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error};

use crate::account::models::{AccountId, NewTransaction, Transaction};
use crate::store::{PgUnitOfWork, StoreError, TransactionLog};

/// Ledger operations
#[derive(Clone)]
pub struct PgTransactionLog {
    pool: PgPool,
}

impl PgTransactionLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLog<PgUnitOfWork> for PgTransactionLog {
    async fn append_transaction(
        &self,
        uow: &mut PgUnitOfWork,
        transaction: NewTransaction,
    ) -> Result<Transaction, StoreError> {
        debug!(
            from_account_id = transaction.from_account_id,
            to_account_id = transaction.to_account_id,
            amount = %transaction.amount,
            "Appending ledger entry"
        );

        let row: Transaction = sqlx::query_as(
            r#"
            INSERT INTO transactions (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount, created_at
            "#,
        )
        .bind(transaction.from_account_id)
        .bind(transaction.to_account_id)
        .bind(transaction.amount)
        .fetch_one(&mut **uow)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to insert ledger entry"))?;

        Ok(row)
    }

    async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at
            FROM transactions
            WHERE from_account_id = $1 OR to_account_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| error!(account_id, error = %e, "Failed to list transactions"))?;

        Ok(rows)
    }
}
