//! PostgreSQL unit of work
//!
//! A unit of work is a plain sqlx transaction. sqlx rolls an uncommitted
//! transaction back when it is dropped, which is what cancellation relies on.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use super::{Datastore, StoreError, UnitOfWork};

pub type PgUnitOfWork = sqlx::Transaction<'static, Postgres>;

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<(), StoreError> {
        sqlx::Transaction::commit(self).await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        sqlx::Transaction::rollback(self).await?;
        Ok(())
    }
}

/// Begins sqlx transactions on a pool
#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
    /// `SET LOCAL lock_timeout` for every unit of work, when set
    lock_timeout_ms: Option<u64>,
}

impl PgDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout_ms: None,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout_ms: Option<u64>) -> Self {
        self.lock_timeout_ms = lock_timeout_ms;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    type Uow = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Some(ms) = self.lock_timeout_ms {
            // SET does not take bind parameters; the value is a plain integer
            sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", ms))
                .execute(&mut *tx)
                .await?;
        }

        Ok(tx)
    }
}
