//! Transfer request, receipt and engine settings

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::TransferError;
use crate::account::models::{AccountId, Transaction, UserId};
use crate::db::schema::fits_money_scale;

/// One money movement requested by an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Acting user; must own the source account
    pub user_id: UserId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(
        user_id: UserId,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
    ) -> Self {
        Self {
            user_id,
            from_account_id,
            to_account_id,
            amount,
        }
    }

    /// Checks that need no I/O, in reporting order.
    ///
    /// Amounts finer than the money columns would be rounded on write, so
    /// they are rejected as invalid.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.from_account_id == self.to_account_id {
            return Err(TransferError::SameAccountTransfer);
        }
        if self.amount <= Decimal::ZERO || !fits_money_scale(self.amount) {
            return Err(TransferError::InvalidAmount);
        }
        Ok(())
    }
}

/// Result of a committed transfer.
///
/// Carries both owners so the layer above can invalidate their cached
/// account listings.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub transaction: Transaction,
    pub source_owner: UserId,
    pub destination_owner: UserId,
}

impl TransferReceipt {
    pub fn owners(&self) -> [UserId; 2] {
        [self.source_owner, self.destination_owner]
    }
}

/// Order in which the engine takes the two row locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockOrder {
    /// Source first, then destination
    CallerOrder,
    /// Lower account id first; opposite-direction transfers cannot deadlock
    #[default]
    AscendingId,
}

impl LockOrder {
    /// The pair in the order it must be locked
    pub fn sequence(self, from: AccountId, to: AccountId) -> [AccountId; 2] {
        match self {
            LockOrder::CallerOrder => [from, to],
            LockOrder::AscendingId if to < from => [to, from],
            LockOrder::AscendingId => [from, to],
        }
    }
}
