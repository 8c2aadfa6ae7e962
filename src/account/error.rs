//! Account service errors

use thiserror::Error;

use super::validation::ValidationError;
use crate::store::StoreError;
use crate::transfer::TransferError;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Invalid currency: {0}")]
    InvalidCurrency(#[from] ValidationError),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Account belongs to another user")]
    PermissionDenied,

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::InvalidAmount => "INVALID_AMOUNT",
            AccountError::InvalidCurrency(_) => "INVALID_CURRENCY",
            AccountError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            AccountError::PermissionDenied => "PERMISSION_DENIED",
            AccountError::Transfer(e) => e.code(),
            AccountError::Storage(_) => "STORAGE_FAILURE",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AccountError::InvalidAmount | AccountError::InvalidCurrency(_) => 400,
            AccountError::AccountNotFound => 404,
            AccountError::PermissionDenied => 403,
            AccountError::Transfer(e) => e.http_status(),
            AccountError::Storage(_) => 500,
        }
    }
}
