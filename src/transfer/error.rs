//! Transfer Error Types
//!
//! Closed set of failures the transfer engine can report. Callers switch on
//! the variant (or on `code()`) to pick a transport response.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum TransferError {
    // === Validation Errors (rejected before any I/O) ===
    #[error("Source and destination account cannot be the same")]
    SameAccountTransfer,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    // === Account Errors ===
    #[error("Sender account not found")]
    SenderAccountNotFound,

    #[error("Receiver account not found")]
    ReceiverAccountNotFound,

    #[error("You can only transfer money from your own account")]
    PermissionDenied,

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error(
        "Currency mismatch between accounts: {source_currency} -> {destination_currency}"
    )]
    CurrencyMismatch {
        source_currency: String,
        destination_currency: String,
    },

    #[error("Destination balance would overflow")]
    BalanceOverflow,

    // === System Errors ===
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    #[error("Transfer deadline exceeded")]
    DeadlineExceeded,
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::SenderAccountNotFound => "SENDER_ACCOUNT_NOT_FOUND",
            TransferError::ReceiverAccountNotFound => "RECEIVER_ACCOUNT_NOT_FOUND",
            TransferError::PermissionDenied => "PERMISSION_DENIED",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            TransferError::BalanceOverflow => "BALANCE_OVERFLOW",
            TransferError::StorageFailure(_) => "STORAGE_FAILURE",
            TransferError::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::SenderAccountNotFound | TransferError::ReceiverAccountNotFound => 404,
            TransferError::PermissionDenied => 403,
            TransferError::SameAccountTransfer
            | TransferError::InvalidAmount
            | TransferError::InsufficientFunds { .. }
            | TransferError::CurrencyMismatch { .. } => 400,
            TransferError::BalanceOverflow
            | TransferError::StorageFailure(_)
            | TransferError::DeadlineExceeded => 500,
        }
    }

    /// Business-rule rejections; these never leave a write behind
    pub fn is_rejection(&self) -> bool {
        self.http_status() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TransferError::SameAccountTransfer.code(),
            "SAME_ACCOUNT_TRANSFER"
        );
        assert_eq!(
            TransferError::InsufficientFunds {
                available: Decimal::ZERO,
                requested: Decimal::ONE,
            }
            .code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(TransferError::PermissionDenied.code(), "PERMISSION_DENIED");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransferError::SenderAccountNotFound.http_status(), 404);
        assert_eq!(TransferError::ReceiverAccountNotFound.http_status(), 404);
        assert_eq!(TransferError::PermissionDenied.http_status(), 403);
        assert_eq!(TransferError::InvalidAmount.http_status(), 400);
        assert_eq!(
            TransferError::CurrencyMismatch {
                source_currency: "TRY".into(),
                destination_currency: "USD".into(),
            }
            .http_status(),
            400
        );
        assert_eq!(
            TransferError::StorageFailure(StoreError::Unavailable("x".into())).http_status(),
            500
        );
        assert_eq!(TransferError::DeadlineExceeded.http_status(), 500);
    }

    #[test]
    fn test_display() {
        let err = TransferError::InsufficientFunds {
            available: "50.00".parse().unwrap(),
            requested: "100.00".parse().unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: available 50.00, requested 100.00"
        );
        assert!(err.is_rejection());
        assert!(!TransferError::DeadlineExceeded.is_rejection());
    }
}
