//! Accounts
//!
//! Account rows, currency validation, the PostgreSQL repository and the
//! account service with its cached listing.

pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod validation;

pub use error::AccountError;
pub use models::{Account, AccountId, NewTransaction, Transaction, UserId};
pub use repository::PgAccountRepository;
pub use service::AccountService;
pub use validation::{CurrencyCode, ValidationError};
