//! PostgreSQL schema for the ledger
//!
//! Statements are idempotent so `Database::migrate` can run at every start.

use rust_decimal::Decimal;

/// Fractional digits of every money column (`NUMERIC(20, 4)`)
pub const MONEY_SCALE: u32 = 4;

/// True if the column stores `amount` without rounding it
pub fn fits_money_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id             BIGSERIAL PRIMARY KEY,
    user_id        BIGINT         NOT NULL,
    account_number BIGINT         NOT NULL UNIQUE,
    balance        NUMERIC(20, 4) NOT NULL DEFAULT 0 CHECK (balance >= 0),
    currency       VARCHAR(3)     NOT NULL CHECK (char_length(currency) = 3),
    created_at     TIMESTAMPTZ    NOT NULL DEFAULT NOW()
)
"#;

pub const CREATE_ACCOUNTS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_accounts_user_id ON accounts (user_id)";

pub const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id              BIGSERIAL PRIMARY KEY,
    from_account_id BIGINT         NOT NULL REFERENCES accounts (id),
    to_account_id   BIGINT         NOT NULL REFERENCES accounts (id),
    amount          NUMERIC(20, 4) NOT NULL CHECK (amount > 0),
    created_at      TIMESTAMPTZ    NOT NULL DEFAULT NOW(),
    CHECK (from_account_id <> to_account_id)
)
"#;

pub const CREATE_TRANSACTIONS_FROM_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transactions_from ON transactions (from_account_id)";

pub const CREATE_TRANSACTIONS_TO_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transactions_to ON transactions (to_account_id)";

/// All statements in dependency order
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("accounts", CREATE_ACCOUNTS_TABLE),
    ("accounts.user_id index", CREATE_ACCOUNTS_USER_INDEX),
    ("transactions", CREATE_TRANSACTIONS_TABLE),
    ("transactions.from index", CREATE_TRANSACTIONS_FROM_INDEX),
    ("transactions.to index", CREATE_TRANSACTIONS_TO_INDEX),
];
