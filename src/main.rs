//! Ledger command line
//!
//! ```text
//! ledger [--env <name>] <command> [args]
//!
//!   migrate                              create tables and indexes
//!   health                               check the database connection
//!   create-account <user> <currency>     open a zero-balance account
//!   deposit <account> <amount>           add funds to an account
//!   transfer <user> <from> <to> <amount> move funds between accounts
//!   accounts <user>                      list a user's accounts
//!   all-accounts                         list every account
//!   history <user> <account>             ledger rows of an account
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr and the log file.

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

use bank_ledger::account::{AccountService, PgAccountRepository};
use bank_ledger::cache::TimedCacheClient;
use bank_ledger::config::AppConfig;
use bank_ledger::db::Database;
use bank_ledger::logging::init_logging;
use bank_ledger::store::PgDatastore;
use bank_ledger::transfer::{PgTransactionLog, TransferEngine, TransferService};

type PgTransferService = TransferService<PgDatastore, PgAccountRepository, PgTransactionLog>;

/// Split `--env/-e <name>` from the positional arguments
fn parse_args(args: Vec<String>) -> (String, Vec<String>) {
    let mut env = "dev".to_string();
    let mut rest = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--env" || arg == "-e" {
            if let Some(value) = iter.next() {
                env = value;
            }
        } else {
            rest.push(arg);
        }
    }
    (env, rest)
}

fn arg<T>(args: &[String], index: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = args
        .get(index)
        .with_context(|| format!("missing argument <{}>", name))?;
    raw.parse()
        .with_context(|| format!("invalid <{}>: {}", name, raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct App {
    db: Database,
    accounts: Arc<AccountService>,
    transfers: PgTransferService,
}

impl App {
    async fn build(config: &AppConfig) -> Result<Self> {
        let db = Database::connect(
            config.database_url()?,
            config.database.max_connections,
            config.database.acquire_timeout_secs,
        )
        .await
        .context("failed to connect to PostgreSQL")?;

        let pool = db.pool().clone();
        let cache = Arc::new(TimedCacheClient::new(config.cache.ttl_secs));
        let accounts = Arc::new(AccountService::new(
            Arc::new(PgAccountRepository::new(pool.clone())),
            cache,
        ));

        let engine = TransferEngine::new(
            PgDatastore::new(pool.clone()).with_lock_timeout(config.database.lock_timeout_ms),
            PgAccountRepository::new(pool.clone()),
            PgTransactionLog::new(pool),
        )
        .with_lock_order(config.transfer.lock_order);
        let transfers = TransferService::new(engine, accounts.clone())
            .with_deadline(config.transfer.deadline());

        Ok(Self {
            db,
            accounts,
            transfers,
        })
    }
}

async fn run(config: &AppConfig, args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        bail!(
            "missing command (migrate, health, create-account, deposit, transfer, accounts, all-accounts, history)"
        );
    };
    let app = App::build(config).await?;

    match command.as_str() {
        "migrate" => {
            app.db.migrate().await?;
            print_json(&serde_json::json!({ "migrated": true }))
        }
        "health" => {
            app.db.health_check().await?;
            print_json(&serde_json::json!({ "status": "ok" }))
        }
        "create-account" => {
            let user_id: i64 = arg(args, 1, "user")?;
            let currency: String = arg(args, 2, "currency")?;
            let account = app.accounts.create_account(user_id, &currency).await?;
            print_json(&account)
        }
        "deposit" => {
            let account_id: i64 = arg(args, 1, "account")?;
            let amount: Decimal = arg(args, 2, "amount")?;
            let account = app.accounts.deposit(account_id, amount).await?;
            print_json(&account)
        }
        "transfer" => {
            let user_id: i64 = arg(args, 1, "user")?;
            let from: i64 = arg(args, 2, "from")?;
            let to: i64 = arg(args, 3, "to")?;
            let amount: Decimal = arg(args, 4, "amount")?;
            match app.transfers.transfer(user_id, from, to, amount).await {
                Ok(transaction) => print_json(&transaction),
                Err(e) => {
                    print_json(&serde_json::json!({
                        "code": e.code(),
                        "status": e.http_status(),
                        "message": e.to_string(),
                    }))?;
                    Err(e.into())
                }
            }
        }
        "accounts" => {
            let user_id: i64 = arg(args, 1, "user")?;
            print_json(&app.accounts.list_accounts_for_user(user_id).await?)
        }
        "all-accounts" => print_json(&app.accounts.list_all_accounts().await?),
        "history" => {
            let user_id: i64 = arg(args, 1, "user")?;
            let account_id: i64 = arg(args, 2, "account")?;
            let rows = app
                .transfers
                .list_transactions_for_account(user_id, account_id)
                .await?;
            print_json(&rows)
        }
        other => bail!("unknown command: {}", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (env, args) = parse_args(std::env::args().skip(1).collect());
    let config = AppConfig::load(&env)?;
    let _guard = init_logging(&config)?;
    tracing::info!(env = %env, "Ledger starting");

    run(&config, &args).await
}
