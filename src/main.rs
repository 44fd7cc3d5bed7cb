use atm_ledger::application::ledger::Ledger;
use atm_ledger::application::session::SessionToken;
use atm_ledger::application::teller::Teller;
use atm_ledger::config::{DEFAULT_LOCK_TIMEOUT, EngineConfig};
use atm_ledger::domain::ports::LedgerStoreRef;
use atm_ledger::error::LedgerError;
use atm_ledger::infrastructure::in_memory::InMemoryLedgerStore;
#[cfg(feature = "storage-rocksdb")]
use atm_ledger::infrastructure::rocksdb::RocksDBStore;
use atm_ledger::interfaces::csv::account_writer::AccountWriter;
use atm_ledger::interfaces::csv::operation_reader::{Operation, OperationReader};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV script of teller operations
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Maximum time an operation waits for an account lock, in milliseconds
    #[arg(long, default_value_t = DEFAULT_LOCK_TIMEOUT.as_millis() as u64)]
    lock_timeout_ms: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<&Path>) -> Result<LedgerStoreRef> {
    match db_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Opening persistent ledger");
            Ok(Arc::new(RocksDBStore::open(path)?))
        }
        None => Ok(Arc::new(InMemoryLedgerStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<&Path>) -> Result<LedgerStoreRef> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryLedgerStore::new()))
}

async fn login(teller: &Teller, username: &str, credential: &str) -> atm_ledger::error::Result<SessionToken> {
    teller
        .login(username, credential)
        .await?
        .ok_or_else(|| LedgerError::InvalidInput(format!("invalid credentials for {username}")))
}

async fn run(teller: &Teller, operation: Operation) -> atm_ledger::error::Result<()> {
    match operation {
        Operation::Register(request) => {
            let id = teller.register(request).await?;
            tracing::debug!(account = %id, "Registered account");
        }
        Operation::Deposit {
            username,
            credential,
            amount,
        } => {
            let token = login(teller, &username, &credential).await?;
            let result = teller.deposit(&token, amount).await;
            teller.logout(&token).await;
            let balance = result?;
            tracing::debug!(%username, %balance, "Deposit applied");
        }
        Operation::Withdraw {
            username,
            credential,
            amount,
        } => {
            let token = login(teller, &username, &credential).await?;
            let result = teller.withdraw(&token, amount).await;
            teller.logout(&token).await;
            let balance = result?;
            tracing::debug!(%username, %balance, "Withdrawal applied");
        }
        Operation::Close {
            username,
            credential,
            target,
        } => {
            let token = login(teller, &username, &credential).await?;
            let result = teller.close_account(&token, &target).await;
            teller.logout(&token).await;
            let receipt = result?;
            tracing::debug!(
                closed = %receipt.closed,
                target = %receipt.target,
                transferred = %receipt.transferred,
                "Account closed"
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = EngineConfig::default().with_lock_timeout(Duration::from_millis(cli.lock_timeout_ms));
    let store = open_store(cli.db_path.as_deref())?;
    let teller = Teller::new(Ledger::new(store.clone(), config));

    let file = File::open(&cli.input).into_diagnostic()?;
    for (line, operation) in OperationReader::new(file).operations().enumerate() {
        match operation {
            Ok(operation) => {
                if let Err(e) = run(&teller, operation).await {
                    tracing::warn!(row = line + 1, error = %e, "Error processing operation");
                }
            }
            Err(e) => {
                tracing::warn!(row = line + 1, error = %e, "Error reading operation");
            }
        }
    }

    let accounts = store.all_accounts().await?;
    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts)?;

    Ok(())
}
