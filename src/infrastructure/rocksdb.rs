use crate::domain::account::{Account, AccountDraft, AccountId};
use crate::domain::batch::{LedgerBatch, LedgerWrite};
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::{Transaction, TransactionId, TransactionKind, newest_first};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for account records, keyed by account id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family mapping a government id to its account id.
pub const CF_GOV_IDS: &str = "gov_ids";
/// Column Family for the transaction log, keyed by account id then transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for id sequences.
pub const CF_META: &str = "meta";

const LAST_ACCOUNT_ID: &[u8] = b"last_account_id";
const LAST_TRANSACTION_ID: &[u8] = b"last_transaction_id";

fn account_key(id: AccountId) -> [u8; 8] {
    id.0.to_be_bytes()
}

fn transaction_key(account: AccountId, tx: TransactionId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&account.0.to_be_bytes());
    key[8..].copy_from_slice(&tx.0.to_be_bytes());
    key
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LedgerError::storage("corrupt sequence value"))?;
    Ok(u64::from_be_bytes(raw))
}

/// A persistent ledger store backed by RocksDB.
///
/// Accounts, the gov_id index, the transaction log and id sequences live in
/// separate Column Families. Every batch becomes one RocksDB `WriteBatch`, so
/// it is applied atomically even across a crash. Writers are serialized by an
/// internal mutex; reads go straight to the database.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating any
    /// missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_ACCOUNTS, CF_GOV_IDS, CF_TRANSACTIONS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::storage(format!("{name} column family not found")))
    }

    fn read_account(&self, id: AccountId) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(&cf, account_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_sequence(&self, key: &[u8]) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(&cf, key)? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    fn account_transactions(&self, account: AccountId) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let prefix = account_key(account);
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut transactions = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            transactions.push(serde_json::from_slice(&value)?);
        }
        Ok(transactions)
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn insert_account(&self, draft: AccountDraft) -> Result<Account> {
        let _guard = self.writer.lock().await;
        let cf_accounts = self.cf(CF_ACCOUNTS)?;
        let cf_gov_ids = self.cf(CF_GOV_IDS)?;
        let cf_meta = self.cf(CF_META)?;

        if self.db.get_pinned_cf(&cf_gov_ids, draft.gov_id.as_bytes())?.is_some() {
            return Err(LedgerError::DuplicateIdentifier {
                gov_id: draft.gov_id,
            });
        }

        let id = AccountId(self.read_sequence(LAST_ACCOUNT_ID)? + 1);
        let account = draft.into_account(id);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, account_key(id), serde_json::to_vec(&account)?);
        batch.put_cf(&cf_gov_ids, account.gov_id.as_bytes(), account_key(id));
        batch.put_cf(&cf_meta, LAST_ACCOUNT_ID, id.0.to_be_bytes());
        self.db.write(batch)?;

        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.read_account(id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Vec<Account>> {
        Ok(self
            .all_accounts()
            .await?
            .into_iter()
            .filter(|a| a.username == username)
            .collect())
    }

    async fn find_by_gov_id(&self, gov_id: &str) -> Result<Option<Account>> {
        let cf = self.cf(CF_GOV_IDS)?;
        match self.db.get_cf(&cf, gov_id.as_bytes())? {
            Some(bytes) => self.read_account(AccountId(decode_u64(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<()> {
        let _guard = self.writer.lock().await;
        let cf_accounts = self.cf(CF_ACCOUNTS)?;
        let cf_gov_ids = self.cf(CF_GOV_IDS)?;
        let cf_transactions = self.cf(CF_TRANSACTIONS)?;
        let cf_meta = self.cf(CF_META)?;

        // Accounts staged by this batch; everything is validated before the
        // WriteBatch reaches the database.
        let mut staged: HashMap<AccountId, Account> = HashMap::new();
        let mut deleted: HashSet<AccountId> = HashSet::new();
        let mut last_tx = self.read_sequence(LAST_TRANSACTION_ID)?;
        let mut out = WriteBatch::default();

        for write in batch.into_writes() {
            let id = match &write {
                LedgerWrite::SetBalance { account, .. } => *account,
                LedgerWrite::Append(tx) => tx.account_id,
                LedgerWrite::DeleteAccount(account) => *account,
            };
            if deleted.contains(&id) {
                return Err(LedgerError::AccountNotFound(id));
            }
            if !staged.contains_key(&id) {
                let account = self
                    .read_account(id)?
                    .ok_or(LedgerError::AccountNotFound(id))?;
                staged.insert(id, account);
            }

            match write {
                LedgerWrite::SetBalance { account, balance } => {
                    if let Some(acc) = staged.get_mut(&account) {
                        acc.balance = balance;
                        out.put_cf(&cf_accounts, account_key(account), serde_json::to_vec(acc)?);
                    }
                }
                LedgerWrite::Append(pending) => {
                    last_tx += 1;
                    let tx = pending.into_transaction(TransactionId(last_tx));
                    out.put_cf(
                        &cf_transactions,
                        transaction_key(tx.account_id, tx.id),
                        serde_json::to_vec(&tx)?,
                    );
                }
                LedgerWrite::DeleteAccount(account) => {
                    if let Some(acc) = staged.remove(&account) {
                        out.delete_cf(&cf_gov_ids, acc.gov_id.as_bytes());
                    }
                    out.delete_cf(&cf_accounts, account_key(account));
                    out.delete_range_cf(
                        &cf_transactions,
                        transaction_key(account, TransactionId(0)),
                        transaction_key(AccountId(account.0 + 1), TransactionId(0)),
                    );
                    deleted.insert(account);
                }
            }
        }

        out.put_cf(&cf_meta, LAST_TRANSACTION_ID, last_tx.to_be_bytes());
        self.db.write(out)?;
        Ok(())
    }

    async fn recent_transactions(
        &self,
        account: AccountId,
        kind: TransactionKind,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let mut matching: Vec<Transaction> = self
            .account_transactions(account)?
            .into_iter()
            .filter(|tx| tx.kind == kind)
            .collect();
        matching.sort_by(newest_first);
        matching.truncate(limit);
        Ok(matching)
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            accounts.push(serde_json::from_slice(&value)?);
        }
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Amount, Balance};
    use crate::domain::transaction::PendingTransaction;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn draft(gov_id: &str) -> AccountDraft {
        AccountDraft {
            username: "alice".to_string(),
            credential_hash: "hash".to_string(),
            gov_id: gov_id.to_string(),
            balance: Balance::new(dec!(100)).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in [CF_ACCOUNTS, CF_GOV_IDS, CF_TRANSACTIONS, CF_META] {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_account_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let account = store.insert_account(draft("G-1")).await.unwrap();
        assert_eq!(account.id, AccountId(1));

        let retrieved = store.get_account(account.id).await.unwrap().unwrap();
        assert_eq!(retrieved, account);
        assert_eq!(store.find_by_gov_id("G-1").await.unwrap(), Some(account.clone()));
        assert_eq!(store.find_by_username("alice").await.unwrap(), vec![account]);
        assert!(store.get_account(AccountId(2)).await.unwrap().is_none());

        assert!(matches!(
            store.insert_account(draft("G-1")).await,
            Err(LedgerError::DuplicateIdentifier { .. })
        ));
    }

    #[tokio::test]
    async fn test_rocksdb_batch_and_cascade() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let a = store.insert_account(draft("G-1")).await.unwrap();
        let b = store.insert_account(draft("G-2")).await.unwrap();

        let five = Amount::new(dec!(5)).unwrap();
        store
            .commit(
                LedgerBatch::new()
                    .set_balance(a.id, Balance::new(dec!(105)).unwrap())
                    .append(PendingTransaction::now(a.id, five, TransactionKind::Deposit))
                    .append(PendingTransaction::now(b.id, five, TransactionKind::Deposit)),
            )
            .await
            .unwrap();

        let history = store
            .recent_transactions(a.id, TransactionKind::Deposit, 5)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, TransactionId(1));

        store
            .commit(LedgerBatch::new().delete_account(a.id))
            .await
            .unwrap();
        assert!(store.get_account(a.id).await.unwrap().is_none());
        assert!(store.find_by_gov_id("G-1").await.unwrap().is_none());
        assert!(
            store
                .recent_transactions(a.id, TransactionKind::Deposit, 5)
                .await
                .unwrap()
                .is_empty()
        );
        // The neighbour's log survives the range delete.
        assert_eq!(
            store
                .recent_transactions(b.id, TransactionKind::Deposit, 5)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_rocksdb_failed_batch_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let a = store.insert_account(draft("G-1")).await.unwrap();

        let result = store
            .commit(
                LedgerBatch::new()
                    .set_balance(a.id, Balance::ZERO)
                    .set_balance(AccountId(9), Balance::ZERO),
            )
            .await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound(AccountId(9)))));
        assert_eq!(
            store.get_account(a.id).await.unwrap().unwrap().balance.value(),
            dec!(100)
        );
    }

    #[tokio::test]
    async fn test_rocksdb_sequences_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.insert_account(draft("G-1")).await.unwrap();
        }
        let store = RocksDBStore::open(dir.path()).unwrap();
        let second = store.insert_account(draft("G-2")).await.unwrap();
        assert_eq!(second.id, AccountId(2));
        assert_eq!(store.all_accounts().await.unwrap().len(), 2);
    }
}
