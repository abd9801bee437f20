//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Balance rows (key: account_id)
//! - `receipts` - Append-only receipt log (key: receipt_id)
//! - `windows` - Subscription windows (key: window_id)
//! - `indices` - Secondary indices for fast lookups
//!
//! Every multi-row mutation (transfer, verification purchase, window
//! transition) commits through a single `WriteBatch`, so a failed
//! operation leaves no partial state behind.

use crate::{
    error::{Error, Result},
    types::{Account, AccountId, SubscriptionWindow, TransactionReceipt},
    Config,
};
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_RECEIPTS: &str = "receipts";
const CF_WINDOWS: &str = "windows";
const CF_INDICES: &str = "indices";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_hot()),
            ColumnFamilyDescriptor::new(CF_RECEIPTS, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_WINDOWS, Self::cf_options_hot()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_hot() -> Options {
        let mut opts = Options::default();
        // Frequently read rows, LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_log() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Account operations

    /// Put account row
    pub fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = bincode::serialize(account)?;
        self.db.put_cf(cf, account.account_id.as_bytes(), &value)?;
        Ok(())
    }

    /// Get account by ID
    pub fn get_account(&self, account_id: AccountId) -> Result<Account> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;

        let value = self
            .db
            .get_cf(cf, account_id.as_bytes())?
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;

        let account: Account = bincode::deserialize(&value)?;
        Ok(account)
    }

    // Receipt operations

    /// Get receipt by ID
    pub fn get_receipt(&self, receipt_id: Uuid) -> Result<TransactionReceipt> {
        let cf = self.cf_handle(CF_RECEIPTS)?;

        let value = self
            .db
            .get_cf(cf, receipt_id.as_bytes())?
            .ok_or_else(|| Error::Storage(format!("Receipt not found: {}", receipt_id)))?;

        let receipt: TransactionReceipt = bincode::deserialize(&value)?;
        Ok(receipt)
    }

    /// Get receipts referencing an account as payer or payee (via index)
    pub fn receipts_for_account(&self, account_id: AccountId) -> Result<Vec<TransactionReceipt>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        // Index keys: account_id || receipt_id (32 bytes). The 16-byte
        // active-window index rows share the prefix space and are skipped
        // by the length check.
        let iter = self
            .db
            .prefix_iterator_cf(cf_indices, account_id.as_bytes());

        let mut receipts = Vec::new();
        for item in iter {
            let (key, _) = item?;

            if !key.starts_with(account_id.as_bytes()) {
                break;
            }

            if key.len() >= 32 {
                let receipt_id_bytes: [u8; 16] = key[16..32]
                    .try_into()
                    .map_err(|_| Error::Storage("Malformed receipt index key".to_string()))?;
                let receipt_id = Uuid::from_bytes(receipt_id_bytes);

                receipts.push(self.get_receipt(receipt_id)?);
            }
        }

        Ok(receipts)
    }

    // Window operations

    /// Get window by ID
    pub fn get_window(&self, window_id: Uuid) -> Result<SubscriptionWindow> {
        let cf = self.cf_handle(CF_WINDOWS)?;

        let value = self
            .db
            .get_cf(cf, window_id.as_bytes())?
            .ok_or_else(|| Error::WindowNotFound(window_id.to_string()))?;

        let window: SubscriptionWindow = bincode::deserialize(&value)?;
        Ok(window)
    }

    /// Get the active window for an account, if any (via index)
    pub fn active_window(&self, account_id: AccountId) -> Result<Option<SubscriptionWindow>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let value = self.db.get_cf(cf_indices, account_id.as_bytes())?;

        match value {
            Some(bytes) => {
                let window_id_bytes: [u8; 16] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("Malformed window index value".to_string()))?;
                let window = self.get_window(Uuid::from_bytes(window_id_bytes))?;
                Ok(Some(window))
            }
            None => Ok(None),
        }
    }

    /// All active windows whose period has elapsed at `now`
    pub fn stale_active_windows(&self, now: DateTime<Utc>) -> Result<Vec<SubscriptionWindow>> {
        let cf = self.cf_handle(CF_WINDOWS)?;

        let mut stale = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let window: SubscriptionWindow = bincode::deserialize(&value)?;
            if window.is_stale(now) {
                stale.push(window);
            }
        }

        Ok(stale)
    }

    /// All accounts whose fee-based verification has lapsed at `now`
    pub fn lapsed_verified_accounts(&self, now: DateTime<Utc>) -> Result<Vec<Account>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;

        let mut lapsed = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let account: Account = bincode::deserialize(&value)?;
            if account.verification_lapsed(now) {
                lapsed.push(account);
            }
        }

        Ok(lapsed)
    }

    // Atomic multi-row mutations

    /// Commit a completed transfer: both account rows and the receipt,
    /// plus receipt indices, in one atomic batch.
    pub fn apply_transfer(
        &self,
        payer: &Account,
        payee: &Account,
        receipt: &TransactionReceipt,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        batch.put_cf(
            cf_accounts,
            payer.account_id.as_bytes(),
            bincode::serialize(payer)?,
        );
        batch.put_cf(
            cf_accounts,
            payee.account_id.as_bytes(),
            bincode::serialize(payee)?,
        );

        self.batch_receipt(&mut batch, receipt)?;

        self.db.write(batch)?;

        tracing::debug!(
            receipt_id = %receipt.receipt_id,
            payer = %receipt.payer,
            payee = %receipt.payee,
            amount = %receipt.amount,
            "Transfer committed"
        );

        Ok(())
    }

    /// Commit a verification purchase: debited account, fee receipt, new
    /// window, and the active-window index, in one atomic batch.
    ///
    /// Refuses to commit when the account already has an active window.
    pub fn apply_purchase(
        &self,
        account: &Account,
        receipt: &TransactionReceipt,
        window: &SubscriptionWindow,
    ) -> Result<()> {
        if self.active_window(account.account_id)?.is_some() {
            return Err(Error::AlreadyVerified(account.account_id.to_string()));
        }

        let mut batch = WriteBatch::default();

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        batch.put_cf(
            cf_accounts,
            account.account_id.as_bytes(),
            bincode::serialize(account)?,
        );

        self.batch_receipt(&mut batch, receipt)?;

        let cf_windows = self.cf_handle(CF_WINDOWS)?;
        batch.put_cf(
            cf_windows,
            window.window_id.as_bytes(),
            bincode::serialize(window)?,
        );

        // Active-window index: account_id -> window_id
        let cf_indices = self.cf_handle(CF_INDICES)?;
        batch.put_cf(
            cf_indices,
            account.account_id.as_bytes(),
            window.window_id.as_bytes(),
        );

        self.db.write(batch)?;

        tracing::info!(
            window_id = %window.window_id,
            account_id = %account.account_id,
            period_end = %window.period_end,
            "Verification window opened"
        );

        Ok(())
    }

    /// Commit a window transition and (optionally) the owner's updated
    /// account row in one atomic batch. Terminal transitions drop the
    /// active-window index entry.
    pub fn apply_window_update(
        &self,
        window: &SubscriptionWindow,
        account: Option<&Account>,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_windows = self.cf_handle(CF_WINDOWS)?;
        batch.put_cf(
            cf_windows,
            window.window_id.as_bytes(),
            bincode::serialize(window)?,
        );

        if window.status.is_terminal() {
            let cf_indices = self.cf_handle(CF_INDICES)?;
            batch.delete_cf(cf_indices, window.account_id.as_bytes());
        }

        if let Some(account) = account {
            let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
            batch.put_cf(
                cf_accounts,
                account.account_id.as_bytes(),
                bincode::serialize(account)?,
            );
        }

        self.db.write(batch)?;

        Ok(())
    }

    /// Stage a receipt and its per-account index rows into `batch`.
    /// The platform sink gets no index row.
    fn batch_receipt(&self, batch: &mut WriteBatch, receipt: &TransactionReceipt) -> Result<()> {
        let cf_receipts = self.cf_handle(CF_RECEIPTS)?;
        batch.put_cf(
            cf_receipts,
            receipt.receipt_id.as_bytes(),
            bincode::serialize(receipt)?,
        );

        let cf_indices = self.cf_handle(CF_INDICES)?;
        for account_id in [receipt.payer, receipt.payee] {
            if account_id.is_platform_sink() {
                continue;
            }
            batch.put_cf(
                cf_indices,
                Self::index_key_account_receipt(account_id, receipt.receipt_id),
                [],
            );
        }

        Ok(())
    }

    fn index_key_account_receipt(account_id: AccountId, receipt_id: Uuid) -> Vec<u8> {
        let mut key = account_id.as_bytes().to_vec();
        key.extend_from_slice(receipt_id.as_bytes());
        key
    }

    // Statistics

    /// Get storage statistics (approximate key counts)
    pub fn get_stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            total_accounts: self.approximate_count(CF_ACCOUNTS)?,
            total_receipts: self.approximate_count(CF_RECEIPTS)?,
            total_windows: self.approximate_count(CF_WINDOWS)?,
        })
    }

    fn approximate_count(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf_handle(cf_name)?;
        let prop = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(prop)
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Approximate account rows
    pub total_accounts: u64,
    /// Approximate receipt rows
    pub total_receipts: u64,
    /// Approximate window rows
    pub total_windows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransferKind, WindowStatus};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn test_account(balance: Decimal) -> Account {
        Account::new(AccountId::generate(), balance, Utc::now())
    }

    #[test]
    fn test_storage_open() {
        let (storage, _temp) = test_storage();
        assert!(storage.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(storage.db.cf_handle(CF_RECEIPTS).is_some());
        assert!(storage.db.cf_handle(CF_WINDOWS).is_some());
    }

    #[test]
    fn test_put_and_get_account() {
        let (storage, _temp) = test_storage();

        let account = test_account(Decimal::new(250000, 2));
        storage.put_account(&account).unwrap();

        let retrieved = storage.get_account(account.account_id).unwrap();
        assert_eq!(retrieved.account_id, account.account_id);
        assert_eq!(retrieved.balance, account.balance);
    }

    #[test]
    fn test_get_missing_account() {
        let (storage, _temp) = test_storage();

        let result = storage.get_account(AccountId::generate());
        assert!(matches!(result, Err(Error::AccountNotFound(_))));
    }

    #[test]
    fn test_apply_transfer_atomic() {
        let (storage, _temp) = test_storage();

        let mut payer = test_account(Decimal::new(250000, 2));
        let mut payee = test_account(Decimal::ZERO);
        storage.put_account(&payer).unwrap();
        storage.put_account(&payee).unwrap();

        let amount = Decimal::new(50000, 2);
        payer.apply_debit(amount);
        payee.apply_credit(amount);
        let receipt = TransactionReceipt::new(
            payer.account_id,
            payee.account_id,
            amount,
            TransferKind::Purchase,
            None,
            Utc::now(),
        );

        storage.apply_transfer(&payer, &payee, &receipt).unwrap();

        assert_eq!(
            storage.get_account(payer.account_id).unwrap().balance,
            Decimal::new(200000, 2)
        );
        assert_eq!(
            storage.get_account(payee.account_id).unwrap().balance,
            Decimal::new(50000, 2)
        );

        let retrieved = storage.get_receipt(receipt.receipt_id).unwrap();
        assert_eq!(retrieved.token, receipt.token);

        // Both sides see the receipt through the index
        assert_eq!(storage.receipts_for_account(payer.account_id).unwrap().len(), 1);
        assert_eq!(storage.receipts_for_account(payee.account_id).unwrap().len(), 1);
    }

    #[test]
    fn test_apply_purchase_and_active_window_index() {
        let (storage, _temp) = test_storage();

        let mut account = test_account(Decimal::new(500000, 2));
        storage.put_account(&account).unwrap();

        let now = Utc::now();
        let fee = Decimal::new(500000, 2);
        let window = SubscriptionWindow::open(account.account_id, fee, now);
        account.apply_debit(fee);
        account.set_verified(Some(window.period_end));
        let receipt = TransactionReceipt::new(
            account.account_id,
            AccountId::platform_sink(),
            fee,
            TransferKind::SubscriptionFee,
            None,
            now,
        );

        storage.apply_purchase(&account, &receipt, &window).unwrap();

        let active = storage.active_window(account.account_id).unwrap().unwrap();
        assert_eq!(active.window_id, window.window_id);

        // Second purchase for the same account is refused
        let dup = SubscriptionWindow::open(account.account_id, fee, now);
        let result = storage.apply_purchase(&account, &receipt, &dup);
        assert!(matches!(result, Err(Error::AlreadyVerified(_))));

        // Sink receipts are indexed for the payer only
        let receipts = storage.receipts_for_account(account.account_id).unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].kind, TransferKind::SubscriptionFee);
    }

    #[test]
    fn test_window_update_drops_index_on_terminal() {
        let (storage, _temp) = test_storage();

        let mut account = test_account(Decimal::new(500000, 2));
        storage.put_account(&account).unwrap();

        let now = Utc::now();
        let fee = Decimal::new(500000, 2);
        let mut window = SubscriptionWindow::open(account.account_id, fee, now);
        account.apply_debit(fee);
        account.set_verified(Some(window.period_end));
        let receipt = TransactionReceipt::new(
            account.account_id,
            AccountId::platform_sink(),
            fee,
            TransferKind::SubscriptionFee,
            None,
            now,
        );
        storage.apply_purchase(&account, &receipt, &window).unwrap();

        window.status = WindowStatus::Expired;
        account.clear_verified();
        storage.apply_window_update(&window, Some(&account)).unwrap();

        assert!(storage.active_window(account.account_id).unwrap().is_none());
        assert_eq!(
            storage.get_window(window.window_id).unwrap().status,
            WindowStatus::Expired
        );
        assert!(!storage.get_account(account.account_id).unwrap().verified);
    }

    #[test]
    fn test_stale_window_scan() {
        let (storage, _temp) = test_storage();

        let account = test_account(Decimal::new(500000, 2));
        storage.put_account(&account).unwrap();

        let past = Utc::now() - chrono::Duration::days(60);
        let fee = Decimal::new(5000, 0);
        let window = SubscriptionWindow::open(account.account_id, fee, past);
        let receipt = TransactionReceipt::new(
            account.account_id,
            AccountId::platform_sink(),
            fee,
            TransferKind::SubscriptionFee,
            None,
            past,
        );
        storage.apply_purchase(&account, &receipt, &window).unwrap();

        let stale = storage.stale_active_windows(Utc::now()).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].window_id, window.window_id);
    }
}
