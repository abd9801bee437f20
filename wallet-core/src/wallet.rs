//! Main wallet orchestration layer
//!
//! Ties storage, the mutation actor, and metrics together into the
//! high-level API consumed by the surrounding request handlers.
//!
//! # Example
//!
//! ```no_run
//! use rust_decimal::Decimal;
//! use wallet_core::{Config, TransferRequest, Wallet};
//!
//! #[tokio::main]
//! async fn main() -> wallet_core::Result<()> {
//!     let wallet = Wallet::open(Config::default()).await?;
//!
//!     let payer = wallet.create_account().await?;
//!     let payee = wallet.create_account().await?;
//!
//!     let receipt = wallet
//!         .transfer(TransferRequest::purchase(
//!             payer.account_id,
//!             payee.account_id,
//!             Decimal::new(50000, 2),
//!         ))
//!         .await?;
//!     println!("transfer recorded as {}", receipt.token);
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_wallet_actor, WalletHandle},
    metrics::Metrics,
    types::{
        Account, AccountId, SubscriptionWindow, SweepOutcome, TransactionReceipt, TransferRequest,
    },
    Config, Error, Result, Storage,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Main wallet interface
pub struct Wallet {
    /// Actor handle for mutations
    handle: WalletHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Prometheus metrics
    metrics: Metrics,
}

impl Wallet {
    /// Open wallet with configuration
    pub async fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let handle = spawn_wallet_actor(
            storage.clone(),
            config.starting_balance,
            config.mailbox_capacity,
        );

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        Ok(Self {
            handle,
            storage,
            metrics,
        })
    }

    /// Register a new account with the configured starting balance
    pub async fn create_account(&self) -> Result<Account> {
        self.handle.create_account().await
    }

    /// Move value between two accounts and record a receipt
    ///
    /// Validates the request, then applies the debit, credit, and receipt
    /// append as one atomic unit via the mutation actor.
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransactionReceipt> {
        self.validate_transfer(&request)?;

        let timer = self.metrics.apply_duration.start_timer();
        let result = self.handle.transfer(request).await;
        timer.observe_duration();

        match &result {
            Ok(receipt) => {
                self.metrics.record_transfer(receipt.amount.to_f64().unwrap_or(0.0));
            }
            Err(_) => self.metrics.record_rejected_transfer(),
        }

        result
    }

    /// Purchase a verification window, debiting `fee` to the platform sink
    pub async fn purchase_verification(
        &self,
        account_id: AccountId,
        fee: Decimal,
    ) -> Result<(SubscriptionWindow, TransactionReceipt)> {
        if fee <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "Verification fee must be positive, got {}",
                fee
            )));
        }

        let result = self.handle.purchase_verification(account_id, fee).await;
        if result.is_ok() {
            self.metrics.record_subscription();
        }

        result
    }

    /// Cancel an active window (administrative action)
    pub async fn cancel_window(&self, window_id: Uuid) -> Result<SubscriptionWindow> {
        self.handle.cancel_window(window_id).await
    }

    /// Grant permanent verification (administrative action)
    pub async fn grant_verified(&self, account_id: AccountId) -> Result<Account> {
        self.handle.grant_verified(account_id).await
    }

    /// Toggle the soft-disable flag (administrative action)
    pub async fn set_disabled(&self, account_id: AccountId, disabled: bool) -> Result<Account> {
        self.handle.set_disabled(account_id, disabled).await
    }

    /// Toggle the unlimited-funds flag (administrative action)
    pub async fn set_unlimited(&self, account_id: AccountId, unlimited: bool) -> Result<Account> {
        self.handle.set_unlimited(account_id, unlimited).await
    }

    /// Expire stale windows and lapsed verifications as of `now`
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<SweepOutcome> {
        let outcome = self.handle.expire_stale(now).await?;
        self.metrics.record_windows_expired(outcome.windows_expired);
        Ok(outcome)
    }

    // Reads (served directly from storage)

    /// Get account by ID
    pub fn get_account(&self, account_id: AccountId) -> Result<Account> {
        self.storage.get_account(account_id)
    }

    /// Get receipt by ID
    pub fn get_receipt(&self, receipt_id: Uuid) -> Result<TransactionReceipt> {
        self.storage.get_receipt(receipt_id)
    }

    /// Get receipts referencing an account as payer or payee
    pub fn receipts_for_account(&self, account_id: AccountId) -> Result<Vec<TransactionReceipt>> {
        self.storage.receipts_for_account(account_id)
    }

    /// Get the active window for an account, if any
    pub fn active_window(&self, account_id: AccountId) -> Result<Option<SubscriptionWindow>> {
        self.storage.active_window(account_id)
    }

    /// Get window by ID
    pub fn get_window(&self, window_id: Uuid) -> Result<SubscriptionWindow> {
        self.storage.get_window(window_id)
    }

    /// Storage statistics
    pub fn stats(&self) -> Result<crate::storage::StorageStats> {
        self.storage.get_stats()
    }

    /// Prometheus metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown wallet
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }

    /// Validate transfer invariants before dispatch
    fn validate_transfer(&self, request: &TransferRequest) -> Result<()> {
        if request.amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "Amount must be positive, got {}",
                request.amount
            )));
        }

        if request.payer == request.payee {
            return Err(Error::SelfTransfer(request.payer.to_string()));
        }

        if request.payer.is_platform_sink() || request.payee.is_platform_sink() {
            return Err(Error::InvalidAmount(
                "Platform sink cannot be a transfer party".to_string(),
            ));
        }

        if let Some(fee) = request.platform_fee {
            if fee < Decimal::ZERO || fee > request.amount {
                return Err(Error::InvalidAmount(format!(
                    "Platform fee {} out of range for amount {}",
                    fee, request.amount
                )));
            }
        }

        Ok(())
    }
}
