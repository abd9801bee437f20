//! Membership engine
//!
//! Orchestrates verification purchases, status queries, and window
//! administration on top of the wallet ledger. All mutations ride the
//! wallet's single-writer actor, so the not-already-verified check and
//! the window insert cannot interleave with a concurrent purchase for
//! the same account.

use crate::{config::MembershipConfig, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use wallet_core::{Account, AccountId, SubscriptionWindow, SweepOutcome, Wallet};

/// Verification state of one account
#[derive(Debug, Clone)]
pub struct VerificationStatus {
    /// Current flag
    pub verified: bool,

    /// Expiry of a fee-based verification; `None` while verified means
    /// administrator-granted
    pub verified_until: Option<DateTime<Utc>>,

    /// The account's active window, if any
    pub active_window: Option<SubscriptionWindow>,
}

/// Membership engine
pub struct MembershipEngine {
    /// Wallet ledger
    wallet: Arc<Wallet>,

    /// Configuration
    config: MembershipConfig,
}

impl MembershipEngine {
    /// Create new membership engine
    pub fn new(wallet: Arc<Wallet>, config: MembershipConfig) -> Self {
        Self { wallet, config }
    }

    /// The underlying wallet ledger
    pub fn wallet(&self) -> &Arc<Wallet> {
        &self.wallet
    }

    /// Engine configuration
    pub fn config(&self) -> &MembershipConfig {
        &self.config
    }

    /// Purchase a verification window for the configured fee
    ///
    /// Debits the fee to the platform sink, opens an active window ending
    /// one calendar month from now, and flips the account's verified
    /// flag. Fails with `AlreadyVerified` for verified accounts and
    /// propagates `InsufficientFunds` from the debit.
    pub async fn purchase_verification(&self, account_id: AccountId) -> Result<SubscriptionWindow> {
        let (window, receipt) = self
            .wallet
            .purchase_verification(account_id, self.config.verification_fee)
            .await?;

        tracing::info!(
            account_id = %account_id,
            window_id = %window.window_id,
            token = %receipt.token,
            "Verification purchased"
        );

        Ok(window)
    }

    /// Current verification state of an account
    pub fn verification_status(&self, account_id: AccountId) -> Result<VerificationStatus> {
        let account = self.wallet.get_account(account_id)?;
        let active_window = self.wallet.active_window(account_id)?;

        Ok(VerificationStatus {
            verified: account.verified,
            verified_until: account.verified_until,
            active_window,
        })
    }

    /// Cancel an active window (administrative action)
    ///
    /// Transitions `Active -> Cancelled` and clears the owner's fee-based
    /// verification immediately.
    pub async fn cancel_window(&self, window_id: Uuid) -> Result<SubscriptionWindow> {
        Ok(self.wallet.cancel_window(window_id).await?)
    }

    /// Grant permanent verification with no fee (administrative action)
    pub async fn grant_verified(&self, account_id: AccountId) -> Result<Account> {
        Ok(self.wallet.grant_verified(account_id).await?)
    }

    /// Expire stale windows and lapsed verifications as of now
    pub async fn expire_stale_windows(&self) -> Result<SweepOutcome> {
        self.expire_stale_windows_at(Utc::now()).await
    }

    /// Expire stale windows against an explicit reference time
    pub async fn expire_stale_windows_at(&self, now: DateTime<Utc>) -> Result<SweepOutcome> {
        Ok(self.wallet.expire_stale(now).await?)
    }
}
