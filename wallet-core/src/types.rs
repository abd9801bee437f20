//! Core types for the wallet ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Immutable receipts (append-only log)

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Create from an existing UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The reserved platform sink. Subscription fees are paid here;
    /// no account row exists for this ID.
    pub fn platform_sink() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the reserved platform sink
    pub fn is_platform_sink(&self) -> bool {
        self.0.is_nil()
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Raw bytes (storage key)
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's balance-holding record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub account_id: AccountId,

    /// Spendable balance (exact decimal, currency minor units carried in scale)
    pub balance: Decimal,

    /// When set, the balance is neither debited nor credited
    pub unlimited_funds: bool,

    /// Cumulative credits received as payee
    pub lifetime_earnings: Decimal,

    /// Verified status flag
    pub verified: bool,

    /// Verification expiry. `None` while verified means the status was
    /// administrator-granted and permanent.
    pub verified_until: Option<DateTime<Utc>>,

    /// Soft-disable flag. Accounts referenced by receipts are never deleted.
    pub disabled: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with the configured starting balance
    pub fn new(account_id: AccountId, starting_balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            balance: starting_balance,
            unlimited_funds: false,
            lifetime_earnings: Decimal::ZERO,
            verified: false,
            verified_until: None,
            disabled: false,
            created_at: now,
        }
    }

    /// Whether the account can cover `amount`
    pub fn can_spend(&self, amount: Decimal) -> bool {
        self.unlimited_funds || self.balance >= amount
    }

    /// Debit the balance. No-op for unlimited-funds accounts.
    pub fn apply_debit(&mut self, amount: Decimal) {
        if !self.unlimited_funds {
            self.balance -= amount;
        }
    }

    /// Credit the balance and lifetime earnings. No-op for unlimited-funds accounts.
    pub fn apply_credit(&mut self, amount: Decimal) {
        if !self.unlimited_funds {
            self.balance += amount;
            self.lifetime_earnings += amount;
        }
    }

    /// Mark verified until `expiry` (`None` = administrator-granted, permanent)
    pub fn set_verified(&mut self, expiry: Option<DateTime<Utc>>) {
        self.verified = true;
        self.verified_until = expiry;
    }

    /// Clear the verified flag and its expiry
    pub fn clear_verified(&mut self) {
        self.verified = false;
        self.verified_until = None;
    }

    /// Whether a fee-based verification has lapsed at `now`.
    /// Administrator-granted verification (no expiry) never lapses.
    pub fn verification_lapsed(&self, now: DateTime<Utc>) -> bool {
        match (self.verified, self.verified_until) {
            (true, Some(until)) => until < now,
            _ => false,
        }
    }
}

/// Kind of value transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    /// Marketplace purchase (buyer pays seller)
    Purchase,
    /// Administrative gift
    Gift,
    /// Verification fee paid to the platform sink
    SubscriptionFee,
}

/// Externally presentable transaction token.
///
/// Construction: `TXN-<unix millis>-<32 hex chars>`. The suffix carries
/// 128 bits of randomness, so collisions are astronomically unlikely; the
/// timestamp prefix keeps tokens roughly sortable by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionToken(String);

impl TransactionToken {
    /// Generate a fresh token
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self(format!(
            "TXN-{}-{:032x}",
            now.timestamp_millis(),
            rand::random::<u128>()
        ))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable record of a single completed value transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Receipt ID
    pub receipt_id: Uuid,

    /// Paying account
    pub payer: AccountId,

    /// Receiving account (the platform sink for subscription fees)
    pub payee: AccountId,

    /// Transferred amount. Zero only for unlimited-funds subscription
    /// fee receipts, which are recorded for audit.
    pub amount: Decimal,

    /// Platform cut retained out of `amount`, if any
    pub platform_fee: Option<Decimal>,

    /// Externally presentable token
    pub token: TransactionToken,

    /// What this transfer was
    pub kind: TransferKind,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl TransactionReceipt {
    /// Create a receipt with a freshly generated token
    pub fn new(
        payer: AccountId,
        payee: AccountId,
        amount: Decimal,
        kind: TransferKind,
        platform_fee: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            receipt_id: Uuid::new_v4(),
            payer,
            payee,
            amount,
            platform_fee,
            token: TransactionToken::generate(now),
            kind,
            created_at: now,
        }
    }
}

/// A transfer request as submitted by a caller
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Paying account
    pub payer: AccountId,

    /// Receiving account
    pub payee: AccountId,

    /// Amount to move (must be positive)
    pub amount: Decimal,

    /// Purchase or gift
    pub kind: TransferKind,

    /// Optional platform cut, recorded on the receipt
    pub platform_fee: Option<Decimal>,
}

impl TransferRequest {
    /// Marketplace purchase
    pub fn purchase(payer: AccountId, payee: AccountId, amount: Decimal) -> Self {
        Self {
            payer,
            payee,
            amount,
            kind: TransferKind::Purchase,
            platform_fee: None,
        }
    }

    /// Administrative gift
    pub fn gift(payer: AccountId, payee: AccountId, amount: Decimal) -> Self {
        Self {
            payer,
            payee,
            amount,
            kind: TransferKind::Gift,
            platform_fee: None,
        }
    }

    /// Attach a platform fee
    pub fn with_platform_fee(mut self, fee: Decimal) -> Self {
        self.platform_fee = Some(fee);
        self
    }
}

/// Subscription window status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowStatus {
    /// Window is current
    Active,
    /// Period elapsed; set by the sweep
    Expired,
    /// Closed by an administrator
    Cancelled,
}

impl WindowStatus {
    /// No transition leaves `Expired` or `Cancelled`
    pub fn is_terminal(&self) -> bool {
        matches!(self, WindowStatus::Expired | WindowStatus::Cancelled)
    }
}

/// One paid interval of verified status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionWindow {
    /// Window ID
    pub window_id: Uuid,

    /// Owning account
    pub account_id: AccountId,

    /// Fee charged for this window
    pub fee: Decimal,

    /// Period start
    pub period_start: DateTime<Utc>,

    /// Period end (start + 1 calendar month)
    pub period_end: DateTime<Utc>,

    /// Current status
    pub status: WindowStatus,
}

impl SubscriptionWindow {
    /// Open a new active window starting at `start`
    pub fn open(account_id: AccountId, fee: Decimal, start: DateTime<Utc>) -> Self {
        let period_end = start
            .checked_add_months(Months::new(1))
            .expect("period end within chrono date range");

        Self {
            window_id: Uuid::new_v4(),
            account_id,
            fee,
            period_start: start,
            period_end,
            status: WindowStatus::Active,
        }
    }

    /// Whether the period has elapsed at `now`
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.status == WindowStatus::Active && self.period_end < now
    }
}

/// Outcome of one expiry sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Windows transitioned `Active` -> `Expired`
    pub windows_expired: usize,

    /// Accounts whose fee-based verification was cleared
    pub verifications_cleared: usize,
}
