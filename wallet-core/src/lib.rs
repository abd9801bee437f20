//! Kiosk Wallet Core
//!
//! Balance ledger for the marketplace: accounts, value transfers with
//! immutable receipts, and the persisted subscription-window state.
//!
//! # Architecture
//!
//! - **Exact money**: `Decimal` balances, no floats
//! - **Single writer**: one actor task applies every balance mutation,
//!   eliminating lost updates between concurrent operations
//! - **Atomic commits**: each operation's rows land in one `WriteBatch`
//! - **Append-only receipts**: the transfer log is never updated or
//!   deleted
//!
//! # Invariants
//!
//! - Balances never go negative; unlimited-funds accounts are never
//!   debited or credited
//! - Every completed transfer appends exactly one receipt
//! - At most one active subscription window per account

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod telemetry;
pub mod types;
pub mod wallet;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use storage::Storage;
pub use types::{
    Account, AccountId, SubscriptionWindow, SweepOutcome, TransactionReceipt, TransactionToken,
    TransferKind, TransferRequest, WindowStatus,
};
pub use wallet::Wallet;
