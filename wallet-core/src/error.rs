//! Error types for the wallet ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for wallet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wallet errors
///
/// Every error is terminal for the operation that raised it; nothing is
/// retried internally. `Storage` failures are the one class a caller may
/// reasonably retry.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Referenced account missing
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is soft-disabled
    #[error("Account disabled: {0}")]
    AccountDisabled(String),

    /// Balance too low and payer lacks unlimited funds
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount the operation needed
        requested: Decimal,
        /// Balance actually available
        available: Decimal,
    },

    /// Payer and payee are the same account
    #[error("Self transfer rejected for account {0}")]
    SelfTransfer(String),

    /// Amount not strictly positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Duplicate verification purchase
    #[error("Account already verified: {0}")]
    AlreadyVerified(String),

    /// Referenced subscription window missing
    #[error("Subscription window not found: {0}")]
    WindowNotFound(String),

    /// Transition attempted out of a terminal window status
    #[error("Subscription window closed: {0}")]
    WindowClosed(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
