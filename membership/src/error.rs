//! Error types for the membership engine

use thiserror::Error;

/// Result type for membership operations
pub type Result<T> = std::result::Result<T, Error>;

/// Membership errors
#[derive(Error, Debug)]
pub enum Error {
    /// Error propagated from the wallet ledger
    #[error("Wallet error: {0}")]
    Wallet(#[from] wallet_core::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this is the duplicate-purchase rejection
    pub fn is_already_verified(&self) -> bool {
        matches!(self, Error::Wallet(wallet_core::Error::AlreadyVerified(_)))
    }

    /// Whether this is the insufficient-funds rejection
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            Error::Wallet(wallet_core::Error::InsufficientFunds { .. })
        )
    }
}
