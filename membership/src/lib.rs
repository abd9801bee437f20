//! Membership Engine
//!
//! Paid "verified" status for marketplace accounts: a fixed fee buys a
//! one-calendar-month subscription window; a periodic sweep expires
//! windows whose period has elapsed and clears the lapsed verification
//! flags.
//!
//! # Architecture
//!
//! 1. **Purchase**: fee debit, window insert, and flag flip commit as one
//!    atomic unit through the wallet's mutation actor
//! 2. **Sweep**: an hourly pass transitions stale windows
//!    `Active -> Expired`; administrator-granted verification (no expiry
//!    date) is never touched
//! 3. **Cancellation**: administrators close a window early
//!    (`Active -> Cancelled`)
//!
//! # Example
//!
//! ```no_run
//! use membership::{MembershipConfig, MembershipEngine};
//! use std::sync::Arc;
//! use wallet_core::{Config, Wallet};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let wallet = Arc::new(Wallet::open(Config::default()).await?);
//!     let engine = MembershipEngine::new(wallet, MembershipConfig::default());
//!
//!     let account = engine.wallet().create_account().await?;
//!     let window = engine.purchase_verification(account.account_id).await?;
//!     println!("verified until {}", window.period_end);
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod sweep;

// Re-exports
pub use config::MembershipConfig;
pub use engine::{MembershipEngine, VerificationStatus};
pub use error::{Error, Result};
pub use sweep::{spawn_sweep, SweepScheduler};
pub use wallet_core::{SubscriptionWindow, SweepOutcome, WindowStatus};
