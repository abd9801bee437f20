//! Presence Tracking
//!
//! Durable last-seen tracking for community features: who is online right
//! now, backed by a bounded-lifetime key-value table rather than an
//! in-process socket map. State survives process restarts and can be
//! shared by multiple server instances pointed at the same store.
//!
//! An account is online while its last heartbeat is within the configured
//! TTL; a periodic sweep deletes rows past it.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod tracker;

// Re-exports
pub use config::PresenceConfig;
pub use error::{Error, Result};
pub use tracker::{spawn_presence_sweeper, PresenceRecord, PresenceTracker};
