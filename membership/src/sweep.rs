//! Periodic expiry sweep
//!
//! Runs `expire_stale_windows` on a fixed interval. The sweep is
//! fire-and-forget maintenance: failures are logged and retried on the
//! next tick, never surfaced to a caller. It only touches rows already
//! past their period end, so it can run concurrently with purchases for
//! other accounts.

use crate::engine::MembershipEngine;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Expiry sweep scheduler
pub struct SweepScheduler {
    /// Membership engine
    engine: Arc<MembershipEngine>,

    /// Interval between passes
    interval: tokio::time::Duration,
}

impl SweepScheduler {
    /// Create new scheduler
    pub fn new(engine: Arc<MembershipEngine>, interval: tokio::time::Duration) -> Self {
        Self { engine, interval }
    }

    /// Start the sweep loop
    pub async fn start(self: Arc<Self>) {
        info!("Starting membership expiry sweep (every {:?})", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.run_once().await;
        }
    }

    /// Run one sweep pass
    pub async fn run_once(&self) {
        match self.engine.expire_stale_windows().await {
            Ok(outcome) => {
                if outcome.windows_expired > 0 || outcome.verifications_cleared > 0 {
                    info!(
                        windows_expired = outcome.windows_expired,
                        verifications_cleared = outcome.verifications_cleared,
                        "Expiry sweep completed"
                    );
                } else {
                    debug!("Expiry sweep found nothing stale");
                }
            }
            Err(e) => {
                // Retried on the next tick
                warn!("Expiry sweep failed: {}", e);
            }
        }
    }
}

/// Spawn the sweep scheduler on the engine's configured interval
pub fn spawn_sweep(engine: Arc<MembershipEngine>) -> tokio::task::JoinHandle<()> {
    let interval = tokio::time::Duration::from_secs(engine.config().sweep_interval_secs);
    let scheduler = Arc::new(SweepScheduler::new(engine, interval));

    tokio::spawn(async move {
        scheduler.start().await;
    })
}
