//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the wallet.
//!
//! # Metrics
//!
//! - `wallet_transfers_total` - Completed transfers
//! - `wallet_transfers_rejected_total` - Rejected transfers
//! - `wallet_transfer_volume` - Total value moved
//! - `wallet_subscriptions_total` - Verification windows purchased
//! - `wallet_windows_expired_total` - Windows expired by the sweep
//! - `wallet_apply_duration_seconds` - Mutation apply latency

use prometheus::{Counter, Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
///
/// Collectors are registered on a dedicated registry, never the global
/// default, so multiple wallets can coexist in one process.
#[derive(Clone)]
pub struct Metrics {
    /// Completed transfers
    pub transfers_total: IntCounter,

    /// Rejected transfers (validation or funds)
    pub transfers_rejected_total: IntCounter,

    /// Total value moved
    pub transfer_volume: Counter,

    /// Verification windows purchased
    pub subscriptions_total: IntCounter,

    /// Windows expired by the sweep
    pub windows_expired_total: IntCounter,

    /// Mutation apply latency
    pub apply_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transfers_total =
            IntCounter::new("wallet_transfers_total", "Completed transfers")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let transfers_rejected_total = IntCounter::new(
            "wallet_transfers_rejected_total",
            "Rejected transfers (validation or funds)",
        )?;
        registry.register(Box::new(transfers_rejected_total.clone()))?;

        let transfer_volume = Counter::new("wallet_transfer_volume", "Total value moved")?;
        registry.register(Box::new(transfer_volume.clone()))?;

        let subscriptions_total = IntCounter::new(
            "wallet_subscriptions_total",
            "Verification windows purchased",
        )?;
        registry.register(Box::new(subscriptions_total.clone()))?;

        let windows_expired_total = IntCounter::new(
            "wallet_windows_expired_total",
            "Windows expired by the sweep",
        )?;
        registry.register(Box::new(windows_expired_total.clone()))?;

        let apply_duration = Histogram::with_opts(
            HistogramOpts::new("wallet_apply_duration_seconds", "Mutation apply latency")
                .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(apply_duration.clone()))?;

        Ok(Self {
            transfers_total,
            transfers_rejected_total,
            transfer_volume,
            subscriptions_total,
            windows_expired_total,
            apply_duration,
            registry,
        })
    }

    /// Record a completed transfer
    pub fn record_transfer(&self, amount: f64) {
        self.transfers_total.inc();
        self.transfer_volume.inc_by(amount);
    }

    /// Record a rejected transfer
    pub fn record_rejected_transfer(&self) {
        self.transfers_rejected_total.inc();
    }

    /// Record a verification purchase
    pub fn record_subscription(&self) {
        self.subscriptions_total.inc();
    }

    /// Record windows expired by one sweep pass
    pub fn record_windows_expired(&self, count: usize) {
        self.windows_expired_total.inc_by(count as u64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.transfers_total.get(), 0);
        assert_eq!(metrics.subscriptions_total.get(), 0);
    }

    #[test]
    fn test_record_transfer() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transfer(500.0);
        metrics.record_transfer(250.0);

        assert_eq!(metrics.transfers_total.get(), 2);
        assert!((metrics.transfer_volume.get() - 750.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_rejected_transfer() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected_transfer();
        assert_eq!(metrics.transfers_rejected_total.get(), 1);
    }

    #[test]
    fn test_record_windows_expired() {
        let metrics = Metrics::new().unwrap();
        metrics.record_windows_expired(3);
        metrics.record_windows_expired(0);
        assert_eq!(metrics.windows_expired_total.get(), 3);
    }

    #[test]
    fn test_independent_registries() {
        // Two collectors in one process must not collide
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_subscription();
        assert_eq!(a.subscriptions_total.get(), 1);
        assert_eq!(b.subscriptions_total.get(), 0);
    }
}
