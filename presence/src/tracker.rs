//! Presence tracker backed by RocksDB
//!
//! One row per account keyed by account ID, holding the last heartbeat
//! timestamp. Reads filter by TTL, so a crashed client goes offline on
//! its own even before the sweep deletes the row.

use crate::{PresenceConfig, Result};
use chrono::{DateTime, Duration, Utc};
use rocksdb::{IteratorMode, Options, DB};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wallet_core::AccountId;

/// One last-seen row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Account this row belongs to
    pub account_id: AccountId,

    /// Last heartbeat timestamp
    pub last_seen: DateTime<Utc>,
}

/// Presence tracker
pub struct PresenceTracker {
    db: Arc<DB>,
    ttl: Duration,
}

impl PresenceTracker {
    /// Open or create the presence store
    pub fn open(config: &PresenceConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);

        let db = DB::open(&db_opts, &config.data_dir)?;

        tracing::info!("Opened presence store at {:?}", config.data_dir);

        Ok(Self {
            db: Arc::new(db),
            ttl: Duration::seconds(config.ttl_secs as i64),
        })
    }

    /// Record a heartbeat for an account
    pub fn heartbeat(&self, account_id: AccountId) -> Result<()> {
        self.record_seen_at(account_id, Utc::now())
    }

    fn record_seen_at(&self, account_id: AccountId, when: DateTime<Utc>) -> Result<()> {
        let record = PresenceRecord {
            account_id,
            last_seen: when,
        };
        self.db
            .put(account_id.as_bytes(), bincode::serialize(&record)?)?;

        Ok(())
    }

    /// Last heartbeat for an account, if any row exists
    pub fn last_seen(&self, account_id: AccountId) -> Result<Option<DateTime<Utc>>> {
        let value = self.db.get(account_id.as_bytes())?;

        match value {
            Some(bytes) => {
                let record: PresenceRecord = bincode::deserialize(&bytes)?;
                Ok(Some(record.last_seen))
            }
            None => Ok(None),
        }
    }

    /// Whether an account heartbeated within the TTL
    pub fn is_online(&self, account_id: AccountId) -> Result<bool> {
        match self.last_seen(account_id)? {
            Some(last_seen) => Ok(Utc::now() - last_seen <= self.ttl),
            None => Ok(false),
        }
    }

    /// All accounts currently within the TTL
    pub fn online_accounts(&self) -> Result<Vec<AccountId>> {
        let cutoff = Utc::now() - self.ttl;

        let mut online = Vec::new();
        for item in self.db.iterator(IteratorMode::Start) {
            let (_, value) = item?;
            let record: PresenceRecord = bincode::deserialize(&value)?;
            if record.last_seen >= cutoff {
                online.push(record.account_id);
            }
        }

        Ok(online)
    }

    /// Delete rows past the TTL. Returns the number removed.
    pub fn sweep_stale(&self) -> Result<usize> {
        let cutoff = Utc::now() - self.ttl;

        let mut removed = 0;
        for item in self.db.iterator(IteratorMode::Start) {
            let (key, value) = item?;
            let record: PresenceRecord = bincode::deserialize(&value)?;
            if record.last_seen < cutoff {
                self.db.delete(key)?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "Swept stale presence rows");
        }

        Ok(removed)
    }
}

/// Spawn the stale-row sweep loop
pub fn spawn_presence_sweeper(
    tracker: Arc<PresenceTracker>,
    interval: tokio::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = tracker.sweep_stale() {
                // Retried on the next tick
                tracing::warn!("Presence sweep failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_tracker(ttl_secs: u64) -> (PresenceTracker, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = PresenceConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ttl_secs,
            sweep_interval_secs: 60,
        };
        (PresenceTracker::open(&config).unwrap(), temp_dir)
    }

    #[test]
    fn test_heartbeat_marks_online() {
        let (tracker, _temp) = test_tracker(300);
        let account_id = AccountId::generate();

        assert!(!tracker.is_online(account_id).unwrap());

        tracker.heartbeat(account_id).unwrap();
        assert!(tracker.is_online(account_id).unwrap());
        assert!(tracker.last_seen(account_id).unwrap().is_some());
    }

    #[test]
    fn test_stale_heartbeat_goes_offline() {
        let (tracker, _temp) = test_tracker(300);
        let account_id = AccountId::generate();

        tracker
            .record_seen_at(account_id, Utc::now() - Duration::seconds(600))
            .unwrap();

        // Row exists but the TTL filter hides it
        assert!(tracker.last_seen(account_id).unwrap().is_some());
        assert!(!tracker.is_online(account_id).unwrap());
        assert!(tracker.online_accounts().unwrap().is_empty());
    }

    #[test]
    fn test_sweep_removes_only_stale_rows() {
        let (tracker, _temp) = test_tracker(300);
        let fresh = AccountId::generate();
        let stale = AccountId::generate();

        tracker.heartbeat(fresh).unwrap();
        tracker
            .record_seen_at(stale, Utc::now() - Duration::seconds(600))
            .unwrap();

        assert_eq!(tracker.sweep_stale().unwrap(), 1);
        assert!(tracker.last_seen(stale).unwrap().is_none());
        assert!(tracker.is_online(fresh).unwrap());

        // Second pass finds nothing
        assert_eq!(tracker.sweep_stale().unwrap(), 0);
    }

    #[test]
    fn test_online_accounts_lists_fresh_rows() {
        let (tracker, _temp) = test_tracker(300);

        let a = AccountId::generate();
        let b = AccountId::generate();
        tracker.heartbeat(a).unwrap();
        tracker.heartbeat(b).unwrap();

        let online = tracker.online_accounts().unwrap();
        assert_eq!(online.len(), 2);
        assert!(online.contains(&a));
        assert!(online.contains(&b));
    }

    #[tokio::test]
    async fn test_sweeper_loop_keeps_running() {
        let (tracker, _temp) = test_tracker(300);
        let handle = spawn_presence_sweeper(
            Arc::new(tracker),
            tokio::time::Duration::from_millis(10),
        );

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        handle.abort();
    }
}
