//! Freshness cache: the single shared slot holding the latest batch.
//!
//! Exclusively written by the background poller via [`FreshnessCache::refresh`];
//! everything else takes read snapshots through [`FreshnessCache::read`].
//! The lock is held only for the duration of the copy — the poller fetches
//! and normalizes upstream data fully before acquiring it, so readers are
//! never blocked on network I/O.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::models::CanonicalReading;

// ---

/// Readings older than this are reported as stale. Stale data is still
/// served — a transient upstream outage degrades freshness, not
/// availability.
const STALE_AFTER: Duration = Duration::from_secs(10);

/// Consumer-facing freshness descriptor for a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh { age_secs: u64 },
    Stale { age_secs: u64 },
    /// The poller has never succeeded; consumers get an explicit
    /// not-ready response, never fabricated data.
    NoData,
}

impl CacheStatus {
    /// Wire label carried in API responses, e.g. `cache_age_3s`.
    pub fn label(&self) -> String {
        // ---
        match self {
            CacheStatus::Fresh { age_secs } => format!("cache_age_{age_secs}s"),
            CacheStatus::Stale { age_secs } => format!("cache_stale_{age_secs}s"),
            CacheStatus::NoData => "no_data".to_string(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    batch: Vec<CanonicalReading>,
    refreshed_at: Instant,
}

/// Lock-guarded slot for the most recent successfully normalized batch.
///
/// Created empty at process start; lives for the process lifetime.
#[derive(Debug, Default)]
pub struct FreshnessCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl FreshnessCache {
    pub fn new() -> Self {
        // ---
        Self::default()
    }

    /// Atomically replace the stored batch and refresh time. Called only
    /// by the background poller, never from request handlers.
    pub fn refresh(&self, batch: Vec<CanonicalReading>) {
        // ---
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        *entry = Some(CacheEntry {
            batch,
            refreshed_at: Instant::now(),
        });
    }

    /// Snapshot of the stored batch (newest first) with its staleness
    /// descriptor. Empty batch with [`CacheStatus::NoData`] until the
    /// first successful refresh.
    pub fn read(&self) -> (Vec<CanonicalReading>, CacheStatus) {
        // ---
        let entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        match entry.as_ref() {
            Some(e) => (e.batch.clone(), status_for_age(e.refreshed_at.elapsed())),
            None => (Vec::new(), CacheStatus::NoData),
        }
    }
}

fn status_for_age(age: Duration) -> CacheStatus {
    // ---
    let age_secs = age.as_secs();
    if age < STALE_AFTER {
        CacheStatus::Fresh { age_secs }
    } else {
        CacheStatus::Stale { age_secs }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn reading(timestamp: f64) -> CanonicalReading {
        // ---
        CanonicalReading {
            timestamp,
            temperature_bmp280: Some(22.0),
            temperature_dht22: Some(23.0),
            humidity: 55.0,
            pressure: 1013.0,
            altitude: 100.0,
            light_raw: 2000,
            soil_moisture: 50.0,
            mq135_drop: 100.0,
            mq2_drop: 50.0,
            mq7_drop: 20.0,
            mq135_baseline: 400.0,
            mq2_baseline: 500.0,
            mq7_baseline: 300.0,
            flame_raw: 4095.0,
            flame_detected: false,
        }
    }

    #[test]
    fn test_empty_cache_reports_no_data() {
        // ---
        let cache = FreshnessCache::new();
        let (batch, status) = cache.read();
        assert!(batch.is_empty());
        assert_eq!(status, CacheStatus::NoData);
        assert_eq!(status.label(), "no_data");
    }

    #[test]
    fn test_refresh_then_read_is_fresh() {
        // ---
        let cache = FreshnessCache::new();
        cache.refresh(vec![reading(200.0), reading(100.0)]);

        let (batch, status) = cache.read();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].timestamp, 200.0);
        assert!(matches!(status, CacheStatus::Fresh { .. }));
    }

    #[test]
    fn test_refresh_replaces_batch_wholesale() {
        // ---
        let cache = FreshnessCache::new();
        cache.refresh(vec![reading(100.0)]);
        cache.refresh(vec![reading(300.0), reading(200.0)]);

        let (batch, _) = cache.read();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].timestamp, 300.0);
    }

    #[test]
    fn test_staleness_bucket_boundary() {
        // ---
        assert_eq!(
            status_for_age(Duration::from_secs(3)),
            CacheStatus::Fresh { age_secs: 3 }
        );
        assert_eq!(
            status_for_age(Duration::from_millis(9_999)),
            CacheStatus::Fresh { age_secs: 9 }
        );
        assert_eq!(
            status_for_age(Duration::from_secs(10)),
            CacheStatus::Stale { age_secs: 10 }
        );
        assert_eq!(
            status_for_age(Duration::from_secs(15)),
            CacheStatus::Stale { age_secs: 15 }
        );
    }

    #[test]
    fn test_status_labels() {
        // ---
        assert_eq!(CacheStatus::Fresh { age_secs: 3 }.label(), "cache_age_3s");
        assert_eq!(CacheStatus::Stale { age_secs: 15 }.label(), "cache_stale_15s");
    }
}
