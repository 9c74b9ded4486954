//! Read-access transparency log.
//!
//! Counts every mindful minutes aggregation and how it ended, so the user
//! can audit how often their health data was read. No record contents and
//! no minute totals are kept.

use crate::error::{AggregationResult, MindfulError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters of aggregation requests and outcomes.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Number of aggregations requested
    requests: AtomicU64,
    /// Number of aggregations that produced a total
    successes: AtomicU64,
    /// Number of records read from the store
    records_read: AtomicU64,
    data_unavailable: AtomicU64,
    not_authorized: AtomicU64,
    no_samples: AtomicU64,
    platform_errors: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            records_read: AtomicU64::new(0),
            data_unavailable: AtomicU64::new(0),
            not_authorized: AtomicU64::new(0),
            no_samples: AtomicU64::new(0),
            platform_errors: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log that persists to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous access stats: {e}");
        }

        log
    }

    /// Record that an aggregation was requested.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how an aggregation ended.
    pub fn record_outcome(&self, result: &AggregationResult, records_read: usize) {
        self.records_read
            .fetch_add(records_read as u64, Ordering::Relaxed);

        let counter = match result {
            Ok(_) => &self.successes,
            Err(MindfulError::DataUnavailable) => &self.data_unavailable,
            Err(MindfulError::NotAuthorized) => &self.not_authorized,
            Err(MindfulError::NoSamples) => &self.no_samples,
            Err(MindfulError::PlatformError) => &self.platform_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            records_read: self.records_read.load(Ordering::Relaxed),
            data_unavailable: self.data_unavailable.load(Ordering::Relaxed),
            not_authorized: self.not_authorized.load(Ordering::Relaxed),
            no_samples: self.no_samples.load(Ordering::Relaxed),
            platform_errors: self.platform_errors.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Read Access Statistics:\n\
             - Aggregations requested: {}\n\
             - Totals produced: {}\n\
             - Mindful sessions read: {}\n\
             - Failed (data unavailable): {}\n\
             - Failed (not authorized): {}\n\
             - Failed (no samples): {}\n\
             - Failed (platform error): {}\n\
             \n\
             Access Guarantee:\n\
             - Only mindful session start and end times are read\n\
             - Health data is never written or modified\n\
             - Results are never cached",
            stats.requests,
            stats.successes,
            stats.records_read,
            stats.data_unavailable,
            stats.not_authorized,
            stats.no_samples,
            stats.platform_errors,
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                requests: stats.requests,
                successes: stats.successes,
                records_read: stats.records_read,
                data_unavailable: stats.data_unavailable,
                not_authorized: stats.not_authorized,
                no_samples: stats.no_samples,
                platform_errors: stats.platform_errors,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.requests.store(persisted.requests, Ordering::Relaxed);
                self.successes.store(persisted.successes, Ordering::Relaxed);
                self.records_read
                    .store(persisted.records_read, Ordering::Relaxed);
                self.data_unavailable
                    .store(persisted.data_unavailable, Ordering::Relaxed);
                self.not_authorized
                    .store(persisted.not_authorized, Ordering::Relaxed);
                self.no_samples
                    .store(persisted.no_samples, Ordering::Relaxed);
                self.platform_errors
                    .store(persisted.platform_errors, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.requests,
            &self.successes,
            &self.records_read,
            &self.data_unavailable,
            &self.not_authorized,
            &self.no_samples,
            &self.platform_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of access statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub requests: u64,
    pub successes: u64,
    pub records_read: u64,
    pub data_unavailable: u64,
    pub not_authorized: u64,
    pub no_samples: u64,
    pub platform_errors: u64,
    pub session_start: DateTime<Utc>,
}

impl TransparencyStats {
    /// Number of aggregations that ended in an error.
    pub fn failures(&self) -> u64 {
        self.data_unavailable + self.not_authorized + self.no_samples + self.platform_errors
    }
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    requests: u64,
    successes: u64,
    records_read: u64,
    data_unavailable: u64,
    not_authorized: u64,
    no_samples: u64,
    platform_errors: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_counting() {
        let log = TransparencyLog::new();

        log.record_request();
        log.record_outcome(&Ok(12), 3);
        log.record_request();
        log.record_outcome(&Err(MindfulError::NotAuthorized), 0);

        let stats = log.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.records_read, 3);
        assert_eq!(stats.not_authorized, 1);
        assert_eq!(stats.failures(), 1);
    }

    #[test]
    fn test_reset() {
        let log = TransparencyLog::new();

        log.record_request();
        log.record_outcome(&Err(MindfulError::NoSamples), 0);
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.requests, 0);
        assert_eq!(stats.failures(), 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("mindful-access-{}", uuid::Uuid::new_v4()))
            .join("access.json");

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_request();
        log.record_outcome(&Err(MindfulError::DataUnavailable), 0);
        log.save().unwrap();

        let reloaded = TransparencyLog::with_persistence(path.clone());
        let stats = reloaded.stats();
        assert_eq!(stats.requests, 1);
        assert_eq!(stats.data_unavailable, 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_summary_format() {
        let summary = TransparencyLog::new().summary();

        assert!(summary.contains("Aggregations requested"));
        assert!(summary.contains("Access Guarantee"));
        assert!(summary.contains("never written"));
    }
}
