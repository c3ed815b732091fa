//! Configuration for federated scans.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::{FilesiftError, Result};
use crate::util::similarity::MAX_SCORE;

/// Default similarity threshold for live scans.
pub const DEFAULT_THRESHOLD: f64 = 85.0;

/// Default similarity threshold for snapshot scans.
pub const DEFAULT_SNAPSHOT_THRESHOLD: f64 = 75.0;

/// Configuration for a search client and its fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum similarity (0–100) a text term must reach to match.
    pub threshold: f64,

    /// Maximum number of records returned by one search call.
    pub result_limit: usize,

    /// Maximum number of channel scans active at once.
    pub max_concurrent_scans: usize,

    /// Number of messages requested per history page.
    pub page_size: usize,

    /// Overall timeout for one search call, in milliseconds.
    pub search_timeout_ms: Option<u64>,

    /// Whether to collect scan metrics.
    pub collect_metrics: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            result_limit: 25,
            max_concurrent_scans: 10,
            page_size: 100,
            search_timeout_ms: None,
            collect_metrics: true,
        }
    }
}

impl SearchConfig {
    /// Defaults for the snapshot variant, which matches more loosely.
    pub fn snapshot_default() -> Self {
        Self {
            threshold: DEFAULT_SNAPSHOT_THRESHOLD,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the similarity threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the per-call result limit.
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    /// Set the concurrency cap.
    pub fn with_max_concurrent_scans(mut self, max: usize) -> Self {
        self.max_concurrent_scans = max;
        self
    }

    /// Set the history page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the search timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set whether to collect metrics.
    pub fn with_metrics(mut self, collect: bool) -> Self {
        self.collect_metrics = collect;
        self
    }

    /// The search timeout, if any.
    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_ms.map(Duration::from_millis)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_SCORE).contains(&self.threshold) {
            return Err(FilesiftError::invalid_config(format!(
                "threshold must be within 0..=100, got {}",
                self.threshold
            )));
        }
        if self.result_limit == 0 {
            return Err(FilesiftError::invalid_config("result_limit must be positive"));
        }
        if !(1..=Semaphore::MAX_PERMITS).contains(&self.max_concurrent_scans) {
            return Err(FilesiftError::invalid_config(format!(
                "max_concurrent_scans must be within 1..={}, got {}",
                Semaphore::MAX_PERMITS,
                self.max_concurrent_scans
            )));
        }
        if self.page_size == 0 {
            return Err(FilesiftError::invalid_config("page_size must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.threshold, 85.0);
        assert_eq!(config.result_limit, 25);
        assert_eq!(config.max_concurrent_scans, 10);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.search_timeout(), None);
        assert!(config.validate().is_ok());

        assert_eq!(SearchConfig::snapshot_default().threshold, 75.0);
    }

    #[test]
    fn test_config_builder() {
        let config = SearchConfig::default()
            .with_threshold(70.0)
            .with_result_limit(5)
            .with_max_concurrent_scans(3)
            .with_page_size(20)
            .with_timeout(Duration::from_secs(2))
            .with_metrics(false);

        assert_eq!(config.threshold, 70.0);
        assert_eq!(config.result_limit, 5);
        assert_eq!(config.max_concurrent_scans, 3);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.search_timeout(), Some(Duration::from_secs(2)));
        assert!(!config.collect_metrics);
    }

    #[test]
    fn test_validation() {
        assert!(SearchConfig::default().with_threshold(101.0).validate().is_err());
        assert!(SearchConfig::default().with_result_limit(0).validate().is_err());
        assert!(SearchConfig::default().with_max_concurrent_scans(0).validate().is_err());
        assert!(
            SearchConfig::default()
                .with_max_concurrent_scans(Semaphore::MAX_PERMITS + 1)
                .validate()
                .is_err()
        );
        assert!(
            SearchConfig::default()
                .with_max_concurrent_scans(Semaphore::MAX_PERMITS)
                .validate()
                .is_ok()
        );
        assert!(SearchConfig::default().with_page_size(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"result_limit": 10, "search_timeout_ms": 500}"#).unwrap();

        let config = SearchConfig::from_json_file(&path).unwrap();
        assert_eq!(config.result_limit, 10);
        assert_eq!(config.search_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.threshold, 85.0);
    }
}
