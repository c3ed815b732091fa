//! Configuration for snapshot search.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FilesiftError, Result};

/// How snapshots are built, reused and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Number of most recent messages copied per channel.
    pub depth: usize,

    /// Reuse a snapshot younger than this many seconds. `None` rebuilds on
    /// every call.
    pub refresh_interval_secs: Option<u64>,

    /// Directory snapshots are written to as JSON, one file per scope.
    pub persist_dir: Option<PathBuf>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            depth: 100,
            refresh_interval_secs: None,
            persist_dir: None,
        }
    }
}

impl SnapshotConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_secs = Some(interval.as_secs());
        self
    }

    pub fn with_persist_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.persist_dir = Some(dir.into());
        self
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(FilesiftError::invalid_config("snapshot depth must be positive"));
        }
        Ok(())
    }
}
