//! Federated live scanning of channel histories.
//!
//! A [`FanoutCoordinator`] dispatches one [`ChannelScanner`] per eligible
//! channel, gates them with a semaphore, collects their matches into a shared
//! [`ScanAccumulator`] and ranks the merged set with a [`RankingMerger`].

pub mod accumulator;
pub mod config;
pub mod coordinator;
pub mod merger;
pub mod metrics;
pub mod outcome;
pub mod scanner;

pub use accumulator::{Admission, ScanAccumulator, ScanSink};
pub use config::{DEFAULT_SNAPSHOT_THRESHOLD, DEFAULT_THRESHOLD, SearchConfig};
pub use coordinator::FanoutCoordinator;
pub use merger::{RankingMerger, ScoredRecord};
pub use metrics::{ScanMetrics, ScanMetricsCollector, Timer};
pub use outcome::{ChannelFailure, ScanOutcome};
pub use scanner::{ChannelScanner, ScanStop};
