//! Fans a query out over many channels under a concurrency cap.

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FilesiftError, Result};
use crate::query::{MatchPredicate, Query};
use crate::scan::accumulator::ScanAccumulator;
use crate::scan::config::SearchConfig;
use crate::scan::merger::RankingMerger;
use crate::scan::metrics::{ScanMetricsCollector, Timer};
use crate::scan::outcome::ScanOutcome;
use crate::scan::scanner::{ChannelScanner, ScanStop};
use crate::source::{Channel, MessageSource, PermissionOracle, UserId};

/// Runs one search call across a set of channels.
///
/// All channel scans of a call run as futures on the caller's task, at most
/// `max_concurrent_scans` of them past the gate at once. They share one
/// [`ScanAccumulator`], so the result budget is global to the call. A failing
/// channel is recorded in the outcome and never aborts its siblings.
pub struct FanoutCoordinator<'a> {
    source: &'a dyn MessageSource,
    permissions: &'a dyn PermissionOracle,
    config: &'a SearchConfig,
    metrics: Option<&'a ScanMetricsCollector>,
    merger: RankingMerger,
}

impl<'a> FanoutCoordinator<'a> {
    pub fn new(
        source: &'a dyn MessageSource,
        permissions: &'a dyn PermissionOracle,
        config: &'a SearchConfig,
    ) -> Self {
        FanoutCoordinator {
            source,
            permissions,
            config,
            metrics: None,
            merger: RankingMerger::new(),
        }
    }

    /// Report scans to a metrics collector.
    pub fn with_metrics(mut self, metrics: Option<&'a ScanMetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Search `channels` on behalf of `principal`.
    ///
    /// Returns ranked records, cursors for channels that stopped early and the
    /// channels that failed. Channel-local errors only fail their channel; any
    /// other error fails the call.
    pub async fn search(
        &self,
        principal: UserId,
        channels: Vec<Channel>,
        query: &Query,
    ) -> Result<ScanOutcome> {
        self.config.validate()?;
        let search_id = Uuid::new_v4();
        let timer = Timer::start();

        let eligible = self.eligible_channels(principal, channels, query).await;
        info!(
            %search_id,
            %principal,
            channels = eligible.len(),
            resuming = query.is_resuming(),
            "starting federated scan"
        );

        let accumulator = ScanAccumulator::new(self.config.result_limit, Utc::now());
        for channel in &eligible {
            accumulator.register(channel.id, query.start_bound(channel.id));
        }

        let predicate = MatchPredicate::new(query, self.config.threshold);
        let gate = Semaphore::new(self.config.max_concurrent_scans);
        let scans = join_all(
            eligible
                .iter()
                .map(|channel| self.scan_channel(channel, &predicate, &accumulator, &gate)),
        );

        let timed_out = match self.config.search_timeout() {
            Some(limit) => match tokio::time::timeout(limit, scans).await {
                Ok(results) => {
                    results.into_iter().collect::<Result<Vec<()>>>()?;
                    false
                }
                Err(_) => {
                    warn!(%search_id, timeout_ms = limit.as_millis() as u64, "search timed out");
                    true
                }
            },
            None => {
                scans.await.into_iter().collect::<Result<Vec<()>>>()?;
                false
            }
        };

        let mut outcome = accumulator.into_outcome(search_id, timed_out);
        self.merger.rank(query, &mut outcome.records);

        let elapsed = timer.stop();
        if let Some(metrics) = self.metrics {
            metrics.record_search(
                elapsed,
                outcome.channels_scanned as u64,
                outcome.failures.len() as u64,
                outcome.records.len() as u64,
                timed_out,
            );
        }

        info!(
            %search_id,
            records = outcome.records.len(),
            pending_channels = outcome.channel_cursor_map.len(),
            failed_channels = outcome.failures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "federated scan complete"
        );
        Ok(outcome)
    }

    /// Channels this call will scan.
    ///
    /// A resumed call only revisits channels that still hold a cursor.
    /// Channels without history access are skipped silently.
    async fn eligible_channels(
        &self,
        principal: UserId,
        channels: Vec<Channel>,
        query: &Query,
    ) -> Vec<Channel> {
        let mut eligible = Vec::with_capacity(channels.len());
        for channel in channels {
            if query
                .channel_cursor_map()
                .is_some_and(|cursors| !cursors.contains_key(&channel.id))
            {
                continue;
            }
            if query.channel().is_some_and(|only| only != channel.id) {
                continue;
            }
            if !self.permissions.can_read_history(principal, &channel).await {
                debug!(channel = %channel.id, %principal, "no history access, skipping");
                continue;
            }
            eligible.push(channel);
        }
        eligible
    }

    async fn scan_channel(
        &self,
        channel: &Channel,
        predicate: &MatchPredicate<'_>,
        accumulator: &ScanAccumulator,
        gate: &Semaphore,
    ) -> Result<()> {
        let _permit = gate
            .acquire()
            .await
            .map_err(|e| FilesiftError::cancelled(e.to_string()))?;
        let _active = self.metrics.map(ScanMetricsCollector::scan_started);

        let scanner = ChannelScanner::new(self.source, predicate, self.config.page_size);
        match scanner.scan(channel, accumulator).await {
            Ok(ScanStop::Exhausted) => accumulator.exhaust(channel.id),
            Ok(ScanStop::BudgetReached) => {
                if let Some(metrics) = self.metrics {
                    metrics.record_budget_stop();
                }
            }
            Err(e) => match e.in_channel(channel.id) {
                FilesiftError::ChannelUnavailable { channel, reason } => {
                    warn!(%channel, %reason, "channel scan failed");
                    accumulator.fail(channel, reason);
                }
                e => return Err(e),
            },
        }
        Ok(())
    }
}
