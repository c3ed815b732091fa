//! Search client that matches against bounded snapshots of recent history.
//!
//! A [`Snapshot`] holds the attachment records of the most recent `depth`
//! messages of every channel in a scope, grouped by channel. It is rebuilt
//! when older than the configured refresh interval (or on every call when no
//! interval is set) and can be persisted as JSON, one file per scope.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashSet;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{ClientState, RemovedDocs, SearchClient, SearchRequest, SnapshotConfig};
use crate::error::{FilesiftError, Result};
use crate::query::{MatchPredicate, Query};
use crate::record::{AttachmentRecord, ObjectId};
use crate::scan::{
    ChannelFailure, RankingMerger, ScanMetrics, ScanMetricsCollector, ScanOutcome, SearchConfig,
    Timer,
};
use crate::source::{Channel, ChannelId, HistoryRequest, MessageSource, PermissionOracle, Scope, UserId};

/// Recent attachments of every channel in a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub scope: Scope,
    pub built_at: DateTime<Utc>,
    pub depth: usize,
    /// Channels of the scope at build time.
    pub channels: Vec<Channel>,
    /// Records per channel, newest first.
    pub records: BTreeMap<ChannelId, Vec<AttachmentRecord>>,
    /// Channels whose history could not be read during the build.
    pub failures: Vec<ChannelFailure>,
}

impl Snapshot {
    /// Whether the snapshot is younger than `max_age` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Option<std::time::Duration>) -> bool {
        let Some(max_age) = max_age else {
            return false;
        };
        match TimeDelta::from_std(max_age) {
            Ok(max_age) => now - self.built_at < max_age,
            Err(_) => true,
        }
    }

    /// Total number of records held.
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a snapshot written by [`Snapshot::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the snapshot as JSON, replacing any previous file atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let temp = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(&temp, data)?;
        std::fs::rename(&temp, path).map_err(|e| {
            FilesiftError::snapshot(format!("failed to move snapshot into place: {e}"))
        })?;
        Ok(())
    }
}

/// Snapshot-backed search.
///
/// Cheaper than a live walk but bounded to each channel's recent messages and
/// possibly stale. Queries carrying resume cursors are rejected.
pub struct IndexedSnapshotSearch {
    source: Arc<dyn MessageSource>,
    permissions: Arc<dyn PermissionOracle>,
    config: SearchConfig,
    snapshot_config: SnapshotConfig,
    state: ClientState,
    snapshots: RwLock<HashMap<Scope, Arc<Snapshot>>>,
    metrics: Option<ScanMetricsCollector>,
    merger: RankingMerger,
}

impl IndexedSnapshotSearch {
    /// Create a client with validated configurations.
    pub fn new(
        source: Arc<dyn MessageSource>,
        permissions: Arc<dyn PermissionOracle>,
        config: SearchConfig,
        snapshot_config: SnapshotConfig,
    ) -> Result<Self> {
        config.validate()?;
        snapshot_config.validate()?;
        let metrics = config.collect_metrics.then(ScanMetricsCollector::new);
        Ok(IndexedSnapshotSearch {
            source,
            permissions,
            config,
            snapshot_config,
            state: ClientState::new(),
            snapshots: RwLock::new(HashMap::new()),
            metrics,
            merger: RankingMerger::new(),
        })
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Where the snapshot of `scope` is persisted, if persistence is enabled.
    pub fn snapshot_path(&self, scope: &Scope) -> Option<PathBuf> {
        self.snapshot_config
            .persist_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", scope.key())))
    }

    /// A snapshot of `scope`, reused when fresh and rebuilt otherwise.
    pub async fn snapshot(&self, scope: &Scope) -> Result<Arc<Snapshot>> {
        let now = Utc::now();
        let max_age = self.snapshot_config.refresh_interval();

        let cached = self.snapshots.read().get(scope).cloned();
        if let Some(cached) = cached.filter(|s| s.is_fresh(now, max_age)) {
            debug!(%scope, "reusing cached snapshot");
            return Ok(cached);
        }

        if let Some(stored) = self.load_persisted(scope, now) {
            let stored = Arc::new(stored);
            self.snapshots.write().insert(*scope, Arc::clone(&stored));
            return Ok(stored);
        }

        let snapshot = Arc::new(self.rebuild(scope).await?);
        if let Some(path) = self.snapshot_path(scope) {
            snapshot.save(&path)?;
            debug!(%scope, path = %path.display(), "persisted snapshot");
        }
        self.snapshots.write().insert(*scope, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Build a fresh snapshot of `scope` from the message source.
    pub async fn rebuild(&self, scope: &Scope) -> Result<Snapshot> {
        let timer = Timer::start();
        let channels = self.source.list_channels(scope).await?;
        let depth = self.snapshot_config.depth;
        let gate = Semaphore::new(self.config.max_concurrent_scans);

        let pages = join_all(channels.iter().map(|channel| {
            let gate = &gate;
            async move {
                let _permit = gate
                    .acquire()
                    .await
                    .map_err(|e| FilesiftError::cancelled(e.to_string()))?;
                self.source
                    .history(channel, HistoryRequest::new(depth))
                    .await
            }
        }))
        .await;

        let mut records = BTreeMap::new();
        let mut failures = Vec::new();
        for (channel, page) in channels.iter().zip(pages) {
            match page {
                Ok(messages) => {
                    let channel_records: Vec<AttachmentRecord> = messages
                        .iter()
                        .flat_map(AttachmentRecord::from_message)
                        .collect();
                    records.insert(channel.id, channel_records);
                }
                Err(e) => match e.in_channel(channel.id) {
                    FilesiftError::ChannelUnavailable { channel, reason } => {
                        warn!(%channel, %reason, "snapshot build skipped channel");
                        failures.push(ChannelFailure {
                            channel_id: channel,
                            reason,
                        });
                    }
                    e => return Err(e),
                },
            }
        }

        let snapshot = Snapshot {
            scope: *scope,
            built_at: Utc::now(),
            depth,
            channels,
            records,
            failures,
        };
        info!(
            %scope,
            channels = snapshot.channels.len(),
            records = snapshot.len(),
            elapsed_ms = timer.stop().as_millis() as u64,
            "built snapshot"
        );
        Ok(snapshot)
    }

    fn load_persisted(&self, scope: &Scope, now: DateTime<Utc>) -> Option<Snapshot> {
        let path = self.snapshot_path(scope)?;
        if !path.exists() {
            return None;
        }
        match Snapshot::load(&path) {
            Ok(snapshot)
                if snapshot.scope == *scope
                    && snapshot.depth == self.snapshot_config.depth
                    && snapshot.is_fresh(now, self.snapshot_config.refresh_interval()) =>
            {
                debug!(%scope, path = %path.display(), "loaded persisted snapshot");
                Some(snapshot)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(%scope, path = %path.display(), error = %e, "ignoring unreadable snapshot");
                None
            }
        }
    }

    async fn search_snapshot(
        &self,
        identity: UserId,
        snapshot: &Snapshot,
        query: &Query,
    ) -> ScanOutcome {
        let mut outcome = ScanOutcome::empty(Uuid::new_v4());
        let predicate = MatchPredicate::new(query, self.config.threshold);
        let mut seen = AHashSet::new();
        let mut readable = BTreeSet::new();

        for channel in &snapshot.channels {
            if query.channel().is_some_and(|only| only != channel.id) {
                continue;
            }
            if !self.permissions.can_read_history(identity, channel).await {
                debug!(channel = %channel.id, %identity, "no history access, skipping");
                continue;
            }
            readable.insert(channel.id);
            outcome.channels_scanned += 1;
            let Some(records) = snapshot.records.get(&channel.id) else {
                continue;
            };
            outcome.records.extend(
                records
                    .iter()
                    .filter(|record| predicate.matches(record))
                    .filter(|record| seen.insert(record.object_id.clone()))
                    .cloned(),
            );
        }

        outcome.failures = snapshot
            .failures
            .iter()
            .filter(|f| readable.contains(&f.channel_id))
            .cloned()
            .collect();

        outcome
            .records
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.merger.rank(query, &mut outcome.records);
        outcome.records.truncate(self.config.result_limit);
        outcome
    }
}

#[async_trait]
impl SearchClient for IndexedSnapshotSearch {
    async fn initialize(&self, identity: UserId) -> bool {
        self.state.bind(identity);
        info!(%identity, "snapshot search initialized");
        true
    }

    async fn search(&self, request: SearchRequest) -> Result<ScanOutcome> {
        let (identity, query) = self.state.prepare(&request.query)?;
        if query.is_resuming() {
            return Err(FilesiftError::invalid_query(
                "snapshot search does not support resume cursors",
            ));
        }

        let timer = Timer::start();
        let snapshot = self.snapshot(&request.scope).await?;
        let outcome = self.search_snapshot(identity, &snapshot, &query).await;
        let elapsed = timer.stop();

        if let Some(metrics) = &self.metrics {
            metrics.record_search(
                elapsed,
                outcome.channels_scanned as u64,
                outcome.failures.len() as u64,
                outcome.records.len() as u64,
                false,
            );
        }
        info!(
            search_id = %outcome.search_id,
            scope = %request.scope,
            records = outcome.records.len(),
            snapshot_age_ms = (Utc::now() - snapshot.built_at).num_milliseconds(),
            elapsed_ms = elapsed.as_millis() as u64,
            "snapshot search complete"
        );
        Ok(outcome)
    }

    async fn create_doc(&self, record: &AttachmentRecord) -> Result<()> {
        debug!(object_id = %record.object_id, "snapshot search rebuilds from history, ignoring create_doc");
        Ok(())
    }

    async fn remove_doc(
        &self,
        ids: &[ObjectId],
        scope: &Scope,
        actor: UserId,
    ) -> Result<RemovedDocs> {
        let newly = self.state.ban(ids);
        info!(%scope, %actor, requested = ids.len(), newly_banned = newly.len(), "banned documents");
        Ok(RemovedDocs {
            removed_ids: ids.to_vec(),
        })
    }

    async fn clear(&self) -> Result<()> {
        self.state.clear();
        info!("cleared banned documents");
        Ok(())
    }

    fn metrics(&self) -> Option<ScanMetrics> {
        self.metrics.as_ref().map(ScanMetricsCollector::snapshot)
    }
}
