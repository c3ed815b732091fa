//! Search client that scans live channel history on every call.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::{ClientState, RemovedDocs, SearchClient, SearchRequest};
use crate::error::Result;
use crate::record::{AttachmentRecord, ObjectId};
use crate::scan::{FanoutCoordinator, ScanMetrics, ScanMetricsCollector, ScanOutcome, SearchConfig};
use crate::source::{MessageSource, PermissionOracle, Scope, UserId};

/// Federated live search over a [`MessageSource`].
///
/// Every call fans out over the scope's channels through a
/// [`FanoutCoordinator`]. Outcomes carry resume cursors; pass them back via
/// [`ScanOutcome::next_query`] to continue where the previous call stopped.
pub struct LiveFederatedSearch {
    source: Arc<dyn MessageSource>,
    permissions: Arc<dyn PermissionOracle>,
    config: SearchConfig,
    state: ClientState,
    metrics: Option<ScanMetricsCollector>,
}

impl LiveFederatedSearch {
    /// Create a client with a validated configuration.
    pub fn new(
        source: Arc<dyn MessageSource>,
        permissions: Arc<dyn PermissionOracle>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        let metrics = config.collect_metrics.then(ScanMetricsCollector::new);
        Ok(LiveFederatedSearch {
            source,
            permissions,
            config,
            state: ClientState::new(),
            metrics,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }
}

#[async_trait]
impl SearchClient for LiveFederatedSearch {
    async fn initialize(&self, identity: UserId) -> bool {
        self.state.bind(identity);
        info!(%identity, "live search initialized");
        true
    }

    async fn search(&self, request: SearchRequest) -> Result<ScanOutcome> {
        let (identity, query) = self.state.prepare(&request.query)?;
        let channels = self.source.list_channels(&request.scope).await?;
        debug!(scope = %request.scope, channels = channels.len(), "listed channels");

        let coordinator = FanoutCoordinator::new(
            self.source.as_ref(),
            self.permissions.as_ref(),
            &self.config,
        )
        .with_metrics(self.metrics.as_ref());

        coordinator.search(identity, channels, &query).await
    }

    async fn create_doc(&self, record: &AttachmentRecord) -> Result<()> {
        debug!(object_id = %record.object_id, "live search keeps no index, ignoring create_doc");
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
