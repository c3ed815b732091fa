//! The uniform search client contract and its two variants.
//!
//! [`LiveFederatedSearch`] walks channel histories on every call and supports
//! resuming. [`IndexedSnapshotSearch`] searches a bounded, periodically
//! rebuilt copy of each channel's recent messages. Both hold the same
//! per-instance state: the bound identity and the set of banned object ids.

pub mod config;
pub mod live;
pub mod request;
pub mod snapshot;

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{FilesiftError, Result};
use crate::query::Query;
use crate::record::{AttachmentRecord, ObjectId};
use crate::scan::{ScanMetrics, ScanOutcome};
use crate::source::{Scope, UserId};

pub use config::SnapshotConfig;
pub use live::LiveFederatedSearch;
pub use request::{Caller, CommandContext, SearchRequest};
pub use snapshot::{IndexedSnapshotSearch, Snapshot};

/// Ids a `remove_doc` call banned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedDocs {
    pub removed_ids: Vec<ObjectId>,
}

/// Operations every search backend offers.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Bind the identity used for permission checks and self-exclusion.
    ///
    /// Calling it again rebinds; it always succeeds for in-crate variants.
    async fn initialize(&self, identity: UserId) -> bool;

    /// Run a search.
    ///
    /// Fails with `NotInitialized` before [`initialize`](Self::initialize)
    /// and with `InvalidQuery` when the query constrains nothing.
    async fn search(&self, request: SearchRequest) -> Result<ScanOutcome>;

    /// Index a record. The in-crate variants keep no separate index.
    async fn create_doc(&self, record: &AttachmentRecord) -> Result<()>;

    /// Exclude `ids` from every later search of this client.
    async fn remove_doc(
        &self,
        ids: &[ObjectId],
        scope: &Scope,
        actor: UserId,
    ) -> Result<RemovedDocs>;

    /// Forget every banned id.
    async fn clear(&self) -> Result<()>;

    /// Metrics collected so far, if collection is enabled.
    fn metrics(&self) -> Option<ScanMetrics>;
}

/// Identity and ban list of one client instance.
///
/// Created empty, bound by `initialize`, mutated by `remove_doc` and `clear`.
/// Every search reads one consistent copy of it.
#[derive(Debug, Default)]
pub struct ClientState {
    inner: RwLock<StateInner>,
}

#[derive(Debug, Default)]
struct StateInner {
    identity: Option<UserId>,
    banned_ids: HashSet<ObjectId>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the scanning identity.
    pub fn bind(&self, identity: UserId) {
        self.inner.write().identity = Some(identity);
    }

    /// The bound identity.
    pub fn identity(&self) -> Result<UserId> {
        self.inner
            .read()
            .identity
            .ok_or_else(|| FilesiftError::not_initialized("call initialize before searching"))
    }

    /// Ban ids, returning the ones that were not banned yet.
    pub fn ban<'a, I: IntoIterator<Item = &'a ObjectId>>(&self, ids: I) -> Vec<ObjectId> {
        let mut inner = self.inner.write();
        ids.into_iter()
            .filter(|id| inner.banned_ids.insert((*id).clone()))
            .cloned()
            .collect()
    }

    pub fn is_banned(&self, id: &ObjectId) -> bool {
        self.inner.read().banned_ids.contains(id)
    }

    pub fn banned_count(&self) -> usize {
        self.inner.read().banned_ids.len()
    }

    /// Forget every banned id. The identity stays bound.
    pub fn clear(&self) {
        self.inner.write().banned_ids.clear();
    }

    /// Check a request and produce the query a search should run, with this
    /// client's bans and self-exclusion applied.
    pub fn prepare(&self, query: &Query) -> Result<(UserId, Query)> {
        let inner = self.inner.read();
        let identity = inner
            .identity
            .ok_or_else(|| FilesiftError::not_initialized("call initialize before searching"))?;
        if !query.has_constraints() {
            return Err(FilesiftError::invalid_query(
                "at least one search term or filter is required",
            ));
        }
        let query = query
            .with_banned_ids(inner.banned_ids.iter().cloned())
            .excluding_author(identity);
        Ok((identity, query))
    }
}
