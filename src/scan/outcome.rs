//! The result of one search call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::{CursorMap, Query};
use crate::record::AttachmentRecord;
use crate::source::ChannelId;

/// A channel that could not be scanned during a call.
///
/// Failed channels contribute no records and get no resume cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFailure {
    pub channel_id: ChannelId,
    pub reason: String,
}

/// Records found by a search plus the state needed to continue it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Identifier of the call, used to correlate log lines.
    pub search_id: Uuid,

    /// Matching records, unique by object id, ranked when the query carries
    /// a text term.
    pub records: Vec<AttachmentRecord>,

    /// Resume cursors for channels that stopped before their history ran out.
    pub channel_cursor_map: CursorMap,

    /// Channels whose scan failed.
    pub failures: Vec<ChannelFailure>,

    /// Number of channels dispatched.
    pub channels_scanned: usize,

    /// Whether the call was cut short by its timeout.
    pub timed_out: bool,
}

impl ScanOutcome {
    /// An outcome with no records and nothing to resume.
    pub fn empty(search_id: Uuid) -> Self {
        ScanOutcome {
            search_id,
            records: Vec::new(),
            channel_cursor_map: CursorMap::new(),
            failures: Vec::new(),
            channels_scanned: 0,
            timed_out: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether some channel still has unscanned history.
    pub fn has_more(&self) -> bool {
        !self.channel_cursor_map.is_empty()
    }

    /// The query that fetches the next page of results, if there is one.
    pub fn next_query(&self, query: &Query) -> Option<Query> {
        self.has_more()
            .then(|| query.resuming_from(self.channel_cursor_map.clone()))
    }
}
