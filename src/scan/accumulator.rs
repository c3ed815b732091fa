//! The per-call result accumulator shared by concurrent channel scans.
//!
//! Scanners never touch the accumulator's state. They see it through
//! [`ScanSink`], whose calls each run inside a single critical section: the
//! budget check, the dedup check, record admission and the channel's progress
//! marker change together or not at all.

use std::collections::BTreeMap;

use ahash::AHashSet;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::query::CursorMap;
use crate::record::{AttachmentRecord, ObjectId};
use crate::scan::outcome::{ChannelFailure, ScanOutcome};
use crate::source::ChannelId;

/// Answer to a scanner offering the matches of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The matches were integrated; keep scanning.
    Accepted,
    /// The shared budget is spent; the channel has been given a cursor and
    /// the scan must stop.
    BudgetReached,
}

/// Narrow view of the accumulator handed to scanners.
pub trait ScanSink: Send + Sync {
    /// Stop the channel if the budget is already spent.
    fn check_budget(&self, channel: ChannelId) -> Admission;

    /// Offer the matches of every message posted at `inspected_at`.
    ///
    /// The messages count as inspected only when the offer is accepted.
    fn offer(
        &self,
        channel: ChannelId,
        inspected_at: DateTime<Utc>,
        records: Vec<AttachmentRecord>,
    ) -> Admission;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChannelStatus {
    Pending,
    Scanning,
    Exhausted,
    Stopped(DateTime<Utc>),
    Failed(String),
}

#[derive(Debug, Clone)]
struct ChannelProgress {
    /// Exclusive bound the scan started from; `None` is "now".
    start: Option<DateTime<Utc>>,
    /// Oldest message whose matches have been fully integrated.
    last_inspected: Option<DateTime<Utc>>,
    status: ChannelStatus,
}

impl ChannelProgress {
    fn resume_cursor(&self, started_at: DateTime<Utc>) -> DateTime<Utc> {
        self.last_inspected.or(self.start).unwrap_or(started_at)
    }
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<AttachmentRecord>,
    seen: AHashSet<ObjectId>,
    channels: BTreeMap<ChannelId, ChannelProgress>,
}

/// Result set, dedup set, cursor map and budget counter of one search call.
#[derive(Debug)]
pub struct ScanAccumulator {
    budget: usize,
    started_at: DateTime<Utc>,
    inner: Mutex<Inner>,
}

impl ScanAccumulator {
    /// Create an accumulator admitting at most `budget` records.
    pub fn new(budget: usize, started_at: DateTime<Utc>) -> Self {
        ScanAccumulator {
            budget,
            started_at,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Register a channel that is about to be scanned from `start`.
    pub fn register(&self, channel: ChannelId, start: Option<DateTime<Utc>>) {
        self.inner.lock().channels.insert(
            channel,
            ChannelProgress {
                start,
                last_inspected: None,
                status: ChannelStatus::Pending,
            },
        );
    }

    /// Mark a channel whose history ran out before the budget did.
    pub fn exhaust(&self, channel: ChannelId) {
        if let Some(progress) = self.inner.lock().channels.get_mut(&channel) {
            progress.status = ChannelStatus::Exhausted;
        }
    }

    /// Mark a channel whose scan failed.
    pub fn fail<S: Into<String>>(&self, channel: ChannelId, reason: S) {
        if let Some(progress) = self.inner.lock().channels.get_mut(&channel) {
            progress.status = ChannelStatus::Failed(reason.into());
        }
    }

    /// Number of records admitted so far.
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the call and produce its outcome.
    ///
    /// Channels that never reached a terminal state (because the call timed
    /// out) get a cursor at their last fully inspected message, or at their
    /// start bound if they inspected nothing.
    pub fn into_outcome(self, search_id: Uuid, timed_out: bool) -> ScanOutcome {
        let started_at = self.started_at;
        let inner = self.inner.into_inner();

        let mut channel_cursor_map = CursorMap::new();
        let mut failures = Vec::new();
        let channels_scanned = inner.channels.len();

        for (channel, progress) in inner.channels {
            match &progress.status {
                ChannelStatus::Exhausted => {}
                ChannelStatus::Stopped(cursor) => {
                    channel_cursor_map.insert(channel, *cursor);
                }
                ChannelStatus::Pending | ChannelStatus::Scanning => {
                    channel_cursor_map.insert(channel, progress.resume_cursor(started_at));
                }
                ChannelStatus::Failed(reason) => failures.push(ChannelFailure {
                    channel_id: channel,
                    reason: reason.clone(),
                }),
            }
        }

        ScanOutcome {
            search_id,
            records: inner.records,
            channel_cursor_map,
            failures,
            channels_scanned,
            timed_out,
        }
    }

    fn stop(&self, inner: &mut Inner, channel: ChannelId) -> Admission {
        if let Some(progress) = inner.channels.get_mut(&channel) {
            let cursor = progress.resume_cursor(self.started_at);
            progress.status = ChannelStatus::Stopped(cursor);
        }
        Admission::BudgetReached
    }
}

impl ScanSink for ScanAccumulator {
    fn check_budget(&self, channel: ChannelId) -> Admission {
        let mut inner = self.inner.lock();
        if inner.records.len() >= self.budget {
            return self.stop(&mut inner, channel);
        }
        Admission::Accepted
    }

    fn offer(
        &self,
        channel: ChannelId,
        inspected_at: DateTime<Utc>,
        records: Vec<AttachmentRecord>,
    ) -> Admission {
        let mut inner = self.inner.lock();

        if inner.records.len() >= self.budget {
            return self.stop(&mut inner, channel);
        }

        let mut batch_ids = AHashSet::new();
        let fresh: Vec<AttachmentRecord> = records
            .into_iter()
            .filter(|r| !inner.seen.contains(&r.object_id) && batch_ids.insert(r.object_id.clone()))
            .collect();

        // A run that does not fit is deferred whole to the next call, unless
        // nothing was admitted yet: a timestamp cursor cannot point inside it.
        let remaining = self.budget - inner.records.len();
        if fresh.len() > remaining && !inner.records.is_empty() {
            return self.stop(&mut inner, channel);
        }

        for record in fresh {
            inner.seen.insert(record.object_id.clone());
            inner.records.push(record);
        }
        if let Some(progress) = inner.channels.get_mut(&channel) {
            progress.last_inspected = Some(inspected_at);
            progress.status = ChannelStatus::Scanning;
        }
        Admission::Accepted
    }
}
