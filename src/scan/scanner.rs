//! Scans a single channel's history.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::error::Result;
use crate::query::MatchPredicate;
use crate::record::AttachmentRecord;
use crate::scan::accumulator::{Admission, ScanSink};
use crate::source::{Channel, HistoryRequest, MessageSource};

/// Why a channel scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// The history ran out before the budget did.
    Exhausted,
    /// The shared budget was spent; the sink holds the resume cursor.
    BudgetReached,
}

/// Walks one channel's history from newest to oldest, page by page.
///
/// Every history page is a suspension point. Matches are offered to the sink
/// one timestamp at a time: all messages posted at the same instant form a
/// run that is admitted or deferred as a whole, even when it straddles a page
/// boundary. Resume cursors are bare timestamps, so a run is never split
/// between two calls.
pub struct ChannelScanner<'a> {
    source: &'a dyn MessageSource,
    predicate: &'a MatchPredicate<'a>,
    page_size: usize,
}

/// Matches of the messages posted at one instant.
struct Run {
    at: DateTime<Utc>,
    records: Vec<AttachmentRecord>,
}

impl<'a> ChannelScanner<'a> {
    pub fn new(
        source: &'a dyn MessageSource,
        predicate: &'a MatchPredicate<'a>,
        page_size: usize,
    ) -> Self {
        ChannelScanner {
            source,
            predicate,
            page_size,
        }
    }

    /// Scan `channel` until its history or the shared budget runs out.
    ///
    /// Errors from the message source are returned as-is; the caller decides
    /// how to record them.
    pub async fn scan<S: ScanSink>(&self, channel: &Channel, sink: &S) -> Result<ScanStop> {
        let query = self.predicate.query();
        let after = query.after();
        // History bounds are exclusive; the query's lower bound is not.
        let lower = after.map(|after| after - TimeDelta::nanoseconds(1));
        let mut request = HistoryRequest::new(self.page_size)
            .before(query.start_bound(channel.id))
            .after(lower);
        let mut run: Option<Run> = None;
        let mut pages = 0usize;

        loop {
            if sink.check_budget(channel.id) == Admission::BudgetReached {
                debug!(channel = %channel.id, pages, "budget reached before fetch");
                return Ok(ScanStop::BudgetReached);
            }

            let page = self.source.history(channel, request).await?;
            pages += 1;

            for message in &page {
                if after.is_some_and(|after| message.created_at < after) {
                    debug!(channel = %channel.id, pages, "reached lower time bound");
                    return Ok(self.finish(channel, run, sink));
                }
                let records = self.predicate.matching_records(message);
                if let Some(current) = run.as_mut().filter(|r| r.at == message.created_at) {
                    current.records.extend(records);
                    continue;
                }
                let previous = run.replace(Run {
                    at: message.created_at,
                    records,
                });
                if let Some(previous) = previous {
                    let admission = sink.offer(channel.id, previous.at, previous.records);
                    if admission == Admission::BudgetReached {
                        debug!(channel = %channel.id, pages, "budget reached");
                        return Ok(ScanStop::BudgetReached);
                    }
                }
            }

            match page.last() {
                Some(oldest) if page.len() >= self.page_size => {
                    request = request.before_message(oldest.created_at, oldest.id);
                }
                _ => {
                    debug!(channel = %channel.id, pages, "history exhausted");
                    return Ok(self.finish(channel, run, sink));
                }
            }
        }
    }

    /// Offer the last pending run of an exhausted history.
    fn finish<S: ScanSink>(&self, channel: &Channel, run: Option<Run>, sink: &S) -> ScanStop {
        let Some(run) = run else {
            return ScanStop::Exhausted;
        };
        match sink.offer(channel.id, run.at, run.records) {
            Admission::Accepted => ScanStop::Exhausted,
            Admission::BudgetReached => ScanStop::BudgetReached,
        }
    }
}
