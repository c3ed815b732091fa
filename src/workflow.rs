//! Find, remove and delete workflows on behalf of a command caller.
//!
//! Each workflow searches the caller's scope, then keeps only the records the
//! caller may manage before acting on them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::{Caller, SearchClient, SearchRequest};
use crate::error::{FilesiftError, Result};
use crate::query::Query;
use crate::record::{AttachmentRecord, ObjectId};
use crate::scan::ScanOutcome;
use crate::source::{MessageSource, PermissionOracle};

/// Result of [`delete_files`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Records whose messages were deleted.
    pub deleted: Vec<AttachmentRecord>,
    /// Records banned from search whose messages could not be deleted.
    pub skipped: Vec<AttachmentRecord>,
}

/// Search the caller's scope and keep what the caller may manage.
///
/// The outcome's cursors are left intact so the caller can page on.
pub async fn find_files<C: Caller + ?Sized>(
    client: &dyn SearchClient,
    permissions: &dyn PermissionOracle,
    caller: &C,
    query: Query,
) -> Result<ScanOutcome> {
    let mut outcome = client
        .search(SearchRequest::for_caller(caller, query))
        .await?;
    let found = outcome.records.len();
    outcome.records = permissions
        .filter_by_manage_permission(caller.author(), std::mem::take(&mut outcome.records))
        .await;
    info!(
        author = %caller.author(),
        found,
        manageable = outcome.records.len(),
        "found files"
    );
    Ok(outcome)
}

/// Ban the caller's manageable matches from later searches.
///
/// Returns the records that were banned.
pub async fn remove_files<C: Caller + ?Sized>(
    client: &dyn SearchClient,
    permissions: &dyn PermissionOracle,
    caller: &C,
    query: Query,
) -> Result<Vec<AttachmentRecord>> {
    let outcome = find_files(client, permissions, caller, query).await?;
    if outcome.records.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<ObjectId> = outcome.records.iter().map(|r| r.object_id.clone()).collect();
    let removed = client
        .remove_doc(&ids, &caller.search_scope(), caller.author())
        .await?;
    let removed: BTreeSet<&ObjectId> = removed.removed_ids.iter().collect();

    Ok(outcome
        .records
        .into_iter()
        .filter(|r| removed.contains(&r.object_id))
        .collect())
}

/// Ban the caller's manageable matches and delete the messages carrying them.
///
/// Messages the acting account may not delete, or that are already gone, are
/// skipped. Any other source error aborts the remaining deletions.
pub async fn delete_files<C: Caller + ?Sized>(
    client: &dyn SearchClient,
    source: &dyn MessageSource,
    permissions: &dyn PermissionOracle,
    caller: &C,
    query: Query,
) -> Result<DeleteReport> {
    let records = remove_files(client, permissions, caller, query).await?;
    let mut report = DeleteReport::default();
    let mut attempted = BTreeSet::new();
    let mut failed = BTreeSet::new();

    for record in &records {
        let key = (record.channel_id, record.message_id);
        if attempted.insert(key) {
            match source.delete_message(record.channel_id, record.message_id).await {
                Ok(()) => {}
                Err(e @ (FilesiftError::Permission(_) | FilesiftError::NotFound(_))) => {
                    warn!(
                        channel = %record.channel_id,
                        message = %record.message_id,
                        error = %e,
                        "skipping message"
                    );
                    failed.insert(key);
                }
                Err(e) => return Err(e),
            }
        }
    }

    for record in records {
        if failed.contains(&(record.channel_id, record.message_id)) {
            report.skipped.push(record);
        } else {
            report.deleted.push(record);
        }
    }
    info!(
        author = %caller.author(),
        deleted = report.deleted.len(),
        skipped = report.skipped.len(),
        "deleted files"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CommandContext, LiveFederatedSearch};
    use crate::scan::SearchConfig;
    use crate::source::memory::{InMemoryPermissions, InMemorySource};
    use crate::source::{
        Attachment, AttachmentId, Channel, ChannelId, GroupId, Message, MessageId, UserId,
    };
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    const BOT: UserId = UserId(99);
    const ALICE: UserId = UserId(1);

    fn message(channel: u64, id: u64, filenames: &[&str]) -> Message {
        Message {
            id: MessageId(id),
            channel_id: ChannelId(channel),
            author_id: UserId(5),
            created_at: Utc.timestamp_opt(1_700_000_000 + id as i64, 0).unwrap(),
            content: String::new(),
            attachments: filenames
                .iter()
                .enumerate()
                .map(|(i, name)| Attachment {
                    id: AttachmentId(id * 10 + i as u64),
                    filename: name.to_string(),
                    content_type: None,
                    url: String::new(),
                })
                .collect(),
            jump_url: String::new(),
        }
    }

    struct Fixture {
        source: Arc<InMemorySource>,
        permissions: Arc<InMemoryPermissions>,
        client: LiveFederatedSearch,
        caller: CommandContext,
    }

    async fn fixture() -> Fixture {
        let source = Arc::new(InMemorySource::new());
        source.add_channel(Channel::new(ChannelId(1), "general").in_group(GroupId(7)));
        source.add_channel(Channel::new(ChannelId(2), "private").in_group(GroupId(7)));
        source.add_message(message(1, 1, &["budget.xlsx", "budget-notes.txt"]));
        source.add_message(message(1, 2, &["budget-2024.xlsx"]));
        source.add_message(message(2, 3, &["budget-secret.xlsx"]));

        let permissions = Arc::new(InMemoryPermissions::new());
        permissions.deny(ALICE, ChannelId(2));

        let client = LiveFederatedSearch::new(
            source.clone(),
            permissions.clone(),
            SearchConfig::default(),
        )
        .unwrap();
        client.initialize(BOT).await;

        Fixture {
            source,
            permissions,
            client,
            caller: CommandContext {
                author: ALICE,
                channel: ChannelId(1),
                guild: Some(GroupId(7)),
            },
        }
    }

    fn budget() -> Query {
        Query::builder().filename("budget").build().unwrap()
    }

    #[tokio::test]
    async fn test_find_files_filters_by_manage_permission() {
        let f = fixture().await;

        let outcome = find_files(&f.client, f.permissions.as_ref(), &f.caller, budget())
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 3);
        assert!(outcome.records.iter().all(|r| r.channel_id == ChannelId(1)));
    }

    #[tokio::test]
    async fn test_remove_files_bans_matches() {
        let f = fixture().await;

        let removed = remove_files(&f.client, f.permissions.as_ref(), &f.caller, budget())
            .await
            .unwrap();
        assert_eq!(removed.len(), 3);

        let again = find_files(&f.client, f.permissions.as_ref(), &f.caller, budget())
            .await
            .unwrap();
        assert!(again.records.is_empty());
        // Messages are untouched.
        assert_eq!(f.source.message_count(ChannelId(1)), 2);
    }

    #[tokio::test]
    async fn test_delete_files_skips_forbidden_messages() {
        let f = fixture().await;
        f.source.forbid_delete(MessageId(2));

        let report = delete_files(
            &f.client,
            f.source.as_ref(),
            f.permissions.as_ref(),
            &f.caller,
            budget(),
        )
        .await
        .unwrap();

        assert_eq!(report.deleted.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].message_id, MessageId(2));
        assert_eq!(f.source.message_count(ChannelId(1)), 1);
        assert_eq!(f.source.message_count(ChannelId(2)), 1);
    }
}
