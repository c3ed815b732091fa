//! Collaborator interfaces the search core consumes.
//!
//! The core never talks to a chat platform directly. It is handed a
//! [`MessageSource`] that lists channels and pages through their history, and
//! a [`PermissionOracle`] that answers access questions for a principal.
//! [`memory`] provides in-process implementations of both.

pub mod memory;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use crate::record::AttachmentRecord;

pub use types::{
    Attachment, AttachmentId, Channel, ChannelId, GroupId, HistoryRequest, Message, MessageId,
    Scope, UserId,
};

/// A source of channels and their message history.
///
/// Retry policy, rate limiting and authentication belong to the
/// implementation; the core never retries a failed call.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// List the channels covered by a scope.
    async fn list_channels(&self, scope: &Scope) -> Result<Vec<Channel>>;

    /// Fetch one page of history, newest first.
    ///
    /// Only messages strictly inside the request bounds are returned, at most
    /// `request.limit` of them. Messages sharing a timestamp come in
    /// descending id order so `request.before_id` can continue between them. A page shorter than the limit means the
    /// history below `request.before` is exhausted.
    async fn history(&self, channel: &Channel, request: HistoryRequest) -> Result<Vec<Message>>;

    /// Delete a message.
    ///
    /// Returns `FilesiftError::Permission` when the acting account may not
    /// delete it and `FilesiftError::NotFound` when it no longer exists.
    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()>;
}

/// Answers permission questions about a principal.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    /// Whether `principal` may read the history of `channel`.
    async fn can_read_history(&self, principal: UserId, channel: &Channel) -> bool;

    /// Keep only the records `principal` is allowed to act on.
    async fn filter_by_manage_permission(
        &self,
        principal: UserId,
        records: Vec<AttachmentRecord>,
    ) -> Vec<AttachmentRecord>;
}
