//! Attachment records produced by a scan.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::{Attachment, AttachmentId, ChannelId, Message, MessageId, UserId};

/// Stable identity of one attachment: `<channel>-<message>-<attachment>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Compose the identity of an attachment from its coordinates.
    pub fn compose(channel: ChannelId, message: MessageId, attachment: AttachmentId) -> Self {
        ObjectId(format!("{channel}-{message}-{attachment}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId(s.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        ObjectId(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file attachment matched by a search, together with its message context.
///
/// Records are built fresh for every scan and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub object_id: ObjectId,
    pub filename: String,
    pub content_type: Option<String>,
    /// Text of the message the file was posted with.
    pub content: String,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub url: String,
    /// Deep link to the message.
    pub jump_url: String,
}

impl AttachmentRecord {
    /// Build a record for one attachment of a message.
    pub fn from_attachment(message: &Message, attachment: &Attachment) -> Self {
        AttachmentRecord {
            object_id: ObjectId::compose(message.channel_id, message.id, attachment.id),
            filename: attachment.filename.clone(),
            content_type: attachment.content_type.clone(),
            content: message.content.clone(),
            channel_id: message.channel_id,
            message_id: message.id,
            author_id: message.author_id,
            created_at: message.created_at,
            url: attachment.url.clone(),
            jump_url: message.jump_url.clone(),
        }
    }

    /// Build records for every attachment of a message.
    pub fn from_message(message: &Message) -> Vec<Self> {
        message
            .attachments
            .iter()
            .map(|attachment| Self::from_attachment(message, attachment))
            .collect()
    }
}
