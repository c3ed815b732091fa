//! Identifiers and message shapes produced by a message source.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a channel.
    ChannelId
);
id_type!(
    /// Identifier of a channel group (a server / guild).
    GroupId
);
id_type!(
    /// Identifier of a message within a channel.
    MessageId
);
id_type!(
    /// Identifier of a file attachment.
    AttachmentId
);
id_type!(
    /// Identifier of a user or bot account.
    UserId
);

/// What a search covers: one channel, or every channel of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Scope {
    /// A single channel, e.g. a direct-message channel.
    Channel(ChannelId),
    /// All channels of a group.
    Group(GroupId),
}

impl Scope {
    /// A stable key used to name per-scope state such as snapshots.
    pub fn key(&self) -> String {
        match self {
            Scope::Channel(id) => format!("channel-{id}"),
            Scope::Group(id) => format!("group-{id}"),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A message channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl Channel {
    pub fn new<S: Into<String>>(id: ChannelId, name: S) -> Self {
        Channel {
            id,
            name: name.into(),
            group_id: None,
        }
    }

    pub fn in_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub url: String,
}

/// A message with its attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub jump_url: String,
}

/// Bounds for one page of channel history.
///
/// Both bounds are exclusive. Pages are returned newest first, messages
/// sharing a timestamp in descending id order. With `before_id` set, the upper
/// bound is the position of that message: messages posted at `before` with a
/// smaller id are still inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRequest {
    pub before: Option<DateTime<Utc>>,
    pub before_id: Option<MessageId>,
    pub after: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl HistoryRequest {
    pub fn new(limit: usize) -> Self {
        HistoryRequest {
            before: None,
            before_id: None,
            after: None,
            limit,
        }
    }

    pub fn before(mut self, before: Option<DateTime<Utc>>) -> Self {
        self.before = before;
        self.before_id = None;
        self
    }

    /// Continue below a message already seen.
    pub fn before_message(mut self, created_at: DateTime<Utc>, id: MessageId) -> Self {
        self.before = Some(created_at);
        self.before_id = Some(id);
        self
    }

    pub fn after(mut self, after: Option<DateTime<Utc>>) -> Self {
        self.after = after;
        self
    }

    /// Whether a message lies inside the requested bounds.
    pub fn contains(&self, created_at: DateTime<Utc>, id: MessageId) -> bool {
        let below = match self.before {
            None => true,
            Some(before) => {
                created_at < before
                    || (created_at == before && self.before_id.is_some_and(|last| id < last))
            }
        };
        below && self.after.is_none_or(|after| created_at > after)
    }
}
