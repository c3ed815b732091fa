//! In-memory message source and permission oracle.
//!
//! Used by tests and by the CLI, which loads a [`Workspace`] fixture from a
//! JSON file. Latency and per-channel failures can be injected to exercise
//! the concurrent scan paths.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FilesiftError, Result};
use crate::record::AttachmentRecord;
use crate::source::{
    Channel, ChannelId, HistoryRequest, Message, MessageId, MessageSource, PermissionOracle,
    Scope, UserId,
};

/// Serializable description of a whole workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Channels whose history a user may not read.
    #[serde(default)]
    pub denied: Vec<Denial>,
}

/// A `(user, channel)` pair without history access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Denial {
    pub user: UserId,
    pub channel: ChannelId,
}

impl Workspace {
    /// Load a workspace from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// A message source backed by in-process collections.
#[derive(Debug, Default)]
pub struct InMemorySource {
    channels: RwLock<Vec<Channel>>,
    /// Messages per channel, newest first.
    messages: RwLock<HashMap<ChannelId, Vec<Message>>>,
    failing: RwLock<HashSet<ChannelId>>,
    forbidden_deletes: RwLock<HashSet<MessageId>>,
    latency: Option<(Duration, Duration)>,
    history_calls: AtomicUsize,
}

impl InMemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source holding every channel and message of a workspace.
    pub fn from_workspace(workspace: &Workspace) -> Self {
        let source = Self::new();
        for channel in &workspace.channels {
            source.add_channel(channel.clone());
        }
        for message in &workspace.messages {
            source.add_message(message.clone());
        }
        source
    }

    /// Sleep a random duration in `[min, max]` before every history page.
    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.latency = Some((min, max.max(min)));
        self
    }

    /// Register a channel.
    pub fn add_channel(&self, channel: Channel) {
        let mut channels = self.channels.write();
        channels.retain(|c| c.id != channel.id);
        channels.push(channel);
        channels.sort_by_key(|c| c.id);
    }

    /// Add a message to its channel's history.
    pub fn add_message(&self, message: Message) {
        let mut messages = self.messages.write();
        let history = messages.entry(message.channel_id).or_default();
        let position = history
            .iter()
            .position(|m| (m.created_at, m.id) < (message.created_at, message.id))
            .unwrap_or(history.len());
        history.insert(position, message);
    }

    /// Make every history request for a channel fail.
    pub fn fail_channel(&self, channel_id: ChannelId) {
        self.failing.write().insert(channel_id);
    }

    /// Make deleting a message fail with a permission error.
    pub fn forbid_delete(&self, message_id: MessageId) {
        self.forbidden_deletes.write().insert(message_id);
    }

    /// Number of history pages served so far.
    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::Relaxed)
    }

    /// Number of messages currently stored in a channel.
    pub fn message_count(&self, channel_id: ChannelId) -> usize {
        self.messages
            .read()
            .get(&channel_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn random_latency(&self) -> Option<Duration> {
        let (min, max) = self.latency?;
        let min_ms = min.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        Some(Duration::from_millis(rand::rng().random_range(min_ms..=max_ms)))
    }
}

#[async_trait]
impl MessageSource for InMemorySource {
    async fn list_channels(&self, scope: &Scope) -> Result<Vec<Channel>> {
        let channels = self.channels.read();
        match scope {
            Scope::Channel(id) => channels
                .iter()
                .find(|c| c.id == *id)
                .cloned()
                .map(|c| vec![c])
                .ok_or_else(|| FilesiftError::not_found(format!("channel {id}"))),
            Scope::Group(group) => Ok(channels
                .iter()
                .filter(|c| c.group_id == Some(*group))
                .cloned()
                .collect()),
        }
    }

    async fn history(&self, channel: &Channel, request: HistoryRequest) -> Result<Vec<Message>> {
        self.history_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(delay) = self.random_latency() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().contains(&channel.id) {
            return Err(FilesiftError::source(format!(
                "history unavailable for channel {}",
                channel.id
            )));
        }

        let messages = self.messages.read();
        Ok(messages
            .get(&channel.id)
            .map(|history| {
                history
                    .iter()
                    .filter(|m| request.contains(m.created_at, m.id))
                    .take(request.limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        if self.forbidden_deletes.read().contains(&message_id) {
            return Err(FilesiftError::permission(format!(
                "cannot delete message {message_id}"
            )));
        }

        let mut messages = self.messages.write();
        let history = messages
            .get_mut(&channel_id)
            .ok_or_else(|| FilesiftError::not_found(format!("channel {channel_id}")))?;
        let before = history.len();
        history.retain(|m| m.id != message_id);
        if history.len() == before {
            return Err(FilesiftError::not_found(format!("message {message_id}")));
        }
        Ok(())
    }
}

/// A permission oracle that grants everything except explicit denials.
#[derive(Debug, Default)]
pub struct InMemoryPermissions {
    denied: RwLock<HashSet<Denial>>,
}

impl InMemoryPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an oracle with the denials of a workspace.
    pub fn from_workspace(workspace: &Workspace) -> Self {
        let permissions = Self::new();
        for denial in &workspace.denied {
            permissions.deny(denial.user, denial.channel);
        }
        permissions
    }

    /// Revoke history access to a channel for a user.
    pub fn deny(&self, user: UserId, channel: ChannelId) {
        self.denied.write().insert(Denial { user, channel });
    }

    fn allowed(&self, user: UserId, channel: ChannelId) -> bool {
        !self.denied.read().contains(&Denial { user, channel })
    }
}

#[async_trait]
impl PermissionOracle for InMemoryPermissions {
    async fn can_read_history(&self, principal: UserId, channel: &Channel) -> bool {
        self.allowed(principal, channel.id)
    }

    async fn filter_by_manage_permission(
        &self,
        principal: UserId,
        records: Vec<AttachmentRecord>,
    ) -> Vec<AttachmentRecord> {
        records
            .into_iter()
            .filter(|record| self.allowed(principal, record.channel_id))
            .collect()
    }
}
