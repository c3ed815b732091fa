//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use filesift::client::LiveFederatedSearch;
use filesift::scan::SearchConfig;
use filesift::source::memory::{InMemoryPermissions, InMemorySource};
use filesift::source::{
    Attachment, AttachmentId, Channel, ChannelId, GroupId, Message, MessageId, UserId,
};

pub const GROUP: GroupId = GroupId(7);
pub const BOT: UserId = UserId(999);
pub const AUTHOR: UserId = UserId(5);

pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn attachment(id: u64, filename: &str) -> Attachment {
    Attachment {
        id: AttachmentId(id),
        filename: filename.to_string(),
        content_type: Some(content_type_for(filename).to_string()),
        url: format!("https://cdn.example/{id}/{filename}"),
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

pub fn message(channel: u64, id: u64, secs: i64, filenames: &[&str]) -> Message {
    Message {
        id: MessageId(id),
        channel_id: ChannelId(channel),
        author_id: AUTHOR,
        created_at: t(secs),
        content: format!("message {id}"),
        attachments: filenames
            .iter()
            .enumerate()
            .map(|(i, name)| attachment(id * 100 + i as u64, name))
            .collect(),
        jump_url: format!("https://chat.example/{channel}/{id}"),
    }
}

/// `channels` channels in [`GROUP`], each with `per_channel` messages carrying
/// one `report-<channel>-<n>.pdf` attachment, at `t(1)..=t(per_channel)`.
pub fn reports(channels: u64, per_channel: u64) -> InMemorySource {
    let source = InMemorySource::new();
    for c in 1..=channels {
        source.add_channel(Channel::new(ChannelId(c), format!("channel-{c}")).in_group(GROUP));
        for n in 1..=per_channel {
            source.add_message(message(
                c,
                c * 10_000 + n,
                n as i64,
                &[&format!("report-{c}-{n}.pdf")],
            ));
        }
    }
    source
}

pub fn live_client(source: Arc<InMemorySource>, config: SearchConfig) -> LiveFederatedSearch {
    LiveFederatedSearch::new(source, Arc::new(InMemoryPermissions::new()), config).unwrap()
}
