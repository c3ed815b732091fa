//! Search queries.
//!
//! A [`Query`] is an immutable set of normalized search parameters. Build one
//! with [`Query::builder`]; validation happens in [`QueryBuilder::build`], so a
//! query that exists is always executable.

pub mod matcher;

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::{FilesiftError, Result};
use crate::record::ObjectId;
use crate::source::{ChannelId, UserId};

pub use matcher::MatchPredicate;

/// Per-channel resume cursors: the timestamp of the oldest message inspected.
pub type CursorMap = BTreeMap<ChannelId, DateTime<Utc>>;

/// Which record field a text term is compared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermField {
    Filename,
    Content,
}

/// The single text term that orders results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingTerm<'a> {
    pub field: TermField,
    pub term: &'a str,
}

/// Normalized search parameters.
///
/// Deserialization goes through [`QueryBuilder::build`], so a decoded query is
/// validated like a built one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    filename: Option<String>,
    content: Option<String>,
    author: Option<UserId>,
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
    file_type: Option<String>,
    custom_file_type: Option<String>,
    channel: Option<ChannelId>,
    excluded_author: Option<UserId>,
    banned_ids: HashSet<ObjectId>,
    channel_cursor_map: Option<CursorMap>,
}

impl Query {
    /// Start building a query.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// Fuzzy filename term.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Fuzzy message content term.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Required author of the message carrying the file.
    pub fn author(&self) -> Option<UserId> {
        self.author
    }

    /// Upper time bound, inclusive.
    pub fn before(&self) -> Option<DateTime<Utc>> {
        self.before
    }

    /// Lower time bound, inclusive.
    pub fn after(&self) -> Option<DateTime<Utc>> {
        self.after
    }

    /// Exact MIME type.
    pub fn file_type(&self) -> Option<&str> {
        self.file_type.as_deref()
    }

    /// Fuzzy file type, compared against the filename (e.g. `"pdf"`).
    pub fn custom_file_type(&self) -> Option<&str> {
        self.custom_file_type.as_deref()
    }

    /// Restrict a group scope to one channel.
    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    /// Author whose uploads never match, usually the scanning identity.
    pub fn excluded_author(&self) -> Option<UserId> {
        self.excluded_author
    }

    pub fn banned_ids(&self) -> &HashSet<ObjectId> {
        &self.banned_ids
    }

    pub fn is_banned(&self, id: &ObjectId) -> bool {
        self.banned_ids.contains(id)
    }

    /// Resume state from a previous call, if any.
    pub fn channel_cursor_map(&self) -> Option<&CursorMap> {
        self.channel_cursor_map.as_ref()
    }

    /// Whether this query continues a previous, partially consumed search.
    pub fn is_resuming(&self) -> bool {
        self.channel_cursor_map.is_some()
    }

    /// Exclusive upper bound where a scan of `channel` starts.
    ///
    /// This is the channel's resume cursor if there is one, else just past
    /// `before` so a message posted exactly at `before` is still inspected.
    /// `None` means "from the newest message".
    pub fn start_bound(&self, channel: ChannelId) -> Option<DateTime<Utc>> {
        self.channel_cursor_map
            .as_ref()
            .and_then(|map| map.get(&channel).copied())
            .or_else(|| self.before.map(|before| before + TimeDelta::nanoseconds(1)))
    }

    /// The term that orders results: the filename term if present, else the
    /// content term.
    pub fn ranking_term(&self) -> Option<RankingTerm<'_>> {
        if let Some(term) = self.filename() {
            return Some(RankingTerm {
                field: TermField::Filename,
                term,
            });
        }
        self.content().map(|term| RankingTerm {
            field: TermField::Content,
            term,
        })
    }

    /// Whether the query constrains anything at all.
    pub fn has_constraints(&self) -> bool {
        self.filename.is_some()
            || self.content.is_some()
            || self.author.is_some()
            || self.before.is_some()
            || self.after.is_some()
            || self.file_type.is_some()
            || self.custom_file_type.is_some()
    }

    /// Copy of this query with more banned ids.
    pub fn with_banned_ids<I: IntoIterator<Item = ObjectId>>(&self, ids: I) -> Self {
        let mut query = self.clone();
        query.banned_ids.extend(ids);
        query
    }

    /// Copy of this query that resumes from `cursors`.
    pub fn resuming_from(&self, cursors: CursorMap) -> Self {
        let mut query = self.clone();
        query.channel_cursor_map = Some(cursors);
        query
    }

    /// Copy of this query excluding uploads of `author`.
    pub fn excluding_author(&self, author: UserId) -> Self {
        let mut query = self.clone();
        query.excluded_author = Some(author);
        query
    }
}

/// Builder for [`Query`].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn filename<S: Into<String>>(mut self, term: S) -> Self {
        self.query.filename = Some(term.into());
        self
    }

    pub fn content<S: Into<String>>(mut self, term: S) -> Self {
        self.query.content = Some(term.into());
        self
    }

    pub fn author(mut self, author: UserId) -> Self {
        self.query.author = Some(author);
        self
    }

    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.query.before = Some(before);
        self
    }

    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.query.after = Some(after);
        self
    }

    pub fn file_type<S: Into<String>>(mut self, file_type: S) -> Self {
        self.query.file_type = Some(file_type.into());
        self
    }

    pub fn custom_file_type<S: Into<String>>(mut self, file_type: S) -> Self {
        self.query.custom_file_type = Some(file_type.into());
        self
    }

    pub fn channel(mut self, channel: ChannelId) -> Self {
        self.query.channel = Some(channel);
        self
    }

    pub fn excluded_author(mut self, author: UserId) -> Self {
        self.query.excluded_author = Some(author);
        self
    }

    pub fn banned_ids<I: IntoIterator<Item = ObjectId>>(mut self, ids: I) -> Self {
        self.query.banned_ids.extend(ids);
        self
    }

    pub fn channel_cursor_map(mut self, cursors: CursorMap) -> Self {
        self.query.channel_cursor_map = Some(cursors);
        self
    }

    /// Validate and produce the query.
    pub fn build(self) -> Result<Query> {
        let mut query = self.query;

        query.filename = normalize_term(query.filename, "filename")?;
        query.content = normalize_term(query.content, "content")?;
        query.file_type = normalize_term(query.file_type, "file type")?;
        query.custom_file_type = normalize_term(query.custom_file_type, "custom file type")?;

        if let (Some(after), Some(before)) = (query.after, query.before) {
            if after > before {
                return Err(FilesiftError::invalid_query(format!(
                    "time range is empty: after {after} is later than before {before}"
                )));
            }
        }

        Ok(query)
    }
}

/// Wire shape of a [`Query`] before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QueryFields {
    filename: Option<String>,
    content: Option<String>,
    author: Option<UserId>,
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
    file_type: Option<String>,
    custom_file_type: Option<String>,
    channel: Option<ChannelId>,
    excluded_author: Option<UserId>,
    banned_ids: HashSet<ObjectId>,
    channel_cursor_map: Option<CursorMap>,
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = QueryFields::deserialize(deserializer)?;
        let builder = QueryBuilder {
            query: Query {
                filename: fields.filename,
                content: fields.content,
                author: fields.author,
                before: fields.before,
                after: fields.after,
                file_type: fields.file_type,
                custom_file_type: fields.custom_file_type,
                channel: fields.channel,
                excluded_author: fields.excluded_author,
                banned_ids: fields.banned_ids,
                channel_cursor_map: fields.channel_cursor_map,
            },
        };
        builder.build().map_err(de::Error::custom)
    }
}

fn normalize_term(term: Option<String>, what: &str) -> Result<Option<String>> {
    match term {
        Some(term) => {
            let trimmed = term.trim();
            if trimmed.is_empty() {
                Err(FilesiftError::invalid_query(format!("{what} term is empty")))
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        None => Ok(None),
    }
}
