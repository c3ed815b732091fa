//! Command line argument parsing for the filesift CLI using clap.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::{FilesiftError, Result};
use crate::query::Query;
use crate::source::{ChannelId, GroupId, Scope, UserId};

/// filesift - find files shared in chat channels
#[derive(Parser, Debug, Clone)]
#[command(name = "filesift")]
#[command(about = "Find files shared in chat channels by name, content, author, time or type")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct FilesiftArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl FilesiftArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search a workspace for files
    Search(SearchArgs),

    /// List the channels of a scope
    Channels(ChannelsArgs),
}

/// Which channels to cover.
#[derive(clap::Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Search every channel of a group
    #[arg(long, value_name = "GROUP_ID", conflicts_with = "channel", required_unless_present = "channel")]
    pub group: Option<u64>,

    /// Search a single channel
    #[arg(long, value_name = "CHANNEL_ID")]
    pub channel: Option<u64>,
}

impl ScopeArgs {
    pub fn scope(&self) -> Result<Scope> {
        match (self.group, self.channel) {
            (Some(group), _) => Ok(Scope::Group(GroupId(group))),
            (None, Some(channel)) => Ok(Scope::Channel(ChannelId(channel))),
            (None, None) => Err(FilesiftError::invalid_query(
                "either --group or --channel is required",
            )),
        }
    }
}

/// Arguments for searching
#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Workspace fixture file (JSON)
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Fuzzy filename term
    #[arg(long)]
    pub filename: Option<String>,

    /// Fuzzy message content term
    #[arg(long)]
    pub content: Option<String>,

    /// Only files posted by this user
    #[arg(long, value_name = "USER_ID")]
    pub author: Option<u64>,

    /// Only files posted at or after this time (RFC 3339)
    #[arg(long)]
    pub after: Option<DateTime<Utc>>,

    /// Only files posted at or before this time (RFC 3339)
    #[arg(long)]
    pub before: Option<DateTime<Utc>>,

    /// Exact MIME type, e.g. application/pdf
    #[arg(long)]
    pub file_type: Option<String>,

    /// Fuzzy file type matched against the filename, e.g. pdf
    #[arg(long)]
    pub custom_file_type: Option<String>,

    /// Restrict a group search to one channel
    #[arg(long, value_name = "CHANNEL_ID")]
    pub in_channel: Option<u64>,

    /// Identity the search runs as
    #[arg(long, value_name = "USER_ID", default_value = "0")]
    pub identity: u64,

    /// Search backend
    #[arg(short = 'm', long, default_value = "live")]
    pub mode: SearchMode,

    /// Search configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Snapshot configuration file (JSON), snapshot mode only
    #[arg(long, value_name = "CONFIG_FILE")]
    pub snapshot_config: Option<PathBuf>,

    /// Maximum number of results, overriding the configuration
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// File holding resume cursors between calls
    #[arg(long, value_name = "CURSOR_FILE")]
    pub cursor_file: Option<PathBuf>,

    /// Continue from the cursors in --cursor-file
    #[arg(long, requires = "cursor_file")]
    pub resume: bool,
}

impl SearchArgs {
    /// Build the query described by the filter flags.
    pub fn query(&self) -> Result<Query> {
        let mut builder = Query::builder();
        if let Some(filename) = &self.filename {
            builder = builder.filename(filename.as_str());
        }
        if let Some(content) = &self.content {
            builder = builder.content(content.as_str());
        }
        if let Some(author) = self.author {
            builder = builder.author(UserId(author));
        }
        if let Some(after) = self.after {
            builder = builder.after(after);
        }
        if let Some(before) = self.before {
            builder = builder.before(before);
        }
        if let Some(file_type) = &self.file_type {
            builder = builder.file_type(file_type.as_str());
        }
        if let Some(custom) = &self.custom_file_type {
            builder = builder.custom_file_type(custom.as_str());
        }
        if let Some(channel) = self.in_channel {
            builder = builder.channel(ChannelId(channel));
        }
        builder.build()
    }
}

/// Arguments for listing channels
#[derive(clap::Args, Debug, Clone)]
pub struct ChannelsArgs {
    /// Workspace fixture file (JSON)
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

/// Search backends available in the CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Walk channel history on every call
    Live,
    /// Search bounded snapshots of recent history
    Snapshot,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = FilesiftArgs::try_parse_from(["filesift", "channels", "ws.json", "--group", "1"])
            .unwrap();
        assert_eq!(args.verbosity(), 1);

        let args =
            FilesiftArgs::try_parse_from(["filesift", "-vv", "channels", "ws.json", "--group", "1"])
                .unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = FilesiftArgs::try_parse_from([
            "filesift", "--quiet", "channels", "ws.json", "--group", "1",
        ])
        .unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_search_args_build_query() {
        let args = FilesiftArgs::try_parse_from([
            "filesift",
            "--format",
            "json",
            "search",
            "ws.json",
            "--group",
            "7",
            "--filename",
            "invoice",
            "--after",
            "2024-01-01T00:00:00Z",
            "--mode",
            "snapshot",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);

        let Command::Search(search) = args.command else {
            panic!("expected search command");
        };
        assert_eq!(search.mode, SearchMode::Snapshot);
        assert_eq!(search.scope.scope().unwrap(), Scope::Group(GroupId(7)));

        let query = search.query().unwrap();
        assert_eq!(query.filename(), Some("invoice"));
        assert!(query.after().is_some());
    }

    #[test]
    fn test_scope_is_required_and_exclusive() {
        assert!(FilesiftArgs::try_parse_from(["filesift", "channels", "ws.json"]).is_err());
        assert!(
            FilesiftArgs::try_parse_from([
                "filesift", "channels", "ws.json", "--group", "1", "--channel", "2",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_resume_requires_cursor_file() {
        assert!(
            FilesiftArgs::try_parse_from([
                "filesift", "search", "ws.json", "--channel", "1", "--filename", "a", "--resume",
            ])
            .is_err()
        );
    }
}
