//! # filesift
//!
//! Federated, bounded-concurrency search for files shared in chat channels.
//!
//! ## Features
//!
//! - Fuzzy filename and message content matching
//! - Author, time range and file type filters
//! - Concurrent scans over many channels with a shared result budget
//! - Resumable searches through per-channel cursors
//! - Live history scanning or bounded snapshot search behind one trait
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use filesift::prelude::*;
//! use filesift::source::memory::{InMemoryPermissions, InMemorySource, Workspace};
//!
//! # async fn run() -> filesift::error::Result<()> {
//! let workspace = Workspace::from_json_file("workspace.json")?;
//! let client = LiveFederatedSearch::new(
//!     Arc::new(InMemorySource::from_workspace(&workspace)),
//!     Arc::new(InMemoryPermissions::from_workspace(&workspace)),
//!     SearchConfig::default(),
//! )?;
//! client.initialize(UserId(1)).await;
//!
//! let query = Query::builder().filename("invoice").build()?;
//! let outcome = client
//!     .search(SearchRequest::new(Scope::Group(GroupId(7)), query.clone()))
//!     .await?;
//!
//! if let Some(next) = outcome.next_query(&query) {
//!     client.search(SearchRequest::new(Scope::Group(GroupId(7)), next)).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod error;
pub mod query;
pub mod record;
pub mod scan;
pub mod source;
pub mod util;
pub mod workflow;

pub mod prelude {
    pub use crate::client::{
        Caller, CommandContext, IndexedSnapshotSearch, LiveFederatedSearch, SearchClient,
        SearchRequest, SnapshotConfig,
    };
    pub use crate::error::{FilesiftError, Result};
    pub use crate::query::{CursorMap, MatchPredicate, Query};
    pub use crate::record::{AttachmentRecord, ObjectId};
    pub use crate::scan::{ScanOutcome, SearchConfig};
    pub use crate::source::{
        Channel, ChannelId, GroupId, MessageSource, PermissionOracle, Scope, UserId,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
