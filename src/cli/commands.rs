//! Command implementations for the filesift CLI.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::client::{
    IndexedSnapshotSearch, LiveFederatedSearch, SearchClient, SearchRequest, SnapshotConfig,
};
use crate::error::Result;
use crate::query::CursorMap;
use crate::scan::SearchConfig;
use crate::source::memory::{InMemoryPermissions, InMemorySource, Workspace};
use crate::source::{MessageSource, UserId};

/// Execute a CLI command.
pub async fn execute_command(args: FilesiftArgs) -> Result<()> {
    match &args.command {
        Command::Search(search_args) => search_workspace(search_args, &args).await,
        Command::Channels(channels_args) => list_channels(channels_args, &args).await,
    }
}

/// Search a workspace fixture.
async fn search_workspace(args: &SearchArgs, cli_args: &FilesiftArgs) -> Result<()> {
    let workspace = Workspace::from_json_file(&args.workspace)?;
    let source = Arc::new(InMemorySource::from_workspace(&workspace));
    let permissions = Arc::new(InMemoryPermissions::from_workspace(&workspace));

    let mut config = match (&args.config, args.mode) {
        (Some(path), _) => SearchConfig::from_json_file(path)?,
        (None, SearchMode::Live) => SearchConfig::default(),
        (None, SearchMode::Snapshot) => SearchConfig::snapshot_default(),
    };
    if let Some(limit) = args.limit {
        config = config.with_result_limit(limit);
    }

    let client: Box<dyn SearchClient> = match args.mode {
        SearchMode::Live => Box::new(LiveFederatedSearch::new(source, permissions, config)?),
        SearchMode::Snapshot => {
            let snapshot_config = match &args.snapshot_config {
                Some(path) => SnapshotConfig::from_json_file(path)?,
                None => SnapshotConfig::default(),
            };
            Box::new(IndexedSnapshotSearch::new(
                source,
                permissions,
                config,
                snapshot_config,
            )?)
        }
    };
    client.initialize(UserId(args.identity)).await;

    let mut query = args.query()?;
    if args.resume {
        if let Some(path) = &args.cursor_file {
            let cursors = read_cursor_file(path)?;
            debug!(channels = cursors.len(), "resuming from cursor file");
            query = query.resuming_from(cursors);
        }
    }

    let scope = args.scope.scope()?;
    let outcome = client.search(SearchRequest::new(scope, query)).await?;

    if let Some(path) = &args.cursor_file {
        write_cursor_file(path, &outcome.channel_cursor_map)?;
    }

    output_search(&outcome, cli_args)
}

/// List the channels of a scope.
async fn list_channels(args: &ChannelsArgs, cli_args: &FilesiftArgs) -> Result<()> {
    let workspace = Workspace::from_json_file(&args.workspace)?;
    let source = InMemorySource::from_workspace(&workspace);
    let channels = source.list_channels(&args.scope.scope()?).await?;

    output_channels(&channels, cli_args)
}

/// Read resume cursors. A missing file means nothing to resume.
pub fn read_cursor_file(path: &Path) -> Result<CursorMap> {
    if !path.exists() {
        return Ok(CursorMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Write resume cursors, or remove the file when nothing is left to resume.
pub fn write_cursor_file(path: &Path, cursors: &CursorMap) -> Result<()> {
    if cursors.is_empty() {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        return Ok(());
    }
    std::fs::write(path, serde_json::to_vec_pretty(cursors)?)?;
    Ok(())
}
