//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{FilesiftArgs, OutputFormat};
use crate::error::Result;
use crate::scan::ScanOutcome;
use crate::source::Channel;

/// Print a search outcome in the selected format.
pub fn output_search(outcome: &ScanOutcome, args: &FilesiftArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(outcome, args),
        OutputFormat::Human => {
            print!("{}", render_search_human(outcome, args.verbosity()));
            Ok(())
        }
    }
}

/// Print a channel list in the selected format.
pub fn output_channels(channels: &[Channel], args: &FilesiftArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(&channels, args),
        OutputFormat::Human => {
            print!("{}", render_channels_human(channels));
            Ok(())
        }
    }
}

fn output_json<T: Serialize + ?Sized>(result: &T, args: &FilesiftArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Human-readable rendering of a search outcome.
pub fn render_search_human(outcome: &ScanOutcome, verbosity: u8) -> String {
    let mut out = String::new();

    if outcome.records.is_empty() {
        out.push_str("No files found.\n");
    } else {
        out.push_str(&format!("Found {} file(s):\n", outcome.records.len()));
        for (rank, record) in outcome.records.iter().enumerate() {
            out.push_str(&format!(
                "{:>3}. {}  [channel {}, {}]\n",
                rank + 1,
                record.filename,
                record.channel_id,
                record.created_at.format("%Y-%m-%d %H:%M:%S"),
            ));
            if verbosity > 1 {
                out.push_str(&format!("     id:   {}\n", record.object_id));
                if !record.url.is_empty() {
                    out.push_str(&format!("     url:  {}\n", record.url));
                }
                if !record.jump_url.is_empty() {
                    out.push_str(&format!("     jump: {}\n", record.jump_url));
                }
            }
        }
    }

    for failure in &outcome.failures {
        out.push_str(&format!(
            "Channel {} could not be searched: {}\n",
            failure.channel_id, failure.reason
        ));
    }
    if outcome.timed_out {
        out.push_str("Search timed out; results are partial.\n");
    }
    if outcome.has_more() {
        out.push_str(&format!(
            "More results in {} channel(s); rerun with --resume to continue.\n",
            outcome.channel_cursor_map.len()
        ));
    }
    out
}

/// Human-readable rendering of a channel list.
pub fn render_channels_human(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return "No channels.\n".to_string();
    }
    channels
        .iter()
        .map(|channel| match channel.group_id {
            Some(group) => format!("{:>8}  #{}  (group {})\n", channel.id, channel.name, group),
            None => format!("{:>8}  #{}\n", channel.id, channel.name),
        })
        .collect()
}
