//! filesift CLI binary.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use filesift::cli::args::*;
use filesift::cli::commands::*;

fn init_tracing(args: &FilesiftArgs) {
    let level = match args.verbosity() {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let args = FilesiftArgs::parse();
    init_tracing(&args);

    if let Err(e) = execute_command(args).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
