//! npm-cache-upload
//!
//! Publish every .tgz under a directory using the locally configured registry

use clap::Parser;
use npm_bulk::cli::{self, CommonArgs};
use npm_bulk::security::AmbientCredentials;
use std::path::PathBuf;
use std::process;

/// Recursively search a directory and publish every npm .tgz archive.
///
/// The registry and its credentials come from your ~/.npmrc.
#[derive(Parser, Debug)]
#[command(name = "npm-cache-upload")]
#[command(version)]
#[command(about = "Publish every .tgz under a directory with your npm configuration", long_about = None)]
struct Cli {
    /// Directory containing the .tgz archives to publish
    #[arg(value_name = "CACHEDIR")]
    cachedir: PathBuf,

    /// Only perform dry-run
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Cli::parse();
    cli::init_tracing(args.common.verbose);

    let result = cli::publish_command(
        args.cachedir,
        None,
        Box::new(AmbientCredentials),
        args.dry_run,
        args.common,
    )
    .await;
    process::exit(cli::exit_code(result));
}
