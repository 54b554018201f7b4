//! npm-bulk-publish
//!
//! Publish every .tgz under a directory to an explicitly named registry

use clap::Parser;
use npm_bulk::cli::{self, CommonArgs};
use npm_bulk::security::credentials_for_registry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

/// Given a directory and a registry, recursively search the directory and
/// publish every npm .tgz archive to the registry.
///
/// Authentication uses NPM_TOKEN when set, otherwise the credentials in
/// your ~/.npmrc for the given registry.
#[derive(Parser, Debug)]
#[command(name = "npm-bulk-publish")]
#[command(version)]
#[command(about = "Publish every .tgz under a directory to a registry", long_about = None)]
#[command(after_help = "Example:\n  npm-bulk-publish ~/.npm/ https://<account>.pkgs.example.com/_packaging/<feed>/npm/registry/")]
struct Cli {
    /// Directory containing the .tgz archives to publish
    #[arg(value_name = "CACHEDIR")]
    cachedir: PathBuf,

    /// Registry to publish the archives to
    #[arg(value_name = "REGISTRY")]
    registry: String,

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

    let env: HashMap<String, String> = std::env::vars().collect();
    let credentials = credentials_for_registry(&args.registry, &env);

    let result = cli::publish_command(
        args.cachedir,
        Some(args.registry),
        credentials,
        args.dry_run,
        args.common,
    )
    .await;
    process::exit(cli::exit_code(result));
}
