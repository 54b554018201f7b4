//! Shared plumbing for the command-line tools
//!
//! Each binary parses its own positional arguments and flattens
//! [`CommonArgs`] into them, then hands over to [`download_command`] or
//! [`publish_command`].

use crate::core::config::BulkConfig;
use crate::core::config_loader::{ConfigLoadOptions, ConfigLoader};
use crate::core::error::BulkError;
use crate::core::invocation_log::InvocationLog;
use crate::core::summary::{EXIT_FATAL, RunSummary};
use crate::orchestration::{
    BatchPublishOptions, BatchPublisher, BulkDownloader, find_artifacts, prepare_cache_dir,
    read_package_list,
};
use crate::plugins::NpmPlugin;
use crate::security::CredentialProvider;
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Flags shared by every tool
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file (defaults to ./.npm-bulk.yaml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory receiving per-invocation npm output
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Kill an npm invocation after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit with status 2 if any item failed
    #[arg(long)]
    pub strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    fn cli_config(&self) -> BulkConfig {
        BulkConfig {
            npm_path: None,
            log_dir: self.log_dir.clone(),
            timeout_secs: self.timeout,
            strict: self.strict.then_some(true),
        }
    }
}

/// Install the stdout log subscriber; `RUST_LOG` wins over `--verbose`
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Resolve configuration from file, environment and flags
pub async fn load_config(common: &CommonArgs) -> Result<BulkConfig, BulkError> {
    let env: HashMap<String, String> = std::env::vars().collect();

    ConfigLoader::load(ConfigLoadOptions {
        project_path: PathBuf::from("."),
        config_file: common.config.clone(),
        cli_args: Some(common.cli_config()),
        env,
    })
    .await
}

async fn npm_plugin(config: &BulkConfig) -> Result<(NpmPlugin, Arc<InvocationLog>), BulkError> {
    let logs = Arc::new(InvocationLog::create(&config.log_dir()).await?);
    info!("Writing npm output to {}", logs.run_dir().display());

    let plugin = NpmPlugin::new(config.npm_path(), logs.clone()).with_timeout(config.timeout());
    Ok((plugin, logs))
}

/// Download every version of every package listed in `packages`
pub async fn download_command(
    cache_dir: PathBuf,
    packages: PathBuf,
    common: CommonArgs,
) -> Result<i32> {
    let config = load_config(&common).await?;

    let cache_dir = prepare_cache_dir(&cache_dir).await?;
    let packages = read_package_list(&packages).await?;

    let (plugin, logs) = npm_plugin(&config).await?;
    let mut summary = RunSummary::new(logs.run_id());

    let downloader = BulkDownloader::new(plugin, cache_dir);
    downloader.run(&packages, &mut summary).await;

    summary.print();
    Ok(summary.exit_code(config.strict()))
}

/// Publish every artifact found under `cache_dir`
pub async fn publish_command(
    cache_dir: PathBuf,
    registry: Option<String>,
    credentials: Box<dyn CredentialProvider>,
    dry_run: bool,
    common: CommonArgs,
) -> Result<i32> {
    let config = load_config(&common).await?;

    let artifacts = find_artifacts(&cache_dir)?;

    let (plugin, logs) = npm_plugin(&config).await?;
    let mut summary = RunSummary::new(logs.run_id());

    let publisher = BatchPublisher::new(
        plugin,
        credentials,
        BatchPublishOptions { registry, dry_run },
    );
    publisher.publish_all(&artifacts, &mut summary).await;

    summary.print();
    Ok(summary.exit_code(config.strict()))
}

/// Map the outcome of a command to a process exit code, reporting fatal errors
pub fn exit_code(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            EXIT_FATAL
        }
    }
}
