//! NPM Plugin - drives the `npm` executable
//!
//! This module implements [`PackageManager`] on top of the npm CLI:
//! - `npm info <package> --json` to enumerate published versions
//! - `npm pack <package>@<version>` to fetch an archive into a directory
//! - `npm publish --always-auth=true [--registry=<url>] <archive>` to upload
//!
//! Every invocation goes through [`SafeCommandExecutor`] and has its output
//! captured by the run's [`InvocationLog`].

use crate::core::error::ItemError;
use crate::core::invocation_log::InvocationLog;
use crate::core::summary::Operation;
use crate::core::traits::{PackageManager, PublishRequest, mask_secrets};
use crate::security::command_executor::{CommandError, SafeCommandExecutor};
use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// `versions` as reported by `npm info --json`.
///
/// npm prints an array of strings, a bare string when only one version
/// exists, and registry documents carry an object keyed by version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NpmVersions {
    List(Vec<String>),
    Single(String),
    Map(serde_json::Map<String, serde_json::Value>),
}

/// NPM registry package info
#[derive(Debug, Deserialize)]
struct NpmRegistryInfo {
    versions: Option<NpmVersions>,
}

/// NPM package manager
pub struct NpmPlugin {
    npm_path: PathBuf,
    /// Working directory for commands that don't need a specific one
    default_dir: PathBuf,
    timeout: Option<Duration>,
    logs: Arc<InvocationLog>,
}

impl NpmPlugin {
    /// Create a new NPM plugin instance
    pub fn new<P: Into<PathBuf>>(npm_path: P, logs: Arc<InvocationLog>) -> Self {
        Self {
            npm_path: npm_path.into(),
            default_dir: PathBuf::from("."),
            timeout: None,
            logs,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.default_dir = dir.into();
        self
    }

    /// Run npm once, capturing its streams into the invocation log.
    ///
    /// `command_line` is the command line as it should appear in logs; callers
    /// are responsible for keeping secrets out of it. `secrets` are masked
    /// in the captured output before it is written.
    async fn run(
        &self,
        operation: Operation,
        subject: &str,
        working_dir: &Path,
        args: &[String],
        command_line: &str,
        secrets: &[&secrecy::SecretString],
    ) -> Result<Output, ItemError> {
        info!("Start: {}", command_line);

        let mut executor =
            SafeCommandExecutor::new(working_dir).map_err(|e| ItemError::Spawn(e.to_string()))?;
        if let Some(timeout) = self.timeout {
            executor.set_timeout(timeout);
        }

        let output = executor
            .execute(&self.npm_path.to_string_lossy(), args)
            .await
            .map_err(|e| match e {
                CommandError::Timeout(limit) => ItemError::Timeout(limit),
                other => ItemError::Spawn(other.to_string()),
            })?;

        let stdout = mask_secrets(&String::from_utf8_lossy(&output.stdout), secrets);
        let stderr = mask_secrets(&String::from_utf8_lossy(&output.stderr), secrets);
        match self
            .logs
            .record(operation, subject, stdout.as_bytes(), stderr.as_bytes())
            .await
        {
            Ok(paths) => debug!(
                stdout = %paths.stdout.display(),
                stderr = %paths.stderr.display(),
                "captured output of {}",
                command_line
            ),
            Err(e) => warn!("Failed to write logs for {}: {}", command_line, e),
        }

        Ok(output)
    }

    fn program_display(&self) -> String {
        self.npm_path.display().to_string()
    }
}

fn check_status(output: &Output) -> Result<(), ItemError> {
    if output.status.success() {
        Ok(())
    } else {
        Err(ItemError::NonZeroExit {
            code: output.status.code(),
        })
    }
}

/// Extract version identifiers from `npm info --json` output
pub fn parse_versions(stdout: &[u8]) -> Result<Vec<String>, ItemError> {
    let info: NpmRegistryInfo = serde_json::from_slice(stdout)
        .map_err(|e| ItemError::MalformedMetadata(e.to_string()))?;

    let versions = match info.versions {
        None => {
            return Err(ItemError::MalformedMetadata(
                "missing 'versions' field".to_string(),
            ));
        }
        Some(NpmVersions::List(list)) => list,
        Some(NpmVersions::Single(version)) => vec![version],
        Some(NpmVersions::Map(map)) => map.into_iter().map(|(version, _)| version).collect(),
    };

    Ok(sort_versions(versions))
}

/// Semver ascending; identifiers that don't parse go last in lexical order
fn sort_versions(mut versions: Vec<String>) -> Vec<String> {
    versions.sort_by(|a, b| match (Version::parse(a), Version::parse(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
    versions.dedup();
    versions
}

#[async_trait]
impl PackageManager for NpmPlugin {
    async fn query_versions(&self, package: &str) -> Result<Vec<String>, ItemError> {
        let args = vec!["info".to_string(), package.to_string(), "--json".to_string()];
        let command_line = format!("{} info {} --json", self.program_display(), package);

        let output = self
            .run(
                Operation::Query,
                package,
                &self.default_dir,
                &args,
                &command_line,
                &[],
            )
            .await?;
        check_status(&output)?;

        // npm prints nothing at all for some unpublished packages
        if output.stdout.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        parse_versions(&output.stdout)
    }

    async fn pack(
        &self,
        package: &str,
        version: &str,
        target_dir: &Path,
    ) -> Result<(), ItemError> {
        let spec = format!("{}@{}", package, version);
        let args = vec!["pack".to_string(), spec.clone()];
        let command_line = format!("{} pack {}", self.program_display(), spec);

        let output = self
            .run(Operation::Pack, &spec, target_dir, &args, &command_line, &[])
            .await?;
        check_status(&output)
    }

    async fn publish(&self, request: &PublishRequest) -> Result<(), ItemError> {
        let mut args = vec!["publish".to_string(), "--always-auth=true".to_string()];
        let mut shown = args.clone();

        if let Some(ref registry) = request.registry {
            args.push(format!("--registry={}", registry));
            shown.push(format!("--registry={}", registry));
        }

        for auth in &request.auth_args {
            args.push(auth.to_arg());
            shown.push(auth.masked());
        }

        if request.dry_run {
            args.push("--dry-run".to_string());
            shown.push("--dry-run".to_string());
        }

        let artifact = request.artifact.to_string_lossy().to_string();
        args.push(artifact.clone());
        shown.push(artifact);

        let command_line = format!("{} {}", self.program_display(), shown.join(" "));
        let subject = request
            .artifact
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "artifact".to_string());
        let secrets: Vec<&secrecy::SecretString> =
            request.auth_args.iter().map(|a| &a.secret).collect();

        let output = self
            .run(
                Operation::Publish,
                &subject,
                &self.default_dir,
                &args,
                &command_line,
                &secrets,
            )
            .await?;
        check_status(&output)
    }
}
