//! Per-invocation capture of subprocess output
//!
//! Each run gets its own directory `<log_dir>/<run-id>/`, and every npm
//! invocation writes `<NNNN>-<operation>-<subject>.stdout.txt` and
//! `.stderr.txt` inside it. Concurrent runs never share a file.

use crate::core::error::BulkError;
use crate::core::summary::Operation;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._@-]").unwrap();
}

/// Longest subject kept in a log file name
const MAX_SUBJECT_LEN: usize = 80;

/// Paths written for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

#[derive(Debug)]
pub struct InvocationLog {
    run_id: String,
    run_dir: PathBuf,
    sequence: AtomicUsize,
}

impl InvocationLog {
    /// Create the run directory under `log_dir`
    pub async fn create(log_dir: &Path) -> Result<Self, BulkError> {
        let run_id = new_run_id();
        let run_dir = log_dir.join(&run_id);

        fs::create_dir_all(&run_dir)
            .await
            .map_err(|e| BulkError::LogDirUnavailable {
                path: run_dir.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            run_id,
            run_dir,
            sequence: AtomicUsize::new(0),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write captured streams for one invocation
    pub async fn record(
        &self,
        operation: Operation,
        subject: &str,
        stdout: &[u8],
        stderr: &[u8],
    ) -> std::io::Result<LogPaths> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let stem = format!(
            "{:04}-{}-{}",
            sequence,
            operation,
            sanitize_subject(subject)
        );

        let paths = LogPaths {
            stdout: self.run_dir.join(format!("{}.stdout.txt", stem)),
            stderr: self.run_dir.join(format!("{}.stderr.txt", stem)),
        };

        fs::write(&paths.stdout, stdout).await?;
        fs::write(&paths.stderr, stderr).await?;

        Ok(paths)
    }
}

fn new_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%SZ"), &uuid[..8])
}

/// Make a package spec or artifact name usable as part of a file name
pub fn sanitize_subject(subject: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(subject, "_");
    let truncated: String = cleaned.chars().take(MAX_SUBJECT_LEN).collect();
    if truncated.is_empty() {
        "_".to_string()
    } else {
        truncated
    }
}
