//! Error handling for bulk registry operations
//!
//! Two tiers of errors exist:
//! - [`BulkError`] aborts the whole run (missing inputs, unusable directories,
//!   broken configuration) and maps to process exit code 1.
//! - [`ItemError`] describes why a single query, fetch or publish failed. It is
//!   recorded in the run summary and never stops the loop.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal error type for a tool run
#[derive(Error, Debug)]
pub enum BulkError {
    #[error("{0} does not exist")]
    PackageListNotFound(PathBuf),

    #[error("Failed to read package list {path}: {message}")]
    PackageListUnreadable { path: PathBuf, message: String },

    #[error("Cache directory {path} is unavailable: {message}")]
    CacheDirUnavailable { path: PathBuf, message: String },

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Log directory {path} is unavailable: {message}")]
    LogDirUnavailable { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl BulkError {
    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::PackageListNotFound(_) => "PACKAGE_LIST_NOT_FOUND",
            Self::PackageListUnreadable { .. } => "PACKAGE_LIST_UNREADABLE",
            Self::CacheDirUnavailable { .. } => "CACHE_DIR_UNAVAILABLE",
            Self::DirectoryNotFound(_) => "DIRECTORY_NOT_FOUND",
            Self::LogDirUnavailable { .. } => "LOG_DIR_UNAVAILABLE",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}

/// Reason a single item (query, fetch or publish) failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// The package manager could not be started at all
    #[error("command could not be executed: {0}")]
    Spawn(String),

    #[error("command exited with {}", describe_exit(.code))]
    NonZeroExit { code: Option<i32> },

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// `npm info` produced output that does not carry a usable `versions` field
    #[error("malformed package metadata: {0}")]
    MalformedMetadata(String),

    #[error("invalid package name '{0}'")]
    InvalidPackageName(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl ItemError {
    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Spawn(_) => "SPAWN_FAILED",
            Self::NonZeroExit { .. } => "NON_ZERO_EXIT",
            Self::Timeout(_) => "TIMEOUT",
            Self::MalformedMetadata(_) => "MALFORMED_METADATA",
            Self::InvalidPackageName(_) => "INVALID_PACKAGE_NAME",
        }
    }
}
