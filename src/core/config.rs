//! Configuration structures for the npm-bulk tools
//!
//! Every field is optional so the same type can represent one layer of
//! configuration (file, environment, CLI) as well as the merged result.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Package manager executable used when nothing else is configured
pub const DEFAULT_NPM: &str = "npm";

/// Directory (relative to the working directory) receiving invocation logs
pub const DEFAULT_LOG_DIR: &str = "npm-bulk-logs";

/// Root configuration object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BulkConfig {
    /// Path or name of the npm executable
    #[serde(skip_serializing_if = "Option::is_none", rename = "npmPath")]
    pub npm_path: Option<PathBuf>,

    /// Directory receiving per-run invocation logs
    #[serde(skip_serializing_if = "Option::is_none", rename = "logDir")]
    pub log_dir: Option<PathBuf>,

    /// Kill an npm invocation after this many seconds
    #[serde(skip_serializing_if = "Option::is_none", rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,

    /// Exit non-zero when any item failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl BulkConfig {
    pub fn npm_path(&self) -> PathBuf {
        self.npm_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NPM))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }

    /// Overlay every field set in `source` on top of `self`
    pub fn merge_from(&mut self, source: BulkConfig) {
        if source.npm_path.is_some() {
            self.npm_path = source.npm_path;
        }
        if source.log_dir.is_some() {
            self.log_dir = source.log_dir;
        }
        if source.timeout_secs.is_some() {
            self.timeout_secs = source.timeout_secs;
        }
        if source.strict.is_some() {
            self.strict = source.strict;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BulkConfig::default();

        assert_eq!(config.npm_path(), PathBuf::from("npm"));
        assert_eq!(config.log_dir(), PathBuf::from("npm-bulk-logs"));
        assert_eq!(config.timeout(), None);
        assert!(!config.strict());
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut config = BulkConfig {
            npm_path: Some(PathBuf::from("/usr/bin/npm")),
            log_dir: Some(PathBuf::from("logs")),
            timeout_secs: None,
            strict: None,
        };

        config.merge_from(BulkConfig {
            timeout_secs: Some(60),
            log_dir: Some(PathBuf::from("other-logs")),
            ..Default::default()
        });

        assert_eq!(config.npm_path(), PathBuf::from("/usr/bin/npm"));
        assert_eq!(config.log_dir(), PathBuf::from("other-logs"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_yaml_uses_camel_case_keys() {
        let yaml = "npmPath: /opt/node/bin/npm\ntimeoutSecs: 120\nstrict: true\n";
        let config: BulkConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.npm_path, Some(PathBuf::from("/opt/node/bin/npm")));
        assert_eq!(config.timeout_secs, Some(120));
        assert_eq!(config.strict, Some(true));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_yaml_rejects_unknown_keys() {
        let result: Result<BulkConfig, _> = serde_yaml::from_str("registry: foo\n");
        assert!(result.is_err());
    }
}
