//! Core traits and types for bulk registry operations
//!
//! This module defines the package-manager abstraction the download and
//! publish loops are written against, plus the request type for publishing.

use crate::core::error::ItemError;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};

// ============================================================================
// Credentials
// ============================================================================

/// A `--key=value` option whose value is a secret.
///
/// Only [`AuthArg::to_arg`] exposes the secret; everything meant for humans
/// goes through [`AuthArg::masked`].
#[derive(Debug)]
pub struct AuthArg {
    /// Option name including leading dashes, e.g. `--//host/:_authToken`
    pub key: String,
    pub secret: SecretString,
}

impl AuthArg {
    pub fn new<K: Into<String>>(key: K, secret: SecretString) -> Self {
        Self {
            key: key.into(),
            secret,
        }
    }

    /// The argument as handed to the subprocess
    pub fn to_arg(&self) -> String {
        format!("{}={}", self.key, self.secret.expose_secret())
    }

    /// The argument as shown in logs
    pub fn masked(&self) -> String {
        format!("{}={}", self.key, mask_token(self.secret.expose_secret()))
    }
}

/// Masks a token for safe logging
///
/// Shows only the first 3 and last 3 characters for identification purposes.
/// Tokens shorter than 10 characters are fully masked as "****".
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }

    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

/// Replace every occurrence of the given secrets in `text` with its mask
pub fn mask_secrets(text: &str, secrets: &[&SecretString]) -> String {
    let mut masked = text.to_string();
    for secret in secrets {
        let value = secret.expose_secret();
        if value.is_empty() {
            continue;
        }
        masked = masked.replace(value, &mask_token(value));
    }
    masked
}

// ============================================================================
// Publishing
// ============================================================================

/// Everything needed to publish a single artifact
#[derive(Debug, Default)]
pub struct PublishRequest {
    /// Path to the `.tgz` artifact
    pub artifact: PathBuf,
    /// Explicit registry URL; `None` defers to the user's npm configuration
    pub registry: Option<String>,
    /// Extra arguments carrying credentials, never logged in clear text
    pub auth_args: Vec<AuthArg>,
    /// Ask the package manager to go through the motions without uploading
    pub dry_run: bool,
}

impl PublishRequest {
    pub fn new<P: Into<PathBuf>>(artifact: P) -> Self {
        Self {
            artifact: artifact.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Package Manager Trait
// ============================================================================

/// The external package manager the tools drive.
///
/// Every method corresponds to exactly one subprocess invocation. Failures
/// are returned as [`ItemError`] so callers can record them and move on to
/// the next item.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Query the registry for every published version of `package`.
    ///
    /// A package with no published versions yields `Ok(vec![])`.
    async fn query_versions(&self, package: &str) -> Result<Vec<String>, ItemError>;

    /// Fetch `package@version` as an archive into `target_dir`.
    async fn pack(&self, package: &str, version: &str, target_dir: &Path)
    -> Result<(), ItemError>;

    /// Publish a single archive.
    async fn publish(&self, request: &PublishRequest) -> Result<(), ItemError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_request_defaults() {
        let request = PublishRequest::new("cache/left-pad-1.0.0.tgz");

        assert_eq!(request.artifact, PathBuf::from("cache/left-pad-1.0.0.tgz"));
        assert!(request.registry.is_none());
        assert!(request.auth_args.is_empty());
        assert!(!request.dry_run);
    }

    #[test]
    fn test_mask_token_with_short_token() {
        assert_eq!(mask_token("short"), "****");
        assert_eq!(mask_token(""), "****");
    }

    #[test]
    fn test_mask_token_with_long_token() {
        assert_eq!(mask_token("abcdef123456"), "abc...456");
        assert_eq!(mask_token("very-long-token-string"), "ver...ing");
    }

    #[test]
    fn test_auth_arg_masking() {
        let arg = AuthArg::new(
            "--//registry.example.com/:_authToken",
            SecretString::new("npm_abcdefghijkl".into()),
        );

        assert_eq!(
            arg.to_arg(),
            "--//registry.example.com/:_authToken=npm_abcdefghijkl"
        );
        assert_eq!(
            arg.masked(),
            "--//registry.example.com/:_authToken=npm...jkl"
        );
    }

    #[test]
    fn test_mask_secrets_in_output() {
        let secret = SecretString::new("secret-npm-token-12345".into());
        let output = mask_secrets(
            "npm ERR! 403 token secret-npm-token-12345 rejected",
            &[&secret],
        );

        assert!(output.contains("sec...345"));
        assert!(!output.contains("secret-npm-token-12345"));
    }

    #[tokio::test]
    async fn test_mock_package_manager_query() {
        let mut manager = MockPackageManager::new();
        manager
            .expect_query_versions()
            .withf(|package| package == "left-pad")
            .returning(|_| Ok(vec!["1.0.0".to_string()]));

        let versions = manager.query_versions("left-pad").await.unwrap();
        assert_eq!(versions, vec!["1.0.0".to_string()]);
    }
}
