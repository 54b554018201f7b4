//! Batch Publisher - publishes a list of artifacts one after another
//!
//! Features:
//! - Strictly sequential publishing, one npm process at a time
//! - A failed artifact is logged and recorded; the batch always continues
//! - Optional explicit registry, otherwise npm's own configuration applies
//! - Credentials are injected through a [`CredentialProvider`]

use crate::core::summary::{ItemOutcome, Operation, RunSummary};
use crate::core::traits::{PackageManager, PublishRequest};
use crate::security::credentials::CredentialProvider;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Batch publishing options
#[derive(Debug, Clone, Default)]
pub struct BatchPublishOptions {
    /// Registry URL passed as `--registry`; `None` uses ambient configuration
    pub registry: Option<String>,

    /// Run `npm publish --dry-run` instead of uploading
    pub dry_run: bool,
}

/// BatchPublisher - publishes discovered artifacts
pub struct BatchPublisher<M: PackageManager> {
    manager: M,
    credentials: Box<dyn CredentialProvider>,
    options: BatchPublishOptions,
}

impl<M: PackageManager> BatchPublisher<M> {
    /// Create a new BatchPublisher
    ///
    /// # Arguments
    ///
    /// * `manager` - Package manager performing each publish
    /// * `credentials` - Source of authentication arguments
    /// * `options` - Batch publish options
    pub fn new(
        manager: M,
        credentials: Box<dyn CredentialProvider>,
        options: BatchPublishOptions,
    ) -> Self {
        Self {
            manager,
            credentials,
            options,
        }
    }

    /// Publish every artifact in order, recording each outcome
    pub async fn publish_all(&self, artifacts: &[PathBuf], summary: &mut RunSummary) {
        info!(
            "📦 Publishing {} artifacts to {}",
            artifacts.len(),
            self.options
                .registry
                .as_deref()
                .unwrap_or("the configured registry")
        );
        info!("Credentials: {}", self.credentials.describe());
        if self.options.dry_run {
            info!("Dry run: nothing will be uploaded");
        }

        for artifact in artifacts {
            self.publish_artifact(artifact, summary).await;
        }
    }

    /// Publish a single artifact
    pub async fn publish_artifact(&self, artifact: &Path, summary: &mut RunSummary) {
        let request = PublishRequest {
            artifact: artifact.to_path_buf(),
            registry: self.options.registry.clone(),
            auth_args: self.credentials.publish_args(),
            dry_run: self.options.dry_run,
        };
        let label = artifact.display().to_string();

        let result = self.manager.publish(&request).await;
        match &result {
            Ok(()) => info!("END: publish {}", label),
            Err(e) => error!("Failed to publish {}: {}", label, e),
        }
        summary.record(Operation::Publish, label, ItemOutcome::from(result));
    }
}
