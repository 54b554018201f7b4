//! Orchestration layer for bulk downloading and publishing
//!
//! This module provides the loops that drive a [`crate::core::PackageManager`]
//! over a package list or a directory of artifacts.

pub mod batch_publisher;
pub mod cache_finder;
pub mod downloader;

// Re-export main types for convenience
pub use batch_publisher::{BatchPublishOptions, BatchPublisher};
pub use cache_finder::{ARTIFACT_SUFFIX, find_artifacts};
pub use downloader::{BulkDownloader, prepare_cache_dir, read_package_list};
