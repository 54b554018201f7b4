//! Bulk Downloader - fetches every published version of a list of packages
//!
//! For each package name the registry is queried for its versions, then one
//! fetch is issued per version into the cache directory. Failures of a single
//! query or fetch are recorded and the loop moves on.

use crate::core::error::{BulkError, ItemError};
use crate::core::summary::{ItemOutcome, Operation, RunSummary};
use crate::core::traits::PackageManager;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

/// Read a newline-delimited package list.
///
/// Names are trimmed and blank lines are skipped.
///
/// # Errors
///
/// `BulkError::PackageListNotFound` if the file does not exist.
pub async fn read_package_list(path: &Path) -> Result<Vec<String>, BulkError> {
    if !path.is_file() {
        return Err(BulkError::PackageListNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| BulkError::PackageListUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Create the cache directory if needed and return its absolute path
pub async fn prepare_cache_dir(path: &Path) -> Result<PathBuf, BulkError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| BulkError::CacheDirUnavailable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    fs::canonicalize(path)
        .await
        .map_err(|e| BulkError::CacheDirUnavailable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Reject names the package manager would read as an option
fn validate_package_name(package: &str) -> Result<(), ItemError> {
    if package.starts_with('-') {
        return Err(ItemError::InvalidPackageName(package.to_string()));
    }
    Ok(())
}

/// BulkDownloader - drives version enumeration and fetching
pub struct BulkDownloader<M: PackageManager> {
    manager: M,
    cache_dir: PathBuf,
}

impl<M: PackageManager> BulkDownloader<M> {
    /// Create a new BulkDownloader
    ///
    /// # Arguments
    ///
    /// * `manager` - Package manager used for queries and fetches
    /// * `cache_dir` - Directory receiving the fetched archives
    pub fn new<P: Into<PathBuf>>(manager: M, cache_dir: P) -> Self {
        Self {
            manager,
            cache_dir: cache_dir.into(),
        }
    }

    /// Download every version of every package, in list order
    pub async fn run(&self, packages: &[String], summary: &mut RunSummary) {
        info!(
            "📦 Downloading {} packages into {}",
            packages.len(),
            self.cache_dir.display()
        );

        for package in packages {
            if let Err(e) = validate_package_name(package) {
                error!("{}", e);
                summary.record(Operation::Query, package.as_str(), ItemOutcome::Failed(e));
                continue;
            }

            let versions = self.get_versions(package, summary).await;
            self.download_versions(package, &versions, summary).await;
        }
    }

    /// Query the versions of one package.
    ///
    /// Returns an empty list on any failure; the failure is recorded.
    pub async fn get_versions(&self, package: &str, summary: &mut RunSummary) -> Vec<String> {
        match self.manager.query_versions(package).await {
            Ok(versions) => {
                if versions.is_empty() {
                    info!("No published versions for {}", package);
                }
                summary.record(Operation::Query, package, ItemOutcome::Succeeded);
                versions
            }
            Err(e) => {
                error!("Failed to query versions of {}: {}", package, e);
                summary.record(Operation::Query, package, ItemOutcome::Failed(e));
                Vec::new()
            }
        }
    }

    /// Fetch each listed version of `package` into the cache directory
    pub async fn download_versions(
        &self,
        package: &str,
        versions: &[String],
        summary: &mut RunSummary,
    ) {
        for version in versions {
            let spec = format!("{}@{}", package, version);

            let result = self.manager.pack(package, version, &self.cache_dir).await;
            match &result {
                Ok(()) => info!("END: pack {}", spec),
                Err(e) => error!("Failed to pack {}: {}", spec, e),
            }
            summary.record(Operation::Pack, spec, ItemOutcome::from(result));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MockPackageManager;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Mock whose pack calls are appended to the returned log
    fn recording_manager(
        fail_spec: Option<&'static str>,
    ) -> (MockPackageManager, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let mut manager = MockPackageManager::new();
        manager
            .expect_pack()
            .returning(move |package, version, _dir| {
                let spec = format!("{}@{}", package, version);
                recorded.lock().unwrap().push(spec.clone());
                if Some(spec.as_str()) == fail_spec {
                    Err(ItemError::NonZeroExit { code: Some(1) })
                } else {
                    Ok(())
                }
            });
        (manager, calls)
    }

    #[tokio::test]
    async fn test_read_package_list_trims_and_skips_blanks() {
        let temp_dir = TempDir::new().unwrap();
        let list = temp_dir.path().join("packages.txt");
        std::fs::write(&list, "left-pad\n  is-array  \r\n\n@scope/pkg\n").unwrap();

        let packages = read_package_list(&list).await.unwrap();
        assert_eq!(packages, names(&["left-pad", "is-array", "@scope/pkg"]));
    }

    #[tokio::test]
    async fn test_read_package_list_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = read_package_list(&temp_dir.path().join("nope.txt")).await;

        assert!(matches!(result, Err(BulkError::PackageListNotFound(_))));
    }

    #[tokio::test]
    async fn test_prepare_cache_dir_creates_nested() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("a/b/cache");

        let prepared = prepare_cache_dir(&cache).await.unwrap();
        assert!(cache.is_dir());
        assert!(prepared.is_absolute());
    }

    #[tokio::test]
    async fn test_prepare_cache_dir_over_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("cache");
        std::fs::write(&blocker, "file").unwrap();

        let result = prepare_cache_dir(&blocker).await;
        assert!(matches!(result, Err(BulkError::CacheDirUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_fetches_are_cross_product_of_names_and_versions() {
        let (mut manager, calls) = recording_manager(None);
        manager
            .expect_query_versions()
            .times(2)
            .returning(|package| match package {
                "left-pad" => Ok(vec!["1.0.0".to_string(), "1.1.0".to_string()]),
                _ => Ok(vec![]),
            });

        let downloader = BulkDownloader::new(manager, "/cache");
        let mut summary = RunSummary::new("test");
        downloader
            .run(&names(&["left-pad", "is-array"]), &mut summary)
            .await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["left-pad@1.0.0".to_string(), "left-pad@1.1.0".to_string()]
        );
        assert!(!summary.has_failures());
        assert_eq!(summary.attempts(Operation::Query).count(), 2);
        assert_eq!(summary.attempts(Operation::Pack).count(), 2);
    }

    #[tokio::test]
    async fn test_failed_query_yields_no_fetches_and_continues() {
        let (mut manager, calls) = recording_manager(None);
        manager
            .expect_query_versions()
            .returning(|package| match package {
                "broken" => Err(ItemError::MalformedMetadata("missing 'versions' field".to_string())),
                _ => Ok(vec!["2.0.0".to_string()]),
            });

        let downloader = BulkDownloader::new(manager, "/cache");
        let mut summary = RunSummary::new("test");
        downloader
            .run(&names(&["broken", "ok"]), &mut summary)
            .await;

        assert_eq!(*calls.lock().unwrap(), vec!["ok@2.0.0".to_string()]);
        let failed: Vec<&str> = summary.failed().map(|r| r.label.as_str()).collect();
        assert_eq!(failed, vec!["broken"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_stop_later_versions() {
        let (mut manager, calls) = recording_manager(Some("pkg@2.0.0"));
        manager
            .expect_query_versions()
            .returning(|_| Ok(vec!["1.0.0".to_string(), "2.0.0".to_string(), "3.0.0".to_string()]));

        let downloader = BulkDownloader::new(manager, "/cache");
        let mut summary = RunSummary::new("test");
        downloader.run(&names(&["pkg"]), &mut summary).await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["pkg@1.0.0", "pkg@2.0.0", "pkg@3.0.0"]
        );
        let failed: Vec<&str> = summary.failed().map(|r| r.label.as_str()).collect();
        assert_eq!(failed, vec!["pkg@2.0.0"]);
        assert_eq!(summary.exit_code(false), 0);
    }

    #[tokio::test]
    async fn test_option_like_names_are_rejected_without_invoking_npm() {
        let (mut manager, calls) = recording_manager(None);
        manager
            .expect_query_versions()
            .times(1)
            .withf(|package| package == "left-pad")
            .returning(|_| Ok(vec!["1.0.0".to_string()]));

        let downloader = BulkDownloader::new(manager, "/cache");
        let mut summary = RunSummary::new("test");
        downloader
            .run(&names(&["--registry=evil", "left-pad"]), &mut summary)
            .await;

        assert_eq!(*calls.lock().unwrap(), vec!["left-pad@1.0.0"]);
        let failed: Vec<&ItemOutcome> = summary.failed().map(|r| &r.outcome).collect();
        assert_eq!(
            failed,
            vec![&ItemOutcome::Failed(ItemError::InvalidPackageName(
                "--registry=evil".to_string()
            ))]
        );
    }

    #[tokio::test]
    async fn test_fetches_target_the_cache_dir() {
        let mut manager = MockPackageManager::new();
        manager
            .expect_pack()
            .times(1)
            .withf(|_, _, dir| dir == Path::new("/var/cache/npm"))
            .returning(|_, _, _| Ok(()));

        let downloader = BulkDownloader::new(manager, "/var/cache/npm");
        let mut summary = RunSummary::new("test");
        downloader
            .download_versions("left-pad", &names(&["1.0.0"]), &mut summary)
            .await;

        assert_eq!(summary.succeeded().count(), 1);
    }
}
