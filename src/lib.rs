pub mod cli;
pub mod core;
pub mod orchestration;
pub mod plugins;
pub mod security;

pub use self::core::*;
pub use orchestration::{BatchPublishOptions, BatchPublisher, BulkDownloader, find_artifacts};
pub use plugins::NpmPlugin;
pub use security::{
    AmbientCredentials, CommandError, CredentialProvider, SafeCommandExecutor, TokenCredentials,
};

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable shell script named `npm` into `dir`
    pub fn write_fake_npm(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("npm");
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
