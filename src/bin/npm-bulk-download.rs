//! npm-bulk-download
//!
//! Download every published version of a list of npm packages

use clap::Parser;
use npm_bulk::cli::{self, CommonArgs};
use std::path::PathBuf;
use std::process;

/// Given a newline separated file of npm packages and a directory, download
/// every version of each package and store it in the directory.
#[derive(Parser, Debug)]
#[command(name = "npm-bulk-download")]
#[command(version)]
#[command(about = "Download every version of a list of npm packages", long_about = None)]
struct Cli {
    /// Directory receiving the .tgz archives (created if missing)
    #[arg(value_name = "CACHEDIR")]
    cachedir: PathBuf,

    /// A newline separated file of packages to download
    #[arg(value_name = "PACKAGES")]
    packages: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Cli::parse();
    cli::init_tracing(args.common.verbose);

    let result = cli::download_command(args.cachedir, args.packages, args.common).await;
    process::exit(cli::exit_code(result));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_positional_parsing() {
        let cli = Cli::try_parse_from(["npm-bulk-download", "cache", "packages.txt"]).unwrap();
        assert_eq!(cli.cachedir, PathBuf::from("cache"));
        assert_eq!(cli.packages, PathBuf::from("packages.txt"));
        assert!(!cli.common.strict);
    }

    #[test]
    fn test_cli_common_flags() {
        let cli = Cli::try_parse_from([
            "npm-bulk-download",
            "cache",
            "packages.txt",
            "--strict",
            "--timeout",
            "90",
            "--log-dir",
            "/tmp/logs",
        ])
        .unwrap();
        assert!(cli.common.strict);
        assert_eq!(cli.common.timeout, Some(90));
        assert_eq!(cli.common.log_dir, Some(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn test_cli_requires_packages_file() {
        assert!(Cli::try_parse_from(["npm-bulk-download", "cache"]).is_err());
    }
}
