//! Network, git and pip access.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

/// Downloads a URL fully into memory.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Clones `url` at `branch` into `dest`. On failure `dest` must not be left
/// half-populated.
pub trait Cloner {
    fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<()>;
}

/// Installs a whole published package from a git URL.
pub trait PackageInstaller {
    fn install_published(&self, url: &str, branch: &str) -> Result<()>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

impl<T: Cloner + ?Sized> Cloner for &T {
    fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        (**self).clone_repo(url, branch, dest)
    }
}

impl<T: PackageInstaller + ?Sized> PackageInstaller for &T {
    fn install_published(&self, url: &str, branch: &str) -> Result<()> {
        (**self).install_published(url, branch)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        // ureq reports 4xx/5xx as errors
        let response = ureq::get(url)
            .header("User-Agent", concat!("pygeturl/", env!("CARGO_PKG_VERSION")))
            .call()
            .map_err(|e| Error::fetch(url, e))?;

        if !response.status().is_success() {
            return Err(Error::fetch(url, format!("HTTP {}", response.status())));
        }

        response
            .into_body()
            .read_to_vec()
            .map_err(|e| Error::fetch(url, e))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GitCloner;

impl Cloner for GitCloner {
    fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        match git2::build::RepoBuilder::new().branch(branch).clone(url, dest) {
            Ok(_) => Ok(()),
            Err(err) => {
                let _ = fs::remove_dir_all(dest);
                Err(Error::clone_failed(url, err.message()))
            }
        }
    }
}

/// Runs `python -m pip install git+<url>@<branch>`.
#[derive(Debug, Clone)]
pub struct PipInstaller {
    python: String,
}

impl Default for PipInstaller {
    fn default() -> Self {
        let python = if cfg!(target_os = "windows") {
            "python"
        } else {
            "python3"
        };
        Self {
            python: python.to_string(),
        }
    }
}

impl PipInstaller {
    pub fn with_python(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

impl PackageInstaller for PipInstaller {
    fn install_published(&self, url: &str, branch: &str) -> Result<()> {
        let target = format!("git+{url}@{branch}");
        let status = Command::new(&self.python)
            .args(["-m", "pip", "install", &target])
            .status()
            .map_err(|e| Error::PackageInstallFailure {
                url: target.clone(),
                reason: format!("failed to run {}: {}", self.python, e),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::PackageInstallFailure {
                url: target,
                reason: format!("pip exited with {status}"),
            })
        }
    }
}
