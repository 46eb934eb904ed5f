//! Error types for dependency resolution and installation.
//!
//! Every failure a single `pyget` command can hit is one variant here, so the
//! CLI can report the operation and the cause without inspecting strings.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed spec '{0}': expected owner/repo[@branch][/path] [as alias]")]
    MalformedSpec(String),

    #[error("Invalid owner/repo in '{0}'")]
    InvalidOwnerRepo(String),

    #[error("Failed to download {url}: {reason}")]
    NetworkFetchFailure { url: String, reason: String },

    #[error("No entrypoint found in {}", .0.display())]
    EntrypointNotFound(PathBuf),

    #[error("Manifest not found: {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("Failed to clone {url}: {reason}")]
    VcsCloneFailure { url: String, reason: String },

    #[error("Package installer failed for {url}: {reason}")]
    PackageInstallFailure { url: String, reason: String },

    #[error("Module '{0}' is not installed")]
    NotInstalled(String),

    #[error("Registry file corrupted: {}\n  → Fix: delete it and reinstall from py.mod\n  → Details: {message}", .path.display())]
    RegistryCorrupted { path: PathBuf, message: String },

    #[error("Invalid mirror URL '{0}': must start with http:// or https://")]
    InvalidMirror(String),

    #[error("Refusing to write outside the cache: {}", .0.display())]
    OutsideCache(PathBuf),

    #[error("Could not find home directory")]
    HomeDirMissing,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn fetch(url: &str, reason: impl ToString) -> Self {
        Self::NetworkFetchFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn clone_failed(url: &str, reason: impl ToString) -> Self {
        Self::VcsCloneFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
