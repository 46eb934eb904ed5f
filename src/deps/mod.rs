//! Module installation and management.
//!
//! This module drives every command that touches installed modules:
//!
//! - **Install**: `owner/repo@branch/path`, raw `https://` URLs and
//!   `git+<url>[@branch]` repositories
//! - **Replay**: reinstall everything listed in `py.mod`
//! - **Management**: list, remove, set the mirror, clean all state
//!
//! Network and subprocess work goes through the [`Fetcher`], [`Cloner`] and
//! [`PackageInstaller`] traits so the orchestration can run against fakes.

mod fetch;
mod install;
mod manage;
mod vcs;

pub use fetch::{Cloner, Fetcher, GitCloner, HttpFetcher, PackageInstaller, PipInstaller};
pub use install::{InstallOutcome, Installer, ManifestSummary, Request, classify};
pub use manage::{cache_list, cache_path, clean_all, list_modules, remove_module, set_mirror};
pub use vcs::{VCS_PREFIX, VcsSource};
