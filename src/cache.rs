//! Module cache management.
//!
//! Downloaded files and clones live under `~/.pygeturl/cache`, partitioned by
//! alias first so two aliases never share a file even when they come from the
//! same upstream path:
//!
//! - `cache/<alias>/<owner>/<repo>/<branch>/<path>` - spec installs
//! - `cache/external/<alias>.py` - raw URL installs
//! - `cache/<alias>/git/<host>/<owner>/<repo>/<branch>` - git clones

use crate::config::Settings;
use crate::deps::VcsSource;
use crate::error::{Error, Result};
use crate::spec::{Locator, MODULE_EXT};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const EXTERNAL_DIR: &str = "external";
const GIT_DIR: &str = "git";

#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(settings: &Settings) -> Self {
        Self {
            root: std::path::absolute(&settings.cache_dir)
                .unwrap_or_else(|_| settings.cache_dir.clone()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn spec_path(&self, alias: &str, locator: &Locator) -> Result<PathBuf> {
        let mut path = self
            .root
            .join(alias)
            .join(&locator.owner)
            .join(&locator.repo)
            .join(&locator.branch);
        for segment in locator.path.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        self.contained(path)
    }

    pub fn external_path(&self, alias: &str) -> Result<PathBuf> {
        self.contained(
            self.root
                .join(EXTERNAL_DIR)
                .join(format!("{alias}.{MODULE_EXT}")),
        )
    }

    pub fn clone_dir(&self, alias: &str, source: &VcsSource) -> Result<PathBuf> {
        self.contained(
            self.root
                .join(alias)
                .join(GIT_DIR)
                .join(&source.host)
                .join(&source.owner)
                .join(&source.repo)
                .join(&source.branch),
        )
    }

    /// `path` must sit strictly below the root and hold only plain segments
    /// past it. `Path::join` with an absolute part replaces the root, and
    /// `..` walks out of it.
    fn contained(&self, path: PathBuf) -> Result<PathBuf> {
        let inside = path.strip_prefix(&self.root).is_ok_and(|rel| {
            rel.components().next().is_some()
                && rel.components().all(|c| matches!(c, Component::Normal(_)))
        });
        if inside { Ok(path) } else { Err(Error::OutsideCache(path)) }
    }

    /// Write `bytes` to `path`, creating parent directories. Overwrites.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Delete `path` if present and prune parent directories left empty,
    /// stopping at the cache root. Files outside the cache are left alone.
    pub fn remove_file(&self, path: &Path) -> Result<bool> {
        if !path.is_file() || self.contained(path.to_path_buf()).is_err() {
            return Ok(false);
        }
        fs::remove_file(path)?;

        let mut dir = path.parent();
        while let Some(current) = dir {
            if !current.starts_with(&self.root) || current == self.root {
                break;
            }
            // read_dir fails or is non-empty -> stop pruning
            let is_empty = fs::read_dir(current)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if !is_empty || fs::remove_dir(current).is_err() {
                break;
            }
            dir = current.parent();
        }
        Ok(true)
    }

    /// Delete everything cached for `alias`: the registered file and, for git
    /// installs, the clone it was resolved from.
    pub fn purge(&self, alias: &str, registered: &Path) -> Result<bool> {
        let mut removed = self.remove_file(registered)?;

        if alias != EXTERNAL_DIR
            && let Ok(clones) = self.contained(self.root.join(alias).join(GIT_DIR))
            && clones.is_dir()
        {
            fs::remove_dir_all(&clones)?;
            removed = true;
            let partition = self.root.join(alias);
            if fs::read_dir(&partition).is_ok_and(|mut e| e.next().is_none()) {
                fs::remove_dir(&partition)?;
            }
        }
        Ok(removed)
    }

    /// Top-level partitions (aliases plus `external`), sorted.
    pub fn entries(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)?.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn clean(&self) -> Result<bool> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
