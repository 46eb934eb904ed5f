//! Process-wide locations.
//!
//! `Settings` is built once per invocation and handed by reference to every
//! component, so nothing below this module touches `dirs` or the environment.

use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `~/.pygeturl` when set.
pub const HOME_ENV: &str = "PYGETURL_HOME";

pub const DEFAULT_MIRROR: &str = "https://raw.githubusercontent.com";

const HOME_DIR: &str = ".pygeturl";
const CACHE_DIR: &str = "cache";
const REGISTRY_FILE: &str = "registry.json";
const MIRROR_FILE: &str = "mirror.txt";
const MANIFEST_FILE: &str = "py.mod";

#[derive(Debug, Clone)]
pub struct Settings {
    pub home: PathBuf,
    pub cache_dir: PathBuf,
    pub registry_path: PathBuf,
    pub mirror_path: PathBuf,
    pub manifest_path: PathBuf,
}

impl Settings {
    /// Resolve paths from `PYGETURL_HOME` (or the user's home) and the
    /// current directory.
    pub fn from_env() -> Result<Self> {
        let home = match env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir().ok_or(Error::HomeDirMissing)?.join(HOME_DIR),
        };
        let manifest = env::current_dir()?.join(MANIFEST_FILE);
        Ok(Self::new(home, manifest))
    }

    pub fn new(home: impl Into<PathBuf>, manifest_path: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            cache_dir: home.join(CACHE_DIR),
            registry_path: home.join(REGISTRY_FILE),
            mirror_path: home.join(MIRROR_FILE),
            manifest_path: manifest_path.into(),
            home,
        }
    }

    /// Settings rooted entirely under `root`, manifest included.
    pub fn in_dir(root: &Path) -> Self {
        Self::new(root.join(HOME_DIR), root.join(MANIFEST_FILE))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        Ok(())
    }

    /// The configured mirror base, if one has been set.
    pub fn mirror(&self) -> Option<String> {
        let content = fs::read_to_string(&self.mirror_path).ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn set_mirror(&self, url: &str) -> Result<String> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidMirror(url.to_string()));
        }
        fs::create_dir_all(&self.home)?;
        fs::write(&self.mirror_path, url)?;
        Ok(url.to_string())
    }
}
