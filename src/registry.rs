use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Installed modules: alias -> absolute path of the cached file.
///
/// Backed by `~/.pygeturl/registry.json`, which is also what the import hook
/// reads, so the on-disk shape is a flat JSON object.
#[derive(Debug, Default)]
pub struct Registry {
    path: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl Registry {
    pub fn load(path: &Path) -> Result<Self> {
        let entries = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| Error::RegistryCorrupted {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Rewrite the whole file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            Error::RegistryCorrupted {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn is_installed(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn get(&self, alias: &str) -> Option<&Path> {
        self.entries.get(alias).map(PathBuf::as_path)
    }

    pub fn insert(&mut self, alias: impl Into<String>, path: PathBuf) {
        self.entries.insert(alias.into(), path);
    }

    pub fn remove(&mut self, alias: &str) -> Option<PathBuf> {
        self.entries.remove(alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
