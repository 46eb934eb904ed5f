//! `py.mod` project manifest.
//!
//! A small INI-like file edited line by line so hand-written content survives:
//!
//! ```text
//! [project]
//! name = "pyget_project"
//! version = "0.1.0"
//!
//! [dependencies]
//! requests_api = "psf/requests@main/src/requests/api.py"
//! tools = "https://example.com/tools.py"
//! ```

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEPENDENCIES_HEADER: &str = "[dependencies]";

const TEMPLATE: &str = "[project]\nname = \"pyget_project\"\nversion = \"0.1.0\"\n\n[dependencies]\n";

#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the manifest from the template. Returns `true` if it was created.
    pub fn ensure_exists(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, TEMPLATE)?;
        Ok(true)
    }

    /// Add `alias = "spec"` at the end of `[dependencies]` unless the alias is
    /// already listed. Returns `true` if a line was written.
    pub fn append(&self, alias: &str, spec: &str) -> Result<bool> {
        self.ensure_exists()?;
        let mut lines = self.read_lines()?;

        let (start, end) = match dependencies_range(&lines) {
            Some(range) => range,
            None => {
                if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                    lines.push(String::new());
                }
                lines.push(DEPENDENCIES_HEADER.to_string());
                (lines.len(), lines.len())
            }
        };

        if lines[start..end]
            .iter()
            .any(|line| entry_key(line) == Some(alias))
        {
            return Ok(false);
        }

        // After the last non-blank line of the section, so blank separators
        // before the next header stay where they are.
        let insert_at = (start..end)
            .rev()
            .find(|&i| !lines[i].trim().is_empty())
            .map(|i| i + 1)
            .unwrap_or(start);
        lines.insert(insert_at, format!("{alias} = \"{spec}\""));
        self.write_lines(&lines)?;
        Ok(true)
    }

    /// Drop the `alias = ...` line from `[dependencies]`. Returns `true` if a
    /// line was removed.
    pub fn remove_line(&self, alias: &str) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }
        let mut lines = self.read_lines()?;
        let Some((start, end)) = dependencies_range(&lines) else {
            return Ok(false);
        };

        let before = lines.len();
        let mut index = 0;
        lines.retain(|line| {
            let in_section = index >= start && index < end;
            index += 1;
            !(in_section && entry_key(line) == Some(alias))
        });

        if lines.len() == before {
            return Ok(false);
        }
        self.write_lines(&lines)?;
        Ok(true)
    }

    /// `(alias, spec)` pairs from `[dependencies]`, in file order.
    pub fn iter_dependencies(&self) -> Result<Vec<(String, String)>> {
        if !self.exists() {
            return Err(Error::ManifestMissing(self.path.clone()));
        }
        let lines = self.read_lines()?;
        let Some((start, end)) = dependencies_range(&lines) else {
            return Ok(Vec::new());
        };

        Ok(lines[start..end]
            .iter()
            .filter_map(|line| parse_entry(line))
            .collect())
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        let content = fs::read_to_string(&self.path)?;
        Ok(content.lines().map(str::to_string).collect())
    }

    fn write_lines(&self, lines: &[String]) -> Result<()> {
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&self.path, content)?;
        Ok(())
    }
}

fn is_section_header(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('[') && line.ends_with(']')
}

/// Line indices `[start, end)` of the body of `[dependencies]`.
fn dependencies_range(lines: &[String]) -> Option<(usize, usize)> {
    let header = lines
        .iter()
        .position(|line| line.trim() == DEPENDENCIES_HEADER)?;
    let start = header + 1;
    let end = lines[start..]
        .iter()
        .position(|line| is_section_header(line))
        .map(|offset| start + offset)
        .unwrap_or(lines.len());
    Some((start, end))
}

fn entry_key(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    line.split_once('=').map(|(key, _)| key.trim())
}

fn parse_entry(line: &str) -> Option<(String, String)> {
    let key = entry_key(line)?;
    let (_, value) = line.split_once('=')?;
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}
