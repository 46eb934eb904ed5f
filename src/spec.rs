//! Dependency spec parsing.
//!
//! Grammar: `owner/repo[@branch][/path/to/file.py] [as alias]`
//!
//! - `user/repo` -> branch `master`, path `repo/repo.py`
//! - `user/repo@dev` -> branch `dev`, path `repo/repo.py`
//! - `user/repo@dev/pkg/mod.py` -> branch `dev`, path `pkg/mod.py`
//! - `user/repo/pkg/mod.py` -> branch `master`, path `pkg/mod.py`

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

pub const DEFAULT_BRANCH: &str = "master";
pub const MODULE_EXT: &str = "py";

const ALIAS_SEPARATOR: &str = " as ";

/// A single remote file: `owner/repo@branch/path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub alias: Option<String>,
}

impl Locator {
    /// `owner/repo@branch/path`, the form recorded in `py.mod`.
    pub fn canonical(&self) -> String {
        format!("{}/{}@{}/{}", self.owner, self.repo, self.branch, self.path)
    }

    /// File stem of `path`; the alias used when none is given.
    pub fn module_name(&self) -> String {
        Path::new(&self.path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.repo.clone())
    }

    pub fn file_name(&self) -> String {
        self.path.rsplit('/').next().unwrap_or(&self.path).to_string()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())?;
        if let Some(alias) = &self.alias {
            write!(f, "{}{}", ALIAS_SEPARATOR, alias)?;
        }
        Ok(())
    }
}

/// Split a trailing ` as alias` off `input`, splitting from the right.
/// A bare trailing ` as` yields an empty alias.
pub fn split_alias(input: &str) -> (&str, Option<&str>) {
    if let Some((rest, alias)) = input.rsplit_once(ALIAS_SEPARATOR) {
        return (rest, Some(alias.trim()));
    }
    match input.trim_end().strip_suffix(ALIAS_SEPARATOR.trim_end()) {
        Some(rest) => (rest, Some("")),
        None => (input, None),
    }
}

/// Aliases become a cache directory and a `py.mod` key, so they must be a
/// single plain path segment with no key/value syntax in them.
pub fn validate_alias(alias: &str) -> Result<()> {
    let bad_char = |c: char| {
        c.is_whitespace() || matches!(c, '/' | '\\' | '=' | '"' | '\'' | '#' | '[' | ']')
    };
    if alias.is_empty() || alias == "." || alias.contains("..") || alias.chars().any(bad_char) {
        return Err(Error::MalformedSpec(alias.to_string()));
    }
    Ok(())
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

pub fn default_path(repo: &str) -> String {
    format!("{repo}/{repo}.{MODULE_EXT}")
}

pub fn parse(spec: &str) -> Result<Locator> {
    let (rest, alias) = split_alias(spec);
    if let Some(alias) = alias
        && validate_alias(alias).is_err()
    {
        return Err(Error::MalformedSpec(spec.to_string()));
    }
    let rest = rest.trim();

    if !rest.contains('/') {
        return Err(Error::MalformedSpec(spec.to_string()));
    }

    let (repo_part, path_part) = match rest.split_once('@') {
        Some((repo, path)) => (repo, Some(path)),
        None => (rest, None),
    };

    let repo_parts: Vec<&str> = repo_part.trim_matches('/').split('/').collect();
    if repo_parts.len() < 2 || repo_parts[0].is_empty() || repo_parts[1].is_empty() {
        return Err(Error::InvalidOwnerRepo(spec.to_string()));
    }
    if !repo_parts.iter().all(|part| is_plain_segment(part)) {
        return Err(Error::InvalidOwnerRepo(spec.to_string()));
    }
    let owner = repo_parts[0].to_string();
    let repo = repo_parts[1].to_string();

    let (branch, path) = match path_part {
        Some(path_part) => {
            let parts: Vec<&str> = path_part.trim_matches('/').split('/').collect();
            let branch = parts[0];
            if !parts.iter().all(|part| is_plain_segment(part)) {
                return Err(Error::MalformedSpec(spec.to_string()));
            }
            let path = if parts.len() > 1 {
                parts[1..].join("/")
            } else {
                default_path(&repo)
            };
            (branch.to_string(), path)
        }
        None => {
            let path = if repo_parts.len() > 2 {
                repo_parts[2..].join("/")
            } else {
                default_path(&repo)
            };
            (DEFAULT_BRANCH.to_string(), path)
        }
    };

    Ok(Locator {
        owner,
        repo,
        branch,
        path,
        alias: alias.map(str::to_string),
    })
}
