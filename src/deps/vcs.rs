//! `git+<url>[@branch]` sources.
//!
//! - `git+https://github.com/user/repo.git` -> branch `master`
//! - `git+https://github.com/user/repo.git@dev` -> branch `dev`
//! - `git+ssh://git@host/user/repo.git@v2`
//! - `git+git@github.com:user/repo.git`

use crate::error::{Error, Result};
use crate::spec::DEFAULT_BRANCH;

pub const VCS_PREFIX: &str = "git+";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsSource {
    /// Clone URL without the `git+` prefix or branch.
    pub url: String,
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl VcsSource {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let rest = input
            .strip_prefix(VCS_PREFIX)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| Error::MalformedSpec(input.to_string()))?;

        // `@branch` only counts after the last `/`, so `user@host` and
        // `git@github.com:...` stay part of the URL.
        let (url, branch) = match rest.rsplit_once('@') {
            Some((url, branch)) if !branch.is_empty() && !branch.contains('/') && url.contains('/') => {
                (url, branch)
            }
            _ => (rest, DEFAULT_BRANCH),
        };

        let (host, owner, repo) =
            split_location(url).ok_or_else(|| Error::InvalidOwnerRepo(input.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            host,
            owner,
            repo,
            branch: branch.to_string(),
        })
    }

    /// Normalized `git+<url>@<branch>`, the form recorded in `py.mod`.
    pub fn spec(&self) -> String {
        format!("{}{}@{}", VCS_PREFIX, self.url, self.branch)
    }
}

fn split_location(url: &str) -> Option<(String, String, String)> {
    let location = match url.split_once("://") {
        Some((_, rest)) => rest.to_string(),
        // scp-like `git@host:owner/repo`
        None => url.replacen(':', "/", 1),
    };

    let segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 3 {
        return None;
    }
    let host = segments[0].rsplit('@').next()?.replace(':', "_");
    let owner = segments[1];
    let repo = segments[segments.len() - 1].trim_end_matches(".git");
    if host.is_empty() || owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((host, owner.to_string(), repo.to_string()))
}
