//! Raw-file URL construction.

use crate::config::DEFAULT_MIRROR;
use crate::spec::Locator;

/// `{base}/{owner}/{repo}/{branch}/{path}`, with `base` falling back to the
/// GitHub raw-content host.
pub fn build(locator: &Locator, mirror_base: Option<&str>) -> String {
    let base = mirror_base
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(DEFAULT_MIRROR);
    format!(
        "{}/{}/{}/{}/{}",
        base.trim_end_matches('/'),
        locator.owner,
        locator.repo,
        locator.branch,
        locator.path.trim_start_matches('/')
    )
}

/// File stem of the last path segment of `url`, ignoring query and fragment.
pub fn file_stem(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let name = without_query.trim_end_matches('/').rsplit('/').next()?;
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    if stem.is_empty() || stem.contains(':') {
        None
    } else {
        Some(stem.to_string())
    }
}

pub fn is_http(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}
