//! Install orchestration.
//!
//! Every install follows the same order so a failure never leaves a half
//! registered module behind:
//!
//! 1. Classify and parse the request
//! 2. Check the alias is a plain name, then skip if it is already in the
//!    registry (no network access)
//! 3. Download or clone into the cache
//! 4. Save the registry, then append to `py.mod`; the registry row is rolled
//!    back if the append fails

use super::fetch::{Cloner, Fetcher, GitCloner, HttpFetcher, PackageInstaller, PipInstaller};
use super::vcs::{VCS_PREFIX, VcsSource};
use crate::cache::Cache;
use crate::config::Settings;
use crate::entrypoint;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::registry::Registry;
use crate::spec;
use crate::ui;
use crate::url;
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

const GITHUB: &str = "https://github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { alias: String, path: PathBuf },
    Skipped(String),
}

impl InstallOutcome {
    pub fn alias(&self) -> &str {
        match self {
            Self::Installed { alias, .. } | Self::Skipped(alias) => alias,
        }
    }
}

/// Result of replaying `py.mod`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManifestSummary {
    pub installed: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
}

/// What kind of source a request names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Vcs(VcsSource),
    Url(String),
    Spec(String),
}

/// Classify `input` (without any ` as alias` suffix).
pub fn classify(input: &str) -> Result<Request> {
    let input = input.trim();
    if input.starts_with(VCS_PREFIX) {
        Ok(Request::Vcs(VcsSource::parse(input)?))
    } else if url::is_http(input) {
        Ok(Request::Url(input.to_string()))
    } else {
        Ok(Request::Spec(input.to_string()))
    }
}

pub struct Installer<'a> {
    settings: &'a Settings,
    cache: Cache,
    manifest: Manifest,
    fetcher: Box<dyn Fetcher + 'a>,
    cloner: Box<dyn Cloner + 'a>,
    packages: Box<dyn PackageInstaller + 'a>,
}

impl<'a> Installer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            cache: Cache::new(settings),
            manifest: Manifest::new(&settings.manifest_path),
            fetcher: Box::new(HttpFetcher),
            cloner: Box::new(GitCloner),
            packages: Box::new(PipInstaller::default()),
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'a) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_cloner(mut self, cloner: impl Cloner + 'a) -> Self {
        self.cloner = Box::new(cloner);
        self
    }

    pub fn with_package_installer(mut self, packages: impl PackageInstaller + 'a) -> Self {
        self.packages = Box::new(packages);
        self
    }

    /// Install one request. `alias` is used when the request carries no
    /// ` as alias` of its own.
    pub fn install(&self, request: &str, alias: Option<&str>) -> Result<InstallOutcome> {
        let request = request.trim();
        let (source, inline_alias) = spec::split_alias(request);
        if inline_alias == Some("") {
            return Err(Error::MalformedSpec(request.to_string()));
        }
        let alias = inline_alias.or(alias);

        match classify(source)? {
            Request::Vcs(vcs) => self.install_vcs(&vcs, alias),
            Request::Url(url) => self.install_url(&url, alias),
            Request::Spec(_) => self.install_spec(request, alias),
        }
    }

    fn install_spec(&self, request: &str, alias_override: Option<&str>) -> Result<InstallOutcome> {
        let locator = spec::parse(request)?;
        let alias = locator
            .alias
            .clone()
            .or_else(|| alias_override.map(str::to_string))
            .unwrap_or_else(|| locator.module_name());
        spec::validate_alias(&alias)?;

        let mut registry = Registry::load(&self.settings.registry_path)?;
        if registry.is_installed(&alias) {
            return Ok(self.skipped(alias));
        }

        let url = url::build(&locator, self.settings.mirror().as_deref());
        let bytes = self.download(&url)?;
        let path = self.cache.spec_path(&alias, &locator)?;
        self.cache.write(&path, &bytes)?;

        self.record(&mut registry, alias, &path, &locator.canonical())
    }

    fn install_url(&self, url: &str, alias_override: Option<&str>) -> Result<InstallOutcome> {
        let alias = match alias_override {
            Some(alias) => alias.to_string(),
            None => url::file_stem(url).ok_or_else(|| Error::MalformedSpec(url.to_string()))?,
        };
        spec::validate_alias(&alias)?;

        let mut registry = Registry::load(&self.settings.registry_path)?;
        if registry.is_installed(&alias) {
            return Ok(self.skipped(alias));
        }

        let bytes = self.download(url)?;
        let path = self.cache.external_path(&alias)?;
        self.cache.write(&path, &bytes)?;

        self.record(&mut registry, alias, &path, url)
    }

    fn install_vcs(&self, source: &VcsSource, alias_override: Option<&str>) -> Result<InstallOutcome> {
        let alias = alias_override.unwrap_or(&source.repo).to_string();
        spec::validate_alias(&alias)?;

        let mut registry = Registry::load(&self.settings.registry_path)?;
        if registry.is_installed(&alias) {
            return Ok(self.skipped(alias));
        }

        let dest = self.cache.clone_dir(&alias, source)?;
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }

        let pb = ui::spinner(format!("Cloning {} ({})...", source.url, source.branch));
        match self.cloner.clone_repo(&source.url, &source.branch, &dest) {
            Ok(()) => pb.finish_with_message(format!("{} Cloned {}", "✓".green(), source.url)),
            Err(err) => {
                pb.finish_with_message(format!("{} Failed {}", "x".red(), source.url));
                return Err(err);
            }
        }

        // The clone stays in place on failure; the next attempt replaces it.
        let entry = entrypoint::resolve(&dest).ok_or_else(|| Error::EntrypointNotFound(dest.clone()))?;
        println!("   {} Entrypoint: {}", "📌".blue(), entry.display());

        self.record(&mut registry, alias, &entry, &source.spec())
    }

    /// Reinstall every dependency listed in `py.mod`. Already registered
    /// aliases are skipped; failures are reported and the rest continue.
    pub fn install_from_manifest(&self) -> Result<ManifestSummary> {
        let deps = self.manifest.iter_dependencies()?;
        let mut summary = ManifestSummary::default();

        if deps.is_empty() {
            println!("{} No dependencies listed in {}", "!".yellow(), self.manifest.path().display());
            return Ok(summary);
        }
        println!("{} Installing {} dependencies from py.mod...", "📦".blue(), deps.len());

        for (alias, stored) in deps {
            let result = if stored.starts_with(VCS_PREFIX) || url::is_http(&stored) {
                self.install(&stored, Some(&alias))
            } else {
                self.install(&format!("{stored} as {alias}"), None)
            };

            match result {
                Ok(InstallOutcome::Installed { .. }) => summary.installed += 1,
                Ok(InstallOutcome::Skipped(_)) => summary.skipped += 1,
                Err(err) => {
                    println!("{} Failed to install '{}': {}", "x".red(), alias, err);
                    summary.failed.push(alias);
                }
            }
        }
        Ok(summary)
    }

    /// Hand a whole GitHub repository (`owner/repo[@branch]`) to pip.
    /// Nothing is recorded in the registry or `py.mod`.
    pub fn install_package(&self, request: &str) -> Result<String> {
        let locator = spec::parse(request)?;
        let url = format!("{}/{}/{}.git", GITHUB, locator.owner, locator.repo);
        println!(
            "{} Installing package from GitHub: {}{}@{}",
            "📦".blue(),
            VCS_PREFIX,
            url,
            locator.branch
        );
        self.packages.install_published(&url, &locator.branch)?;
        println!("{} Installed {}/{}", "✓".green(), locator.owner, locator.repo);
        Ok(url)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let pb = ui::spinner(format!("Downloading from: {url}"));
        match self.fetcher.fetch(url) {
            Ok(bytes) => {
                pb.finish_with_message(format!("{} Downloaded {}", "✓".green(), url));
                Ok(bytes)
            }
            Err(err) => {
                pb.finish_with_message(format!("{} Failed {}", "x".red(), url));
                Err(err)
            }
        }
    }

    fn record(
        &self,
        registry: &mut Registry,
        alias: String,
        path: &Path,
        spec: &str,
    ) -> Result<InstallOutcome> {
        let path = std::path::absolute(path)?;
        registry.insert(alias.clone(), path.clone());
        registry.save()?;

        if let Err(err) = self.append_manifest(&alias, spec) {
            registry.remove(&alias);
            registry.save()?;
            return Err(err);
        }

        println!("{} '{}' installed and added to py.mod.", "✓".green(), alias.bold());
        Ok(InstallOutcome::Installed { alias, path })
    }

    fn append_manifest(&self, alias: &str, spec: &str) -> Result<()> {
        if self.manifest.ensure_exists()? {
            println!("{} py.mod not found, created {}", "!".yellow(), self.manifest.path().display());
        }
        self.manifest.append(alias, spec)?;
        Ok(())
    }

    fn skipped(&self, alias: String) -> InstallOutcome {
        println!("{} '{}' is already installed.", "!".yellow(), alias);
        InstallOutcome::Skipped(alias)
    }
}
