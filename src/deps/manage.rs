//! Management commands.
//!
//! - `pyget list` - show installed modules
//! - `pyget remove <alias>` - drop registry row, `py.mod` line and cached file
//! - `pyget set-mirror <url>` - override the raw-content host
//! - `pyget clean` - remove the cache, registry and mirror override
//! - `pyget cache path|ls`

use crate::cache::Cache;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::registry::Registry;
use crate::ui;
use colored::*;
use std::fs;
use std::path::Path;

pub fn list_modules(settings: &Settings) -> Result<()> {
    let registry = Registry::load(&settings.registry_path)?;
    if registry.is_empty() {
        println!("{} No modules installed.", "ℹ".blue());
        return Ok(());
    }

    let mut table = ui::Table::new(&["Module", "Path"]);
    for (alias, path) in registry.iter() {
        let shown = if path.exists() {
            path.display().to_string()
        } else {
            format!("{} {}", path.display(), "(missing)".yellow())
        };
        table.add_row(vec![alias.green().to_string(), shown]);
    }
    table.print();
    Ok(())
}

/// Remove an installed module everywhere it is recorded. An unknown alias is
/// reported as [`Error::NotInstalled`] and nothing is touched.
pub fn remove_module(settings: &Settings, alias: &str) -> Result<()> {
    let mut registry = Registry::load(&settings.registry_path)?;
    let Some(path) = registry.get(alias).map(Path::to_path_buf) else {
        return Err(Error::NotInstalled(alias.to_string()));
    };

    let cache = Cache::new(settings);
    if cache.purge(alias, &path)? {
        println!("   {} Deleted {}", "🗑️".red(), path.display());
    }

    registry.remove(alias);
    registry.save()?;

    let manifest = Manifest::new(&settings.manifest_path);
    if manifest.remove_line(alias)? {
        println!("   {} Removed '{}' from py.mod", "✓".green(), alias);
    }

    println!("{} Removed {}", "✓".green(), alias.bold());
    Ok(())
}

pub fn set_mirror(settings: &Settings, url: &str) -> Result<()> {
    let url = settings.set_mirror(url)?;
    println!("{} Mirror set to: {}", "✓".green(), url);
    Ok(())
}

/// Remove the cache directory, the registry file and the mirror override.
pub fn clean_all(settings: &Settings) -> Result<()> {
    let cache = Cache::new(settings);
    let mut cleaned = false;

    if cache.clean()? {
        println!("{} Removed cache at {}", "🧹".yellow(), cache.root().display());
        cleaned = true;
    }
    for (label, path) in [
        ("registry", &settings.registry_path),
        ("mirror override", &settings.mirror_path),
    ] {
        if path.exists() {
            fs::remove_file(path)?;
            println!("{} Removed {} at {}", "🧹".yellow(), label, path.display());
            cleaned = true;
        }
    }

    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} No cache found to clean.", "ℹ".blue());
    }
    Ok(())
}

pub fn cache_path(settings: &Settings) {
    println!("{}", settings.cache_dir.display());
}

pub fn cache_list(settings: &Settings) -> Result<()> {
    let entries = Cache::new(settings).entries()?;
    if entries.is_empty() {
        println!("{} Cache is empty.", "ℹ".blue());
        return Ok(());
    }

    let mut table = ui::Table::new(&["Cache Entry"]);
    for name in entries {
        table.add_row(vec![name]);
    }
    table.print();
    Ok(())
}
