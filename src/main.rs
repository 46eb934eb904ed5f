//! # pyget CLI Entry Point
//!
//! Parses arguments with clap and routes them to the handlers in
//! [`pygeturl::deps`].
//!
//! - **Install**: `install [SPEC] [--as ALIAS] [--package]`
//! - **Manage**: `list`, `remove`, `set-mirror`, `clean`, `cache`
//! - **Shell**: `completion`

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;

use pygeturl::config::Settings;
use pygeturl::deps::{self, InstallOutcome, Installer};

#[derive(Parser)]
#[command(name = "pyget")]
#[command(about = "Fetch single-file Python modules from GitHub, URLs or git", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a module, or everything in py.mod when no spec is given
    Install {
        /// owner/repo[@branch][/path] [as alias], an http(s) URL, or git+<url>[@branch]
        #[arg(num_args = 0..)]
        spec: Vec<String>,
        /// Alias to register the module under
        #[arg(long = "as", value_name = "ALIAS")]
        alias: Option<String>,
        /// Install the whole repository as a package with pip
        #[arg(long)]
        package: bool,
    },
    /// List installed modules
    #[command(alias = "ls")]
    List,
    /// Remove an installed module
    Remove {
        /// Alias of the module
        alias: String,
    },
    /// Use a mirror instead of raw.githubusercontent.com
    #[command(alias = "set-registry")]
    SetMirror {
        /// Base URL, e.g. https://mirror.example
        url: String,
    },
    /// Remove the cache, registry and mirror override
    #[command(alias = "clean-cache")]
    Clean,
    /// Inspect the module cache
    Cache {
        #[command(subcommand)]
        op: CacheOp,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

#[derive(Subcommand)]
enum CacheOp {
    /// List cached entries
    Ls,
    /// Print cache directory path
    Path,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        println!("{} {:#}", "x".red(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completion { shell } = cli.command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let settings = Settings::from_env().context("Failed to locate pyget directories")?;
    settings
        .ensure_dirs()
        .with_context(|| format!("Failed to create {}", settings.cache_dir.display()))?;

    match cli.command {
        Commands::Install {
            spec,
            alias,
            package,
        } => install(&settings, &spec.join(" "), alias.as_deref(), package),
        Commands::List => deps::list_modules(&settings).context("Failed to list modules"),
        Commands::Remove { alias } => {
            deps::remove_module(&settings, &alias).with_context(|| format!("Failed to remove '{alias}'"))
        }
        Commands::SetMirror { url } => {
            deps::set_mirror(&settings, &url).context("Failed to set mirror")
        }
        Commands::Clean => deps::clean_all(&settings).context("Failed to clean"),
        Commands::Cache { op } => match op {
            CacheOp::Ls => deps::cache_list(&settings).context("Failed to list cache"),
            CacheOp::Path => {
                deps::cache_path(&settings);
                Ok(())
            }
        },
        Commands::Completion { .. } => Ok(()),
    }
}

fn install(settings: &Settings, spec: &str, alias: Option<&str>, package: bool) -> Result<()> {
    let installer = Installer::new(settings);
    let spec = spec.trim();

    if package {
        installer
            .install_package(spec)
            .with_context(|| format!("Failed to install package '{spec}'"))?;
        return Ok(());
    }

    if spec.is_empty() {
        let summary = installer
            .install_from_manifest()
            .context("Failed to install from py.mod")?;
        println!(
            "{} {} installed, {} already present, {} failed",
            "✓".green(),
            summary.installed,
            summary.skipped,
            summary.failed.len()
        );
        if !summary.failed.is_empty() {
            anyhow::bail!("Could not install: {}", summary.failed.join(", "));
        }
        return Ok(());
    }

    match installer
        .install(spec, alias)
        .with_context(|| format!("Failed to install '{spec}'"))?
    {
        InstallOutcome::Installed { path, .. } => {
            println!("   {} {}", "→".blue(), path.display());
        }
        InstallOutcome::Skipped(_) => {}
    }
    Ok(())
}
