//! # pygeturl - single-file Python module manager
//!
//! `pyget` fetches individual Python modules straight from GitHub (or a
//! mirror), raw URLs, or git repositories, caches them under `~/.pygeturl`,
//! and records every install in a project `py.mod` so it can be replayed.
//!
//! ## Quick Start
//!
//! ```bash
//! # owner/repo[@branch][/path] [as alias]
//! pyget install psf/requests@main/src/requests/api.py as requests_api
//!
//! # Raw URL or git repository
//! pyget install https://example.com/tools.py
//! pyget install git+https://github.com/user/tool.git@dev
//!
//! # Reinstall everything from py.mod
//! pyget install
//! ```
//!
//! ## Module Organization
//!
//! - [`spec`] - dependency string grammar
//! - [`url`] - raw-file URL construction
//! - [`cache`] - on-disk cache layout
//! - [`registry`] - alias -> path registry (`registry.json`)
//! - [`manifest`] - `py.mod` project manifest
//! - [`entrypoint`] - main-module discovery in cloned repositories
//! - [`deps`] - install orchestration and management commands

/// Module cache layout under `~/.pygeturl/cache`.
pub mod cache;

/// Process-wide paths and the mirror override.
pub mod config;

/// Install orchestration and management commands.
pub mod deps;

/// Main-module discovery for cloned repositories.
pub mod entrypoint;

/// Error types.
pub mod error;

/// `py.mod` manifest editing.
pub mod manifest;

/// Installed module registry (`registry.json`).
pub mod registry;

/// Dependency spec parsing.
pub mod spec;

/// Terminal UI utilities (tables, spinners).
pub mod ui;

/// Raw-file URL construction.
pub mod url;

pub use error::{Error, Result};
