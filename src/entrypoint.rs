//! Main-module discovery for cloned repositories.
//!
//! Looks at `setup.py`, then `pyproject.toml`, then falls back to the first
//! plain module in the repository root.

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const SETUP_PY: &str = "setup.py";
const PYPROJECT: &str = "pyproject.toml";
const INIT_PY: &str = "__init__.py";

const NON_ENTRY_FILES: &[&str] = &[SETUP_PY, INIT_PY, "conftest.py", "test.py", "tests.py"];

pub fn resolve(repo_root: &Path) -> Option<PathBuf> {
    from_setup_py(repo_root)
        .or_else(|| from_pyproject(repo_root))
        .or_else(|| first_root_module(repo_root))
}

fn from_setup_py(root: &Path) -> Option<PathBuf> {
    let content = fs::read_to_string(root.join(SETUP_PY)).ok()?;

    if let Some(name) = first_listed(&content, "py_modules")
        && let Some(path) = module_file(root, &name)
    {
        return Some(path);
    }
    let name = first_listed(&content, "packages")?;
    package_init(root, &name)
}

/// First quoted name in `key=[...]` / `key = (...)`.
fn first_listed(content: &str, key: &str) -> Option<String> {
    let pattern = format!(r#"\b{}\s*=\s*[\[(]\s*['"]([^'"]+)['"]"#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[derive(Deserialize)]
struct PyProject {
    project: Option<ProjectTable>,
    tool: Option<ToolTable>,
}

#[derive(Deserialize)]
struct ProjectTable {
    name: Option<String>,
}

#[derive(Deserialize)]
struct ToolTable {
    setuptools: Option<Setuptools>,
}

#[derive(Deserialize)]
struct Setuptools {
    #[serde(rename = "py-modules")]
    py_modules: Option<Vec<String>>,
    // a list, or a `{ find = ... }` table
    packages: Option<toml::Value>,
}

fn from_pyproject(root: &Path) -> Option<PathBuf> {
    let content = fs::read_to_string(root.join(PYPROJECT)).ok()?;
    let doc: PyProject = toml::from_str(&content).ok()?;

    if let Some(setuptools) = doc.tool.and_then(|t| t.setuptools) {
        if let Some(name) = setuptools.py_modules.as_deref().and_then(<[String]>::first)
            && let Some(path) = module_file(root, name)
        {
            return Some(path);
        }
        if let Some(name) = setuptools.packages.as_ref().and_then(first_string)
            && let Some(path) = package_init(root, &name)
        {
            return Some(path);
        }
    }

    let name = doc.project?.name?.replace('-', "_");
    module_file(root, &name).or_else(|| package_init(root, &name))
}

fn first_string(value: &toml::Value) -> Option<String> {
    value
        .as_array()?
        .iter()
        .find_map(|v| v.as_str())
        .map(str::to_string)
}

fn module_file(root: &Path, name: &str) -> Option<PathBuf> {
    let path = root.join(format!("{name}.py"));
    path.is_file().then_some(path)
}

fn package_init(root: &Path, name: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for part in name.split('.') {
        path.push(part);
    }
    path.push(INIT_PY);
    path.is_file().then_some(path)
}

fn is_entry_candidate(name: &str) -> bool {
    name.ends_with(".py")
        && !NON_ENTRY_FILES.contains(&name)
        && !name.starts_with("test_")
        && !name.ends_with("_test.py")
}

fn first_root_module(root: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(root)
        .ok()?
        .flatten()
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| is_entry_candidate(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
