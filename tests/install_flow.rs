//! End-to-end install, replay and removal against fake network and git.
//!
//! Each test runs in its own temporary directory with `Settings::in_dir`, so
//! registry, cache and `py.mod` never leak between tests.

use pygeturl::config::Settings;
use pygeturl::deps::{self, Cloner, Fetcher, InstallOutcome, Installer, PackageInstaller};
use pygeturl::error::{Error, Result};
use pygeturl::manifest::Manifest;
use pygeturl::registry::Registry;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct FakeFetcher {
    calls: RefCell<Vec<String>>,
    fail: bool,
}

impl FakeFetcher {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.borrow_mut().push(url.to_string());
        if self.fail {
            return Err(Error::NetworkFetchFailure {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            });
        }
        Ok(format!("# fetched from {url}\n").into_bytes())
    }
}

/// Writes `files` into the destination instead of cloning.
#[derive(Default)]
struct FakeCloner {
    files: Vec<(&'static str, &'static str)>,
    calls: RefCell<Vec<(String, String, PathBuf)>>,
}

impl Cloner for FakeCloner {
    fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((url.to_string(), branch.to_string(), dest.to_path_buf()));
        fs::create_dir_all(dest)?;
        for (name, content) in &self.files {
            fs::write(dest.join(name), content)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct FakePip {
    calls: RefCell<Vec<(String, String)>>,
}

impl PackageInstaller for FakePip {
    fn install_published(&self, url: &str, branch: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((url.to_string(), branch.to_string()));
        Ok(())
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

#[test]
fn test_install_spec_downloads_and_records() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::default();
    let installer = Installer::new(&settings).with_fetcher(&fetcher);

    let outcome = installer.install("a/b", None).unwrap();
    let InstallOutcome::Installed { alias, path } = outcome else {
        panic!("expected install");
    };

    assert_eq!(alias, "b");
    assert_eq!(fetcher.calls(), vec!["https://raw.githubusercontent.com/a/b/master/b/b.py"]);
    assert!(path.is_absolute());
    assert_eq!(
        path,
        settings.cache_dir.join("b").join("a").join("b").join("master").join("b").join("b.py")
    );
    assert!(read(&path).contains("raw.githubusercontent.com"));

    let registry = Registry::load(&settings.registry_path).unwrap();
    assert_eq!(registry.get("b"), Some(path.as_path()));

    let deps = Manifest::new(&settings.manifest_path).iter_dependencies().unwrap();
    assert_eq!(deps, vec![("b".to_string(), "a/b@master/b/b.py".to_string())]);
    assert!(read(&settings.manifest_path).starts_with("[project]\n"));
}

#[test]
fn test_second_install_is_skipped_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::default();
    let installer = Installer::new(&settings).with_fetcher(&fetcher);

    installer.install("a/b@dev/x/y.py", None).unwrap();
    let registry_before = read(&settings.registry_path);
    let manifest_before = read(&settings.manifest_path);

    let outcome = installer.install("a/b@dev/x/y.py", None).unwrap();
    assert_eq!(outcome, InstallOutcome::Skipped("y".to_string()));
    assert_eq!(fetcher.calls().len(), 1);
    assert_eq!(read(&settings.registry_path), registry_before);
    assert_eq!(read(&settings.manifest_path), manifest_before);
}

#[test]
fn test_inline_alias_partitions_cache() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::default();
    let installer = Installer::new(&settings).with_fetcher(&fetcher);

    let first = installer.install("a/b@dev/x/y.py as one", None).unwrap();
    let second = installer.install("a/b@dev/x/y.py", Some("two")).unwrap();

    let (InstallOutcome::Installed { path: p1, .. }, InstallOutcome::Installed { path: p2, .. }) =
        (first, second)
    else {
        panic!("expected both to install");
    };
    assert_ne!(p1, p2);
    assert!(p1.starts_with(settings.cache_dir.join("one")));
    assert!(p2.starts_with(settings.cache_dir.join("two")));

    let deps = Manifest::new(&settings.manifest_path).iter_dependencies().unwrap();
    assert_eq!(deps.len(), 2);
    assert_eq!(deps[0], ("one".to_string(), "a/b@dev/x/y.py".to_string()));
}

#[test]
fn test_mirror_is_used_for_downloads() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    settings.set_mirror("https://mirror.example/").unwrap();
    let fetcher = FakeFetcher::default();

    Installer::new(&settings)
        .with_fetcher(&fetcher)
        .install("a/b@m/c/d.py", None)
        .unwrap();
    assert_eq!(fetcher.calls(), vec!["https://mirror.example/a/b/m/c/d.py"]);
}

#[test]
fn test_fetch_failure_leaves_no_state() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::failing();

    let err = Installer::new(&settings)
        .with_fetcher(&fetcher)
        .install("a/b", None)
        .unwrap_err();
    assert!(matches!(err, Error::NetworkFetchFailure { .. }));
    assert!(!settings.registry_path.exists());
    assert!(!settings.manifest_path.exists());
    assert!(!settings.cache_dir.join("b").exists());
}

#[test]
fn test_parse_error_issues_no_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::default();

    let err = Installer::new(&settings)
        .with_fetcher(&fetcher)
        .install("noSlash", None)
        .unwrap_err();
    assert!(matches!(err, Error::MalformedSpec(_)));
    assert!(fetcher.calls().is_empty());
    assert!(!settings.manifest_path.exists());
}

#[test]
fn test_install_raw_url() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::default();

    let outcome = Installer::new(&settings)
        .with_fetcher(&fetcher)
        .install("https://example.com/lib/tools.py", None)
        .unwrap();

    assert_eq!(outcome.alias(), "tools");
    let registry = Registry::load(&settings.registry_path).unwrap();
    assert_eq!(
        registry.get("tools"),
        Some(settings.cache_dir.join("external").join("tools.py").as_path())
    );
    let deps = Manifest::new(&settings.manifest_path).iter_dependencies().unwrap();
    assert_eq!(
        deps,
        vec![("tools".to_string(), "https://example.com/lib/tools.py".to_string())]
    );
}

#[test]
fn test_install_git_repository() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let cloner = FakeCloner {
        files: vec![
            ("setup.py", "setup(name='tool', py_modules=['tool'])"),
            ("tool.py", "def run(): pass\n"),
            ("helpers.py", ""),
        ],
        ..FakeCloner::default()
    };

    let outcome = Installer::new(&settings)
        .with_cloner(&cloner)
        .install("git+https://github.com/acme/tool.git@dev", None)
        .unwrap();

    let calls = cloner.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "https://github.com/acme/tool.git");
    assert_eq!(calls[0].1, "dev");
    let clone_dir = settings
        .cache_dir
        .join("tool")
        .join("git")
        .join("github.com")
        .join("acme")
        .join("tool")
        .join("dev");
    assert_eq!(calls[0].2, clone_dir);

    assert_eq!(
        outcome,
        InstallOutcome::Installed {
            alias: "tool".to_string(),
            path: clone_dir.join("tool.py"),
        }
    );
    let deps = Manifest::new(&settings.manifest_path).iter_dependencies().unwrap();
    assert_eq!(
        deps,
        vec![("tool".to_string(), "git+https://github.com/acme/tool.git@dev".to_string())]
    );
}

#[test]
fn test_git_without_entrypoint_keeps_clone_but_registers_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let cloner = FakeCloner {
        files: vec![("README.md", "docs only")],
        ..FakeCloner::default()
    };

    let err = Installer::new(&settings)
        .with_cloner(&cloner)
        .install("git+https://github.com/acme/docs.git", None)
        .unwrap_err();

    let clone_dir = match err {
        Error::EntrypointNotFound(dir) => dir,
        other => panic!("expected EntrypointNotFound, got {other:?}"),
    };
    assert!(clone_dir.join("README.md").exists());
    assert!(!settings.registry_path.exists());
    assert!(!settings.manifest_path.exists());
}

#[test]
fn test_remove_deletes_registry_manifest_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::default();
    let installer = Installer::new(&settings).with_fetcher(&fetcher);

    installer.install("a/keep", None).unwrap();
    let InstallOutcome::Installed { path, .. } = installer.install("a/b as gone", None).unwrap()
    else {
        panic!("expected install");
    };
    assert!(path.exists());

    deps::remove_module(&settings, "gone").unwrap();

    assert!(!path.exists());
    assert!(!settings.cache_dir.join("gone").exists());
    let registry = Registry::load(&settings.registry_path).unwrap();
    assert!(!registry.is_installed("gone"));
    assert!(registry.is_installed("keep"));
    let deps = Manifest::new(&settings.manifest_path).iter_dependencies().unwrap();
    assert_eq!(deps, vec![("keep".to_string(), "a/keep@master/keep/keep.py".to_string())]);

    let err = deps::remove_module(&settings, "gone").unwrap_err();
    assert!(matches!(err, Error::NotInstalled(_)));
}

#[test]
fn test_install_from_manifest_reproduces_registrations() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let manifest_text = "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n\n[dependencies]\n\
                         api = \"psf/requests@main/src/requests/api.py\"\n\
                         tools = \"https://example.com/tools.py\"\n\
                         cli = \"git+https://github.com/acme/tool.git@dev\"\n";
    fs::write(&settings.manifest_path, manifest_text).unwrap();

    let fetcher = FakeFetcher::default();
    let cloner = FakeCloner {
        files: vec![("tool.py", "")],
        ..FakeCloner::default()
    };
    let installer = Installer::new(&settings)
        .with_fetcher(&fetcher)
        .with_cloner(&cloner);

    let summary = installer.install_from_manifest().unwrap();
    assert_eq!(summary.installed, 3);
    assert!(summary.failed.is_empty());
    assert_eq!(read(&settings.manifest_path), manifest_text);

    let registry = Registry::load(&settings.registry_path).unwrap();
    let aliases: Vec<&str> = registry.iter().map(|(alias, _)| alias).collect();
    assert_eq!(aliases, vec!["api", "cli", "tools"]);
    assert_eq!(
        fetcher.calls(),
        vec![
            "https://raw.githubusercontent.com/psf/requests/main/src/requests/api.py",
            "https://example.com/tools.py",
        ]
    );

    let again = installer.install_from_manifest().unwrap();
    assert_eq!(again.skipped, 3);
    assert_eq!(again.installed, 0);
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(cloner.calls.borrow().len(), 1);
    assert_eq!(read(&settings.manifest_path), manifest_text);
}

#[test]
fn test_install_from_manifest_continues_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    fs::write(
        &settings.manifest_path,
        "[dependencies]\nbroken = \"noslash\"\nok = \"a/ok\"\n",
    )
    .unwrap();
    let fetcher = FakeFetcher::default();

    let summary = Installer::new(&settings)
        .with_fetcher(&fetcher)
        .install_from_manifest()
        .unwrap();
    assert_eq!(summary.installed, 1);
    assert_eq!(summary.failed, vec!["broken".to_string()]);
}

#[test]
fn test_install_from_missing_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let err = Installer::new(&settings).install_from_manifest().unwrap_err();
    assert!(matches!(err, Error::ManifestMissing(_)));
}

#[test]
fn test_install_package_hands_off_to_pip() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let pip = FakePip::default();

    let url = Installer::new(&settings)
        .with_package_installer(&pip)
        .install_package("psf/requests@main")
        .unwrap();

    assert_eq!(url, "https://github.com/psf/requests.git");
    assert_eq!(
        pip.calls.borrow().as_slice(),
        &[("https://github.com/psf/requests.git".to_string(), "main".to_string())]
    );
    assert!(!settings.registry_path.exists());
    assert!(!settings.manifest_path.exists());
}

#[test]
fn test_retry_after_missing_entrypoint_replaces_stale_clone() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let request = "git+https://github.com/acme/tool.git";

    let docs_only = FakeCloner {
        files: vec![("README.md", "docs only")],
        ..FakeCloner::default()
    };
    let err = Installer::new(&settings)
        .with_cloner(&docs_only)
        .install(request, None)
        .unwrap_err();
    let clone_dir = match err {
        Error::EntrypointNotFound(dir) => dir,
        other => panic!("expected EntrypointNotFound, got {other:?}"),
    };
    assert!(clone_dir.join("README.md").exists());

    let fixed = FakeCloner {
        files: vec![("tool.py", "def run(): pass\n")],
        ..FakeCloner::default()
    };
    let outcome = Installer::new(&settings)
        .with_cloner(&fixed)
        .install(request, None)
        .unwrap();

    assert_eq!(
        outcome,
        InstallOutcome::Installed {
            alias: "tool".to_string(),
            path: clone_dir.join("tool.py"),
        }
    );
    assert!(!clone_dir.join("README.md").exists());
    let deps = Manifest::new(&settings.manifest_path).iter_dependencies().unwrap();
    assert_eq!(
        deps,
        vec![("tool".to_string(), "git+https://github.com/acme/tool.git@master".to_string())]
    );
}

#[test]
fn test_unsafe_aliases_are_rejected_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::default();
    let cloner = FakeCloner::default();
    let installer = Installer::new(&settings)
        .with_fetcher(&fetcher)
        .with_cloner(&cloner);

    for (request, alias) in [
        ("a/b", Some("../../../escaped")),
        ("a/b", Some("/tmp/x")),
        ("a/b", Some("k = v")),
        ("a/b as ../up", None),
        ("a/b@m/../../../../../../outside.py as z", None),
        ("https://example.com/tools.py", Some("../tools")),
        ("git+https://github.com/acme/tool.git", Some("a/b")),
    ] {
        let err = installer.install(request, alias).unwrap_err();
        assert!(matches!(err, Error::MalformedSpec(_)), "{request} {alias:?}: {err:?}");
    }

    assert!(fetcher.calls().is_empty());
    assert!(cloner.calls.borrow().is_empty());
    assert!(!settings.registry_path.exists());
    assert!(!settings.manifest_path.exists());
    assert!(!dir.path().join("escaped").exists());
    assert!(!dir.path().join("outside.py").exists());
}

#[test]
fn test_manifest_with_escaping_alias_fails_that_entry_only() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    fs::write(
        &settings.manifest_path,
        "[dependencies]\n../../../escaped = \"a/b@m/x.py\"\nok = \"a/ok\"\n",
    )
    .unwrap();
    let fetcher = FakeFetcher::default();

    let summary = Installer::new(&settings)
        .with_fetcher(&fetcher)
        .install_from_manifest()
        .unwrap();

    assert_eq!(summary.installed, 1);
    assert_eq!(summary.failed, vec!["../../../escaped".to_string()]);
    assert_eq!(
        fetcher.calls(),
        vec!["https://raw.githubusercontent.com/a/ok/master/ok/ok.py"]
    );
    let registry = Registry::load(&settings.registry_path).unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.is_installed("ok"));
}

#[test]
fn test_install_then_remove_leaves_no_manifest_entry() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    let fetcher = FakeFetcher::default();
    let installer = Installer::new(&settings).with_fetcher(&fetcher);

    installer.install("a/b", Some("helpers")).unwrap();
    deps::remove_module(&settings, "helpers").unwrap();

    let deps = Manifest::new(&settings.manifest_path).iter_dependencies().unwrap();
    assert!(deps.is_empty());
    assert!(Registry::load(&settings.registry_path).unwrap().is_empty());
}

#[test]
fn test_manifest_write_failure_rolls_back_registry() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::in_dir(dir.path());
    fs::create_dir_all(&settings.manifest_path).unwrap();
    let fetcher = FakeFetcher::default();

    let err = Installer::new(&settings)
        .with_fetcher(&fetcher)
        .install("a/b", None)
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    let registry = Registry::load(&settings.registry_path).unwrap();
    assert!(!registry.is_installed("b"));
}
