//! Test fixtures and utilities for reducing test setup duplication.
//!
//! This module provides helper functions to create common test environments
//! (temp directories, git repos, installed modules, provider plugins) and in-memory
//! doubles for the two external collaborators: [`MockGallery`] and [`MockHost`].
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{create_temp_dir, MockGallery, MockHost};
//!
//! #[test]
//! fn my_test() {
//!     let temp = create_temp_dir();
//!     let gallery = MockGallery::new().with_package("A", "1.0", &[("B", "[1.0, )")]);
//!     let host = MockHost::new().failing_install("B");
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ModkitError, Result};
use crate::gallery::{Dependency, Gallery, PackageInfo, PackageVersion};
use crate::host::provider::PLUGIN_DIR;
use crate::host::{InstallRequest, PackageHost};

/// Absolute base for test temp dirs, so a relative TMPDIR never puts them under the
/// current working directory
fn temp_dir_base() -> PathBuf {
    let t = std::env::temp_dir();
    if t.is_absolute() {
        t
    } else if cfg!(windows) {
        std::env::var("TEMP")
            .or_else(|_| std::env::var("TMP"))
            .map_or_else(|_| PathBuf::from("C:\\Windows\\Temp"), PathBuf::from)
    } else {
        PathBuf::from("/tmp")
    }
}

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(temp_dir_base()).expect("Failed to create temp directory")
}

/// Create a temp directory with a git repository initialized.
///
/// # Panics
///
/// Panics if the temp directory or git repository cannot be created.
#[must_use]
pub fn create_git_repo() -> (TempDir, PathBuf) {
    let temp = create_temp_dir();
    let path = temp.path().to_path_buf();
    git2::Repository::init(&path).expect("Failed to init git repository");
    (temp, path)
}

/// Create `<root>/<name>/<version>/<name>.psd1` and return the version directory
pub fn write_module(root: &Path, name: &str, version: &str) -> PathBuf {
    let dir = root.join(name).join(version);
    std::fs::create_dir_all(dir.join("lib")).expect("Failed to create module directory");
    std::fs::write(
        dir.join(format!("{name}.psd1")),
        format!("@{{ ModuleVersion = '{version}' }}\n"),
    )
    .expect("Failed to write module manifest");
    std::fs::write(dir.join("lib").join("helper.ps1"), "function Get-Helper {}\n")
        .expect("Failed to write module file");
    dir
}

/// Create `<location>/nuget/<version>/Microsoft.PackageManagement.NuGetProvider.dll`
pub fn write_provider(location: &Path, version: &str) -> PathBuf {
    let dir = location.join(PLUGIN_DIR).join(version);
    std::fs::create_dir_all(&dir).expect("Failed to create provider directory");
    std::fs::write(
        dir.join("Microsoft.PackageManagement.NuGetProvider.dll"),
        format!("provider {version}"),
    )
    .expect("Failed to write provider file");
    dir
}

/// In-memory gallery
#[derive(Debug, Default)]
pub struct MockGallery {
    packages: Vec<PackageInfo>,
    failing_queries: HashSet<String>,
    failing_downloads: HashSet<String>,
    downloads: RefCell<Vec<String>>,
    published: RefCell<Vec<(PathBuf, String)>>,
}

impl MockGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name@version` with dependencies given as `(name, range)` pairs
    #[must_use]
    pub fn with_package(mut self, name: &str, version: &str, deps: &[(&str, &str)]) -> Self {
        self.packages.push(PackageInfo {
            name: name.to_string(),
            version: version.parse().expect("valid test version"),
            dependencies: deps
                .iter()
                .map(|(n, r)| Dependency {
                    name: (*n).to_string(),
                    range: r.parse().expect("valid test range"),
                })
                .collect(),
        });
        self
    }

    /// Make every query for `name` fail with a gallery error
    #[must_use]
    pub fn failing_query(mut self, name: &str) -> Self {
        self.failing_queries.insert(name.to_ascii_lowercase());
        self
    }

    /// Make every download of `name` fail
    #[must_use]
    pub fn failing_download(mut self, name: &str) -> Self {
        self.failing_downloads.insert(name.to_ascii_lowercase());
        self
    }

    /// Downloads performed so far, as `name@version`
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }

    pub fn published(&self) -> Vec<(PathBuf, String)> {
        self.published.borrow().clone()
    }
}

impl Gallery for MockGallery {
    fn versions(&self, name: &str) -> Result<Vec<PackageInfo>> {
        if self.failing_queries.contains(&name.to_ascii_lowercase()) {
            return Err(ModkitError::Gallery {
                url: format!("mock://{name}"),
                reason: "simulated outage".to_string(),
            });
        }
        Ok(self
            .packages
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect())
    }

    fn download(&self, name: &str, version: &PackageVersion, dest: &Path) -> Result<()> {
        if self.failing_downloads.contains(&name.to_ascii_lowercase()) {
            return Err(ModkitError::transient_io(dest, "simulated network failure"));
        }
        if !self
            .packages
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name) && &p.version == version)
        {
            return Err(ModkitError::not_found(format!("{name} {version}")));
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, format!("nupkg {name} {version}"))?;
        self.downloads.borrow_mut().push(format!("{name}@{version}"));
        Ok(())
    }

    fn publish(&self, package: &Path, api_key: &str) -> Result<()> {
        self.published
            .borrow_mut()
            .push((package.to_path_buf(), api_key.to_string()));
        Ok(())
    }
}

/// In-memory host package manager recording every call
#[derive(Debug)]
pub struct MockHost {
    runtime_major: u32,
    elevated: bool,
    fail_register: bool,
    failing_installs: HashSet<String>,
    sources: RefCell<BTreeSet<String>>,
    install_attempts: RefCell<Vec<String>>,
    installed: RefCell<Vec<(String, Option<String>, Option<String>)>>,
    unregister_calls: Cell<usize>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            runtime_major: 7,
            elevated: false,
            fail_register: false,
            failing_installs: HashSet::new(),
            sources: RefCell::new(BTreeSet::new()),
            install_attempts: RefCell::new(Vec::new()),
            installed: RefCell::new(Vec::new()),
            unregister_calls: Cell::new(0),
        }
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_runtime_major(mut self, major: u32) -> Self {
        self.runtime_major = major;
        self
    }

    #[must_use]
    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    #[must_use]
    pub fn failing_register(mut self) -> Self {
        self.fail_register = true;
        self
    }

    #[must_use]
    pub fn failing_install(mut self, name: &str) -> Self {
        self.failing_installs.insert(name.to_ascii_lowercase());
        self
    }

    /// Currently registered sources
    pub fn registered_sources(&self) -> BTreeSet<String> {
        self.sources.borrow().clone()
    }

    /// Every install attempt in order, successful or not
    pub fn install_attempts(&self) -> Vec<String> {
        self.install_attempts.borrow().clone()
    }

    /// Successful installs as `(name, version, source)`
    pub fn installed(&self) -> Vec<(String, Option<String>, Option<String>)> {
        self.installed.borrow().clone()
    }

    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.get()
    }
}

impl PackageHost for MockHost {
    fn runtime_major(&self) -> Result<u32> {
        Ok(self.runtime_major)
    }

    fn is_elevated(&self) -> Result<bool> {
        Ok(self.elevated)
    }

    fn register_source(&self, name: &str, _location: &Path) -> Result<()> {
        if self.fail_register {
            return Err(ModkitError::host("simulated registration failure"));
        }
        self.sources.borrow_mut().insert(name.to_string());
        Ok(())
    }

    fn unregister_source(&self, name: &str) -> Result<()> {
        self.unregister_calls.set(self.unregister_calls.get() + 1);
        if self.sources.borrow_mut().remove(name) {
            Ok(())
        } else {
            Err(ModkitError::host(format!("source {name} is not registered")))
        }
    }

    fn install(&self, request: &InstallRequest<'_>) -> Result<()> {
        self.install_attempts
            .borrow_mut()
            .push(request.name.to_string());
        if self
            .failing_installs
            .contains(&request.name.to_ascii_lowercase())
        {
            return Err(ModkitError::host(format!(
                "simulated install failure for {}",
                request.name
            )));
        }
        if let Some(source) = request.source {
            if !self.sources.borrow().contains(source) {
                return Err(ModkitError::host(format!("unknown source {source}")));
            }
        }
        self.installed.borrow_mut().push((
            request.name.to_string(),
            request.version.map(ToString::to_string),
            request.source.map(ToString::to_string),
        ));
        Ok(())
    }
}
