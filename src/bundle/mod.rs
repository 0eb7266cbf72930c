//! Offline bundles
//!
//! A bundle is a directory that carries everything a disconnected machine needs to
//! install a set of modules: the package artifacts, a copy of the NuGet provider plugin,
//! and a generated installer script.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├── Nuget/<Name>.<Version>.nupkg               # export
//! ├── Provider/<version>/<plugin files>           # export
//! ├── Modules/<Name>/<Version>/<module files>     # stage
//! ├── Providers/NuGet/<version>/<plugin files>    # stage
//! ├── Install-FromRepoFolder.ps1                  # export
//! └── bundle.yaml                                 # export
//! ```
//!
//! ## Operations
//!
//! - [`stage`]: copy installed modules (or gallery artifacts) into `Modules/`
//! - [`resolve`]: dependency closure with a highest-version-wins merge
//! - [`export`]: closure download into `Nuget/`, provider mirror, installer, manifest
//! - [`install`]: bootstrap the provider, register a temporary source, install

use std::path::{Path, PathBuf};

use crate::gallery::{Gallery, PackageVersion, artifact_file_name};
use crate::host::provider::PLUGIN_NAME;
use crate::host::{ModulePaths, PackageHost, ProviderLocations};

pub mod export;
pub mod install;
pub mod installer_script;
pub mod report;
pub mod resolve;
pub mod stage;

pub use export::{ExportOptions, export};
pub use install::{InstallOptions, install};
pub use report::{BatchReport, InstallReport};
pub use resolve::{ResolvedPackage, ResolvedPackageSet, VersionOverrides, resolve_closure};
pub use stage::{StageOptions, StageSource, stage};

pub const NUGET_DIR: &str = "Nuget";
pub const PROVIDER_DIR: &str = "Provider";
pub const MODULES_DIR: &str = "Modules";
pub const PROVIDERS_DIR: &str = "Providers";
pub const INSTALLER_SCRIPT: &str = "Install-FromRepoFolder.ps1";
pub const MANIFEST_FILE: &str = "bundle.yaml";

/// Packaging-infrastructure modules, installed before anything else in this order
pub const PRIORITY_PACKAGES: [&str; 2] = ["PackageManagement", "PowerShellGet"];

/// Report key used for the provider plugin in batch reports
pub const PROVIDER_REPORT_KEY: &str = "NuGet (provider)";

/// Path helper for a bundle root
#[derive(Debug, Clone, PartialEq)]
pub struct BundleLayout {
    root: PathBuf,
}

impl BundleLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn nuget_dir(&self) -> PathBuf {
        self.root.join(NUGET_DIR)
    }

    pub fn provider_dir(&self) -> PathBuf {
        self.root.join(PROVIDER_DIR)
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.root.join(MODULES_DIR)
    }

    /// `Modules/<name>/<version>`
    pub fn module_dir(&self, name: &str, version: &PackageVersion) -> PathBuf {
        self.modules_dir().join(name).join(version.to_string())
    }

    /// `Providers/NuGet`
    pub fn staged_providers_root(&self) -> PathBuf {
        self.root.join(PROVIDERS_DIR).join(PLUGIN_NAME)
    }

    /// `Providers/NuGet/<version>`
    pub fn staged_provider_dir(&self, version: &PackageVersion) -> PathBuf {
        self.staged_providers_root().join(version.to_string())
    }

    /// `Nuget/<Name>.<Version>.nupkg`
    pub fn artifact_path(&self, name: &str, version: &PackageVersion) -> PathBuf {
        self.nuget_dir().join(artifact_file_name(name, version))
    }

    pub fn installer_script(&self) -> PathBuf {
        self.root.join(INSTALLER_SCRIPT)
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }
}

/// Collaborators the bundle operations work against
#[derive(Clone, Copy)]
pub struct BundleEnv<'a> {
    pub gallery: &'a dyn Gallery,
    pub host: &'a dyn PackageHost,
    pub providers: &'a ProviderLocations,
    pub modules: &'a ModulePaths,
}
