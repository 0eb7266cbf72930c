//! NuGet provider plugin discovery
//!
//! PowerShell's package manager needs its NuGet provider plugin before it can talk to
//! any NuGet-style source, including a local folder. A disconnected machine cannot
//! bootstrap it, so bundles carry a copy.
//!
//! ## Layout
//!
//! ```text
//! <ProviderAssemblies>/
//! └── nuget/
//!     └── <version>/
//!         └── Microsoft.PackageManagement.NuGetProvider.dll
//! ```
//!
//! `ProviderAssemblies` is per user or machine-wide depending on the scope; both are
//! searched, per-user first, after any configured extra locations.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::gallery::PackageVersion;
use crate::host::Scope;

/// Directory name of the plugin under `ProviderAssemblies`
pub const PLUGIN_DIR: &str = "nuget";

/// Display name used for the plugin in staged bundles (`Providers/NuGet/<version>/`)
pub const PLUGIN_NAME: &str = "NuGet";

/// A provider plugin found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderInstall {
    /// `<ProviderAssemblies>/nuget/<version>`
    pub path: PathBuf,
    pub version: PackageVersion,
}

/// Ordered set of `ProviderAssemblies` directories
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderLocations {
    pub current_user: PathBuf,
    pub all_users: PathBuf,
    pub extra: Vec<PathBuf>,
}

impl ProviderLocations {
    pub fn new(current_user: PathBuf, all_users: PathBuf) -> Self {
        Self {
            current_user,
            all_users,
            extra: Vec::new(),
        }
    }

    /// OS default locations plus the configured extras
    pub fn detect(settings: &Settings) -> Self {
        let (current_user, all_users) = default_locations();
        Self {
            current_user,
            all_users,
            extra: settings.provider_search_paths.clone(),
        }
    }

    /// Locations in search order
    pub fn search_order(&self) -> Vec<&Path> {
        self.extra
            .iter()
            .map(PathBuf::as_path)
            .chain([self.current_user.as_path(), self.all_users.as_path()])
            .collect()
    }

    /// Plugin directory (`.../nuget`) for installs into `scope`
    pub fn plugin_dir_for(&self, scope: Scope) -> PathBuf {
        match scope {
            Scope::CurrentUser => self.current_user.join(PLUGIN_DIR),
            Scope::AllUsers => self.all_users.join(PLUGIN_DIR),
        }
    }

    /// Every versioned plugin directory, in search order
    pub fn installs(&self) -> Vec<ProviderInstall> {
        self.search_order()
            .into_iter()
            .flat_map(|location| versioned_dirs(&location.join(PLUGIN_DIR)))
            .collect()
    }

    /// Whether any location holds a usable plugin
    pub fn is_installed(&self) -> bool {
        self.search_order()
            .into_iter()
            .any(|location| contains_files(&location.join(PLUGIN_DIR)))
    }

    /// Find the plugin at `version`, falling back to the highest version on disk when
    /// `version` is `None` or absent.
    pub fn find(&self, version: Option<&PackageVersion>) -> Option<ProviderInstall> {
        let installs = self.installs();
        if let Some(wanted) = version {
            if let Some(exact) = installs.iter().find(|i| &i.version == wanted) {
                return Some(exact.clone());
            }
            tracing::warn!(
                requested = %wanted,
                "provider version not found, falling back to the highest installed"
            );
        }
        installs.into_iter().max_by(|a, b| a.version.cmp(&b.version))
    }
}

fn default_locations() -> (PathBuf, PathBuf) {
    #[cfg(windows)]
    {
        let local = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("C:\\Users\\Default\\AppData\\Local"));
        let program_files = std::env::var_os("ProgramFiles")
            .map_or_else(|| PathBuf::from("C:\\Program Files"), PathBuf::from);
        (
            local.join("PackageManagement").join("ProviderAssemblies"),
            program_files
                .join("PackageManagement")
                .join("ProviderAssemblies"),
        )
    }
    #[cfg(not(windows))]
    {
        let local = dirs::data_local_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .unwrap_or_else(|| PathBuf::from("/tmp"));
        (
            local.join("PackageManagement").join("ProviderAssemblies"),
            PathBuf::from("/usr/local/share/PackageManagement/ProviderAssemblies"),
        )
    }
}

fn versioned_dirs(plugin_dir: &Path) -> Vec<ProviderInstall> {
    let Ok(entries) = std::fs::read_dir(plugin_dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let version = e.file_name().to_str()?.parse().ok()?;
            Some(ProviderInstall {
                path: e.path(),
                version,
            })
        })
        .collect()
}

fn contains_files(dir: &Path) -> bool {
    dir.is_dir()
        && walkdir::WalkDir::new(dir)
            .into_iter()
            .flatten()
            .any(|e| e.file_type().is_file())
}
