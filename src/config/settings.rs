//! Tool settings (modkit.yaml)
//!
//! Settings are resolved once in `main` and passed by reference into every operation.
//! Nothing here is stored in process-wide state.
//!
//! ## Resolution order
//!
//! 1. Built-in defaults
//! 2. `<config dir>/modkit/modkit.yaml` if it exists
//! 3. `--config <path>` (must exist)
//! 4. `MODKIT_GALLERY_URL` and `MODKIT_POWERSHELL` environment variables

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ModkitError, Result};

/// Directory name under the user's config directory
const CONFIG_DIR: &str = "modkit";

/// Settings file name
pub const SETTINGS_FILE: &str = "modkit.yaml";

const DEFAULT_GALLERY_URL: &str = "https://api.nuget.org/v3/index.json";

/// Tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// NuGet v3 service index of the package gallery
    pub gallery_url: String,

    /// Timeout for connectivity probes
    pub probe_timeout_secs: u64,

    /// Timeout for gallery requests and downloads
    pub download_timeout_secs: u64,

    /// PowerShell executable used to drive the host package manager
    pub powershell: String,

    /// Major version of the host PowerShell runtime that bundles are installed with
    pub expected_runtime_major: u32,

    /// Extra provider plugin locations, searched before the OS defaults
    pub provider_search_paths: Vec<PathBuf>,

    /// Environment variable that holds the gallery API key for publishing
    pub api_key_env: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gallery_url: DEFAULT_GALLERY_URL.to_string(),
            probe_timeout_secs: 5,
            download_timeout_secs: 300,
            powershell: "pwsh".to_string(),
            expected_runtime_major: 7,
            provider_search_paths: Vec::new(),
            api_key_env: "MODKIT_API_KEY".to_string(),
        }
    }
}

/// Get the modkit config directory
///
/// Returns `~/.config/modkit` on Linux or the platform equivalent.
///
/// Can be overridden with the `MODKIT_CONFIG_DIR` environment variable.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MODKIT_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|base| base.join(CONFIG_DIR))
}

impl Settings {
    /// Resolve settings from defaults, config files and the environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(default_path) = config_dir().map(|d| d.join(SETTINGS_FILE)) {
            if default_path.is_file() {
                settings = Self::from_file(&default_path)?;
            }
        }

        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ModkitError::ConfigNotFound {
                    path: path.display().to_string(),
                });
            }
            settings = Self::from_file(path)?;
        }

        settings.apply_env(|key| std::env::var(key).ok());
        tracing::debug!(?settings, "settings resolved");
        Ok(settings)
    }

    /// Parse settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ModkitError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content).map_err(|e| ModkitError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse settings from a YAML string; missing fields keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(yaml)?;
        Ok(settings)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("MODKIT_GALLERY_URL").filter(|v| !v.is_empty()) {
            self.gallery_url = url;
        }
        if let Some(exe) = lookup("MODKIT_POWERSHELL").filter(|v| !v.is_empty()) {
            self.powershell = exe;
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Read the publishing API key from the configured environment variable
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}
