//! Offline bundle manifest (bundle.yaml)
//!
//! Written at the bundle root by `bundle export` so that `bundle install` on the
//! disconnected machine knows which packages were asked for and which versions the
//! closure resolved to.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModkitError, Result};
use crate::gallery::PackageVersion;

/// One resolved package recorded in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlePackage {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<PackageVersion>,
}

/// Contents of `bundle.yaml`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Package names the export was invoked with
    pub requested: Vec<String>,

    /// Every package in the resolved closure
    #[serde(default)]
    pub packages: Vec<BundlePackage>,

    /// RFC 3339 timestamp of the export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
}

impl BundleManifest {
    /// Parse a manifest from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        Ok(manifest)
    }

    /// Serialize the manifest to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load the manifest at `path`, or `None` if the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| ModkitError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content)
            .map(Some)
            .map_err(|e| ModkitError::ConfigParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Write the manifest to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_yaml()?).map_err(|e| ModkitError::FileWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Recorded version of `name`, matched case-insensitively
    pub fn version_of(&self, name: &str) -> Option<&PackageVersion> {
        self.packages
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(|p| p.version.as_ref())
    }
}
