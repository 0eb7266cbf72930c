//! NuGet v3 gallery client
//!
//! Speaks the subset of the NuGet v3 protocol needed to resolve and fetch packages:
//!
//! - service index (`index.json`) to discover resource URLs
//! - registration (`RegistrationsBaseUrl`) for versions and dependency groups
//! - flat container (`PackageBaseAddress/3.0.0`) for `.nupkg` downloads
//! - package publish (`PackagePublish/2.0.0`) for pushes
//!
//! The service index is fetched lazily, once per client.

use std::cell::OnceCell;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, multipart};
use serde::Deserialize;

use super::{Dependency, Gallery, PackageInfo, PackageVersion, VersionRange};
use crate::config::Settings;
use crate::error::{ModkitError, Result};

const REGISTRATION_TYPES: &[&str] = &[
    "RegistrationsBaseUrl/3.6.0",
    "RegistrationsBaseUrl/3.4.0",
    "RegistrationsBaseUrl",
];
const PACKAGE_BASE_TYPE: &str = "PackageBaseAddress/3.0.0";
const PUBLISH_TYPE: &str = "PackagePublish/2.0.0";
const API_KEY_HEADER: &str = "X-NuGet-ApiKey";

#[derive(Debug, Deserialize)]
struct ServiceIndex {
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    resource_type: String,
}

/// Resource URLs resolved from the service index
#[derive(Debug, Clone, PartialEq)]
struct Endpoints {
    registrations: String,
    package_base: String,
    publish: Option<String>,
}

impl ServiceIndex {
    fn resource(&self, resource_type: &str) -> Option<String> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type)
            .map(|r| ensure_trailing_slash(&r.id))
    }

    fn endpoints(&self, index_url: &str) -> Result<Endpoints> {
        let missing = |what: &str| ModkitError::Gallery {
            url: index_url.to_string(),
            reason: format!("service index has no {what} resource"),
        };
        let registrations = REGISTRATION_TYPES
            .iter()
            .find_map(|t| self.resource(t))
            .ok_or_else(|| missing("RegistrationsBaseUrl"))?;
        let package_base = self
            .resource(PACKAGE_BASE_TYPE)
            .ok_or_else(|| missing(PACKAGE_BASE_TYPE))?;

        Ok(Endpoints {
            registrations,
            package_base,
            publish: self.resource(PUBLISH_TYPE).map(|u| u.trim_end_matches('/').to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RegistrationIndex {
    #[serde(default)]
    items: Vec<RegistrationPage>,
}

#[derive(Debug, Deserialize)]
struct RegistrationPage {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default)]
    items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationLeaf {
    catalog_entry: CatalogEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    id: String,
    version: String,
    #[serde(default)]
    listed: Option<bool>,
    #[serde(default)]
    dependency_groups: Vec<DependencyGroup>,
}

#[derive(Debug, Deserialize)]
struct DependencyGroup {
    #[serde(default)]
    dependencies: Vec<DependencyEntry>,
}

#[derive(Debug, Deserialize)]
struct DependencyEntry {
    id: String,
    #[serde(default)]
    range: Option<String>,
}

impl CatalogEntry {
    /// Convert to a [`PackageInfo`], or `None` for unlisted or unparsable entries
    fn into_package(self) -> Option<PackageInfo> {
        if self.listed == Some(false) {
            return None;
        }
        let version = match self.version.parse::<PackageVersion>() {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(package = %self.id, version = %self.version, error = %e, "skipping unparsable version");
                return None;
            }
        };

        // Dependency groups are per target framework; modules do not care which, so the
        // union is taken, first declaration wins.
        let mut dependencies: Vec<Dependency> = Vec::new();
        for dep in self.dependency_groups.into_iter().flat_map(|g| g.dependencies) {
            if dependencies
                .iter()
                .any(|d| d.name.eq_ignore_ascii_case(&dep.id))
            {
                continue;
            }
            let range = dep
                .range
                .as_deref()
                .unwrap_or_default()
                .parse()
                .unwrap_or_else(|_| VersionRange::any());
            dependencies.push(Dependency {
                name: dep.id,
                range,
            });
        }

        Some(PackageInfo {
            name: self.id,
            version,
            dependencies,
        })
    }
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Gallery client for a NuGet v3 feed
#[derive(Debug)]
pub struct NugetGallery {
    index_url: String,
    client: Client,
    endpoints: OnceCell<Endpoints>,
}

impl NugetGallery {
    /// Create a client for the feed configured in `settings`
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.download_timeout_secs))
            .user_agent(concat!("modkit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            index_url: settings.gallery_url.clone(),
            client,
            endpoints: OnceCell::new(),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        tracing::debug!(url, "GET");
        let response = self.client.get(url).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        let body = response.text()?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ModkitError::Gallery {
                url: url.to_string(),
                reason: format!("invalid JSON: {e}"),
            })
    }

    fn endpoints(&self) -> Result<&Endpoints> {
        if let Some(endpoints) = self.endpoints.get() {
            return Ok(endpoints);
        }
        let index: ServiceIndex =
            self.get_json(&self.index_url)?
                .ok_or_else(|| ModkitError::Gallery {
                    url: self.index_url.clone(),
                    reason: "service index not found".to_string(),
                })?;
        let endpoints = index.endpoints(&self.index_url)?;
        Ok(self.endpoints.get_or_init(|| endpoints))
    }

    fn registration_url(&self, name: &str) -> Result<String> {
        Ok(format!(
            "{}{}/index.json",
            self.endpoints()?.registrations,
            name.to_ascii_lowercase()
        ))
    }

    fn content_url(&self, name: &str, version: &PackageVersion) -> Result<String> {
        let id = name.to_ascii_lowercase();
        let ver = version.to_string().to_ascii_lowercase();
        Ok(format!(
            "{}{id}/{ver}/{id}.{ver}.nupkg",
            self.endpoints()?.package_base
        ))
    }
}

impl Gallery for NugetGallery {
    fn versions(&self, name: &str) -> Result<Vec<PackageInfo>> {
        let url = self.registration_url(name)?;
        let Some(index) = self.get_json::<RegistrationIndex>(&url)? else {
            return Ok(Vec::new());
        };

        let mut packages = Vec::new();
        for page in index.items {
            // Large registrations leave pages unexpanded and link to them instead
            let leaves = match page.items {
                Some(leaves) => leaves,
                None => {
                    self.get_json::<RegistrationPage>(&page.id)?
                        .and_then(|p| p.items)
                        .unwrap_or_default()
                }
            };
            packages.extend(
                leaves
                    .into_iter()
                    .filter_map(|leaf| leaf.catalog_entry.into_package()),
            );
        }
        Ok(packages)
    }

    fn download(&self, name: &str, version: &PackageVersion, dest: &Path) -> Result<()> {
        let url = self.content_url(name, version)?;
        tracing::debug!(%url, dest = %dest.display(), "downloading package");

        let response = self.client.get(&url).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ModkitError::not_found(format!("{name} {version} at {url}")));
        }
        let mut response = response.error_for_status()?;

        let parent = dest
            .parent()
            .ok_or_else(|| ModkitError::transient_io(dest, "destination has no parent"))?;
        fs::create_dir_all(parent).map_err(|e| ModkitError::transient_io(parent, e))?;

        // Write to a sibling temp file so an interrupted transfer never leaves a
        // partial artifact at `dest`
        let mut staging =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| ModkitError::transient_io(parent, e))?;
        io::copy(&mut response, staging.as_file_mut())
            .map_err(|e| ModkitError::transient_io(dest, e))?;
        staging
            .persist(dest)
            .map_err(|e| ModkitError::transient_io(dest, e.error))?;
        Ok(())
    }

    fn publish(&self, package: &Path, api_key: &str) -> Result<()> {
        let endpoint = self
            .endpoints()?
            .publish
            .clone()
            .ok_or_else(|| ModkitError::Gallery {
                url: self.index_url.clone(),
                reason: "feed does not accept pushes".to_string(),
            })?;

        let form = multipart::Form::new()
            .file("package", package)
            .map_err(|e| ModkitError::FileReadFailed {
                path: package.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(package = %package.display(), endpoint = %endpoint, "publishing package");
        self.client
            .put(&endpoint)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()?
            .error_for_status()?;
        Ok(())
    }
}
