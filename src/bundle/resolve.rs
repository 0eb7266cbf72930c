//! Dependency closure over the gallery
//!
//! The closure of every requested root is merged into one [`ResolvedPackageSet`] that
//! keeps a single version per package name: the highest seen anywhere in the call.
//! The merge does not check that this version still satisfies every consumer's declared
//! range. Installing the bundle leaves that to the host package manager.

use std::collections::BTreeMap;

use crate::error::{ModkitError, Result};
use crate::gallery::{Gallery, PackageVersion};

/// Explicit versions requested by the caller
///
/// `--version 5.5.0` applies to every name; `--version Pester=5.5.0` to one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionOverrides {
    all: Option<PackageVersion>,
    per_name: BTreeMap<String, PackageVersion>,
}

impl VersionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_all(mut self, version: PackageVersion) -> Self {
        self.all = Some(version);
        self
    }

    #[must_use]
    pub fn with(mut self, name: &str, version: PackageVersion) -> Self {
        self.per_name.insert(name.to_ascii_lowercase(), version);
        self
    }

    /// Parse `NAME=VERSION` and bare `VERSION` specs
    pub fn parse(specs: &[String]) -> Result<Self> {
        let mut overrides = Self::new();
        for spec in specs {
            match spec.split_once('=') {
                Some((name, version)) if !name.trim().is_empty() => {
                    overrides = overrides.with(name.trim(), version.parse()?);
                }
                Some(_) => {
                    return Err(ModkitError::invalid_argument(format!(
                        "version override '{spec}' has an empty package name"
                    )));
                }
                None if overrides.all.is_some() => {
                    return Err(ModkitError::invalid_argument(
                        "only one version may apply to all packages",
                    ));
                }
                None => overrides.all = Some(spec.parse()?),
            }
        }
        Ok(overrides)
    }

    pub fn get(&self, name: &str) -> Option<&PackageVersion> {
        self.per_name
            .get(&name.to_ascii_lowercase())
            .or(self.all.as_ref())
    }
}

/// One entry of a resolved set
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPackage {
    pub name: String,
    /// `None` only for fallback entries whose latest version is looked up at download
    pub version: Option<PackageVersion>,
}

/// Package name (case-insensitive) to the single version chosen for it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPackageSet {
    entries: BTreeMap<String, ResolvedPackage>,
    /// Roots whose gallery query failed, with the reason
    pub unresolved: BTreeMap<String, String>,
}

impl ResolvedPackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one `(name, version)`, keeping the higher version on conflict
    pub fn insert(&mut self, name: &str, version: Option<PackageVersion>) {
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                let replace = match (&existing.version, &version) {
                    (None, Some(_)) => true,
                    (Some(current), Some(candidate)) => candidate > current,
                    _ => false,
                };
                if replace {
                    tracing::debug!(
                        package = name,
                        from = ?existing.version.as_ref().map(ToString::to_string),
                        to = ?version.as_ref().map(ToString::to_string),
                        "higher version wins"
                    );
                    existing.version = version;
                }
            }
            None => {
                self.entries.insert(
                    key,
                    ResolvedPackage {
                        name: name.to_string(),
                        version,
                    },
                );
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedPackage> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve `names` and their transitive dependencies against `gallery`
///
/// A root whose query fails is logged and recorded in
/// [`ResolvedPackageSet::unresolved`]; the others still resolve. If nothing resolves,
/// the requested names are returned as-is with their override versions.
pub fn resolve_closure(
    gallery: &dyn Gallery,
    names: &[String],
    overrides: &VersionOverrides,
) -> ResolvedPackageSet {
    let span = tracing::info_span!("resolve", component = "bundle", operation = "resolve");
    let _enter = span.enter();

    let mut set = ResolvedPackageSet::new();
    for name in names {
        match gallery.find_with_dependencies(name, overrides.get(name)) {
            Ok(closure) => {
                tracing::debug!(root = %name, packages = closure.len(), "resolved closure");
                for package in closure {
                    set.insert(&package.name, Some(package.version));
                }
            }
            Err(e) => {
                tracing::warn!(root = %name, error = %e, "failed to resolve package");
                set.unresolved.insert(name.clone(), e.to_string());
            }
        }
    }

    if set.is_empty() {
        tracing::warn!("closure is empty, falling back to the requested names");
        for name in names {
            set.insert(name, overrides.get(name).cloned());
        }
    }
    set
}
