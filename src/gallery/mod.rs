//! Package gallery access
//!
//! The gallery is consumed through the narrow [`Gallery`] trait: list the published
//! versions of a package, download one artifact, publish one artifact. Lookups and
//! dependency-closure queries are provided on top of those primitives so every
//! implementation (the HTTP client and the test doubles) shares the same selection rules.
//!
//! Package ids are case-insensitive.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use crate::error::{ModkitError, Result};

pub mod nuget;
pub mod version;

pub use nuget::NugetGallery;
pub use version::{PackageVersion, VersionRange};

/// A dependency edge declared by a published package
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub name: String,
    pub range: VersionRange,
}

/// One published version of a package
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInfo {
    pub name: String,
    pub version: PackageVersion,
    pub dependencies: Vec<Dependency>,
}

/// Remote package gallery operations
pub trait Gallery {
    /// All listed versions of `name`, in any order.
    ///
    /// Returns an empty list when the package does not exist.
    fn versions(&self, name: &str) -> Result<Vec<PackageInfo>>;

    /// Download the raw package artifact for `name`/`version` to `dest`
    fn download(&self, name: &str, version: &PackageVersion, dest: &Path) -> Result<()>;

    /// Push a package artifact using `api_key`
    fn publish(&self, package: &Path, api_key: &str) -> Result<()>;

    /// Look up `name` at exactly `version`, or its newest stable version when `version`
    /// is `None`.
    fn find(&self, name: &str, version: Option<&PackageVersion>) -> Result<PackageInfo> {
        let candidates = self.versions(name)?;
        let found = match version {
            Some(wanted) => candidates.into_iter().find(|p| &p.version == wanted),
            None => candidates
                .into_iter()
                .filter(|p| !p.version.is_prerelease())
                .max_by(|a, b| a.version.cmp(&b.version)),
        };

        found.ok_or_else(|| match version {
            Some(v) => ModkitError::not_found(format!("{name} {v} in gallery")),
            None => ModkitError::not_found(format!("{name} in gallery")),
        })
    }

    /// Newest stable version of `name` that satisfies `range`
    fn find_in_range(&self, name: &str, range: &VersionRange) -> Result<PackageInfo> {
        self.versions(name)?
            .into_iter()
            .filter(|p| !p.version.is_prerelease() && range.contains(&p.version))
            .max_by(|a, b| a.version.cmp(&b.version))
            .ok_or_else(|| ModkitError::not_found(format!("{name} {range} in gallery")))
    }

    /// `name` plus every transitive dependency, root first.
    ///
    /// Each dependency edge is resolved independently to the newest version inside its
    /// declared range. The same package may therefore appear more than once at different
    /// versions; merging is the caller's decision.
    fn find_with_dependencies(
        &self,
        name: &str,
        version: Option<&PackageVersion>,
    ) -> Result<Vec<PackageInfo>> {
        let root = self.find(name, version)?;
        let mut seen: HashSet<(String, String)> = HashSet::new();
        seen.insert((root.name.to_ascii_lowercase(), root.version.to_string()));

        let mut queue: VecDeque<Dependency> = root.dependencies.iter().cloned().collect();
        let mut closure = vec![root];

        while let Some(dep) = queue.pop_front() {
            let resolved = self.find_in_range(&dep.name, &dep.range)?;
            let key = (
                resolved.name.to_ascii_lowercase(),
                resolved.version.to_string(),
            );
            if !seen.insert(key) {
                continue;
            }
            queue.extend(resolved.dependencies.iter().cloned());
            closure.push(resolved);
        }

        Ok(closure)
    }
}

/// Artifact file name used for downloaded packages: `<Name>.<Version>.nupkg`
pub fn artifact_file_name(name: &str, version: &PackageVersion) -> String {
    format!("{name}.{version}.nupkg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::MockGallery;

    fn v(s: &str) -> PackageVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_find_latest_skips_prerelease() {
        let gallery = MockGallery::new()
            .with_package("Pester", "5.5.0", &[])
            .with_package("Pester", "6.0.0-alpha1", &[])
            .with_package("Pester", "4.10.1", &[]);
        let found = gallery.find("pester", None).unwrap();
        assert_eq!(found.version, v("5.5.0"));
    }

    #[test]
    fn test_find_exact_version() {
        let gallery = MockGallery::new()
            .with_package("Pester", "5.5.0", &[])
            .with_package("Pester", "4.10.1", &[]);
        let found = gallery.find("Pester", Some(&v("4.10.1"))).unwrap();
        assert_eq!(found.version, v("4.10.1"));

        let err = gallery.find("Pester", Some(&v("3.0"))).unwrap_err();
        assert!(matches!(err, ModkitError::NotFound { .. }));
    }

    #[test]
    fn test_find_missing_package() {
        let gallery = MockGallery::new();
        assert!(matches!(
            gallery.find("Nope", None).unwrap_err(),
            ModkitError::NotFound { .. }
        ));
    }

    #[test]
    fn test_closure_follows_ranges() {
        let gallery = MockGallery::new()
            .with_package("A", "1.0", &[("B", "[1.0, 2.0)")])
            .with_package("B", "1.0", &[("C", "1.0")])
            .with_package("B", "1.5", &[("C", "1.0")])
            .with_package("B", "2.0", &[])
            .with_package("C", "1.2", &[]);

        let closure = gallery.find_with_dependencies("A", None).unwrap();
        let names: Vec<String> = closure
            .iter()
            .map(|p| format!("{}@{}", p.name, p.version))
            .collect();
        assert_eq!(names, vec!["A@1.0", "B@1.5", "C@1.2"]);
    }

    #[test]
    fn test_closure_tolerates_cycles() {
        let gallery = MockGallery::new()
            .with_package("A", "1.0", &[("B", "1.0")])
            .with_package("B", "1.0", &[("A", "1.0")]);
        let closure = gallery.find_with_dependencies("A", None).unwrap();
        assert_eq!(closure.len(), 2);
    }

    #[test]
    fn test_closure_fails_on_missing_dependency() {
        let gallery = MockGallery::new().with_package("A", "1.0", &[("Ghost", "1.0")]);
        assert!(gallery.find_with_dependencies("A", None).is_err());
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("Pester", &v("5.5.0")),
            "Pester.5.5.0.nupkg"
        );
    }
}
