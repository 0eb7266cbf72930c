//! Installed module discovery
//!
//! Modules live under one of the `PSModulePath` roots as `<root>/<Name>/<Version>/`.
//! Directory names are matched case-insensitively; version directories that do not
//! parse as versions are ignored.

use std::path::{Path, PathBuf};

use crate::gallery::PackageVersion;

/// One installed version of a module
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledModule {
    /// Module name as spelled on disk
    pub name: String,
    pub version: PackageVersion,
    /// `<root>/<Name>/<Version>`
    pub path: PathBuf,
}

/// Module search roots
#[derive(Debug, Clone, PartialEq)]
pub struct ModulePaths {
    roots: Vec<PathBuf>,
}

impl ModulePaths {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// `PSModulePath` entries followed by the OS default roots, deduplicated
    pub fn detect() -> Self {
        let mut roots: Vec<PathBuf> = std::env::var_os("PSModulePath")
            .map(|value| std::env::split_paths(&value).collect())
            .unwrap_or_default();
        for default in default_roots() {
            if !roots.contains(&default) {
                roots.push(default);
            }
        }
        roots.retain(|r| !r.as_os_str().is_empty());
        Self { roots }
    }

    /// All installed versions of `name`, lowest first
    pub fn installed_versions(&self, name: &str) -> Vec<InstalledModule> {
        let mut found: Vec<InstalledModule> = self
            .roots
            .iter()
            .filter_map(|root| module_dir(root, name))
            .flat_map(|(disk_name, dir)| versions_in(&disk_name, &dir))
            .collect();
        found.sort_by(|a, b| a.version.cmp(&b.version));
        found
    }

    /// `name` at `version`, or its highest installed version when `version` is `None`
    pub fn find(&self, name: &str, version: Option<&PackageVersion>) -> Option<InstalledModule> {
        let mut installed = self.installed_versions(name);
        match version {
            Some(wanted) => installed.into_iter().find(|m| &m.version == wanted),
            None => installed.pop(),
        }
    }
}

fn default_roots() -> Vec<PathBuf> {
    #[cfg(windows)]
    {
        let mut roots = Vec::new();
        if let Some(docs) = dirs::document_dir() {
            roots.push(docs.join("PowerShell").join("Modules"));
            roots.push(docs.join("WindowsPowerShell").join("Modules"));
        }
        if let Some(pf) = std::env::var_os("ProgramFiles").map(PathBuf::from) {
            roots.push(pf.join("PowerShell").join("Modules"));
            roots.push(pf.join("WindowsPowerShell").join("Modules"));
        }
        roots
    }
    #[cfg(not(windows))]
    {
        let mut roots = Vec::new();
        if let Some(data) = dirs::data_local_dir() {
            roots.push(data.join("powershell").join("Modules"));
        }
        roots.push(PathBuf::from("/usr/local/share/powershell/Modules"));
        roots
    }
}

fn module_dir(root: &Path, name: &str) -> Option<(String, PathBuf)> {
    std::fs::read_dir(root).ok()?.flatten().find_map(|entry| {
        let file_name = entry.file_name().to_str()?.to_string();
        (file_name.eq_ignore_ascii_case(name) && entry.path().is_dir())
            .then(|| (file_name, entry.path()))
    })
}

fn versions_in(disk_name: &str, dir: &Path) -> Vec<InstalledModule> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let version = e.file_name().to_str()?.parse().ok()?;
            Some(InstalledModule {
                name: disk_name.to_string(),
                version,
                path: e.path(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, write_module};

    #[test]
    fn test_versions_sorted_across_roots() {
        let temp = create_temp_dir();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        write_module(&a, "Pester", "5.5.0");
        write_module(&b, "Pester", "4.10.1");
        write_module(&b, "Pester", "5.6.1");
        std::fs::create_dir_all(b.join("Pester").join("not-a-version")).unwrap();

        let paths = ModulePaths::new(vec![a, b]);
        let versions: Vec<String> = paths
            .installed_versions("pester")
            .iter()
            .map(|m| m.version.to_string())
            .collect();
        assert_eq!(versions, vec!["4.10.1", "5.5.0", "5.6.1"]);
    }

    #[test]
    fn test_find_highest_and_exact() {
        let temp = create_temp_dir();
        write_module(temp.path(), "Pester", "5.5.0");
        write_module(temp.path(), "Pester", "4.10.1");
        let paths = ModulePaths::new(vec![temp.path().to_path_buf()]);

        let highest = paths.find("Pester", None).unwrap();
        assert_eq!(highest.version.to_string(), "5.5.0");
        assert_eq!(highest.name, "Pester");

        let exact = paths.find("PESTER", Some(&"4.10.1".parse().unwrap())).unwrap();
        assert!(exact.path.ends_with("Pester/4.10.1"));

        assert!(paths.find("Pester", Some(&"1.0".parse().unwrap())).is_none());
        assert!(paths.find("Other", None).is_none());
    }

    #[test]
    fn test_missing_roots_are_ignored() {
        let paths = ModulePaths::new(vec![PathBuf::from("/definitely/not/here")]);
        assert!(paths.installed_versions("Anything").is_empty());
    }
}
