//! Maintenance of installed modules on a connected machine
//!
//! - [`update`]: install the gallery's newest version when it beats the installed one
//! - [`cleanup`]: delete all but the newest `keep` installed versions
//! - [`publish`]: push a package artifact to the gallery

use std::path::Path;

use crate::bundle::BatchReport;
use crate::config::Settings;
use crate::error::{ModkitError, Result};
use crate::gallery::Gallery;
use crate::host::{InstallRequest, ModulePaths, PackageHost, Scope};
use crate::progress::{self, ProgressDisplay};

/// Update each of `names` to the gallery's newest stable version
pub fn update(
    names: &[String],
    scope: Scope,
    gallery: &dyn Gallery,
    host: &dyn PackageHost,
    modules: &ModulePaths,
    progress: Option<&ProgressDisplay>,
) -> BatchReport {
    let span = tracing::info_span!("update", component = "modules", operation = "update");
    let _enter = span.enter();

    let mut report = BatchReport::new();
    for name in names {
        if let Err(e) = update_one(name, scope, gallery, host, modules, &mut report) {
            report.fail(name.as_str(), e);
        }
        progress::step(progress, name);
    }
    report
}

fn update_one(
    name: &str,
    scope: Scope,
    gallery: &dyn Gallery,
    host: &dyn PackageHost,
    modules: &ModulePaths,
    report: &mut BatchReport,
) -> Result<()> {
    let installed = modules
        .find(name, None)
        .ok_or_else(|| ModkitError::not_found(format!("module {name} is not installed")))?;
    let latest = gallery.find(name, None)?;

    if installed.version >= latest.version {
        report.skip(name, "up to date");
        return Ok(());
    }

    tracing::info!(module = name, from = %installed.version, to = %latest.version, "updating module");
    host.install(&InstallRequest {
        name,
        version: Some(&latest.version),
        source: None,
        scope,
    })?;
    report.succeed(format!("{name} {}", latest.version));
    Ok(())
}

/// Remove all but the `keep` highest installed versions of each of `names`
///
/// Items in the report are `"<Name> <Version>"` for each removed version.
pub fn cleanup(names: &[String], keep: usize, modules: &ModulePaths) -> Result<BatchReport> {
    if keep == 0 {
        return Err(ModkitError::invalid_argument(
            "keep must be at least 1; uninstall the module to remove every version",
        ));
    }
    let span = tracing::info_span!("cleanup", component = "modules", operation = "cleanup", keep);
    let _enter = span.enter();

    let mut report = BatchReport::new();
    for name in names {
        let installed = modules.installed_versions(name);
        if installed.is_empty() {
            report.fail(
                name.as_str(),
                ModkitError::not_found(format!("module {name} is not installed")),
            );
            continue;
        }
        if installed.len() <= keep {
            report.skip(name.as_str(), "nothing to remove");
            continue;
        }

        let remove = installed.len() - keep;
        for old in installed.into_iter().take(remove) {
            let item = format!("{} {}", old.name, old.version);
            match std::fs::remove_dir_all(&old.path) {
                Ok(()) => {
                    tracing::info!(path = %old.path.display(), "removed old module version");
                    report.succeed(item);
                }
                Err(e) => report.fail(item, ModkitError::transient_io(&old.path, e)),
            }
        }
    }
    Ok(report)
}

/// The publishing key: `explicit` if given, else the configured environment variable
pub fn resolve_api_key(explicit: Option<&str>, settings: &Settings) -> Result<String> {
    explicit
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .or_else(|| settings.api_key_from_env())
        .ok_or_else(|| {
            ModkitError::invalid_argument(format!(
                "no API key: pass --api-key or set {}",
                settings.api_key_env
            ))
        })
}

/// Push the `.nupkg` at `package` to the gallery
pub fn publish(package: &Path, api_key: &str, gallery: &dyn Gallery) -> Result<()> {
    let span = tracing::info_span!("publish", component = "modules", operation = "publish");
    let _enter = span.enter();

    if !package.is_file() {
        return Err(ModkitError::not_found(package.display().to_string()));
    }
    let is_nupkg = package
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("nupkg"));
    if !is_nupkg {
        return Err(ModkitError::invalid_argument(format!(
            "{} is not a .nupkg package",
            package.display()
        )));
    }

    gallery.publish(package, api_key)?;
    tracing::info!(package = %package.display(), "published package");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{MockGallery, MockHost, create_temp_dir, write_module};
    use serial_test::serial;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_update_installs_only_newer() {
        let temp = create_temp_dir();
        write_module(temp.path(), "Pester", "5.5.0");
        write_module(temp.path(), "PSReadLine", "2.3.4");
        let modules = ModulePaths::new(vec![temp.path().to_path_buf()]);
        let gallery = MockGallery::new()
            .with_package("Pester", "5.6.1", &[])
            .with_package("Pester", "6.0.0-alpha1", &[])
            .with_package("PSReadLine", "2.3.4", &[]);
        let host = MockHost::new();

        let report = update(
            &names(&["Pester", "PSReadLine", "Absent"]),
            Scope::CurrentUser,
            &gallery,
            &host,
            &modules,
            None,
        );

        assert_eq!(report.succeeded, vec!["Pester 5.6.1"]);
        assert_eq!(report.skipped, vec!["PSReadLine"]);
        assert!(report.failed.contains_key("Absent"));
        let installed = host.installed();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].1.as_deref(), Some("5.6.1"));
        assert_eq!(installed[0].2, None);
    }

    #[test]
    fn test_update_host_failure_is_reported() {
        let temp = create_temp_dir();
        write_module(temp.path(), "Pester", "5.5.0");
        let modules = ModulePaths::new(vec![temp.path().to_path_buf()]);
        let gallery = MockGallery::new().with_package("Pester", "5.6.1", &[]);
        let host = MockHost::new().failing_install("Pester");

        let report = update(&names(&["Pester"]), Scope::CurrentUser, &gallery, &host, &modules, None);
        assert!(report.failed.contains_key("Pester"));
    }

    #[test]
    fn test_cleanup_keeps_newest() {
        let temp = create_temp_dir();
        for v in ["4.10.1", "5.5.0", "5.6.1"] {
            write_module(temp.path(), "Pester", v);
        }
        write_module(temp.path(), "PSReadLine", "2.3.4");
        let modules = ModulePaths::new(vec![temp.path().to_path_buf()]);

        let report = cleanup(&names(&["Pester", "PSReadLine", "Absent"]), 1, &modules).unwrap();

        assert_eq!(report.succeeded, vec!["Pester 4.10.1", "Pester 5.5.0"]);
        assert_eq!(report.skipped, vec!["PSReadLine"]);
        assert!(report.failed.contains_key("Absent"));
        let left: Vec<String> = modules
            .installed_versions("Pester")
            .iter()
            .map(|m| m.version.to_string())
            .collect();
        assert_eq!(left, vec!["5.6.1"]);
    }

    #[test]
    fn test_cleanup_keep_zero_is_rejected() {
        let modules = ModulePaths::new(Vec::new());
        assert!(cleanup(&names(&["Pester"]), 0, &modules).is_err());
    }

    #[test]
    fn test_publish_validates_package() {
        let temp = create_temp_dir();
        let gallery = MockGallery::new();

        let missing = publish(&temp.path().join("none.nupkg"), "key", &gallery).unwrap_err();
        assert!(matches!(missing, ModkitError::NotFound { .. }));

        let zip = temp.path().join("Tools.zip");
        std::fs::write(&zip, "zip").unwrap();
        let wrong = publish(&zip, "key", &gallery).unwrap_err();
        assert!(matches!(wrong, ModkitError::InvalidArgument { .. }));

        let nupkg = temp.path().join("Tools.1.0.20250.0.nupkg");
        std::fs::write(&nupkg, "pkg").unwrap();
        publish(&nupkg, "key", &gallery).unwrap();
        assert_eq!(gallery.published(), vec![(nupkg, "key".to_string())]);
    }

    #[test]
    #[serial]
    fn test_api_key_resolution() {
        let settings = Settings {
            api_key_env: "MODKIT_TEST_PUBLISH_KEY".to_string(),
            ..Default::default()
        };
        // SAFETY: serialised with other environment-mutating tests
        unsafe { std::env::remove_var("MODKIT_TEST_PUBLISH_KEY") };
        assert!(resolve_api_key(None, &settings).is_err());
        assert_eq!(resolve_api_key(Some("explicit"), &settings).unwrap(), "explicit");

        unsafe { std::env::set_var("MODKIT_TEST_PUBLISH_KEY", "from-env") };
        assert_eq!(resolve_api_key(None, &settings).unwrap(), "from-env");
        assert_eq!(resolve_api_key(Some(""), &settings).unwrap(), "from-env");
        unsafe { std::env::remove_var("MODKIT_TEST_PUBLISH_KEY") };
    }
}
