//! Version field patching in module manifests
//!
//! A manifest is treated as opaque text with one addressable field:
//!
//! ```text
//! ModuleVersion = '1.0.20250.0'
//! ```
//!
//! Only the quoted value is replaced; whitespace, quote style, comments and every other
//! byte of the file stay as they were. Lines whose first non-blank character is `#` are
//! never matched.

use std::path::Path;

use regex::Regex;

use crate::error::{ModkitError, Result};

/// Key holding the version in a `.psd1` module manifest
pub const DEFAULT_KEY: &str = "ModuleVersion";

fn key_pattern(key: &str) -> Result<Regex> {
    let pattern = format!(
        r#"(?im)^(?P<lead>[ \t]*(?:@\{{[ \t]*)?{}[ \t]*=[ \t]*)(?:'(?P<sv>[^'\r\n]*)'|"(?P<dv>[^"\r\n]*)")"#,
        regex::escape(key)
    );
    Regex::new(&pattern).map_err(|e| ModkitError::invalid_argument(format!("invalid manifest key '{key}': {e}")))
}

/// The quoted value, whichever quote style matched
fn quoted_value<'t>(caps: &regex::Captures<'t>) -> Option<regex::Match<'t>> {
    caps.name("sv").or_else(|| caps.name("dv"))
}

/// Current value of `key`, if present
pub fn read_version(text: &str, key: &str) -> Result<Option<String>> {
    let re = key_pattern(key)?;
    Ok(re
        .captures(text)
        .as_ref()
        .and_then(quoted_value)
        .map(|m| m.as_str().to_string()))
}

/// Replace the value of the first `key` assignment with `version`
///
/// `path` is only used for error messages.
pub fn set_version(text: &str, key: &str, version: &str, path: &Path) -> Result<String> {
    let re = key_pattern(key)?;
    let caps = re.captures(text).ok_or_else(|| ModkitError::ManifestKeyMissing {
        key: key.to_string(),
        path: path.display().to_string(),
    })?;
    let Some(value) = quoted_value(&caps) else {
        return Err(ModkitError::ManifestKeyMissing {
            key: key.to_string(),
            path: path.display().to_string(),
        });
    };

    let mut patched = String::with_capacity(text.len() + version.len());
    patched.push_str(&text[..value.start()]);
    patched.push_str(version);
    patched.push_str(&text[value.end()..]);
    Ok(patched)
}

/// Patch `key` in the file at `path`, writing only when the content changes.
///
/// Returns the previous value.
pub fn patch_file(path: &Path, key: &str, version: &str) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|e| ModkitError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let previous = read_version(&text, key)?.unwrap_or_default();
    let patched = set_version(&text, key, version, path)?;

    if patched == text {
        tracing::debug!(path = %path.display(), version, "manifest already up to date");
        return Ok(previous);
    }
    std::fs::write(path, patched).map_err(|e| ModkitError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    tracing::info!(path = %path.display(), from = %previous, to = version, "patched manifest version");
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::create_temp_dir;

    const MANIFEST: &str = "@{\r\n    # ModuleVersion = '0.0.1'\r\n    RootModule = 'Tools.psm1'\r\n    ModuleVersion   =  \"1.0.0\"  # bumped by CI\r\n    GUID = 'c0ffee00-0000-0000-0000-000000000000'\r\n}\r\n";

    fn p() -> &'static Path {
        Path::new("Tools.psd1")
    }

    #[test]
    fn test_set_version_preserves_every_other_byte() {
        let patched = set_version(MANIFEST, DEFAULT_KEY, "1.0.20250.7", p()).unwrap();
        assert_eq!(
            patched,
            MANIFEST.replace("\"1.0.0\"", "\"1.0.20250.7\"")
        );
        assert!(patched.contains("# ModuleVersion = '0.0.1'"));
        assert!(patched.contains("# bumped by CI"));
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let text = "moduleversion='2.0'\n";
        assert_eq!(
            set_version(text, DEFAULT_KEY, "2.1", p()).unwrap(),
            "moduleversion='2.1'\n"
        );
    }

    #[test]
    fn test_inline_hashtable_opening() {
        let text = "@{ ModuleVersion = '1.2.3' }\n";
        assert_eq!(read_version(text, DEFAULT_KEY).unwrap().as_deref(), Some("1.2.3"));
    }

    #[test]
    fn test_mismatched_quotes_are_not_a_value() {
        for text in ["ModuleVersion = '1.0\"\n", "ModuleVersion = \"1.0'\n"] {
            assert_eq!(read_version(text, DEFAULT_KEY).unwrap(), None);
            let err = set_version(text, DEFAULT_KEY, "2.0", p()).unwrap_err();
            assert!(matches!(err, ModkitError::ManifestKeyMissing { .. }));
        }
    }

    #[test]
    fn test_other_quote_inside_value_is_kept() {
        let text = "ModuleVersion = \"1.0'beta\"\n";
        assert_eq!(read_version(text, DEFAULT_KEY).unwrap().as_deref(), Some("1.0'beta"));
    }

    #[test]
    fn test_commented_key_only_is_missing() {
        let text = "# ModuleVersion = '1.0'\n";
        let err = set_version(text, DEFAULT_KEY, "2.0", p()).unwrap_err();
        assert!(matches!(err, ModkitError::ManifestKeyMissing { .. }));
        assert_eq!(read_version(text, DEFAULT_KEY).unwrap(), None);
    }

    #[test]
    fn test_similar_key_does_not_match() {
        let text = "PowerShellVersion = '7.2'\nModuleVersionExtra = '9'\n";
        assert_eq!(read_version(text, DEFAULT_KEY).unwrap(), None);
    }

    #[test]
    fn test_patch_file_round_trip() {
        let temp = create_temp_dir();
        let path = temp.path().join("Tools.psd1");
        std::fs::write(&path, MANIFEST).unwrap();

        let previous = patch_file(&path, DEFAULT_KEY, "1.0.20250.7").unwrap();
        assert_eq!(previous, "1.0.0");
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(read_version(&text, DEFAULT_KEY).unwrap().as_deref(), Some("1.0.20250.7"));
    }

    #[test]
    fn test_patch_missing_file() {
        let temp = create_temp_dir();
        let err = patch_file(&temp.path().join("absent.psd1"), DEFAULT_KEY, "1.0").unwrap_err();
        assert!(matches!(err, ModkitError::FileReadFailed { .. }));
    }
}
