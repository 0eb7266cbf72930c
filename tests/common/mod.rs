//! Common test utilities for modkit integration tests

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// A scratch directory for one test, with an isolated config directory
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Read a file from workspace
    #[allow(dead_code)]
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    /// Create an empty directory in workspace
    #[allow(dead_code)]
    pub fn create_dir(&self, path: &str) -> PathBuf {
        let dir = self.path.join(path);
        std::fs::create_dir_all(&dir).expect("Failed to create directory");
        dir
    }

    /// The modkit binary, isolated from the user's settings and PowerShell
    ///
    /// `MODKIT_POWERSHELL` points at an executable that does not exist, so nothing in a
    /// test can reach a real package manager.
    // Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
    #[allow(deprecated)]
    pub fn modkit_cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("modkit").expect("modkit binary");
        cmd.current_dir(&self.path)
            .env("MODKIT_CONFIG_DIR", self.path.join(".modkit-config"))
            .env("MODKIT_POWERSHELL", "modkit-test-no-such-shell")
            .env_remove("MODKIT_CONFIG")
            .env_remove("MODKIT_LOG")
            .env_remove("MODKIT_GALLERY_URL");
        cmd
    }
}
