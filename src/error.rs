//! Error types and handling for modkit
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Precondition failures (`Range`, `InvalidArgument`, `PermissionDenied`,
//! `MissingDependency`, `RuntimeMismatch`) abort the call that raised them. Per-item
//! failures inside a batch (`NotFound`, `TransientIo`, `Gallery`, `Host`) are caught by
//! the batch and recorded in its report instead of propagating.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for modkit operations
#[derive(Error, Diagnostic, Debug)]
pub enum ModkitError {
    // Codec errors
    #[error("Value out of range: {message}")]
    #[diagnostic(
        code(modkit::codec::range),
        help("Build versions can encode years up to 6553")
    )]
    Range { message: String },

    #[error("Invalid argument: {message}")]
    #[diagnostic(code(modkit::argument::invalid))]
    InvalidArgument { message: String },

    // Host precondition errors
    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(modkit::host::permission_denied),
        help("Re-run from an elevated shell, or use --scope current-user")
    )]
    PermissionDenied { message: String },

    #[error("Missing dependency: {name}: {reason}")]
    #[diagnostic(
        code(modkit::host::missing_dependency),
        help(
            "The bundle has no Provider/ directory. Re-export it on a connected machine that has the provider installed"
        )
    )]
    MissingDependency { name: String, reason: String },

    #[error("Host runtime major version {found} does not match expected {expected}")]
    #[diagnostic(
        code(modkit::host::runtime_mismatch),
        help("Set expected_runtime_major in modkit.yaml or use a matching PowerShell")
    )]
    RuntimeMismatch { expected: u32, found: u32 },

    #[error("Package manager command failed: {message}")]
    #[diagnostic(code(modkit::host::command_failed))]
    Host { message: String },

    // Per-item errors
    #[error("Not found: {what}")]
    #[diagnostic(code(modkit::package::not_found))]
    NotFound { what: String },

    #[error("Transfer failed for {path}: {reason}")]
    #[diagnostic(code(modkit::fs::transient_io))]
    TransientIo { path: String, reason: String },

    #[error("Gallery request failed: {url}: {reason}")]
    #[diagnostic(
        code(modkit::gallery::request_failed),
        help("Run 'modkit probe' to check connectivity to the gallery")
    )]
    Gallery { url: String, reason: String },

    #[error("{url} is unreachable: {detail}")]
    #[diagnostic(
        code(modkit::probe::unreachable),
        help("Check proxy settings, or use an offline bundle on this machine")
    )]
    Unreachable { url: String, detail: String },

    #[error("{operation} finished with {failed} failed item(s)")]
    #[diagnostic(
        code(modkit::batch::incomplete),
        help("Re-run without --strict to accept partial results")
    )]
    Incomplete { operation: String, failed: usize },

    // Git errors
    #[error("Not in a git repository")]
    #[diagnostic(
        code(modkit::git::not_in_repo),
        help("Run this command from inside a git working tree")
    )]
    NotInGitRepository,

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(modkit::git::operation_failed))]
    GitOperationFailed { message: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(modkit::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(modkit::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    // Manifest errors
    #[error("Key '{key}' not found in manifest {path}")]
    #[diagnostic(
        code(modkit::manifest::key_missing),
        help("The manifest must contain a line like: ModuleVersion = '1.0.0'")
    )]
    ManifestKeyMissing { key: String, path: String },

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(modkit::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(modkit::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(modkit::fs::io_error))]
    IoError { message: String },
}

impl ModkitError {
    /// Shorthand for an `InvalidArgument` error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ModkitError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        ModkitError::NotFound { what: what.into() }
    }

    /// Shorthand for a `Host` error
    pub fn host(message: impl Into<String>) -> Self {
        ModkitError::Host {
            message: message.into(),
        }
    }

    /// Shorthand for a `TransientIo` error on a path
    pub fn transient_io(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        ModkitError::TransientIo {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for ModkitError {
    fn from(err: std::io::Error) -> Self {
        ModkitError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ModkitError {
    fn from(err: serde_yaml::Error) -> Self {
        ModkitError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ModkitError {
    fn from(err: serde_json::Error) -> Self {
        ModkitError::Gallery {
            url: "unknown".to_string(),
            reason: format!("invalid JSON: {err}"),
        }
    }
}

impl From<git2::Error> for ModkitError {
    fn from(err: git2::Error) -> Self {
        ModkitError::GitOperationFailed {
            message: err.message().to_string(),
        }
    }
}

impl From<reqwest::Error> for ModkitError {
    fn from(err: reqwest::Error) -> Self {
        ModkitError::Gallery {
            url: err
                .url()
                .map_or_else(|| "unknown".to_string(), ToString::to_string),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ModkitError>;
