//! Configuration file handling for modkit
//!
//! This module contains data structures for:
//! - `modkit.yaml` - Tool settings (gallery, timeouts, host executable)
//! - `bundle.yaml` - Record of what an offline bundle export resolved

pub mod bundle_manifest;
pub mod settings;

// Re-export commonly used types
pub use bundle_manifest::{BundleManifest, BundlePackage};
pub use settings::Settings;
