//! Scoped registration of a temporary package source
//!
//! Installing from a bundle means registering its folder as a package source on the
//! host. That registration is host-wide configuration, so it must never outlive the
//! install, whatever happens in between.
//!
//! ## Usage
//!
//! ```ignore
//! let source = TempSource::register(host, &bundle_dir)?;
//!
//! // Install from source.name()...
//!
//! // On success or partial failure:
//! let removed = source.release();
//!
//! // On an early return or panic, Drop unregisters instead
//! ```

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::PackageHost;
use crate::error::Result;

/// Prefix of generated source names
pub const SOURCE_PREFIX: &str = "modkit-offline-";

/// A registered package source that is unregistered when released or dropped
pub struct TempSource<'a> {
    host: &'a dyn PackageHost,
    name: String,
    released: bool,
}

impl std::fmt::Debug for TempSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempSource")
            .field("name", &self.name)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

/// Generate a source name unique to this location, process and moment
pub fn unique_source_name(location: &Path) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seed = format!(
        "{}:{}:{}",
        location.display(),
        std::process::id(),
        nanos
    );
    let hash = blake3::hash(seed.as_bytes()).to_hex().to_string();
    format!("{SOURCE_PREFIX}{}", &hash[..12])
}

impl<'a> TempSource<'a> {
    /// Register `location` under a freshly generated name
    pub fn register(host: &'a dyn PackageHost, location: &Path) -> Result<Self> {
        let name = unique_source_name(location);
        host.register_source(&name, location)?;
        tracing::info!(source = %name, location = %location.display(), "registered temporary package source");
        Ok(Self {
            host,
            name,
            released: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unregister now and report whether that succeeded
    pub fn release(mut self) -> bool {
        self.released = true;
        self.unregister()
    }

    fn unregister(&self) -> bool {
        match self.host.unregister_source(&self.name) {
            Ok(()) => {
                tracing::info!(source = %self.name, "unregistered temporary package source");
                true
            }
            Err(e) => {
                tracing::error!(source = %self.name, error = %e, "failed to unregister temporary package source");
                false
            }
        }
    }
}

impl Drop for TempSource<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.unregister();
        }
    }
}
