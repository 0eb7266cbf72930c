//! Command implementations for modkit CLI

use crate::config::Settings;

pub mod bundle;
pub mod completions;
pub mod git;
pub mod helpers;
pub mod manifest;
pub mod modules;
pub mod probe;
pub mod version;

/// Values every command receives from `main`
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub settings: Settings,
    /// Turn partial failures into errors
    pub strict: bool,
}
