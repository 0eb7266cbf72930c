//! Package versions and version ranges as used by NuGet-style galleries
//!
//! Module versions have one to four numeric components (`1.2`, `1.0.20250.17`) and an
//! optional prerelease label (`2.0.0-beta1`). `semver` cannot represent the 4-component
//! form, so the ordering is implemented here.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModkitError, Result};

const MAX_COMPONENTS: usize = 4;

/// A dotted numeric package version with an optional prerelease label
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageVersion {
    components: Vec<u64>,
    prerelease: Option<String>,
}

impl PackageVersion {
    /// Build a release version from numeric components
    pub fn new(components: &[u64]) -> Self {
        Self {
            components: components.to_vec(),
            prerelease: None,
        }
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for PackageVersion {
    type Err = ModkitError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // Build metadata never participates in ordering
        let without_meta = trimmed.split('+').next().unwrap_or_default();
        let (numeric, prerelease) = match without_meta.split_once('-') {
            Some((n, p)) if !p.is_empty() => (n, Some(p.to_string())),
            Some(_) => {
                return Err(ModkitError::invalid_argument(format!(
                    "'{s}' has an empty prerelease label"
                )));
            }
            None => (without_meta, None),
        };

        let components = numeric
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| {
                    ModkitError::invalid_argument(format!("'{s}' is not a package version"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if components.is_empty() || components.len() > MAX_COMPONENTS {
            return Err(ModkitError::invalid_argument(format!(
                "'{s}' must have between 1 and {MAX_COMPONENTS} numeric components"
            )));
        }

        Ok(Self {
            components,
            prerelease,
        })
    }
}

impl TryFrom<String> for PackageVersion {
    type Error = ModkitError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PackageVersion> for String {
    fn from(value: PackageVersion) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numeric: Vec<String> = self.components.iter().map(u64::to_string).collect();
        write!(f, "{}", numeric.join("."))?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in 0..MAX_COMPONENTS {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        match (&self.prerelease, &other.prerelease) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
        }
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

/// A NuGet dependency range such as `[1.0, )`, `(1.0, 2.0]`, `[1.5]` or a bare `1.0`
/// (minimum inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionRange {
    min: Option<(PackageVersion, bool)>,
    max: Option<(PackageVersion, bool)>,
}

impl VersionRange {
    /// A range that accepts every version
    pub fn any() -> Self {
        Self::default()
    }

    /// A range that accepts exactly `version`
    pub fn exact(version: PackageVersion) -> Self {
        Self {
            min: Some((version.clone(), true)),
            max: Some((version, true)),
        }
    }

    pub fn contains(&self, version: &PackageVersion) -> bool {
        let above_min = match &self.min {
            Some((min, true)) => version >= min,
            Some((min, false)) => version > min,
            None => true,
        };
        let below_max = match &self.max {
            Some((max, true)) => version <= max,
            Some((max, false)) => version < max,
            None => true,
        };
        above_min && below_max
    }
}

impl FromStr for VersionRange {
    type Err = ModkitError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Ok(Self::any());
        }

        let first = s.chars().next().unwrap_or_default();
        let last = s.chars().last().unwrap_or_default();
        if !matches!(first, '[' | '(') {
            return Ok(Self {
                min: Some((s.parse()?, true)),
                max: None,
            });
        }
        if !matches!(last, ']' | ')') {
            return Err(ModkitError::invalid_argument(format!(
                "unterminated version range '{s}'"
            )));
        }

        let inner = &s[1..s.len() - 1];
        let min_inclusive = first == '[';
        let max_inclusive = last == ']';

        let Some((lo, hi)) = inner.split_once(',') else {
            let exact: PackageVersion = inner.parse()?;
            return Ok(Self::exact(exact));
        };

        let bound = |text: &str, inclusive: bool| -> Result<Option<(PackageVersion, bool)>> {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                Ok(Some((text.parse()?, inclusive)))
            }
        };

        Ok(Self {
            min: bound(lo, min_inclusive)?,
            max: bound(hi, max_inclusive)?,
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (None, None) => write!(f, "*"),
            (Some((min, true)), Some((max, true))) if min == max => write!(f, "[{min}]"),
            _ => {
                match &self.min {
                    Some((min, true)) => write!(f, "[{min}, ")?,
                    Some((min, false)) => write!(f, "({min}, ")?,
                    None => write!(f, "(, ")?,
                }
                match &self.max {
                    Some((max, true)) => write!(f, "{max}]"),
                    Some((max, false)) => write!(f, "{max})"),
                    None => write!(f, ")"),
                }
            }
        }
    }
}
