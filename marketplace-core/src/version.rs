//! Semantic version comparison
//!
//! Every "newer than" decision in the catalog goes through [`PluginVersion`]:
//! minimum server version checks, latest-version selection and sorting.
//! Ordering follows semver precedence (major, minor, patch, then pre-release);
//! build metadata never affects the order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{CatalogError, Result};

/// A parsed semantic version ordered by semver precedence
#[derive(Debug, Clone)]
pub struct PluginVersion(semver::Version);

impl PluginVersion {
    /// Parse a version string such as `5.15.0` or `1.2.0-rc.1+build.7`
    ///
    /// Invalid strings are an error, never a silent `0.0.0`.
    pub fn parse(value: &str) -> Result<Self> {
        semver::Version::parse(value)
            .map(Self)
            .map_err(|source| CatalogError::InvalidVersion {
                value: value.to_string(),
                source,
            })
    }

    /// Whether this version is at least `minimum`
    pub fn meets_minimum(&self, minimum: &PluginVersion) -> bool {
        self >= minimum
    }
}

/// Compare two version strings, failing if either does not parse
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(PluginVersion::parse(a)?.cmp(&PluginVersion::parse(b)?))
}

impl Ord for PluginVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.0, &other.0);
        (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
    }
}

impl PartialOrd for PluginVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PluginVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PluginVersion {}

impl FromStr for PluginVersion {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
