//! Application version tuple and the rollback/new version pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a string is not an `x.y.z` version
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("version {0:?} must have exactly three components")]
    ComponentCount(String),

    #[error("invalid component {component:?} in version {input:?}")]
    Component { input: String, component: String },
}

/// Three-component version `major.minor.patch`
///
/// Ordering is lexicographic on the components, so the derived `Ord`
/// compares major first, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl AppVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True when `self` is strictly newer than `current`
    ///
    /// # Examples
    ///
    /// ```
    /// use app_repo_publisher::core::AppVersion;
    ///
    /// let current = AppVersion::new(1, 1, 1);
    /// assert!(AppVersion::new(1, 1, 2).is_newer_than(&current));
    /// assert!(!AppVersion::new(1, 1, 1).is_newer_than(&current));
    /// ```
    pub fn is_newer_than(&self, current: &AppVersion) -> bool {
        self > current
    }
}

impl FromStr for AppVersion {
    type Err = VersionParseError;

    /// Parses `x.y.z` where every component is a decimal number
    ///
    /// Components compare numerically, so `1.01.2` reads as `1.1.2`.
    /// Pre-release and build suffixes are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionParseError::ComponentCount(input.to_string()));
        }

        let component = |part: &str| -> Result<u64, VersionParseError> {
            let invalid = || VersionParseError::Component {
                input: input.to_string(),
                component: part.to_string(),
            };
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        Ok(Self::new(
            component(parts[0])?,
            component(parts[1])?,
            component(parts[2])?,
        ))
    }
}

impl Default for AppVersion {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version pair reported once per run
///
/// `rollback` is empty when the application has never been published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(rename = "rollbackVersion")]
    pub rollback: String,
    #[serde(rename = "newVersion")]
    pub new: String,
}

impl VersionRecord {
    pub fn new(rollback: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            rollback: rollback.into(),
            new: new.into(),
        }
    }
}
