//! Version gating for recipes.
//!
//! A recipe may pin the workspace versions it was written for, e.g.
//! `">=6.0.0, <7.0.0"`, checked against the `version` of the workspace
//! `package.json`.

use crate::schematic::package_json::PACKAGE_JSON;
use crate::tree::VirtualTree;
use semver::{Version, VersionReq};
use std::fmt;

/// Errors during version gating
#[derive(Debug, Clone)]
pub enum VersionError {
    /// Invalid version string (e.g., "not-a-version")
    InvalidVersion { value: String, source: String },
    /// Invalid version requirement (e.g., ">=bad")
    InvalidRequirement { value: String, source: String },
    /// `package.json` could not be read or parsed
    Manifest { source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{}': {}", value, source)
            }
            VersionError::InvalidRequirement { value, source } => {
                write!(f, "invalid version requirement '{}': {}", value, source)
            }
            VersionError::Manifest { source } => {
                write!(f, "cannot read workspace version: {}", source)
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Check if a version matches a requirement string
///
/// # Examples
///
/// ```
/// use nx_schematics::config::version::matches_requirement;
///
/// assert!(matches_requirement("6.0.2", Some(">=6.0.0")).unwrap());
/// assert!(matches_requirement("6.1.0", Some(">=6.0.0, <7.0.0")).unwrap());
/// assert!(!matches_requirement("5.2.9", Some(">=6.0.0")).unwrap());
///
/// // No requirement matches every workspace
/// assert!(matches_requirement("1.0.0", None).unwrap());
/// ```
pub fn matches_requirement(
    version: &str,
    requirement: Option<&str>,
) -> Result<bool, VersionError> {
    let Some(req_str) = requirement else {
        return Ok(true);
    };

    let req_str = req_str.trim();
    if req_str.is_empty() {
        return Ok(true);
    }

    let version = Version::parse(version).map_err(|e| VersionError::InvalidVersion {
        value: version.to_string(),
        source: e.to_string(),
    })?;

    let req = VersionReq::parse(req_str).map_err(|e| VersionError::InvalidRequirement {
        value: req_str.to_string(),
        source: e.to_string(),
    })?;

    Ok(req.matches(&version))
}

/// `version` of the workspace `package.json`, `None` when the file or the
/// field is absent.
pub fn workspace_version(tree: &VirtualTree) -> Result<Option<String>, VersionError> {
    let manifest = |source: String| VersionError::Manifest { source };
    let Some(text) = tree
        .read(PACKAGE_JSON)
        .map_err(|e| manifest(e.to_string()))?
    else {
        return Ok(None);
    };
    let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| manifest(e.to_string()))?;
    Ok(json
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string))
}
