//! Module coordinates and identifiers.
//!
//! A [`RequestedCoordinate`] is what a consumer asks for: its version may be an
//! exact version (`1.2.3`) or a dynamic selector (`1.+`, `[1.0,2.0)`,
//! `latest.release`). Once a concrete version is chosen the request becomes a
//! [`ModuleVersionId`].

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A module without a version (`group:name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Pin this module to an exact version.
    pub fn at_version(&self, version: impl Into<String>) -> ModuleVersionId {
        ModuleVersionId {
            group: self.group.clone(),
            name: self.name.clone(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A module pinned to an exact version (`group:name:version`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleVersionId {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ModuleVersionId {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn module(&self) -> ModuleId {
        ModuleId::new(self.group.clone(), self.name.clone())
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A dependency request: group, name and a version constraint.
///
/// The constraint is kept verbatim; whether it is exact or dynamic is decided
/// by the version oracle, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestedCoordinate {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl RequestedCoordinate {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn module(&self) -> ModuleId {
        ModuleId::new(self.group.clone(), self.name.clone())
    }

    /// The identifier this request names when its constraint is read as an
    /// exact version.
    pub fn as_version_id(&self) -> ModuleVersionId {
        self.module().at_version(self.version.clone())
    }
}

impl fmt::Display for RequestedCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

impl FromStr for RequestedCoordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (group, name, version) = split_coordinate(s)?;
        Ok(Self::new(group, name, version))
    }
}

fn split_coordinate(s: &str) -> Result<(&str, &str, &str)> {
    // Ranges such as `[1.0,2.0)` never contain ':' so splitting on the first
    // two separators is enough.
    let mut parts = s.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(name), Some(version))
            if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
        {
            Ok((group, name, version))
        }
        _ => Err(anyhow!(
            "invalid module coordinate '{}': expected group:name:version",
            s
        )),
    }
}

/// Identity of a single artifact file belonging to a module version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    pub module: ModuleVersionId,
    pub file_name: String,
}

impl ArtifactId {
    pub fn new(module: ModuleVersionId, file_name: impl Into<String>) -> Self {
        Self {
            module,
            file_name: file_name.into(),
        }
    }

    /// Identity of a file derived from this artifact (same owning module).
    pub fn derived(&self, file_name: impl Into<String>) -> Self {
        Self::new(self.module.clone(), file_name)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file_name, self.module)
    }
}
