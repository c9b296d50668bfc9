//! Resolved module metadata.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifiers::ModuleVersionId;

/// Default status assigned to modules whose descriptor does not declare one.
pub const DEFAULT_STATUS: &str = "integration";

/// Metadata of one module version as reported by a repository access tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub id: ModuleVersionId,
    /// Publication status (`integration`, `milestone`, `release`, ...).
    #[serde(default = "default_status")]
    pub status: String,
    /// Free-form descriptor properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

impl ModuleMetadata {
    pub fn new(id: ModuleVersionId) -> Self {
        Self {
            id,
            status: default_status(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn version(&self) -> &str {
        &self.id.version
    }
}

/// Where a resolved descriptor came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleSource {
    pub repository: String,
    pub location: String,
}

impl ModuleSource {
    pub fn new(repository: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.location, self.repository)
    }
}
