use std::fmt;
use std::sync::Arc;

use modchain_types::{ArtifactId, AttributeSet};
use thiserror::Error;

/// A failure cause that can be shared by every observer of one outcome.
#[derive(Clone)]
pub struct SharedError(Arc<anyhow::Error>);

impl SharedError {
    pub fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    /// Whether both handles point at the same recorded failure.
    pub fn ptr_eq(&self, other: &SharedError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<anyhow::Error> for SharedError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err)
    }
}

impl fmt::Debug for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&**self.0)
    }
}

/// A failure reported to an artifact visitor.
#[derive(Debug, Clone, Error)]
pub enum ArtifactFailure {
    /// The transform chain (or the artifact's backing file) failed.
    #[error("Failed to transform {artifact} to match attributes {target}.")]
    Transform {
        artifact: ArtifactId,
        target: AttributeSet,
        #[source]
        cause: SharedError,
    },

    /// The artifact set itself could not be listed.
    #[error("Could not resolve all artifacts.")]
    Broken(#[source] SharedError),
}

impl ArtifactFailure {
    pub fn cause(&self) -> &SharedError {
        match self {
            Self::Transform { cause, .. } => cause,
            Self::Broken(cause) => cause,
        }
    }
}
