use modchain_types::RequestedCoordinate;
use thiserror::Error;

/// Why a dependency could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No repository reported a candidate and none of them failed.
    #[error("Could not find any version that matches {0}.")]
    NotFound(RequestedCoordinate),

    /// At least one repository failed and no repository produced a match.
    #[error("Could not resolve {requested}.{}", format_causes(.causes))]
    Failed {
        requested: RequestedCoordinate,
        causes: Vec<anyhow::Error>,
    },
}

impl ResolveError {
    pub fn requested(&self) -> &RequestedCoordinate {
        match self {
            Self::NotFound(requested) => requested,
            Self::Failed { requested, .. } => requested,
        }
    }

    /// Repository failures collected while searching (empty for `NotFound`).
    pub fn causes(&self) -> &[anyhow::Error] {
        match self {
            Self::NotFound(_) => &[],
            Self::Failed { causes, .. } => causes,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

fn format_causes(causes: &[anyhow::Error]) -> String {
    causes
        .iter()
        .map(|cause| format!("\n  caused by: {:#}", cause))
        .collect()
}
