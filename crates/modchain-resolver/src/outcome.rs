//! Outcomes reported by repository access tiers.

use modchain_types::{ModuleMetadata, ModuleSource};

/// A descriptor found by an access tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub metadata: ModuleMetadata,
    pub source: ModuleSource,
    /// The tier fabricated the descriptor because no descriptor file exists.
    pub synthesized: bool,
}

/// Result of asking one access tier for the metadata of a module version.
#[derive(Debug)]
pub enum ResolutionOutcome {
    Resolved(ResolvedMetadata),
    /// The tier is authoritative and the module version does not exist.
    Missing,
    /// The tier could not see the module version but may be incomplete.
    ProbablyMissing,
    /// Not determined by this tier; worth retrying at the next one.
    Unknown,
    Failed(anyhow::Error),
}

impl ResolutionOutcome {
    pub fn resolved(metadata: ModuleMetadata, source: ModuleSource) -> Self {
        Self::Resolved(ResolvedMetadata {
            metadata,
            source,
            synthesized: false,
        })
    }

    pub fn synthesized(metadata: ModuleMetadata, source: ModuleSource) -> Self {
        Self::Resolved(ResolvedMetadata {
            metadata,
            source,
            synthesized: true,
        })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Short label used in trace output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Resolved(_) => "resolved",
            Self::Missing => "missing",
            Self::ProbablyMissing => "probably-missing",
            Self::Unknown => "unknown",
            Self::Failed(_) => "failed",
        }
    }
}

/// Result of asking one access tier which versions of a module exist.
#[derive(Debug)]
pub enum VersionListing {
    /// A complete listing.
    Listed(Vec<String>),
    /// A listing that may be missing versions (e.g. a stale local cache).
    ProbablyListed(Vec<String>),
    Failed(anyhow::Error),
}
