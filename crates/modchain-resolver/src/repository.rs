//! Repository access seams.
//!
//! Each repository exposes two access tiers: a local tier that only consults
//! what is already on this machine, and a remote tier that may go to the
//! network. The resolver never knows how either tier works.

use modchain_types::{ModuleId, ModuleVersionId};

use crate::outcome::{ResolutionOutcome, VersionListing};

/// One access tier of a repository.
pub trait RepositoryAccess: Send + Sync {
    /// Resolve the metadata of an exact module version.
    fn resolve_metadata(&self, id: &ModuleVersionId) -> ResolutionOutcome;

    /// List the versions available for a module.
    fn list_versions(&self, module: &ModuleId) -> VersionListing;
}

/// A named repository with a local and a remote access tier.
pub trait ModuleRepository: Send + Sync {
    fn name(&self) -> &str;

    fn local_access(&self) -> &dyn RepositoryAccess;

    fn remote_access(&self) -> &dyn RepositoryAccess;
}
