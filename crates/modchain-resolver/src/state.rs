//! Per-repository search state for one resolve request.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use modchain_types::RequestedCoordinate;
use tracing::trace;

use crate::metrics::ResolutionMetrics;
use crate::oracle::VersionOracle;
use crate::outcome::{ResolutionOutcome, VersionListing};
use crate::repository::{ModuleRepository, RepositoryAccess};

/// How far a search state has progressed through the access tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessProgress {
    NotSearched,
    SearchedLocally,
    SearchedRemotely,
}

/// How a repository is searched for the requested version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStrategy {
    /// Exact version: resolve the requested coordinate directly.
    Static,
    /// Selector: list versions, then pick the best match.
    Dynamic,
}

impl VersionStrategy {
    pub fn classify(oracle: &dyn VersionOracle, requested: &RequestedCoordinate) -> Self {
        if oracle.is_dynamic(&requested.version) {
            VersionStrategy::Dynamic
        } else {
            VersionStrategy::Static
        }
    }
}

/// Search progress of one repository.
pub struct SearchState {
    repository: Arc<dyn ModuleRepository>,
    strategy: VersionStrategy,
    progress: AccessProgress,
}

impl SearchState {
    pub fn new(repository: Arc<dyn ModuleRepository>, strategy: VersionStrategy) -> Self {
        Self {
            repository,
            strategy,
            progress: AccessProgress::NotSearched,
        }
    }

    pub fn repository(&self) -> &Arc<dyn ModuleRepository> {
        &self.repository
    }

    pub fn progress(&self) -> AccessProgress {
        self.progress
    }

    /// Only the remote tier is left untried.
    pub fn can_make_further_attempts(&self) -> bool {
        self.progress != AccessProgress::SearchedRemotely
    }

    /// Query the next access tier: local on the first call, remote on the
    /// second. A `Failed` outcome is returned as an error so the caller can
    /// record it against this repository.
    pub fn resolve(
        &mut self,
        requested: &RequestedCoordinate,
        oracle: &dyn VersionOracle,
        metrics: &ResolutionMetrics,
    ) -> Result<ResolutionOutcome> {
        let repository = Arc::clone(&self.repository);
        let access = match self.progress {
            AccessProgress::NotSearched => {
                self.progress = AccessProgress::SearchedLocally;
                metrics.record_local_query();
                repository.local_access()
            }
            AccessProgress::SearchedLocally => {
                self.progress = AccessProgress::SearchedRemotely;
                metrics.record_remote_query();
                repository.remote_access()
            }
            AccessProgress::SearchedRemotely => {
                return Err(anyhow!(
                    "repository '{}' was already searched remotely for {}",
                    repository.name(),
                    requested
                ));
            }
        };

        let outcome = match self.strategy {
            VersionStrategy::Static => resolve_static(requested, access),
            VersionStrategy::Dynamic => resolve_dynamic(requested, access, oracle),
        };
        trace!(
            repository = repository.name(),
            progress = ?self.progress,
            outcome = outcome.label(),
            "queried {}",
            requested
        );

        match outcome {
            ResolutionOutcome::Failed(err) => Err(err.context(format!(
                "Could not resolve {} from repository '{}'",
                requested,
                repository.name()
            ))),
            other => Ok(other),
        }
    }
}

fn resolve_static(
    requested: &RequestedCoordinate,
    access: &dyn RepositoryAccess,
) -> ResolutionOutcome {
    access.resolve_metadata(&requested.as_version_id())
}

fn resolve_dynamic(
    requested: &RequestedCoordinate,
    access: &dyn RepositoryAccess,
    oracle: &dyn VersionOracle,
) -> ResolutionOutcome {
    let (candidates, complete) = match access.list_versions(&requested.module()) {
        VersionListing::Failed(err) => return ResolutionOutcome::Failed(err),
        VersionListing::Listed(versions) => (versions, true),
        VersionListing::ProbablyListed(versions) => (versions, false),
    };

    let found = if oracle.needs_metadata(&requested.version) {
        best_match_with_metadata(requested, &candidates, access, oracle)
    } else {
        best_match(requested, &candidates, access, oracle)
    };

    match found {
        Some(outcome) => outcome,
        None if complete => ResolutionOutcome::Missing,
        // A fuller listing from the next tier may hold an acceptable version.
        None => ResolutionOutcome::ProbablyMissing,
    }
}

/// First candidate (latest first) whose version string is accepted; its
/// metadata is resolved once.
fn best_match(
    requested: &RequestedCoordinate,
    candidates: &[String],
    access: &dyn RepositoryAccess,
    oracle: &dyn VersionOracle,
) -> Option<ResolutionOutcome> {
    oracle
        .sort_latest_first(candidates)
        .into_iter()
        .find(|candidate| oracle.accepts(&requested.version, candidate))
        .map(|candidate| access.resolve_metadata(&requested.module().at_version(candidate)))
}

/// First candidate (latest first) whose resolved metadata is accepted.
fn best_match_with_metadata(
    requested: &RequestedCoordinate,
    candidates: &[String],
    access: &dyn RepositoryAccess,
    oracle: &dyn VersionOracle,
) -> Option<ResolutionOutcome> {
    let module = requested.module();
    for candidate in oracle.sort_latest_first(candidates) {
        let outcome = access.resolve_metadata(&module.at_version(candidate));
        let accepted = match &outcome {
            ResolutionOutcome::Failed(_) => true,
            ResolutionOutcome::Resolved(found) => {
                oracle.accepts_metadata(&requested.version, &found.metadata)
            }
            _ => false,
        };
        if accepted {
            return Some(outcome);
        }
    }
    None
}
