//! Repository chain resolution.
//!
//! [`RepositoryChainResolver`] searches an ordered list of repositories for a
//! requested module in two passes:
//!
//! 1. A local pass over every repository. Repositories answering `Unknown`
//!    retry at their remote tier straight away; repositories answering
//!    `ProbablyMissing` are set aside.
//! 2. If the local pass found nothing, the set-aside repositories are searched
//!    again at their remote tier.
//!
//! An exact version found authoritatively ends the search at once. Otherwise
//! every resolved candidate competes and the latest version wins, with real
//! descriptors beating synthesized ones on a tie.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use modchain_types::{ModuleMetadata, ModuleSource, ModuleVersionId, RequestedCoordinate};
use tracing::debug;

use crate::errors::ResolveError;
use crate::metrics::ResolutionMetrics;
use crate::oracle::VersionOracle;
use crate::outcome::{ResolutionOutcome, ResolvedMetadata};
use crate::repository::ModuleRepository;
use crate::state::{SearchState, VersionStrategy};

/// A resolved candidate and the repository it came from.
#[derive(Clone)]
pub struct WinningResolution {
    pub repository: Arc<dyn ModuleRepository>,
    pub metadata: ModuleMetadata,
    pub source: ModuleSource,
    pub synthesized: bool,
}

impl WinningResolution {
    fn new(repository: Arc<dyn ModuleRepository>, found: ResolvedMetadata) -> Self {
        Self {
            repository,
            metadata: found.metadata,
            source: found.source,
            synthesized: found.synthesized,
        }
    }

    pub fn version(&self) -> &str {
        self.metadata.version()
    }
}

impl fmt::Debug for WinningResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WinningResolution")
            .field("repository", &self.repository.name())
            .field("module", &self.metadata.id)
            .field("synthesized", &self.synthesized)
            .finish()
    }
}

/// The module a dependency resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub id: ModuleVersionId,
    pub repository: String,
    pub metadata: ModuleMetadata,
    pub source: ModuleSource,
    pub synthesized: bool,
}

impl From<WinningResolution> for ResolvedModule {
    fn from(winner: WinningResolution) -> Self {
        Self {
            id: winner.metadata.id.clone(),
            repository: winner.repository.name().to_string(),
            metadata: winner.metadata,
            source: winner.source,
            synthesized: winner.synthesized,
        }
    }
}

/// Pick the better of the best candidate so far and a new one.
///
/// The later version wins; on an exact tie an authoritative descriptor beats
/// a synthesized one, and otherwise the earlier candidate is kept.
pub fn choose_best(
    oracle: &dyn VersionOracle,
    best: Option<WinningResolution>,
    candidate: WinningResolution,
) -> WinningResolution {
    let Some(best) = best else {
        return candidate;
    };
    match oracle.compare(best.version(), candidate.version()) {
        Ordering::Greater => best,
        Ordering::Less => candidate,
        Ordering::Equal if best.synthesized && !candidate.synthesized => candidate,
        Ordering::Equal => best,
    }
}

/// Resolves dependencies against an ordered chain of repositories.
pub struct RepositoryChainResolver {
    repositories: Vec<Arc<dyn ModuleRepository>>,
    oracle: Arc<dyn VersionOracle>,
    metrics: ResolutionMetrics,
}

impl RepositoryChainResolver {
    pub fn new(oracle: Arc<dyn VersionOracle>) -> Self {
        Self {
            repositories: Vec::new(),
            oracle,
            metrics: ResolutionMetrics::new(),
        }
    }

    /// Record counters into an existing metrics handle.
    pub fn with_metrics(mut self, metrics: ResolutionMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Append a repository to the end of the chain.
    pub fn add(&mut self, repository: Arc<dyn ModuleRepository>) {
        self.repositories.push(repository);
    }

    pub fn repository_names(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.name()).collect()
    }

    pub fn metrics(&self) -> &ResolutionMetrics {
        &self.metrics
    }

    pub fn oracle(&self) -> &Arc<dyn VersionOracle> {
        &self.oracle
    }

    /// Resolve `requested` to a concrete module version.
    pub fn resolve(
        &self,
        requested: &RequestedCoordinate,
    ) -> Result<ResolvedModule, ResolveError> {
        debug!(
            "Attempting to resolve module '{}' using repositories {:?}",
            requested,
            self.repository_names()
        );
        self.metrics.record_request();

        let mut failures = Vec::new();
        match self.find_latest_module(requested, &mut failures) {
            Some(winner) => {
                debug!(
                    "Using module '{}' from repository '{}'",
                    winner.metadata.id,
                    winner.repository.name()
                );
                for failure in &failures {
                    debug!("Discarding resolve failure: {:#}", failure);
                }
                Ok(winner.into())
            }
            None if failures.is_empty() => Err(ResolveError::NotFound(requested.clone())),
            None => Err(ResolveError::Failed {
                requested: requested.clone(),
                causes: failures,
            }),
        }
    }

    fn find_latest_module(
        &self,
        requested: &RequestedCoordinate,
        failures: &mut Vec<anyhow::Error>,
    ) -> Option<WinningResolution> {
        let strategy = VersionStrategy::classify(self.oracle.as_ref(), requested);
        let mut queue: VecDeque<SearchState> = self
            .repositories
            .iter()
            .map(|repository| SearchState::new(Arc::clone(repository), strategy))
            .collect();
        let mut missing = Vec::new();

        // Local pass
        if let Some(best) = self.drain(requested, strategy, &mut queue, failures, &mut missing) {
            return Some(best);
        }
        if missing.is_empty() {
            return None;
        }

        // Nothing found locally: try the deferred repositories remotely
        self.metrics.record_escalation();
        debug!(
            "No local match for '{}', escalating {} repositories",
            requested,
            missing.len()
        );
        queue.extend(missing.drain(..));
        self.drain(requested, strategy, &mut queue, failures, &mut missing)
    }

    fn drain(
        &self,
        requested: &RequestedCoordinate,
        strategy: VersionStrategy,
        queue: &mut VecDeque<SearchState>,
        failures: &mut Vec<anyhow::Error>,
        missing: &mut Vec<SearchState>,
    ) -> Option<WinningResolution> {
        let mut best = None;
        while let Some(mut state) = queue.pop_front() {
            let outcome = match state.resolve(requested, self.oracle.as_ref(), &self.metrics) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.metrics.record_access_failure();
                    failures.push(err);
                    continue;
                }
            };
            match outcome {
                ResolutionOutcome::Missing => {}
                ResolutionOutcome::ProbablyMissing => {
                    if state.can_make_further_attempts() {
                        missing.push(state);
                    }
                }
                ResolutionOutcome::Unknown => {
                    if state.can_make_further_attempts() {
                        queue.push_front(state);
                    }
                }
                ResolutionOutcome::Resolved(found) => {
                    let candidate = WinningResolution::new(Arc::clone(state.repository()), found);
                    if strategy == VersionStrategy::Static && !candidate.synthesized {
                        self.metrics.record_fast_path();
                        return Some(candidate);
                    }
                    best = Some(choose_best(self.oracle.as_ref(), best, candidate));
                }
                ResolutionOutcome::Failed(_) => {
                    unreachable!("failed outcomes are returned as errors by SearchState::resolve")
                }
            }
        }
        best
    }
}
