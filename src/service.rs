//! Resolution service facade.
//!
//! Owns the configured repository chain and the worker queue transforms are
//! scheduled on.

use std::sync::Arc;

use anyhow::Result;
use modchain_resolver::{
    MetricsSnapshot, ModuleRepository, RepositoryChainResolver, ResolveError, ResolvedModule,
};
use modchain_transform::{
    BoundTransformationStep, ResolvedArtifactSet, TransformedArtifactSet, WorkerQueue,
};
use modchain_types::{AttributeSet, RequestedCoordinate};
use tracing::{debug, info};

use crate::config::PipelineConfig;

pub struct DependencyResolutionService {
    resolver: RepositoryChainResolver,
    queue: Arc<dyn WorkerQueue>,
}

impl DependencyResolutionService {
    /// A service with no repositories yet, built from `config`.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let resolver = RepositoryChainResolver::new(Arc::new(config.version_oracle()));
        let queue = config.worker_queue()?;
        info!(
            worker_threads = config.worker_threads,
            inline = config.inline_transforms,
            "dependency resolution service ready"
        );
        Ok(Self::with_parts(resolver, queue))
    }

    pub fn with_parts(resolver: RepositoryChainResolver, queue: Arc<dyn WorkerQueue>) -> Self {
        Self { resolver, queue }
    }

    /// Append a repository to the end of the search chain.
    pub fn add_repository(&mut self, repository: Arc<dyn ModuleRepository>) -> &mut Self {
        self.resolver.add(repository);
        self
    }

    pub fn resolver(&self) -> &RepositoryChainResolver {
        &self.resolver
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.resolver.metrics().snapshot()
    }

    pub fn resolve_dependency(
        &self,
        requested: &RequestedCoordinate,
    ) -> Result<ResolvedModule, ResolveError> {
        self.resolver.resolve(requested)
    }

    /// Parse a `group:name:version` notation and resolve it.
    pub fn resolve_notation(&self, notation: &str) -> Result<ResolvedModule> {
        let requested: RequestedCoordinate = notation.parse()?;
        Ok(self.resolve_dependency(&requested)?)
    }

    /// Resolve several coordinates, keeping each outcome.
    pub fn resolve_all(
        &self,
        requested: &[RequestedCoordinate],
    ) -> Vec<Result<ResolvedModule, ResolveError>> {
        requested
            .iter()
            .map(|coordinate| self.resolve_dependency(coordinate))
            .collect()
    }

    /// Wrap every artifact of `artifacts` in `steps` and start finalizing
    /// them on the service's worker queue. Visiting the returned set blocks
    /// until each entry settles.
    pub fn transform_artifacts(
        &self,
        artifacts: &dyn ResolvedArtifactSet,
        target: AttributeSet,
        steps: Vec<BoundTransformationStep>,
    ) -> TransformedArtifactSet {
        let step_count = steps.len();
        let set = TransformedArtifactSet::transform(artifacts, target, steps);
        debug!(entries = set.len(), steps = step_count, "scheduling artifact transforms");
        set.start_finalization(self.queue.as_ref());
        set
    }
}
