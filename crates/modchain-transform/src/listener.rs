//! Turning a resolved artifact set into transformed artifacts.

use std::sync::Arc;

use modchain_types::AttributeSet;

use crate::artifact::ResolvableArtifact;
use crate::errors::ArtifactFailure;
use crate::step::BoundTransformationStep;
use crate::transformed::TransformedArtifact;
use crate::visitor::{ArtifactVisitor, ResolvedArtifactSet};
use crate::worker::WorkerQueue;

/// A listing failure, replayed to whoever visits it.
#[derive(Debug, Clone)]
pub struct BrokenArtifacts {
    failure: ArtifactFailure,
}

impl BrokenArtifacts {
    pub fn new(failure: ArtifactFailure) -> Self {
        Self { failure }
    }

    pub fn failure(&self) -> &ArtifactFailure {
        &self.failure
    }

    pub fn visit(&self, visitor: &mut dyn ArtifactVisitor) {
        visitor.visit_failure(self.failure.clone());
    }
}

#[derive(Debug, Clone)]
pub enum ArtifactSetEntry {
    Transformed(Arc<TransformedArtifact>),
    Broken(BrokenArtifacts),
}

impl ArtifactSetEntry {
    pub fn start_finalization(&self, queue: &dyn WorkerQueue) {
        if let Self::Transformed(artifact) = self {
            artifact.start_finalization(queue);
        }
    }

    pub fn visit(&self, visitor: &mut dyn ArtifactVisitor) {
        match self {
            Self::Transformed(artifact) => artifact.visit(visitor),
            Self::Broken(broken) => broken.visit(visitor),
        }
    }
}

/// Listens to a resolved artifact set and records one entry per artifact
/// (or listing failure), all sharing the same steps and target attributes.
pub struct TransformingArtifactListener {
    target: AttributeSet,
    steps: Arc<[BoundTransformationStep]>,
    entries: Vec<ArtifactSetEntry>,
}

impl TransformingArtifactListener {
    pub fn new(target: AttributeSet, steps: Vec<BoundTransformationStep>) -> Self {
        Self {
            target,
            steps: steps.into(),
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[ArtifactSetEntry] {
        &self.entries
    }

    pub fn into_set(self) -> TransformedArtifactSet {
        TransformedArtifactSet {
            entries: self.entries,
        }
    }
}

impl ArtifactVisitor for TransformingArtifactListener {
    fn visit_artifact(
        &mut self,
        variant_name: &str,
        _attributes: &AttributeSet,
        artifact: &ResolvableArtifact,
    ) {
        let transformed = TransformedArtifact::new(
            variant_name,
            artifact.clone(),
            self.target.clone(),
            Arc::clone(&self.steps),
        );
        self.entries.push(ArtifactSetEntry::Transformed(Arc::new(transformed)));
    }

    fn visit_failure(&mut self, failure: ArtifactFailure) {
        self.entries.push(ArtifactSetEntry::Broken(BrokenArtifacts::new(failure)));
    }

    fn require_artifact_files(&self) -> bool {
        false
    }
}

/// The transformed view of a resolved artifact set.
#[derive(Debug, Clone, Default)]
pub struct TransformedArtifactSet {
    entries: Vec<ArtifactSetEntry>,
}

impl TransformedArtifactSet {
    /// List `source` and wrap every artifact in the given chain.
    pub fn transform(
        source: &dyn ResolvedArtifactSet,
        target: AttributeSet,
        steps: Vec<BoundTransformationStep>,
    ) -> Self {
        let mut listener = TransformingArtifactListener::new(target, steps);
        source.visit(&mut listener);
        listener.into_set()
    }

    pub fn entries(&self) -> &[ArtifactSetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule every entry without blocking.
    pub fn start_finalization(&self, queue: &dyn WorkerQueue) {
        for entry in &self.entries {
            entry.start_finalization(queue);
        }
    }
}

impl ResolvedArtifactSet for TransformedArtifactSet {
    fn visit(&self, visitor: &mut dyn ArtifactVisitor) {
        for entry in &self.entries {
            entry.visit(visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::LazyFileSource;
    use crate::step::CachingTransformer;
    use crate::visitor::{CollectingVisitor, ResolvedArtifacts, ResolvedVariant};
    use crate::worker::InlineWorkerQueue;
    use anyhow::anyhow;
    use modchain_types::{ArtifactId, ModuleVersionId};
    use std::path::{Path, PathBuf};

    fn artifact(name: &str) -> ResolvableArtifact {
        let file = PathBuf::from(format!("/repo/{}-1.0.jar", name));
        ResolvableArtifact::new(
            ArtifactId::new(ModuleVersionId::new("g", name, "1.0"), format!("{}-1.0.jar", name)),
            Arc::new(LazyFileSource::new(move || Ok(file.clone()))),
        )
    }

    fn unzip() -> Vec<BoundTransformationStep> {
        let transformer = CachingTransformer::from_fn("unzip", |input: &Path, _: &[PathBuf]| {
            Ok(vec![input.with_extension("classes")])
        });
        vec![BoundTransformationStep::standalone(Arc::new(transformer))]
    }

    fn target() -> AttributeSet {
        AttributeSet::empty().with("artifactType", "classes")
    }

    #[test]
    fn test_listing_creates_one_entry_per_artifact() {
        let (a, b) = (artifact("a"), artifact("b"));
        let resolved = ResolvedArtifacts::new()
            .with_variant(ResolvedVariant::new(
                "runtime",
                AttributeSet::empty().with("artifactType", "jar"),
                vec![a.clone(), b.clone()],
            ))
            .with_failure(anyhow!("could not list g:c:1.0"));

        let set = TransformedArtifactSet::transform(&resolved, target(), unzip());
        assert_eq!(set.len(), 3);
        assert!(matches!(set.entries()[2], ArtifactSetEntry::Broken(_)));
        assert!(!a.file_source().is_finalized());
        assert!(!b.file_source().is_finalized());
    }

    #[test]
    fn test_visiting_transformed_set() {
        let resolved = ResolvedArtifacts::new()
            .with_variant(ResolvedVariant::new(
                "runtime",
                AttributeSet::empty(),
                vec![artifact("a")],
            ))
            .with_failure(anyhow!("could not list g:c:1.0"));
        let set = TransformedArtifactSet::transform(&resolved, target(), unzip());

        set.start_finalization(&InlineWorkerQueue);
        let mut visitor = CollectingVisitor::new();
        set.visit(&mut visitor);

        assert_eq!(visitor.files(), vec![PathBuf::from("/repo/a-1.0.classes")]);
        assert_eq!(visitor.artifacts[0].1, target());
        assert_eq!(visitor.failures.len(), 1);
        assert_eq!(
            visitor.failures[0].cause().to_string(),
            "could not list g:c:1.0"
        );
    }
}
