//! Visiting resolved artifacts and the failures met while listing them.

use modchain_types::AttributeSet;

use crate::artifact::ResolvableArtifact;
use crate::errors::{ArtifactFailure, SharedError};

/// Receives artifacts (or failures) from an artifact set.
pub trait ArtifactVisitor {
    fn visit_artifact(
        &mut self,
        variant_name: &str,
        attributes: &AttributeSet,
        artifact: &ResolvableArtifact,
    );

    fn visit_failure(&mut self, failure: ArtifactFailure);

    /// Whether artifact files must be materialized before they are visited.
    fn require_artifact_files(&self) -> bool {
        true
    }
}

/// Artifacts of one variant of a resolved module.
#[derive(Debug, Clone)]
pub struct ResolvedVariant {
    pub name: String,
    pub attributes: AttributeSet,
    pub artifacts: Vec<ResolvableArtifact>,
}

impl ResolvedVariant {
    pub fn new(
        name: impl Into<String>,
        attributes: AttributeSet,
        artifacts: Vec<ResolvableArtifact>,
    ) -> Self {
        Self {
            name: name.into(),
            attributes,
            artifacts,
        }
    }
}

/// Something that can enumerate resolved artifacts to a visitor.
pub trait ResolvedArtifactSet {
    fn visit(&self, visitor: &mut dyn ArtifactVisitor);
}

/// Resolved variants plus the failures met while listing them.
#[derive(Debug, Clone, Default)]
pub struct ResolvedArtifacts {
    variants: Vec<ResolvedVariant>,
    failures: Vec<SharedError>,
}

impl ResolvedArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, variant: ResolvedVariant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn with_failure(mut self, err: anyhow::Error) -> Self {
        self.failures.push(SharedError::new(err));
        self
    }

    pub fn variants(&self) -> &[ResolvedVariant] {
        &self.variants
    }
}

impl ResolvedArtifactSet for ResolvedArtifacts {
    fn visit(&self, visitor: &mut dyn ArtifactVisitor) {
        for variant in &self.variants {
            for artifact in &variant.artifacts {
                if visitor.require_artifact_files() {
                    artifact.file_source().finalize_if_not_already();
                }
                visitor.visit_artifact(&variant.name, &variant.attributes, artifact);
            }
        }
        for failure in &self.failures {
            visitor.visit_failure(ArtifactFailure::Broken(failure.clone()));
        }
    }
}

/// Collects everything it is shown.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    pub artifacts: Vec<(String, AttributeSet, ResolvableArtifact)>,
    pub failures: Vec<ArtifactFailure>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backing files of the collected artifacts that are materialized.
    pub fn files(&self) -> Vec<std::path::PathBuf> {
        self.artifacts
            .iter()
            .filter_map(|(_, _, artifact)| artifact.file())
            .collect()
    }
}

impl ArtifactVisitor for CollectingVisitor {
    fn visit_artifact(
        &mut self,
        variant_name: &str,
        attributes: &AttributeSet,
        artifact: &ResolvableArtifact,
    ) {
        self.artifacts
            .push((variant_name.to_string(), attributes.clone(), artifact.clone()));
    }

    fn visit_failure(&mut self, failure: ArtifactFailure) {
        self.failures.push(failure);
    }
}
