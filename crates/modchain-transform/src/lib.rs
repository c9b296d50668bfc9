//! Lazy, cache-aware artifact transformation.
//!
//! A resolved artifact is reshaped by an ordered chain of
//! [`BoundTransformationStep`]s into whatever form a consumer asked for.
//! Chains are composed into a single [`Invocation`] that runs at most once
//! per [`TransformedArtifact`], either on a [`WorkerQueue`] or on the thread
//! that first needs the result.
//!
//! # Example
//!
//! ```
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//! use modchain_transform::{
//!     BoundTransformationStep, CachingTransformer, CollectingVisitor, InlineWorkerQueue,
//!     ResolvableArtifact, TransformedArtifact,
//! };
//! use modchain_types::{ArtifactId, AttributeSet, ModuleVersionId};
//!
//! let unzip = CachingTransformer::from_fn("unzip", |input: &Path, _: &[PathBuf]| {
//!     Ok(vec![input.with_extension("classes")])
//! });
//! let steps: Arc<[BoundTransformationStep]> =
//!     vec![BoundTransformationStep::standalone(Arc::new(unzip))].into();
//!
//! let jar = ResolvableArtifact::resolved(
//!     ArtifactId::new(ModuleVersionId::new("org.example", "core", "1.0"), "core-1.0.jar"),
//!     "/repo/core-1.0.jar",
//! );
//! let target = AttributeSet::empty().with("artifactType", "classes");
//! let artifact = Arc::new(TransformedArtifact::new("runtime", jar, target, steps));
//!
//! artifact.start_finalization(&InlineWorkerQueue);
//! let mut visitor = CollectingVisitor::new();
//! artifact.visit(&mut visitor);
//! assert_eq!(visitor.files(), vec![PathBuf::from("/repo/core-1.0.classes")]);
//! ```

pub mod artifact;
pub mod errors;
pub mod invocation;
pub mod listener;
pub mod step;
pub mod subject;
pub mod transformed;
pub mod visitor;
pub mod worker;

pub use artifact::{
    FailedFile, FileResult, FileSource, LazyFileSource, MaterializedFile, ResolvableArtifact,
};
pub use errors::{ArtifactFailure, SharedError};
pub use invocation::{Invocation, SubjectResult};
pub use listener::{
    ArtifactSetEntry, BrokenArtifacts, TransformedArtifactSet, TransformingArtifactListener,
};
pub use step::{
    BoundTransformationStep, CachingTransformer, TransformAction, Transformation,
    UpstreamDependencies,
};
pub use subject::TransformationSubject;
pub use transformed::TransformedArtifact;
pub use visitor::{
    ArtifactVisitor, CollectingVisitor, ResolvedArtifactSet, ResolvedArtifacts, ResolvedVariant,
};
pub use worker::{InlineWorkerQueue, RayonWorkerQueue, Work, WorkerQueue};
