//! Transform capabilities and the steps that bind them into a chain.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use tracing::debug;

use crate::artifact::ResolvableArtifact;
use crate::errors::SharedError;
use crate::invocation::{Invocation, SubjectResult};
use crate::subject::TransformationSubject;

/// A transform capability.
pub trait Transformation: Send + Sync {
    fn display_name(&self) -> &str;

    /// Build (but do not run) the invocation that transforms `subject`.
    fn create_invocation(
        &self,
        subject: TransformationSubject,
        upstream: &UpstreamDependencies,
    ) -> Invocation;
}

/// Artifacts a step needs as additional input.
#[derive(Debug, Clone, Default)]
pub struct UpstreamDependencies {
    artifacts: Vec<ResolvableArtifact>,
}

impl UpstreamDependencies {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(artifacts: Vec<ResolvableArtifact>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &[ResolvableArtifact] {
        &self.artifacts
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Files of every upstream artifact, in order.
    ///
    /// Fails if any upstream file is not materialized yet or failed to
    /// materialize.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            match artifact.file_source().value() {
                Some(Ok(file)) => files.push(file),
                Some(Err(err)) => {
                    return Err(anyhow::Error::new(err)).with_context(|| {
                        format!("Upstream artifact {} could not be materialized.", artifact.id())
                    });
                }
                None => {
                    return Err(anyhow!(
                        "Upstream artifact {} has not been materialized.",
                        artifact.id()
                    ));
                }
            }
        }
        Ok(files)
    }
}

/// A transformation together with the upstream artifacts it consumes.
#[derive(Clone)]
pub struct BoundTransformationStep {
    transformation: Arc<dyn Transformation>,
    upstream: UpstreamDependencies,
}

impl BoundTransformationStep {
    pub fn new(transformation: Arc<dyn Transformation>, upstream: UpstreamDependencies) -> Self {
        Self {
            transformation,
            upstream,
        }
    }

    /// A step without upstream dependencies.
    pub fn standalone(transformation: Arc<dyn Transformation>) -> Self {
        Self::new(transformation, UpstreamDependencies::none())
    }

    pub fn display_name(&self) -> &str {
        self.transformation.display_name()
    }

    pub fn upstream(&self) -> &UpstreamDependencies {
        &self.upstream
    }

    pub fn create_invocation(&self, subject: TransformationSubject) -> Invocation {
        self.transformation.create_invocation(subject, &self.upstream)
    }
}

impl fmt::Debug for BoundTransformationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundTransformationStep")
            .field("transformation", &self.display_name())
            .field("upstream", &self.upstream.artifacts.len())
            .finish()
    }
}

/// The work a [`CachingTransformer`] does for one input file.
pub trait TransformAction: Send + Sync {
    fn execute(&self, input: &Path, upstream: &[PathBuf]) -> Result<Vec<PathBuf>>;
}

impl<F> TransformAction for F
where
    F: Fn(&Path, &[PathBuf]) -> Result<Vec<PathBuf>> + Send + Sync,
{
    fn execute(&self, input: &Path, upstream: &[PathBuf]) -> Result<Vec<PathBuf>> {
        (self)(input, upstream)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    input: PathBuf,
    upstream: Vec<PathBuf>,
}

type OutputCache = Arc<Mutex<HashMap<CacheKey, Vec<PathBuf>>>>;

/// A transformation that memoizes successful outputs per input file and
/// upstream file set.
///
/// Invocations over inputs that are all cached are reported as already
/// computed, so a transformed artifact can settle without scheduling work.
/// Failures are not cached.
pub struct CachingTransformer {
    name: String,
    action: Arc<dyn TransformAction>,
    cache: OutputCache,
}

impl CachingTransformer {
    pub fn new(name: impl Into<String>, action: impl TransformAction + 'static) -> Self {
        Self {
            name: name.into(),
            action: Arc::new(action),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A transformer running `action` for every input file.
    pub fn from_fn<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Path, &[PathBuf]) -> Result<Vec<PathBuf>> + Send + Sync + 'static,
    {
        Self::new(name, action)
    }

    /// Number of memoized input files.
    pub fn cached_entries(&self) -> usize {
        self.cache.lock().len()
    }

    fn lookup(&self, inputs: &[PathBuf], upstream: &[PathBuf]) -> Option<Vec<PathBuf>> {
        let cache = self.cache.lock();
        let mut outputs = Vec::new();
        for input in inputs {
            let key = CacheKey {
                input: input.clone(),
                upstream: upstream.to_vec(),
            };
            outputs.extend(cache.get(&key)?.iter().cloned());
        }
        Some(outputs)
    }
}

impl Transformation for CachingTransformer {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn create_invocation(
        &self,
        subject: TransformationSubject,
        upstream: &UpstreamDependencies,
    ) -> Invocation {
        let materialized = upstream
            .artifacts()
            .iter()
            .all(|artifact| artifact.file_source().is_finalized());
        if materialized {
            let upstream_files = match upstream.files() {
                Ok(files) => files,
                Err(err) => {
                    return Invocation::cached(Err(failure_context(&self.name, &subject, err)));
                }
            };
            if let Some(outputs) = self.lookup(subject.files(), &upstream_files) {
                return Invocation::cached(Ok(subject.with_files(&self.name, outputs)));
            }
        }

        let run = RunTransform {
            name: self.name.clone(),
            action: Arc::clone(&self.action),
            cache: Arc::clone(&self.cache),
        };
        let upstream = upstream.clone();
        Invocation::pending(move || {
            for artifact in upstream.artifacts() {
                artifact.file_source().finalize_if_not_already();
            }
            let upstream_files = upstream
                .files()
                .map_err(|err| failure_context(&run.name, &subject, err))?;
            run.execute(subject, upstream_files)
        })
    }
}

fn failure_context(name: &str, subject: &TransformationSubject, err: anyhow::Error) -> SharedError {
    SharedError::new(err.context(format!(
        "Execution failed for {} on {}.",
        name,
        subject.artifact()
    )))
}

/// What a pending [`CachingTransformer`] invocation runs.
struct RunTransform {
    name: String,
    action: Arc<dyn TransformAction>,
    cache: OutputCache,
}

impl RunTransform {
    fn execute(
        &self,
        subject: TransformationSubject,
        upstream_files: Vec<PathBuf>,
    ) -> SubjectResult {
        let mut outputs = Vec::new();
        for input in subject.files() {
            let key = CacheKey {
                input: input.clone(),
                upstream: upstream_files.clone(),
            };
            let cached = self.cache.lock().get(&key).cloned();
            let produced = match cached {
                Some(produced) => produced,
                None => {
                    debug!(transform = %self.name, input = %input.display(), "executing transform");
                    let produced = self
                        .action
                        .execute(input, &upstream_files)
                        .with_context(|| {
                            format!("Execution failed for {} on {}.", self.name, input.display())
                        })
                        .map_err(SharedError::new)?;
                    self.cache.lock().insert(key, produced.clone());
                    produced
                }
            };
            outputs.extend(produced);
        }
        Ok(subject.with_files(&self.name, outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{FailedFile, LazyFileSource};
    use modchain_types::{ArtifactId, ModuleVersionId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn subject(file: &str) -> TransformationSubject {
        let id = ArtifactId::new(ModuleVersionId::new("g", "n", "1.0"), "n-1.0.jar");
        TransformationSubject::initial(id, PathBuf::from(file))
    }

    fn upstream_id(name: &str) -> ArtifactId {
        ArtifactId::new(ModuleVersionId::new("g", name, "1.0"), format!("{}-1.0.jar", name))
    }

    fn counting_transformer(runs: Arc<AtomicUsize>) -> CachingTransformer {
        CachingTransformer::from_fn("suffix", move |input: &Path, _: &[PathBuf]| {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PathBuf::from(format!("{}.out", input.display()))])
        })
    }

    #[test]
    fn test_second_invocation_is_cached() {
        let runs = Arc::new(AtomicUsize::new(0));
        let transformer = counting_transformer(Arc::clone(&runs));

        let none = UpstreamDependencies::none();
        let mut first = transformer.create_invocation(subject("/in/a"), &none);
        assert!(first.cached_result().is_none());
        let output = first.invoke().unwrap();
        assert_eq!(output.files(), [PathBuf::from("/in/a.out")]);

        let mut second = transformer.create_invocation(subject("/in/a"), &none);
        let cached = second.cached_result().unwrap().unwrap();
        assert_eq!(cached, output);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(transformer.cached_entries(), 1);
    }

    #[test]
    fn test_action_writes_real_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "hello").unwrap();
        let out_dir = dir.path().to_path_buf();
        let transformer = CachingTransformer::from_fn("upper", move |input: &Path, _: &[PathBuf]| {
            let content = std::fs::read_to_string(input)?;
            let output = out_dir.join("notes.upper");
            std::fs::write(&output, content.to_uppercase())?;
            Ok(vec![output])
        });

        let id = ArtifactId::new(ModuleVersionId::new("g", "notes", "1.0"), "notes.txt");
        let subject = TransformationSubject::initial(id, input);
        let output = transformer
            .create_invocation(subject, &UpstreamDependencies::none())
            .invoke()
            .unwrap();
        let written = std::fs::read_to_string(&output.files()[0]).unwrap();
        assert_eq!(written, "HELLO");
    }

    #[test]
    fn test_failures_are_not_cached() {
        let transformer = CachingTransformer::from_fn("broken", |input: &Path, _: &[PathBuf]| {
            Err(anyhow!("cannot read {}", input.display()))
        });
        let mut invocation =
            transformer.create_invocation(subject("/in/a"), &UpstreamDependencies::none());
        let err = invocation.invoke().unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "Execution failed for broken on /in/a.: cannot read /in/a"
        );
        assert_eq!(transformer.cached_entries(), 0);
    }

    #[test]
    fn test_upstream_files_are_passed_to_action() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let transformer =
            CachingTransformer::from_fn("link", move |_: &Path, upstream: &[PathBuf]| {
                record.lock().extend(upstream.iter().cloned());
                Ok(vec![PathBuf::from("/out/linked")])
            });
        let upstream = UpstreamDependencies::new(vec![ResolvableArtifact::resolved(
            upstream_id("dep"),
            "/repo/dep-1.0.jar",
        )]);

        transformer
            .create_invocation(subject("/in/a"), &upstream)
            .invoke()
            .unwrap();
        assert_eq!(*seen.lock(), vec![PathBuf::from("/repo/dep-1.0.jar")]);
    }

    #[test]
    fn test_unmaterialized_upstream_is_materialized_on_run() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let transformer =
            CachingTransformer::from_fn("link", move |input: &Path, upstream: &[PathBuf]| {
                record.lock().extend(upstream.iter().cloned());
                Ok(vec![PathBuf::from(format!("{}.linked", input.display()))])
            });
        let lazy = ResolvableArtifact::new(
            upstream_id("lazy"),
            Arc::new(LazyFileSource::new(|| Ok(PathBuf::from("/repo/lazy-1.0.jar")))),
        );

        let upstream = UpstreamDependencies::new(vec![lazy.clone()]);
        let mut invocation = transformer.create_invocation(subject("/in/a"), &upstream);
        assert!(invocation.cached_result().is_none());
        assert!(!lazy.file_source().is_finalized());

        let output = invocation.invoke().unwrap();
        assert_eq!(output.files(), [PathBuf::from("/in/a.linked")]);
        assert_eq!(*seen.lock(), vec![PathBuf::from("/repo/lazy-1.0.jar")]);

        let mut again = transformer.create_invocation(subject("/in/a"), &upstream);
        assert!(again.cached_result().unwrap().is_ok());
    }

    #[test]
    fn test_failed_upstream_fails_step() {
        let runs = Arc::new(AtomicUsize::new(0));
        let transformer = counting_transformer(Arc::clone(&runs));
        let failed = ResolvableArtifact::new(
            upstream_id("gone"),
            Arc::new(FailedFile::new(anyhow!("404"))),
        );
        let lazy_failure = ResolvableArtifact::new(
            upstream_id("flaky"),
            Arc::new(LazyFileSource::new(|| Err(anyhow!("connection reset")))),
        );

        let mut invocation = transformer
            .create_invocation(subject("/in/a"), &UpstreamDependencies::new(vec![failed]));
        let err = invocation.cached_result().unwrap().unwrap_err();
        assert!(format!("{:#}", err).ends_with("404"));

        let mut invocation = transformer
            .create_invocation(subject("/in/a"), &UpstreamDependencies::new(vec![lazy_failure]));
        assert!(invocation.cached_result().is_none());
        let err = invocation.invoke().unwrap_err();
        assert!(format!("{:#}", err).starts_with("Execution failed for suffix on"));
        assert!(format!("{:#}", err).ends_with("connection reset"));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
