//! Resolvable artifacts and their backing file sources.
//!
//! Materializing an artifact's file (downloading, extracting, copying from a
//! cache) is somebody else's job; the pipeline only needs to know whether the
//! file is there yet, what the outcome was, and how to force it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use modchain_types::ArtifactId;

use crate::errors::SharedError;

/// Outcome of materializing an artifact's backing file.
pub type FileResult = Result<PathBuf, SharedError>;

/// Materialization of one artifact's backing file.
pub trait FileSource: Send + Sync {
    /// Whether materialization has completed (successfully or not).
    fn is_finalized(&self) -> bool;

    /// The outcome, once finalized.
    fn value(&self) -> Option<FileResult>;

    /// Materialize the file if that has not happened yet. May block.
    fn finalize_if_not_already(&self);
}

/// A file that is already on disk.
#[derive(Debug, Clone)]
pub struct MaterializedFile(PathBuf);

impl MaterializedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl FileSource for MaterializedFile {
    fn is_finalized(&self) -> bool {
        true
    }

    fn value(&self) -> Option<FileResult> {
        Some(Ok(self.0.clone()))
    }

    fn finalize_if_not_already(&self) {}
}

/// A file whose materialization already failed.
#[derive(Debug, Clone)]
pub struct FailedFile(SharedError);

impl FailedFile {
    pub fn new(err: anyhow::Error) -> Self {
        Self(SharedError::new(err))
    }
}

impl FileSource for FailedFile {
    fn is_finalized(&self) -> bool {
        true
    }

    fn value(&self) -> Option<FileResult> {
        Some(Err(self.0.clone()))
    }

    fn finalize_if_not_already(&self) {}
}

type Materializer = Box<dyn Fn() -> anyhow::Result<PathBuf> + Send + Sync>;

/// A file materialized on first demand, at most once.
pub struct LazyFileSource {
    materialize: Materializer,
    value: OnceLock<FileResult>,
}

impl LazyFileSource {
    pub fn new(materialize: impl Fn() -> anyhow::Result<PathBuf> + Send + Sync + 'static) -> Self {
        Self {
            materialize: Box::new(materialize),
            value: OnceLock::new(),
        }
    }
}

impl FileSource for LazyFileSource {
    fn is_finalized(&self) -> bool {
        self.value.get().is_some()
    }

    fn value(&self) -> Option<FileResult> {
        self.value.get().cloned()
    }

    fn finalize_if_not_already(&self) {
        self.value.get_or_init(|| (self.materialize)().map_err(SharedError::new));
    }
}

/// An artifact together with the source of its backing file.
#[derive(Clone)]
pub struct ResolvableArtifact {
    id: ArtifactId,
    file_source: Arc<dyn FileSource>,
}

impl ResolvableArtifact {
    pub fn new(id: ArtifactId, file_source: Arc<dyn FileSource>) -> Self {
        Self { id, file_source }
    }

    /// An artifact whose file already exists at `path`.
    pub fn resolved(id: ArtifactId, path: impl Into<PathBuf>) -> Self {
        Self::new(id, Arc::new(MaterializedFile::new(path)))
    }

    pub fn id(&self) -> &ArtifactId {
        &self.id
    }

    pub fn file_source(&self) -> &Arc<dyn FileSource> {
        &self.file_source
    }

    /// The backing file, if it has been materialized successfully.
    pub fn file(&self) -> Option<PathBuf> {
        self.file_source.value().and_then(Result::ok)
    }

    /// A new artifact for a file produced from this one.
    pub fn transformed_to(&self, output: &Path) -> ResolvableArtifact {
        let file_name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| output.display().to_string());
        ResolvableArtifact::resolved(self.id.derived(file_name), output)
    }
}

impl fmt::Debug for ResolvableArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvableArtifact")
            .field("id", &self.id)
            .field("finalized", &self.file_source.is_finalized())
            .finish()
    }
}
