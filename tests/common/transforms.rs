//! Transformations and worker queues with observable behavior.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use modchain::transform::{
    Invocation, LazyFileSource, ResolvableArtifact, Transformation, TransformationSubject,
    UpstreamDependencies, Work, WorkerQueue,
};
use modchain::types::{ArtifactId, ModuleVersionId};
use parking_lot::Mutex;

pub fn artifact_id(name: &str) -> ArtifactId {
    ArtifactId::new(ModuleVersionId::new("org.example", name, "1.0"), format!("{}-1.0.jar", name))
}

pub fn artifact_on_disk(name: &str) -> ResolvableArtifact {
    ResolvableArtifact::resolved(artifact_id(name), format!("/repo/{}-1.0.jar", name))
}

/// An artifact whose file is only "downloaded" when first needed.
pub fn lazy_artifact(name: &str, downloads: Arc<AtomicUsize>) -> ResolvableArtifact {
    let file = PathBuf::from(format!("/cache/{}-1.0.jar", name));
    ResolvableArtifact::new(
        artifact_id(name),
        Arc::new(LazyFileSource::new(move || {
            downloads.fetch_add(1, Ordering::SeqCst);
            Ok(file.clone())
        })),
    )
}

/// Appends `.<name>` to every input file and counts how often it was bound
/// and how often it ran.
pub struct CountingTransform {
    name: String,
    fail_with: Option<&'static str>,
    delay: Duration,
    created: AtomicUsize,
    executed: Arc<AtomicUsize>,
}

impl CountingTransform {
    pub fn new(name: &str) -> Arc<Self> {
        Self::build(name, None, Duration::ZERO)
    }

    pub fn failing(name: &str, message: &'static str) -> Arc<Self> {
        Self::build(name, Some(message), Duration::ZERO)
    }

    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Self::build(name, None, delay)
    }

    fn build(name: &str, fail_with: Option<&'static str>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail_with,
            delay,
            created: AtomicUsize::new(0),
            executed: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

impl Transformation for CountingTransform {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn create_invocation(
        &self,
        subject: TransformationSubject,
        _upstream: &UpstreamDependencies,
    ) -> Invocation {
        self.created.fetch_add(1, Ordering::SeqCst);
        let name = self.name.clone();
        let (fail_with, delay) = (self.fail_with, self.delay);
        let executed = Arc::clone(&self.executed);
        Invocation::pending(move || {
            executed.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(delay);
            if let Some(message) = fail_with {
                return Err(anyhow!("{}", message).into());
            }
            let outputs = subject
                .files()
                .iter()
                .map(|file| PathBuf::from(format!("{}.{}", file.display(), name)))
                .collect();
            Ok(subject.with_files(&name, outputs))
        })
    }
}

/// Holds enqueued work until the test drains it.
#[derive(Default)]
pub struct RecordingQueue(Mutex<Vec<Work>>);

impl RecordingQueue {
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn run_all(&self) {
        let work: Vec<Work> = self.0.lock().drain(..).collect();
        for unit in work {
            unit();
        }
    }
}

impl WorkerQueue for RecordingQueue {
    fn enqueue(&self, work: Work) {
        self.0.lock().push(work);
    }
}
