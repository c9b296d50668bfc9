//! An artifact seen through a chain of transformation steps.
//!
//! The chain runs at most once per [`TransformedArtifact`]. Scheduling never
//! blocks; finalizing blocks until the (single) outcome is known and every
//! caller gets the same shared value.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use modchain_types::AttributeSet;
use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::artifact::ResolvableArtifact;
use crate::errors::{ArtifactFailure, SharedError};
use crate::invocation::{Invocation, SubjectResult};
use crate::step::BoundTransformationStep;
use crate::subject::TransformationSubject;
use crate::visitor::ArtifactVisitor;
use crate::worker::WorkerQueue;

enum State {
    /// The backing file is not known to be materialized yet.
    Unprepared,
    Prepared(Invocation),
    /// One caller is running the chain outside the lock.
    Computing,
    Finalized(Arc<SubjectResult>),
}

struct Cell {
    state: State,
    scheduled: bool,
}

pub struct TransformedArtifact {
    variant_name: String,
    source: ResolvableArtifact,
    target: AttributeSet,
    steps: Arc<[BoundTransformationStep]>,
    cell: Mutex<Cell>,
    settled: Condvar,
}

impl TransformedArtifact {
    pub fn new(
        variant_name: impl Into<String>,
        source: ResolvableArtifact,
        target: AttributeSet,
        steps: Arc<[BoundTransformationStep]>,
    ) -> Self {
        Self {
            variant_name: variant_name.into(),
            source,
            target,
            steps,
            cell: Mutex::new(Cell {
                state: State::Unprepared,
                scheduled: false,
            }),
            settled: Condvar::new(),
        }
    }

    pub fn variant_name(&self) -> &str {
        &self.variant_name
    }

    pub fn source(&self) -> &ResolvableArtifact {
        &self.source
    }

    pub fn target(&self) -> &AttributeSet {
        &self.target
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.cell.lock().state, State::Finalized(_))
    }

    /// The settled outcome, if there is one.
    pub fn result(&self) -> Option<Arc<SubjectResult>> {
        match &self.cell.lock().state {
            State::Finalized(result) => Some(Arc::clone(result)),
            _ => None,
        }
    }

    /// Make progress towards the outcome without blocking.
    ///
    /// Settles immediately when the outcome is already known (a failed
    /// backing file or a fully cached chain); otherwise enqueues a single
    /// unit of work that finalizes this artifact.
    pub fn start_finalization(self: &Arc<Self>, queue: &dyn WorkerQueue) {
        let mut cell = self.cell.lock();
        if matches!(cell.state, State::Unprepared) && self.source.file_source().is_finalized() {
            cell.state = self.prepare();
        }
        if let State::Prepared(invocation) = &mut cell.state {
            if let Some(result) = peek(invocation) {
                trace!(artifact = %self.source.id(), "transform result already cached");
                self.settle(&mut cell, result);
            }
        }
        let waiting = matches!(cell.state, State::Unprepared | State::Prepared(_));
        if !waiting || cell.scheduled {
            return;
        }
        cell.scheduled = true;
        drop(cell);

        let this = Arc::clone(self);
        queue.enqueue(Box::new(move || {
            this.finalize_now();
        }));
    }

    /// Block until the outcome is known, computing it on this thread if
    /// nobody else is.
    pub fn finalize_now(&self) -> Arc<SubjectResult> {
        self.source.file_source().finalize_if_not_already();

        let mut cell = self.cell.lock();
        loop {
            match std::mem::replace(&mut cell.state, State::Computing) {
                State::Finalized(result) => {
                    cell.state = State::Finalized(Arc::clone(&result));
                    return result;
                }
                State::Computing => self.settled.wait(&mut cell),
                State::Unprepared => cell.state = self.prepare(),
                State::Prepared(mut invocation) => {
                    let result = match peek(&mut invocation) {
                        Some(result) => result,
                        None => {
                            debug!(
                                artifact = %self.source.id(),
                                steps = self.steps.len(),
                                "running transform chain"
                            );
                            MutexGuard::unlocked(&mut cell, || run(&mut invocation))
                        }
                    };
                    return self.settle(&mut cell, result);
                }
            }
        }
    }

    /// Finalize and report the outcome to `visitor`.
    pub fn visit(&self, visitor: &mut dyn ArtifactVisitor) {
        let result = self.finalize_now();
        match &*result {
            Ok(subject) if subject.applied().is_empty() => {
                visitor.visit_artifact(&self.variant_name, &self.target, &self.source);
            }
            Ok(subject) => {
                for file in subject.files() {
                    let artifact = self.source.transformed_to(file);
                    visitor.visit_artifact(&self.variant_name, &self.target, &artifact);
                }
            }
            Err(cause) => visitor.visit_failure(ArtifactFailure::Transform {
                artifact: self.source.id().clone(),
                target: self.target.clone(),
                cause: cause.clone(),
            }),
        }
    }

    /// Build the state that follows a materialized backing file.
    fn prepare(&self) -> State {
        match self.source.file_source().value() {
            Some(Ok(file)) => {
                let initial = TransformationSubject::initial(self.source.id().clone(), file);
                let mut invocation = Invocation::cached(Ok(initial));
                for step in self.steps.iter().cloned() {
                    invocation =
                        invocation.flat_map(move |subject| step.create_invocation(subject));
                }
                State::Prepared(invocation)
            }
            Some(Err(cause)) => {
                debug!(artifact = %self.source.id(), "backing file failed, skipping transforms");
                State::Finalized(Arc::new(Err(cause)))
            }
            None => State::Finalized(Arc::new(Err(SharedError::new(anyhow!(
                "Backing file of {} was not materialized.",
                self.source.id()
            ))))),
        }
    }

    fn settle(&self, cell: &mut Cell, result: SubjectResult) -> Arc<SubjectResult> {
        if let Err(err) = &result {
            debug!(artifact = %self.source.id(), error = %err, "transform chain failed");
        }
        let result = Arc::new(result);
        cell.state = State::Finalized(Arc::clone(&result));
        cell.scheduled = false;
        self.settled.notify_all();
        result
    }
}

/// The cached outcome of `invocation`, if binding the chain gets that far.
///
/// Binding calls into transformations, so a panic here settles the chain as
/// failed instead of leaving it partially bound.
fn peek(invocation: &mut Invocation) -> Option<SubjectResult> {
    catch_unwind(AssertUnwindSafe(|| invocation.cached_result()))
        .unwrap_or_else(|_| Some(Err(panicked())))
}

fn run(invocation: &mut Invocation) -> SubjectResult {
    catch_unwind(AssertUnwindSafe(|| invocation.invoke())).unwrap_or_else(|_| Err(panicked()))
}

fn panicked() -> SharedError {
    SharedError::new(anyhow!("Transform chain panicked."))
}

impl std::fmt::Debug for TransformedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformedArtifact")
            .field("variant", &self.variant_name)
            .field("source", self.source.id())
            .field("target", &self.target)
            .field("steps", &self.steps)
            .finish()
    }
}
