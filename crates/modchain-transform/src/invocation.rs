//! Lazy, memoized transform execution.
//!
//! An [`Invocation`] is a head stage (either a pending computation or an
//! already known result) followed by continuations that bind the next step
//! once the previous subject exists. Nothing runs until [`Invocation::invoke`];
//! [`Invocation::cached_result`] only walks through stages whose results are
//! already known.

use std::collections::VecDeque;
use std::fmt;

use anyhow::anyhow;

use crate::errors::SharedError;
use crate::subject::TransformationSubject;

/// Outcome of a transform chain or of one step in it.
pub type SubjectResult = Result<TransformationSubject, SharedError>;

type Compute = Box<dyn FnOnce() -> SubjectResult + Send>;
type Continuation = Box<dyn FnOnce(TransformationSubject) -> Invocation + Send>;

enum Stage {
    Pending(Compute),
    Cached(SubjectResult),
    /// A computation or a continuation panicked before replacing the head.
    Poisoned,
}

pub struct Invocation {
    head: Stage,
    continuations: VecDeque<Continuation>,
}

impl Invocation {
    /// A computation that runs on first [`invoke`](Self::invoke).
    pub fn pending(compute: impl FnOnce() -> SubjectResult + Send + 'static) -> Self {
        Self {
            head: Stage::Pending(Box::new(compute)),
            continuations: VecDeque::new(),
        }
    }

    /// A result that is already known.
    pub fn cached(result: SubjectResult) -> Self {
        Self {
            head: Stage::Cached(result),
            continuations: VecDeque::new(),
        }
    }

    /// Chain `next` after this invocation. `next` is only called with a
    /// successful subject; a failure skips it.
    pub fn flat_map(
        mut self,
        next: impl FnOnce(TransformationSubject) -> Invocation + Send + 'static,
    ) -> Self {
        self.continuations.push_back(Box::new(next));
        self
    }

    /// The final result if it can be determined without running anything.
    ///
    /// Continuations are bound along the way while their inputs are cached,
    /// so a later call does not repeat that work.
    pub fn cached_result(&mut self) -> Option<SubjectResult> {
        loop {
            let subject = match &self.head {
                Stage::Pending(_) => return None,
                Stage::Poisoned => return Some(Err(poisoned())),
                Stage::Cached(Err(err)) => return Some(Err(err.clone())),
                Stage::Cached(Ok(subject)) => subject.clone(),
            };
            match self.continuations.pop_front() {
                None => return Some(Ok(subject)),
                Some(next) => {
                    self.head = Stage::Poisoned;
                    self.splice(next(subject));
                }
            }
        }
    }

    /// Run every remaining stage in order, stopping at the first failure.
    /// Each stage's result is memoized.
    pub fn invoke(&mut self) -> SubjectResult {
        loop {
            let result = match std::mem::replace(&mut self.head, Stage::Poisoned) {
                Stage::Pending(compute) => compute(),
                Stage::Cached(result) => result,
                Stage::Poisoned => Err(poisoned()),
            };
            self.head = Stage::Cached(result.clone());
            let subject = result?;
            match self.continuations.pop_front() {
                None => return Ok(subject),
                Some(next) => {
                    self.head = Stage::Poisoned;
                    self.splice(next(subject));
                }
            }
        }
    }

    /// Replace the head with `next`, running its continuations before ours.
    fn splice(&mut self, next: Invocation) {
        let Invocation {
            head,
            mut continuations,
        } = next;
        continuations.extend(self.continuations.drain(..));
        self.head = head;
        self.continuations = continuations;
    }
}

fn poisoned() -> SharedError {
    SharedError::new(anyhow!("transform invocation did not complete"))
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = match &self.head {
            Stage::Pending(_) => "pending",
            Stage::Cached(Ok(_)) => "cached",
            Stage::Cached(Err(_)) => "failed",
            Stage::Poisoned => "poisoned",
        };
        f.debug_struct("Invocation")
            .field("head", &head)
            .field("continuations", &self.continuations.len())
            .finish()
    }
}
