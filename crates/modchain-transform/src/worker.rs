//! Worker facilities that run deferred transform work.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::{Condvar, Mutex};

/// A unit of deferred work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Accepts work to run later, possibly on another thread.
pub trait WorkerQueue: Send + Sync {
    fn enqueue(&self, work: Work);
}

/// Runs work synchronously on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineWorkerQueue;

impl WorkerQueue for InlineWorkerQueue {
    fn enqueue(&self, work: Work) {
        work();
    }
}

#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

/// Decrements the pending count when dropped, even if the work panicked.
struct PendingGuard(Arc<Pending>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut count = self.0.count.lock();
        *count -= 1;
        if *count == 0 {
            self.0.idle.notify_all();
        }
    }
}

/// A dedicated rayon thread pool.
pub struct RayonWorkerQueue {
    pool: rayon::ThreadPool,
    pending: Arc<Pending>,
}

impl RayonWorkerQueue {
    /// Build a pool with `threads` workers (0 lets rayon pick) named
    /// `<prefix>-<index>`.
    pub fn new(threads: usize, thread_name_prefix: &str) -> Result<Self> {
        let prefix = thread_name_prefix.to_string();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |index| format!("{}-{}", prefix, index))
            .build()
            .context("Failed to build transform worker pool")?;
        Ok(Self {
            pool,
            pending: Arc::new(Pending::default()),
        })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of enqueued units that have not finished yet.
    pub fn pending(&self) -> usize {
        *self.pending.count.lock()
    }

    /// Block until every enqueued unit has finished.
    pub fn wait_for_idle(&self) {
        let mut count = self.pending.count.lock();
        while *count > 0 {
            self.pending.idle.wait(&mut count);
        }
    }
}

impl WorkerQueue for RayonWorkerQueue {
    fn enqueue(&self, work: Work) {
        *self.pending.count.lock() += 1;
        let guard = PendingGuard(Arc::clone(&self.pending));
        self.pool.spawn(move || {
            let _guard = guard;
            work();
        });
    }
}
