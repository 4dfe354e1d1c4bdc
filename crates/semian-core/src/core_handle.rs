//! The explicit process-wide handle.
//!
//! Rather than a lazily-initialized global registry and a single global worker
//! semaphore set, callers construct one [`Core`]. It owns the registry (built on
//! top of this crate by `semian-resource`) and any background tasks — the adaptive
//! breaker's ping scheduler, a shared-scope client — and is torn down on drop.
//! Tests construct a fresh `Core` per test instead of sharing global mutable state,
//! which keeps tests from leaking state into one another when run in parallel.

use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A background task owned by a [`Core`], stopped when the `Core` is dropped.
struct ManagedTask {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
}

/// Owns process-wide mutable state: the set of background tasks this process has
/// spawned on behalf of registered resources (adaptive ping schedulers, a
/// shared-scope client connection). Distinct `Core` instances are fully isolated
/// from one another, which is what lets tests spin up a throwaway one per case.
#[derive(Default)]
pub struct Core {
    tasks: std::sync::Mutex<Vec<ManagedTask>>,
}

impl Core {
    /// Creates a new, empty `Core` with no background tasks running.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Spawns `task` as a managed background job. `task` receives a [`Notify`] it
    /// must select on (alongside its own work) to know when to stop; `Core`
    /// triggers it on drop or via [`Core::shutdown`].
    pub fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Arc<Notify>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(task(Arc::clone(&shutdown)));
        self.tasks
            .lock()
            .expect("core task list lock poisoned")
            .push(ManagedTask { handle, shutdown });
    }

    /// Number of background tasks currently tracked. Exposed mainly for tests that
    /// assert a ping scheduler was (or wasn't) spawned.
    pub fn task_count(&self) -> usize {
        self.tasks.lock().expect("core task list lock poisoned").len()
    }

    /// Notifies every managed task to stop and aborts any that don't exit promptly.
    /// Called automatically on drop; safe to call multiple times.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().expect("core task list lock poisoned");
        for task in tasks.drain(..) {
            task.shutdown.notify_waiters();
            task.handle.abort();
        }
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        self.shutdown();
    }
}
