//! Fixed-size worker pool executing dependency-gated jobs.
//!
//! Tasks travel over one unbounded crossbeam channel shared by all
//! workers. Each worker blocks on the task's dependency token, runs it,
//! then signals the task's own token.
//!
//! # Progress
//!
//! The tracker submits jobs in schedule order and a job only depends on
//! jobs scheduled before it. The channel is FIFO, so the oldest task any
//! worker holds depends only on tasks that are already finished or held
//! by other workers further ahead; that task can always run, and no set
//! of workers can block each other.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::config::PoolError;
use crate::token::{Completer, CompletionToken};

struct Task {
    name: String,
    dependencies: CompletionToken,
    completer: Completer,
    body: Box<dyn FnOnce() + Send>,
}

/// A set of worker threads running jobs once their dependencies finish.
///
/// Dropping the pool lets queued tasks drain, then joins every worker.
pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `worker_count` threads. `worker_count` must be at least 1.
    pub fn new(worker_count: usize) -> Result<Self, PoolError> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Task>();
        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("warren-worker-{index}"))
                .spawn(move || worker_loop(receiver))
                .map_err(|e| PoolError::ThreadSpawnFailed {
                    reason: e.to_string(),
                })?;
            workers.push(handle);
        }
        tracing::debug!(worker_count, "worker pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue `body` to run once `dependencies` completes.
    ///
    /// Returns the token that completes when `body` has run.
    pub fn spawn(
        &self,
        name: impl Into<String>,
        dependencies: CompletionToken,
        body: Box<dyn FnOnce() + Send>,
    ) -> CompletionToken {
        let name = name.into();
        let (token, completer) = CompletionToken::pending(name.clone());
        let task = Task {
            name,
            dependencies,
            completer,
            body,
        };
        if let Some(sender) = &self.sender {
            // A send error hands the task back; dropping it drops the
            // completer, which marks the token as panicked.
            if let Err(e) = sender.send(task) {
                tracing::warn!(job = %e.0.name, "worker pool disconnected; job dropped");
            }
        }
        token
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(receiver: Receiver<Task>) {
    for task in receiver.iter() {
        let Task {
            name,
            dependencies,
            completer,
            body,
        } = task;
        // A panicked dependency still counts as finished; the panic is
        // reported to whoever waits on that dependency.
        let _ = dependencies.wait();
        let panicked = panic::catch_unwind(AssertUnwindSafe(body)).is_err();
        if panicked {
            tracing::warn!(job = %name, "job panicked on worker thread");
        } else {
            tracing::trace!(job = %name, "job finished");
        }
        completer.finish(panicked);
    }
}
