//! The [`JobDependencyTracker`] and the [`Job`] trait.
//!
//! The tracker keeps one [`TrackedSlot`] per buffer it has seen: the last
//! job that wrote it and every job that read it since. From those it
//! derives the hazard edges of each new job:
//!
//! | new access | waits on                              |
//! |------------|---------------------------------------|
//! | read       | last writer                           |
//! | write      | last writer + all readers since it    |
//!
//! Two reads of the same buffer never wait on each other, and jobs with
//! disjoint access sets never wait on each other.
//!
//! # Threading
//!
//! The tracker is not synchronized. All of its methods run on the
//! orchestrating thread; only resolved [`CompletionToken`]s and job
//! bodies cross to the worker pool.

use indexmap::IndexMap;
use warren_core::{BufferId, TrackerError};

use crate::access::AccessSet;
use crate::buffer::{BufferInit, SharedBuffer};
use crate::config::{PoolError, TrackerConfig};
use crate::pool::WorkerPool;
use crate::token::CompletionToken;

/// A unit of parallel work with a compile-time access declaration.
///
/// # Contract
///
/// - `accesses()` lists every buffer `run()` touches, with the right
///   [`Access`](crate::Access) kind. The tracker trusts it; an undeclared
///   access is a data race on the buffer's contents (memory-safe, but
///   unordered).
/// - `run()` may execute on any worker thread.
///
/// ```
/// use warren_jobs::{AccessSet, Job, JobDependencyTracker, SharedBuffer};
///
/// struct Fill {
///     out: SharedBuffer<u32>,
///     value: u32,
/// }
///
/// impl Job for Fill {
///     fn name(&self) -> &str { "fill" }
///     fn accesses(&self) -> AccessSet { AccessSet::new().write(&self.out) }
///     fn run(self) { self.out.write().fill(self.value); }
/// }
///
/// let mut tracker = JobDependencyTracker::linear();
/// let out: SharedBuffer<u32> = SharedBuffer::new(4);
/// tracker.schedule(Fill { out: out.clone(), value: 9 }).unwrap().wait().unwrap();
/// assert_eq!(out.to_vec(), vec![9; 4]);
/// ```
pub trait Job: Send + 'static {
    /// Human-readable name for error reporting and tracing.
    fn name(&self) -> &str;

    /// The buffers this job reads and writes.
    fn accesses(&self) -> AccessSet;

    /// Execute the job.
    fn run(self);
}

/// A [`Job`] built from a closure and an explicit access set.
pub struct FnJob<F> {
    name: String,
    accesses: AccessSet,
    body: F,
}

impl<F> FnJob<F>
where
    F: FnOnce() + Send + 'static,
{
    /// Wrap `body` with the given name and access declaration.
    pub fn new(name: impl Into<String>, accesses: AccessSet, body: F) -> Self {
        Self {
            name: name.into(),
            accesses,
            body,
        }
    }
}

impl<F> Job for FnJob<F>
where
    F: FnOnce() + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn accesses(&self) -> AccessSet {
        self.accesses.clone()
    }

    fn run(self) {
        (self.body)()
    }
}

/// A scheduled job as remembered by a slot.
#[derive(Clone, Debug)]
struct JobRecord {
    token: CompletionToken,
    /// Deduplication key within one dependency computation. Carries no
    /// ordering meaning.
    sequence: u64,
}

/// Hazard state of one buffer.
#[derive(Debug, Default)]
struct TrackedSlot {
    last_writer: Option<JobRecord>,
    /// Readers since `last_writer`. Cleared whenever the writer changes.
    last_readers: Vec<JobRecord>,
    initialized: bool,
    has_write: bool,
}

impl TrackedSlot {
    fn clear(&mut self) {
        self.last_writer = None;
        self.last_readers.clear();
        self.initialized = false;
        self.has_write = false;
    }
}

/// Derives job ordering from declared buffer accesses and runs jobs on a
/// worker pool.
pub struct JobDependencyTracker {
    slots: IndexMap<BufferId, TrackedSlot>,
    /// Cleared slots kept for reuse by the next batch.
    slot_pool: Vec<TrackedSlot>,
    /// Scratch for one dependency computation, keyed by sequence.
    scratch: IndexMap<u64, CompletionToken>,
    next_sequence: u64,
    pool: Option<WorkerPool>,
    linear: bool,
    jobs_scheduled: u64,
}

impl JobDependencyTracker {
    /// Build a tracker with the configured worker pool.
    pub fn new(config: &TrackerConfig) -> Result<Self, PoolError> {
        config.validate()?;
        let workers = config.resolved_worker_count();
        let pool = if workers == 0 {
            None
        } else {
            Some(WorkerPool::new(workers)?)
        };
        let mut tracker = Self::with_pool(pool);
        tracker.linear = config.linear_mode;
        Ok(tracker)
    }

    /// A tracker without worker threads; every job runs synchronously.
    pub fn linear() -> Self {
        Self::with_pool(None)
    }

    fn with_pool(pool: Option<WorkerPool>) -> Self {
        Self {
            slots: IndexMap::new(),
            slot_pool: Vec::new(),
            scratch: IndexMap::new(),
            next_sequence: 1,
            pool,
            linear: false,
            jobs_scheduled: 0,
        }
    }

    // ── Buffers ─────────────────────────────────────────────────

    /// Create a buffer of `len` elements and start tracking it.
    ///
    /// With [`BufferInit::Uninitialized`] the first declared read fails
    /// until some job has written the buffer.
    pub fn new_buffer<T: Clone + Default>(&mut self, len: usize, init: BufferInit) -> SharedBuffer<T> {
        let buffer = SharedBuffer::new(len);
        self.track(buffer.id(), init == BufferInit::Default);
        buffer
    }

    /// Start tracking a buffer created elsewhere.
    ///
    /// Buffers never registered are tracked lazily on first use and
    /// assumed initialized.
    pub fn track(&mut self, buffer: BufferId, initialized: bool) {
        let slot = self.slot_mut(buffer);
        slot.initialized = initialized;
    }

    fn slot_mut(&mut self, buffer: BufferId) -> &mut TrackedSlot {
        let pool = &mut self.slot_pool;
        self.slots.entry(buffer).or_insert_with(|| {
            let mut slot = pool.pop().unwrap_or_default();
            slot.initialized = true;
            slot
        })
    }

    // ── Dependency computation ──────────────────────────────────

    /// Compute the token a job with `accesses` must wait on.
    ///
    /// Fails with [`TrackerError::UninitializedRead`] if the job reads a
    /// buffer that was created uninitialized and has not been written,
    /// unless that access allows uninitialized contents.
    pub fn get_dependencies(
        &mut self,
        job: &str,
        accesses: &AccessSet,
    ) -> Result<CompletionToken, TrackerError> {
        self.scratch.clear();
        for entry in accesses.iter() {
            let slot = {
                let pool = &mut self.slot_pool;
                self.slots.entry(entry.buffer).or_insert_with(|| {
                    let mut slot = pool.pop().unwrap_or_default();
                    slot.initialized = true;
                    slot
                })
            };

            if entry.access.reads() && !slot.initialized && !entry.allow_uninitialized {
                tracing::warn!(job, buffer = %entry.buffer, "read of uninitialized buffer");
                self.scratch.clear();
                return Err(TrackerError::UninitializedRead {
                    buffer: entry.buffer,
                    job: job.to_string(),
                });
            }

            if let Some(writer) = &slot.last_writer {
                self.scratch
                    .entry(writer.sequence)
                    .or_insert_with(|| writer.token.clone());
            }
            if entry.access.writes() {
                for reader in &slot.last_readers {
                    self.scratch
                        .entry(reader.sequence)
                        .or_insert_with(|| reader.token.clone());
                }
            }
        }

        let token = match self.scratch.len() {
            0 => CompletionToken::complete(),
            1 => self.scratch[0].clone(),
            _ => CompletionToken::merge(self.scratch.drain(..).map(|(_, token)| token)),
        };
        self.scratch.clear();
        Ok(token)
    }

    /// Record a job with `accesses` as scheduled behind `token`.
    ///
    /// Writes make the job the buffer's last writer (dropping earlier
    /// reader records, which the job already waits on). Reads append the
    /// job to the buffer's readers.
    pub fn record_scheduled(&mut self, accesses: &AccessSet, token: &CompletionToken) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        for entry in accesses.iter() {
            let slot = self.slot_mut(entry.buffer);
            let record = JobRecord {
                token: token.clone(),
                sequence,
            };
            if entry.access.writes() {
                slot.last_writer = Some(record);
                slot.last_readers.clear();
                slot.initialized = true;
                slot.has_write = true;
            } else {
                slot.last_readers.push(record);
            }
        }
    }

    /// Token over every buffer's last writer.
    ///
    /// Waiting on it makes all scheduled writes visible to the calling
    /// thread.
    pub fn all_writes_dependency(&self) -> CompletionToken {
        CompletionToken::merge(
            self.slots
                .values()
                .filter_map(|slot| slot.last_writer.as_ref())
                .map(|record| record.token.clone()),
        )
    }

    fn all_dependencies(&self) -> CompletionToken {
        CompletionToken::merge(self.slots.values().flat_map(|slot| {
            slot.last_writer
                .iter()
                .chain(slot.last_readers.iter())
                .map(|record| record.token.clone())
        }))
    }

    // ── Scheduling ──────────────────────────────────────────────

    /// Schedule `job` behind its hazards and return its token.
    ///
    /// In linear mode the job runs before this returns and the no-op
    /// token is returned; a panic in the job then propagates to the
    /// caller.
    pub fn schedule<J: Job>(&mut self, job: J) -> Result<CompletionToken, TrackerError> {
        let accesses = job.accesses();
        self.jobs_scheduled += 1;

        if self.is_linear() {
            for entry in accesses.iter().filter(|e| e.access.writes()) {
                if let Some(slot) = self.slots.get_mut(&entry.buffer) {
                    slot.initialized = true;
                }
            }
            tracing::trace!(job = job.name(), "running job inline");
            job.run();
            return Ok(CompletionToken::complete());
        }

        let dependencies = self.get_dependencies(job.name(), &accesses)?;
        let name = job.name().to_string();
        tracing::trace!(
            job = %name,
            waits_on = dependencies.job_count(),
            "scheduling job"
        );
        let token = match &self.pool {
            Some(pool) => pool.spawn(name, dependencies, Box::new(move || job.run())),
            None => {
                // Unreachable: is_linear() is true without a pool.
                job.run();
                CompletionToken::complete()
            }
        };
        self.record_scheduled(&accesses, &token);
        Ok(token)
    }

    // ── Modes and lifetime ──────────────────────────────────────

    /// Whether jobs currently run synchronously at schedule time.
    ///
    /// Always true when the tracker has no worker threads.
    pub fn is_linear(&self) -> bool {
        self.linear || self.pool.is_none()
    }

    /// Switch linear mode on or off.
    ///
    /// Switching on first waits for every scheduled write, so inline jobs
    /// never overlap queued ones.
    pub fn set_linear_mode(&mut self, linear: bool) -> Result<(), TrackerError> {
        if linear && !self.linear {
            self.all_writes_dependency().wait()?;
            tracing::debug!("tracker switched to linear mode");
        }
        self.linear = linear;
        Ok(())
    }

    /// Forget all hazard state so the next batch starts clean.
    ///
    /// Waits for every outstanding job first, so no job from the old batch
    /// can overlap one from the next. Slot storage is kept for reuse.
    pub fn reset(&mut self) -> Result<(), TrackerError> {
        let outstanding = self.all_dependencies();
        let result = outstanding.wait();
        for (_, mut slot) in self.slots.drain(..) {
            slot.clear();
            self.slot_pool.push(slot);
        }
        self.next_sequence = 1;
        result
    }

    /// Number of buffers currently tracked.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether `buffer` has been written by a tracked job since the last
    /// reset.
    pub fn has_write(&self, buffer: BufferId) -> bool {
        self.slots.get(&buffer).is_some_and(|slot| slot.has_write)
    }

    /// Total jobs scheduled over the tracker's lifetime.
    pub fn jobs_scheduled(&self) -> u64 {
        self.jobs_scheduled
    }

    /// Number of worker threads (0 when always linear).
    pub fn worker_count(&self) -> usize {
        self.pool.as_ref().map_or(0, WorkerPool::worker_count)
    }
}

impl Default for JobDependencyTracker {
    fn default() -> Self {
        Self::linear()
    }
}
