//! Automatic hazard tracking and parallel job scheduling.
//!
//! Jobs declare which shared buffers they read and write through the
//! [`Job`] trait. The [`JobDependencyTracker`] turns those declarations
//! into the minimal set of earlier jobs each new job must wait for
//! (write-after-write, write-after-read, read-after-write) and hands the
//! job to a [`WorkerPool`] gated on that set.
//!
//! ```text
//! JobDependencyTracker (orchestrating thread only)
//! ├── IndexMap<BufferId, TrackedSlot>   last writer + readers per buffer
//! ├── WorkerPool                          FIFO crossbeam queue, N threads
//! └── CompletionToken                     no-op | single | merged wait-for-all
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod access;
pub mod buffer;
pub mod config;
pub mod pool;
pub mod token;
pub mod tracker;

pub use access::{Access, AccessSet, BufferAccess};
pub use buffer::{BufferInit, SharedBuffer};
pub use config::{PoolError, TrackerConfig};
pub use pool::WorkerPool;
pub use token::CompletionToken;
pub use tracker::{FnJob, Job, JobDependencyTracker};
