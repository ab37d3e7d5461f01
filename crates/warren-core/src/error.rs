//! Error types for the Warren graph-update core.
//!
//! Organized by subsystem: dependency tracking, work items, and the
//! work-item scheduler. Every variant here is a contract violation or a
//! failure of caller-supplied code; "not done yet" is never an error.

use std::error::Error;
use std::fmt;

use crate::id::BufferId;

/// Errors from the job dependency tracker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackerError {
    /// A job declared a read of a buffer that nothing has written yet and
    /// did not opt in to reading uninitialized contents.
    UninitializedRead {
        /// The buffer that was read.
        buffer: BufferId,
        /// Name of the job that declared the read.
        job: String,
    },
    /// A job panicked on a worker thread. Its completion token was still
    /// signalled so dependents were not deadlocked.
    JobPanicked {
        /// Name of the job that panicked.
        job: String,
    },
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UninitializedRead { buffer, job } => {
                write!(
                    f,
                    "job '{job}' reads {buffer} before any job has written it \
                     (declare the access with allow_uninitialized if intended)"
                )
            }
            Self::JobPanicked { job } => write!(f, "job '{job}' panicked"),
        }
    }
}

impl Error for TrackerError {}

/// Errors returned by a work item's `init` or `update`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkItemError {
    /// The work item failed for a reason of its own.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Scheduling a job from inside the work item failed.
    Tracker(TrackerError),
}

impl WorkItemError {
    /// Convenience constructor for [`WorkItemError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for WorkItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "work item failed: {reason}"),
            Self::Tracker(e) => write!(f, "job scheduling failed: {e}"),
        }
    }
}

impl Error for WorkItemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tracker(e) => Some(e),
            Self::Failed { .. } => None,
        }
    }
}

impl From<TrackerError> for WorkItemError {
    fn from(e: TrackerError) -> Self {
        Self::Tracker(e)
    }
}

/// Errors from the work-item scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// Batch processing was started while a batch was already being
    /// processed, typically a work item waiting on its own queue.
    Reentrant,
    /// A work item reported "not done" on a forced update.
    ForcedItemUnfinished {
        /// Name of the offending work item.
        name: String,
    },
    /// A work item's `init` or `update` failed. The item was dequeued.
    WorkItemFailed {
        /// Name of the failing work item.
        name: String,
        /// The underlying error.
        source: WorkItemError,
    },
    /// Outstanding jobs were drained before a recalculation and one of
    /// them had panicked.
    JobPanicked(TrackerError),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reentrant => write!(
                f,
                "work items are already being processed; \
                 a work item cannot wait on its own queue"
            ),
            Self::ForcedItemUnfinished { name } => {
                write!(f, "work item '{name}' did not finish on a forced update")
            }
            Self::WorkItemFailed { name, source } => {
                write!(f, "work item '{name}' failed: {source}")
            }
            Self::JobPanicked(e) => write!(f, "draining outstanding jobs: {e}"),
        }
    }
}

impl Error for SchedulerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WorkItemFailed { source, .. } => Some(source),
            Self::JobPanicked(e) => Some(e),
            _ => None,
        }
    }
}
