//! Tracker and worker-pool configuration.

use std::error::Error;
use std::fmt;

/// Configuration for a [`JobDependencyTracker`](crate::JobDependencyTracker).
#[derive(Clone, Debug, Default)]
pub struct TrackerConfig {
    /// Number of worker threads. `None` = auto-detect
    /// (`available_parallelism - 1`, clamped to `[1, 16]`, leaving the
    /// orchestrating thread its own core). `Some(0)` disables the pool
    /// and forces linear mode.
    pub worker_count: Option<usize>,
    /// Start in linear mode: every job runs synchronously at schedule
    /// time. Default: false.
    pub linear_mode: bool,
}

impl TrackerConfig {
    /// Upper bound on an explicit worker count.
    pub const MAX_WORKERS: usize = 64;

    /// A config with no worker threads (always linear).
    pub fn linear() -> Self {
        Self {
            worker_count: Some(0),
            linear_mode: true,
        }
    }

    /// A config with exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self {
            worker_count: Some(n),
            linear_mode: false,
        }
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n,
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                cpus.saturating_sub(1).clamp(1, 16)
            }
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), PoolError> {
        match self.worker_count {
            Some(n) if n > Self::MAX_WORKERS => Err(PoolError::TooManyWorkers {
                configured: n,
                max: Self::MAX_WORKERS,
            }),
            _ => Ok(()),
        }
    }
}

/// Errors from worker-pool construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// The explicit worker count is above [`TrackerConfig::MAX_WORKERS`].
    TooManyWorkers {
        /// The configured count.
        configured: usize,
        /// The allowed maximum.
        max: usize,
    },
    /// A worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of the OS error.
        reason: String,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyWorkers { configured, max } => {
                write!(f, "worker_count {configured} exceeds maximum of {max}")
            }
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "worker thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for PoolError {}
