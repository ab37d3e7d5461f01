//! Completion tokens: "this work has finished" handles.
//!
//! A [`CompletionToken`] is either the no-op token, the signal of one
//! scheduled job, or a merged "wait for all of these" token. Tokens are
//! cheap to clone (`Arc` bumps) and `Send + Sync`, so the orchestrating
//! thread can hand resolved dependency sets to worker threads.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

use smallvec::SmallVec;
use warren_core::TrackerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SignalState {
    Pending,
    Done,
    Panicked,
}

/// Completion state of one job, shared between the worker that runs it
/// and every token that waits on it.
#[derive(Debug)]
pub(crate) struct JobSignal {
    job: String,
    state: Mutex<SignalState>,
    finished: Condvar,
}

impl JobSignal {
    fn new(job: String) -> Self {
        Self {
            job,
            state: Mutex::new(SignalState::Pending),
            finished: Condvar::new(),
        }
    }

    fn state(&self) -> SignalState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, next: SignalState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == SignalState::Pending {
            *state = next;
            self.finished.notify_all();
        }
    }

    fn wait(&self) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while *state == SignalState::Pending {
            state = self
                .finished
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        match *state {
            SignalState::Panicked => Err(TrackerError::JobPanicked {
                job: self.job.clone(),
            }),
            _ => Ok(()),
        }
    }
}

// Compile-time assertion: tokens cross to worker threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<CompletionToken>();
};

/// Write side of a job's signal, owned by whoever runs the job.
///
/// Dropping a completer that was never finished marks the job as
/// panicked, so a worker that unwinds past it cannot leave dependents
/// waiting forever.
#[derive(Debug)]
pub(crate) struct Completer {
    signal: Arc<JobSignal>,
}

impl Completer {
    /// Mark the job as finished, successfully or not.
    pub(crate) fn finish(self, panicked: bool) {
        let next = if panicked {
            SignalState::Panicked
        } else {
            SignalState::Done
        };
        self.signal.set(next);
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        // No-op when finish() already ran: set() ignores non-pending states.
        self.signal.set(SignalState::Panicked);
    }
}

#[derive(Clone, Debug)]
enum TokenInner {
    Complete,
    Single(Arc<JobSignal>),
    All(Arc<[Arc<JobSignal>]>),
}

/// Opaque handle representing "when this work finishes".
#[derive(Clone, Debug)]
pub struct CompletionToken {
    inner: TokenInner,
}

impl CompletionToken {
    /// The no-op token: already complete, waiting returns immediately.
    pub fn complete() -> Self {
        Self {
            inner: TokenInner::Complete,
        }
    }

    /// A fresh pending token for `job` and the completer that resolves it.
    pub(crate) fn pending(job: impl Into<String>) -> (Self, Completer) {
        let signal = Arc::new(JobSignal::new(job.into()));
        let token = Self {
            inner: TokenInner::Single(Arc::clone(&signal)),
        };
        (token, Completer { signal })
    }

    /// Combine tokens into one that completes when all of them have.
    ///
    /// Returns the no-op token for an empty input and the sole token
    /// unchanged for a single input.
    pub fn merge<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = CompletionToken>,
    {
        let mut signals: SmallVec<[Arc<JobSignal>; 8]> = SmallVec::new();
        for token in tokens {
            for signal in token.signals() {
                if !signals.iter().any(|s| Arc::ptr_eq(s, signal)) {
                    signals.push(Arc::clone(signal));
                }
            }
        }
        match signals.len() {
            0 => Self::complete(),
            1 => Self {
                inner: TokenInner::Single(signals.remove(0)),
            },
            _ => Self {
                inner: TokenInner::All(signals.into_vec().into()),
            },
        }
    }

    fn signals(&self) -> &[Arc<JobSignal>] {
        match &self.inner {
            TokenInner::Complete => &[],
            TokenInner::Single(signal) => std::slice::from_ref(signal),
            TokenInner::All(signals) => signals,
        }
    }

    /// Whether every job behind this token has finished. Never blocks.
    pub fn is_complete(&self) -> bool {
        self.signals()
            .iter()
            .all(|s| s.state() != SignalState::Pending)
    }

    /// Block until every job behind this token has finished.
    ///
    /// All jobs are waited for even when one of them panicked; the first
    /// panic is then reported as [`TrackerError::JobPanicked`].
    pub fn wait(&self) -> Result<(), TrackerError> {
        let mut first_error = None;
        for signal in self.signals() {
            if let Err(e) = signal.wait() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of distinct jobs this token waits on.
    pub fn job_count(&self) -> usize {
        self.signals().len()
    }

    /// Whether waiting on `self` also waits on every job behind `other`.
    ///
    /// Vacuously true when `other` is the no-op token.
    pub fn includes(&self, other: &CompletionToken) -> bool {
        let mine = self.signals();
        other
            .signals()
            .iter()
            .all(|theirs| mine.iter().any(|s| Arc::ptr_eq(s, theirs)))
    }
}

impl Default for CompletionToken {
    fn default() -> Self {
        Self::complete()
    }
}
