//! Per-batch scheduler metrics.
//!
//! [`BatchMetrics`] covers one batch: from the first `process` call that
//! found queued work to the call that drained the queue and ran the
//! end-of-batch bookkeeping.

/// Counters and timings for one completed batch.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchMetrics {
    /// `process` calls the batch spanned.
    pub process_calls: u32,
    /// Items retired as done.
    pub items_completed: u32,
    /// `init` calls.
    pub inits: u32,
    /// `update` calls, including pending ones.
    pub updates: u32,
    /// Nodes marked dirty through a work-item context.
    pub nodes_marked_dirty: u32,
    /// Whether end-of-batch connectivity repair ran.
    pub recalculated: bool,
    /// Wall-clock time from the batch's first `process` call to the end
    /// of its bookkeeping.
    pub total_us: u64,
    /// Time spent waiting for outstanding jobs and recalculating
    /// connectivity at the end of the batch.
    pub recalculation_us: u64,
}
