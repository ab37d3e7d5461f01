//! The work-item queue and the context handed to running items.
//!
//! # Batches
//!
//! A batch opens when `process` first finds queued work and closes when
//! the queue drains on a call with `send_events` set. Between the two it
//! may span any number of `process` calls. Closing a batch that dirtied
//! the graph fires [`BatchEvent::BeforeAreaRecalculation`], repairs
//! connectivity once, then fires [`BatchEvent::AfterUpdate`]. Every
//! close also waits for outstanding jobs and resets the dependency
//! tracker.
//!
//! # Reentrancy
//!
//! While an item runs, the processor is lent to its
//! [`WorkItemContext`]. Asking that context to process the queue again
//! hits the guard and returns [`SchedulerError::Reentrant`]: an item
//! cannot wait on the queue it is part of.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use warren_core::{HostGraph, NodeId, SchedulerError, WorkItemError};
use warren_hierarchy::HierarchicalGraph;
use warren_jobs::JobDependencyTracker;

use crate::events::{BatchEvent, EventBus};
use crate::metrics::BatchMetrics;
use crate::work_item::{ItemState, Progress, QueuedItem, WorkItem};

/// Everything a batch mutates besides the queue itself.
pub(crate) struct Services<'a, G> {
    pub(crate) graph: &'a mut G,
    pub(crate) hierarchy: &'a mut HierarchicalGraph,
    pub(crate) tracker: &'a mut JobDependencyTracker,
    pub(crate) events: &'a mut EventBus,
    pub(crate) full_scan: bool,
}

#[derive(Debug, Default)]
struct BatchState {
    open: bool,
    started: Option<Instant>,
    graph_dirty: bool,
    before_batch_sent: bool,
    metrics: BatchMetrics,
}

/// FIFO of pending work items with a reentrancy guard.
///
/// Owned by a [`NavWorld`](crate::NavWorld), which drives it; outside the
/// crate it is inspect-only, through
/// [`NavWorld::processor`](crate::NavWorld::processor).
pub struct WorkItemProcessor<G: HostGraph> {
    queue: VecDeque<QueuedItem<G>>,
    processing: bool,
    batch: BatchState,
    last_metrics: BatchMetrics,
}

impl<G: HostGraph> WorkItemProcessor<G> {
    /// An idle processor with an empty queue.
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            processing: false,
            batch: BatchState::default(),
            last_metrics: BatchMetrics::default(),
        }
    }

    /// Append `item` to the back of the queue.
    pub(crate) fn enqueue(&mut self, item: Box<dyn WorkItem<G>>) {
        self.queue.push_back(QueuedItem::new(item));
    }

    /// Items waiting, including one that is partway through.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether a `process` call is on the stack.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Lifecycle state of the front item.
    pub fn front_state(&self) -> Option<ItemState> {
        self.queue.front().map(|entry| entry.state)
    }

    /// Whether a batch has started and not yet closed.
    pub fn batch_open(&self) -> bool {
        self.batch.open
    }

    /// Metrics of the most recently closed batch.
    pub fn last_metrics(&self) -> &BatchMetrics {
        &self.last_metrics
    }

    fn open_batch(&mut self) {
        if !self.batch.open {
            self.batch.open = true;
            self.batch.started = Some(Instant::now());
            tracing::debug!(queued = self.queue.len(), "work item batch opened");
        }
    }

    /// Record a graph mutation made outside any work item, so the next
    /// batch close repairs connectivity.
    pub(crate) fn note_graph_dirty(&mut self) {
        self.open_batch();
        self.batch.graph_dirty = true;
    }

    /// Drive the queue. Returns `Ok(true)` once the queue has drained.
    ///
    /// The guard is released on every exit path, including a panic in an
    /// item, which is then resumed.
    pub(crate) fn process(
        &mut self,
        services: &mut Services<'_, G>,
        force: bool,
        send_events: bool,
    ) -> Result<bool, SchedulerError> {
        if self.processing {
            tracing::warn!("work item queue processed from inside a work item");
            return Err(SchedulerError::Reentrant);
        }
        self.processing = true;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run(services, force, send_events)
        }));
        self.processing = false;
        result.unwrap_or_else(|payload| panic::resume_unwind(payload))
    }

    fn run(
        &mut self,
        services: &mut Services<'_, G>,
        force: bool,
        send_events: bool,
    ) -> Result<bool, SchedulerError> {
        if !self.queue.is_empty() {
            self.open_batch();
        }
        if self.batch.open {
            self.batch.metrics.process_calls += 1;
        }

        // The front item is taken out while it runs so its context can
        // lend the rest of the processor; a pending item goes back first.
        while let Some(mut entry) = self.queue.pop_front() {
            match self.step(&mut entry, services, force) {
                Ok(Progress::Done) => {
                    self.batch.metrics.items_completed += 1;
                    tracing::trace!(item = entry.name(), "work item done");
                }
                Ok(Progress::Pending) if !force => {
                    self.queue.push_front(entry);
                    return Ok(false);
                }
                Ok(Progress::Pending) => {
                    let name = entry.name().to_string();
                    tracing::warn!(item = %name, "forced work item did not finish");
                    return Err(SchedulerError::ForcedItemUnfinished { name });
                }
                Err(source) => {
                    let name = entry.name().to_string();
                    tracing::warn!(item = %name, error = %source, "work item failed");
                    return Err(SchedulerError::WorkItemFailed { name, source });
                }
            }
        }

        if send_events && self.batch.open {
            self.close_batch(services)?;
        }
        Ok(true)
    }

    fn step(
        &mut self,
        entry: &mut QueuedItem<G>,
        services: &mut Services<'_, G>,
        force: bool,
    ) -> Result<Progress, WorkItemError> {
        let mut ctx = WorkItemContext {
            graph: &mut *services.graph,
            hierarchy: &mut *services.hierarchy,
            tracker: &mut *services.tracker,
            events: &mut *services.events,
            full_scan: services.full_scan,
            processor: self,
        };
        if entry.state == ItemState::NotStarted {
            ctx.processor.batch.metrics.inits += 1;
            entry.item.init(&mut ctx)?;
            entry.state = ItemState::InProgress { updates: 0 };
        }
        if let ItemState::InProgress { updates } = &mut entry.state {
            *updates += 1;
        }
        ctx.processor.batch.metrics.updates += 1;
        entry.item.update(&mut ctx, force)
    }

    /// Close the batch: drain and clear the tracker, then repair
    /// connectivity if the batch dirtied the graph.
    ///
    /// A panicked job is reported only after the repair and both
    /// recalculation events, and its records are cleared with the rest,
    /// so the next batch starts clean.
    fn close_batch(&mut self, services: &mut Services<'_, G>) -> Result<(), SchedulerError> {
        let mut batch = mem::take(&mut self.batch);
        let start = Instant::now();
        if batch.graph_dirty {
            services.events.emit(BatchEvent::BeforeAreaRecalculation);
        }
        let drained = services.tracker.reset();
        if batch.graph_dirty {
            services.hierarchy.recalculate_if_necessary(&mut *services.graph);
            services.events.emit(BatchEvent::AfterUpdate);
            batch.metrics.recalculated = true;
            batch.metrics.recalculation_us = start.elapsed().as_micros() as u64;
        }
        if let Some(started) = batch.started {
            batch.metrics.total_us = started.elapsed().as_micros() as u64;
        }
        tracing::debug!(
            items = batch.metrics.items_completed,
            process_calls = batch.metrics.process_calls,
            recalculated = batch.metrics.recalculated,
            total_us = batch.metrics.total_us,
            "work item batch closed"
        );
        self.last_metrics = batch.metrics;
        drained.map_err(|e| {
            tracing::warn!(error = %e, "job panicked during the batch");
            SchedulerError::JobPanicked(e)
        })
    }
}

impl<G: HostGraph> fmt::Debug for WorkItemProcessor<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItemProcessor")
            .field("queued", &self.queue.len())
            .field("processing", &self.processing)
            .field("batch_open", &self.batch.open)
            .finish()
    }
}

/// Mutation context handed to a running work item.
///
/// Changes to node walkability or connections must be followed by
/// [`mark_dirty`](Self::mark_dirty) for each affected node.
pub struct WorkItemContext<'a, G: HostGraph> {
    graph: &'a mut G,
    hierarchy: &'a mut HierarchicalGraph,
    tracker: &'a mut JobDependencyTracker,
    events: &'a mut EventBus,
    processor: &'a mut WorkItemProcessor<G>,
    full_scan: bool,
}

impl<G: HostGraph> WorkItemContext<'_, G> {
    /// The host graph.
    pub fn graph(&self) -> &G {
        &*self.graph
    }

    /// The host graph, for mutation.
    pub fn graph_mut(&mut self) -> &mut G {
        &mut *self.graph
    }

    /// The connectivity hierarchy. Reflects the graph as of the last
    /// recalculation.
    pub fn hierarchy(&self) -> &HierarchicalGraph {
        &*self.hierarchy
    }

    /// The dependency tracker, for scheduling parallel jobs. Its records
    /// are cleared when the batch closes.
    pub fn tracker(&mut self) -> &mut JobDependencyTracker {
        &mut *self.tracker
    }

    /// Whether the world is running its initial full scan.
    pub fn is_full_scan(&self) -> bool {
        self.full_scan
    }

    /// Queue `node` for reclassification and flag the batch as having
    /// dirtied the graph.
    pub fn mark_dirty(&mut self, node: NodeId) {
        self.hierarchy.mark_dirty(&mut *self.graph, node);
        self.processor.batch.graph_dirty = true;
        self.processor.batch.metrics.nodes_marked_dirty += 1;
    }

    /// Announce that this item is about to mutate the graph.
    ///
    /// Fires [`BatchEvent::BeforeBatch`] the first time any item of the
    /// batch calls it, unless the world is in full-scan mode.
    pub fn prepare_for_update(&mut self) {
        if self.processor.batch.before_batch_sent {
            return;
        }
        self.processor.batch.before_batch_sent = true;
        if !self.full_scan {
            self.events.emit(BatchEvent::BeforeBatch);
        }
    }

    /// Bring connectivity up to date mid-batch.
    ///
    /// Waits for every scheduled write so the graph is stable, then
    /// recalculates the hierarchy if any node is dirty.
    pub fn ensure_valid_flood_fill(&mut self) -> Result<(), WorkItemError> {
        self.tracker.all_writes_dependency().wait()?;
        self.hierarchy.recalculate_if_necessary(&mut *self.graph);
        Ok(())
    }

    /// Append `item` to the back of the queue. It runs in this batch,
    /// after everything already queued.
    pub fn enqueue<W>(&mut self, item: W)
    where
        W: WorkItem<G> + 'static,
    {
        self.processor.enqueue(Box::new(item));
    }

    /// Try to drain the queue from inside an item.
    ///
    /// Always fails with [`SchedulerError::Reentrant`]: the calling item
    /// is itself part of the queue.
    pub fn flush_work_items(&mut self, force: bool) -> Result<bool, SchedulerError> {
        let mut services = Services {
            graph: &mut *self.graph,
            hierarchy: &mut *self.hierarchy,
            tracker: &mut *self.tracker,
            events: &mut *self.events,
            full_scan: self.full_scan,
        };
        self.processor.process(&mut services, force, true)
    }
}

impl<G: HostGraph> fmt::Debug for WorkItemContext<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItemContext")
            .field("processor", &self.processor)
            .field("full_scan", &self.full_scan)
            .finish()
    }
}
