//! [`NavWorld`]: the context object tying the three parts together.
//!
//! A world owns the host graph, its connectivity hierarchy, the job
//! dependency tracker, the work-item queue and the batch listeners. One
//! world per host graph; nothing here is global.

use warren_core::{AreaId, HostGraph, NodeId, SchedulerError};
use warren_hierarchy::HierarchicalGraph;
use warren_jobs::JobDependencyTracker;

use crate::config::{ConfigError, WorldConfig};
use crate::events::{BatchEvent, EventBus, ListenerId};
use crate::metrics::BatchMetrics;
use crate::processor::{Services, WorkItemProcessor};
use crate::work_item::WorkItem;

/// A host graph plus everything that keeps it queryable while it changes.
///
/// # Examples
///
/// ```
/// use warren_core::NodeId;
/// use warren_engine::{FnWorkItem, NavWorld, WorldConfig};
/// use warren_test_utils::AdjacencyGraph;
///
/// let mut world = NavWorld::new(AdjacencyGraph::with_nodes(2), WorldConfig::linear()).unwrap();
/// world.scan().unwrap();
/// assert!(!world.is_reachable(NodeId(0), NodeId(1)));
///
/// world.enqueue(FnWorkItem::<AdjacencyGraph>::once("connect", |ctx| {
///     ctx.graph_mut().add_edge(NodeId(0), NodeId(1));
///     ctx.mark_dirty(NodeId(0));
///     ctx.mark_dirty(NodeId(1));
///     Ok(())
/// }));
/// assert!(world.process_work_items(false, true).unwrap());
/// assert!(world.is_reachable(NodeId(0), NodeId(1)));
/// ```
pub struct NavWorld<G: HostGraph> {
    graph: G,
    hierarchy: HierarchicalGraph,
    tracker: JobDependencyTracker,
    processor: WorkItemProcessor<G>,
    events: EventBus,
    full_scan: bool,
}

impl<G: HostGraph + 'static> NavWorld<G> {
    /// Build a world around `graph`.
    ///
    /// The hierarchy starts empty; call [`scan`](Self::scan) before the
    /// first reachability query.
    pub fn new(graph: G, config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracker = JobDependencyTracker::new(&config.tracker)?;
        let hierarchy = HierarchicalGraph::new(config.hierarchy)?;
        tracing::debug!(
            nodes = graph.node_count(),
            workers = tracker.worker_count(),
            "nav world created"
        );
        Ok(Self {
            graph,
            hierarchy,
            tracker,
            processor: WorkItemProcessor::new(),
            events: EventBus::default(),
            full_scan: false,
        })
    }

    /// The host graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// The connectivity hierarchy.
    pub fn hierarchy(&self) -> &HierarchicalGraph {
        &self.hierarchy
    }

    /// The dependency tracker.
    pub fn tracker(&self) -> &JobDependencyTracker {
        &self.tracker
    }

    /// The dependency tracker, for allocating buffers or scheduling jobs
    /// outside any work item.
    ///
    /// The tracker is reset whenever a batch closes, so buffers tracked
    /// here are forgotten at the next close.
    pub fn tracker_mut(&mut self) -> &mut JobDependencyTracker {
        &mut self.tracker
    }

    /// Give the host graph back, discarding the hierarchy.
    pub fn into_graph(self) -> G {
        self.graph
    }

    /// Queue a work item.
    pub fn enqueue<W>(&mut self, item: W)
    where
        W: WorkItem<G> + 'static,
    {
        self.processor.enqueue(Box::new(item));
    }

    /// The work-item queue, for inspecting progress.
    pub fn processor(&self) -> &WorkItemProcessor<G> {
        &self.processor
    }

    /// Queued work items, including one that is partway through.
    pub fn pending_work_items(&self) -> usize {
        self.processor.len()
    }

    /// Drive queued work items.
    ///
    /// Returns `Ok(false)` when an item is still pending (call again
    /// later) and `Ok(true)` once the queue has drained. With
    /// `send_events` set, a drained batch that dirtied the graph then
    /// repairs connectivity and notifies listeners; without it, that
    /// bookkeeping waits for the next call that has it set.
    pub fn process_work_items(
        &mut self,
        force: bool,
        send_events: bool,
    ) -> Result<bool, SchedulerError> {
        let mut services = Services {
            graph: &mut self.graph,
            hierarchy: &mut self.hierarchy,
            tracker: &mut self.tracker,
            events: &mut self.events,
            full_scan: self.full_scan,
        };
        self.processor.process(&mut services, force, send_events)
    }

    /// Run every queued item to completion and close the batch.
    pub fn flush_work_items(&mut self) -> Result<(), SchedulerError> {
        self.process_work_items(true, true).map(|_| ())
    }

    /// Rebuild connectivity for the whole graph.
    ///
    /// Runs in full-scan mode: queued items are flushed without
    /// [`BatchEvent::BeforeBatch`], then every live node is reclassified.
    pub fn scan(&mut self) -> Result<(), SchedulerError> {
        let previous = self.full_scan;
        self.full_scan = true;
        self.hierarchy.mark_all_dirty(&mut self.graph);
        self.processor.note_graph_dirty();
        let result = self.flush_work_items();
        self.full_scan = previous;
        result
    }

    /// Enter or leave full-scan mode, which suppresses
    /// [`BatchEvent::BeforeBatch`].
    pub fn set_full_scan(&mut self, full_scan: bool) {
        self.full_scan = full_scan;
    }

    /// Whether the world is in full-scan mode.
    pub fn is_full_scan(&self) -> bool {
        self.full_scan
    }

    /// Register a batch listener.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(BatchEvent) + 'static,
    {
        self.events.subscribe(Box::new(listener))
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Area of `node` as of the last recalculation.
    pub fn area_of(&self, node: NodeId) -> Option<AreaId> {
        self.hierarchy.area_of(&self.graph, node)
    }

    /// Whether a walkable path joins `a` and `b`, as of the last
    /// recalculation.
    pub fn is_reachable(&self, a: NodeId, b: NodeId) -> bool {
        self.hierarchy.is_reachable(&self.graph, a, b)
    }

    /// Metrics of the most recently closed batch.
    pub fn last_metrics(&self) -> &BatchMetrics {
        self.processor.last_metrics()
    }
}

impl<G: HostGraph> std::fmt::Debug for NavWorld<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavWorld")
            .field("nodes", &self.graph.node_count())
            .field("clusters", &self.hierarchy.cluster_count())
            .field("processor", &self.processor)
            .field("full_scan", &self.full_scan)
            .finish()
    }
}
