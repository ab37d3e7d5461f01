//! Recalculation instrumentation.

use std::time::Duration;

/// Work done by one [`recalculate_if_necessary`] pass that found dirty
/// nodes.
///
/// [`recalculate_if_necessary`]: crate::HierarchicalGraph::recalculate_if_necessary
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Dirty nodes the pass started with.
    pub dirty_nodes: usize,
    /// Clusters freed, including cascaded clean neighbours.
    pub clusters_torn_down: usize,
    /// Of those, clean neighbours torn down by the small-cluster cascade.
    pub clusters_cascaded: usize,
    /// Clusters grown by BFS.
    pub clusters_created: usize,
    /// Nodes assigned to a new cluster.
    pub nodes_reclassified: usize,
    /// Areas after the flood fill.
    pub areas: usize,
    /// Wall-clock time of the pass.
    pub duration: Duration,
}

/// Cumulative counters plus the most recent pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecalculationStats {
    /// Passes that did work.
    pub recalculations: u64,
    /// Clusters freed across all passes.
    pub total_clusters_torn_down: u64,
    /// Nodes reclassified across all passes.
    pub total_nodes_reclassified: u64,
    /// The most recent pass that did work.
    pub last: PassStats,
}

impl RecalculationStats {
    pub(crate) fn record(&mut self, pass: PassStats) {
        self.recalculations += 1;
        self.total_clusters_torn_down += pass.clusters_torn_down as u64;
        self.total_nodes_reclassified += pass.nodes_reclassified as u64;
        self.last = pass;
    }
}
