//! The cluster graph and its incremental recalculation.
//!
//! Clusters live in an arena indexed by [`ClusterId`]; index 0 is the
//! unassigned sentinel and never holds members. Freed ids go on a free
//! list and are reused before the arena grows.

use std::collections::VecDeque;
use std::mem;
use std::time::Instant;

use smallvec::SmallVec;
use warren_core::{AreaId, ClusterId, HostGraph, NodeId};

use crate::config::{HierarchyConfig, HierarchyError};
use crate::stats::{PassStats, RecalculationStats};

type ClusterLinks = SmallVec<[ClusterId; 8]>;

/// Clusters of walkable nodes, their adjacency, and the area each
/// cluster's connected component was labelled with.
///
/// The host graph owns the per-node back-reference and dirty flag (see
/// [`HostGraph`]); every method that touches nodes takes the host graph
/// as a parameter, so the two structures never alias.
#[derive(Debug)]
pub struct HierarchicalGraph {
    config: HierarchyConfig,
    /// Member nodes per cluster. Empty for the sentinel and freed ids.
    children: Vec<Vec<NodeId>>,
    /// Adjacent clusters, symmetric.
    connections: Vec<ClusterLinks>,
    areas: Vec<AreaId>,
    cluster_dirty: Vec<bool>,
    free: Vec<ClusterId>,
    dirty_nodes: Vec<NodeId>,
    area_count: usize,
    version: u64,
    stats: RecalculationStats,
    // Scratch, kept between passes for its capacity.
    bfs: VecDeque<NodeId>,
    teardown: Vec<(ClusterId, bool)>,
    fill: Vec<ClusterId>,
}

impl HierarchicalGraph {
    /// An empty hierarchy. Every node starts unassigned; mark nodes
    /// dirty (or call [`mark_all_dirty`](Self::mark_all_dirty)) to have
    /// them clustered on the next recalculation.
    pub fn new(config: HierarchyConfig) -> Result<Self, HierarchyError> {
        config.validate()?;
        Ok(Self {
            config,
            children: vec![Vec::new()],
            connections: vec![ClusterLinks::new()],
            areas: vec![AreaId::NONE],
            cluster_dirty: vec![false],
            free: Vec::new(),
            dirty_nodes: Vec::new(),
            area_count: 0,
            version: 0,
            stats: RecalculationStats::default(),
            bfs: VecDeque::new(),
            teardown: Vec::new(),
            fill: Vec::new(),
        })
    }

    /// The configuration this hierarchy was built with.
    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Queue `node` for reclassification. Idempotent.
    ///
    /// Hosts call this for created and destroyed nodes, for walkability
    /// changes, and for both endpoints of an added or removed edge.
    pub fn mark_dirty<G: HostGraph>(&mut self, graph: &mut G, node: NodeId) {
        if graph.is_dirty(node) {
            return;
        }
        graph.set_dirty(node, true);
        self.dirty_nodes.push(node);
    }

    /// Queue every live node of `graph`, forcing a full rebuild.
    pub fn mark_all_dirty<G: HostGraph>(&mut self, graph: &mut G) {
        for index in 0..graph.node_count() {
            let node = NodeId(index as u32);
            if !graph.is_destroyed(node) {
                self.mark_dirty(graph, node);
            }
        }
    }

    /// Whether dirty nodes are waiting for a recalculation.
    pub fn has_pending_work(&self) -> bool {
        !self.dirty_nodes.is_empty()
    }

    /// Number of nodes currently queued.
    pub fn dirty_node_count(&self) -> usize {
        self.dirty_nodes.len()
    }

    /// Bring clusters and areas up to date with the host graph.
    ///
    /// Returns `false` without touching anything when no node is dirty.
    /// Otherwise rebuilds the clusters owning dirty nodes, re-labels
    /// areas, bumps [`version`](Self::version) and returns `true`.
    pub fn recalculate_if_necessary<G: HostGraph>(&mut self, graph: &mut G) -> bool {
        if self.dirty_nodes.is_empty() {
            return false;
        }
        let start = Instant::now();
        let mut pass = PassStats {
            dirty_nodes: self.dirty_nodes.len(),
            ..PassStats::default()
        };

        self.collect_dirty_clusters(graph);
        self.tear_down_dirty_clusters(graph, &mut pass);
        self.grow_clusters(graph, &mut pass);

        for node in self.dirty_nodes.drain(..) {
            graph.set_dirty(node, false);
        }

        self.assign_areas();
        self.version += 1;

        pass.areas = self.area_count;
        pass.duration = start.elapsed();
        tracing::debug!(
            version = self.version,
            dirty_nodes = pass.dirty_nodes,
            torn_down = pass.clusters_torn_down,
            created = pass.clusters_created,
            reclassified = pass.nodes_reclassified,
            areas = pass.areas,
            "hierarchy recalculated"
        );
        self.stats.record(pass);
        true
    }

    /// Flag every cluster that owns a dirty node, and drop destroyed
    /// nodes from the dirty list once their cluster is flagged.
    fn collect_dirty_clusters<G: HostGraph>(&mut self, graph: &mut G) {
        let mut kept = 0;
        for i in 0..self.dirty_nodes.len() {
            let node = self.dirty_nodes[i];
            let cluster = graph.cluster(node);
            if self.is_live(cluster) && !self.cluster_dirty[cluster.index()] {
                self.cluster_dirty[cluster.index()] = true;
                self.teardown.push((cluster, true));
            }
            if graph.is_destroyed(node) {
                // Slot may be reused by the host; it must be markable again.
                graph.set_dirty(node, false);
                continue;
            }
            self.dirty_nodes[kept] = node;
            kept += 1;
        }
        self.dirty_nodes.truncate(kept);
    }

    /// Free every flagged cluster. Clean neighbours below half capacity
    /// go with it, one level deep.
    fn tear_down_dirty_clusters<G: HostGraph>(&mut self, graph: &mut G, pass: &mut PassStats) {
        let threshold = self.config.cascade_threshold();
        while let Some((cluster, cascade)) = self.teardown.pop() {
            let links = mem::take(&mut self.connections[cluster.index()]);
            for adjacent in links {
                let a = adjacent.index();
                if self.cluster_dirty[a] {
                    // Queued too; its own teardown drops the link.
                    continue;
                }
                if cascade && self.children[a].len() < threshold {
                    self.cluster_dirty[a] = true;
                    self.teardown.push((adjacent, false));
                    pass.clusters_cascaded += 1;
                    tracing::trace!(cluster = adjacent.0, "small neighbour torn down");
                } else {
                    self.connections[a].retain(|c| *c != cluster);
                }
            }

            let mut members = mem::take(&mut self.children[cluster.index()]);
            for &member in &members {
                graph.set_cluster(member, ClusterId::UNASSIGNED);
                if !graph.is_destroyed(member) {
                    self.mark_dirty(graph, member);
                }
            }
            members.clear();
            self.children[cluster.index()] = members;
            self.areas[cluster.index()] = AreaId::NONE;
            self.free.push(cluster);
            pass.clusters_torn_down += 1;
        }
    }

    /// Seed a cluster from every dirty node that is still unassigned.
    fn grow_clusters<G: HostGraph>(&mut self, graph: &mut G, pass: &mut PassStats) {
        // Indexed loop: growth can append overflow nodes to the list.
        let mut i = 0;
        while i < self.dirty_nodes.len() {
            let seed = self.dirty_nodes[i];
            i += 1;
            if graph.is_destroyed(seed)
                || !graph.is_walkable(seed)
                || !graph.cluster(seed).is_unassigned()
            {
                continue;
            }
            let cluster = self.allocate();
            self.grow(graph, cluster, seed);
            pass.clusters_created += 1;
            pass.nodes_reclassified += self.children[cluster.index()].len();
        }
    }

    /// Breadth-first growth from `seed` up to the child limit.
    fn grow<G: HostGraph>(&mut self, graph: &mut G, cluster: ClusterId, seed: NodeId) {
        let limit = self.config.max_children_per_node;
        graph.set_cluster(seed, cluster);
        self.children[cluster.index()].push(seed);
        self.bfs.clear();
        self.bfs.push_back(seed);

        while let Some(node) = self.bfs.pop_front() {
            for neighbour in graph.neighbours(node) {
                if graph.is_destroyed(neighbour) || !graph.is_walkable(neighbour) {
                    continue;
                }
                let other = graph.cluster(neighbour);
                if other == cluster {
                    continue;
                }
                if !other.is_unassigned() {
                    self.connect(cluster, other);
                } else if self.children[cluster.index()].len() < limit {
                    graph.set_cluster(neighbour, cluster);
                    self.children[cluster.index()].push(neighbour);
                    self.bfs.push_back(neighbour);
                } else {
                    // Full: leave it to seed a later cluster, which
                    // will record the connection back to this one.
                    self.mark_dirty(graph, neighbour);
                }
            }
        }
    }

    fn allocate(&mut self) -> ClusterId {
        if let Some(cluster) = self.free.pop() {
            self.cluster_dirty[cluster.index()] = false;
            return cluster;
        }
        let cluster = ClusterId(self.children.len() as u32);
        self.children.push(Vec::new());
        self.connections.push(ClusterLinks::new());
        self.areas.push(AreaId::NONE);
        self.cluster_dirty.push(false);
        cluster
    }

    fn connect(&mut self, a: ClusterId, b: ClusterId) {
        if !self.connections[a.index()].contains(&b) {
            self.connections[a.index()].push(b);
            self.connections[b.index()].push(a);
        }
    }

    /// Label every connected component of the cluster graph.
    fn assign_areas(&mut self) {
        self.areas.fill(AreaId::NONE);
        let mut next = 0u32;
        for index in 1..self.children.len() {
            if self.children[index].is_empty() || !self.areas[index].is_none() {
                continue;
            }
            next += 1;
            let area = AreaId(next);
            self.areas[index] = area;
            self.fill.push(ClusterId(index as u32));
            while let Some(cluster) = self.fill.pop() {
                for &adjacent in &self.connections[cluster.index()] {
                    if self.areas[adjacent.index()].is_none() {
                        self.areas[adjacent.index()] = area;
                        self.fill.push(adjacent);
                    }
                }
            }
        }
        self.area_count = next as usize;
    }

    fn is_live(&self, cluster: ClusterId) -> bool {
        self.children
            .get(cluster.index())
            .is_some_and(|members| !members.is_empty())
    }

    /// Area of `cluster`, or [`AreaId::NONE`] for the sentinel, a freed
    /// id, or an id this hierarchy never issued.
    pub fn get_connected_component(&self, cluster: ClusterId) -> AreaId {
        self.areas
            .get(cluster.index())
            .copied()
            .unwrap_or(AreaId::NONE)
    }

    /// Area of the cluster owning `node`, if the node is clustered.
    ///
    /// Only meaningful once pending work has been recalculated.
    pub fn area_of<G: HostGraph>(&self, graph: &G, node: NodeId) -> Option<AreaId> {
        if graph.is_destroyed(node) || !graph.is_walkable(node) {
            return None;
        }
        let area = self.get_connected_component(graph.cluster(node));
        (!area.is_none()).then_some(area)
    }

    /// Whether a walkable path joins `a` and `b`.
    pub fn is_reachable<G: HostGraph>(&self, graph: &G, a: NodeId, b: NodeId) -> bool {
        match (self.area_of(graph, a), self.area_of(graph, b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Counter bumped by every recalculation that did work.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Live clusters.
    pub fn cluster_count(&self) -> usize {
        self.children.len() - 1 - self.free.len()
    }

    /// Areas found by the last recalculation.
    pub fn area_count(&self) -> usize {
        self.area_count
    }

    /// Member nodes of `cluster`; empty for ids that are not live.
    pub fn members(&self, cluster: ClusterId) -> &[NodeId] {
        self.children
            .get(cluster.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Clusters adjacent to `cluster`.
    pub fn connections(&self, cluster: ClusterId) -> &[ClusterId] {
        self.connections
            .get(cluster.index())
            .map_or(&[], |links| links.as_slice())
    }

    /// Recalculation counters.
    pub fn stats(&self) -> &RecalculationStats {
        &self.stats
    }

    /// Cross-check cluster bookkeeping against `graph`.
    ///
    /// Call with no pending work. Walks every node and edge, so this is
    /// meant for tests and debugging rather than per-frame use.
    pub fn check_consistency<G: HostGraph>(&self, graph: &G) -> Result<(), HierarchyError> {
        let fail = |reason: String| Err(HierarchyError::Inconsistent { reason });
        if self.has_pending_work() {
            return fail("dirty nodes pending".to_string());
        }

        let mut clustered = 0usize;
        for index in 1..self.children.len() {
            let cluster = ClusterId(index as u32);
            let members = &self.children[index];
            if members.len() > self.config.max_children_per_node {
                return fail(format!("cluster {index} has {} members", members.len()));
            }
            for &member in members {
                if graph.cluster(member) != cluster {
                    return fail(format!("node {} back-reference mismatch", member.0));
                }
                if graph.is_destroyed(member) || !graph.is_walkable(member) {
                    return fail(format!("node {} is not walkable", member.0));
                }
            }
            clustered += members.len();
            for &adjacent in &self.connections[index] {
                if adjacent == cluster || !self.is_live(adjacent) {
                    return fail(format!("cluster {index} links to {}", adjacent.0));
                }
                if !self.connections[adjacent.index()].contains(&cluster) {
                    return fail(format!("link {index}-{} is one-sided", adjacent.0));
                }
                if self.areas[adjacent.index()] != self.areas[index] {
                    return fail(format!("linked clusters {index}-{} differ in area", adjacent.0));
                }
            }
        }

        let mut usable = 0usize;
        for index in 0..graph.node_count() {
            let node = NodeId(index as u32);
            if graph.is_destroyed(node) || !graph.is_walkable(node) {
                continue;
            }
            usable += 1;
            let cluster = graph.cluster(node);
            if !self.is_live(cluster) {
                return fail(format!("node {index} is unclustered"));
            }
            for neighbour in graph.neighbours(node) {
                if graph.is_destroyed(neighbour) || !graph.is_walkable(neighbour) {
                    continue;
                }
                let other = graph.cluster(neighbour);
                if other != cluster && !self.connections[cluster.index()].contains(&other) {
                    return fail(format!(
                        "edge {index}-{} crosses unlinked clusters",
                        neighbour.0
                    ));
                }
            }
        }
        if usable != clustered {
            return fail(format!("{usable} walkable nodes but {clustered} clustered"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use warren_test_utils::{flood_components, AdjacencyGraph, GridGraph};

    fn hierarchy(limit: usize) -> HierarchicalGraph {
        HierarchicalGraph::new(HierarchyConfig {
            max_children_per_node: limit,
        })
        .unwrap()
    }

    fn built<G: HostGraph>(graph: &mut G, limit: usize) -> HierarchicalGraph {
        let mut h = hierarchy(limit);
        h.mark_all_dirty(graph);
        assert!(h.recalculate_if_necessary(graph));
        h.check_consistency(graph).unwrap();
        h
    }

    /// Area labels agree with brute-force components up to renaming.
    fn assert_matches_flood_fill<G: HostGraph>(h: &HierarchicalGraph, graph: &G) {
        let truth = flood_components(graph);
        let n = graph.node_count();
        for a in 0..n {
            let na = NodeId(a as u32);
            assert_eq!(h.area_of(graph, na).is_some(), truth[a].is_some(), "node {a}");
            for b in (a + 1)..n {
                let nb = NodeId(b as u32);
                let same = truth[a].is_some() && truth[a] == truth[b];
                assert_eq!(h.is_reachable(graph, na, nb), same, "nodes {a} and {b}");
            }
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let err = HierarchicalGraph::new(HierarchyConfig {
            max_children_per_node: 0,
        })
        .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidChildLimit { .. }));
    }

    #[test]
    fn empty_dirty_set_is_a_no_op() {
        let mut graph = GridGraph::new(4, 4);
        let mut h = hierarchy(16);
        assert!(!h.recalculate_if_necessary(&mut graph));
        assert_eq!(h.version(), 0);
        assert_eq!(h.stats().recalculations, 0);
    }

    #[test]
    fn mark_dirty_is_idempotent() {
        let mut graph = GridGraph::new(2, 2);
        let mut h = hierarchy(16);
        h.mark_dirty(&mut graph, NodeId(1));
        h.mark_dirty(&mut graph, NodeId(1));
        assert_eq!(h.dirty_node_count(), 1);
        assert!(graph.is_dirty(NodeId(1)));
    }

    #[test]
    fn second_recalculation_is_idempotent() {
        let mut graph = GridGraph::new(8, 8);
        let mut h = built(&mut graph, 16);
        let version = h.version();
        let areas: Vec<_> = (0..64)
            .map(|i| h.area_of(&graph, NodeId(i)))
            .collect();

        assert!(!h.recalculate_if_necessary(&mut graph));
        assert_eq!(h.version(), version);
        let again: Vec<_> = (0..64)
            .map(|i| h.area_of(&graph, NodeId(i)))
            .collect();
        assert_eq!(areas, again);
    }

    #[test]
    fn child_limit_caps_cluster_size() {
        let mut graph = GridGraph::new(10, 10);
        let h = built(&mut graph, 16);
        assert!(h.cluster_count() >= 100 / 16);
        assert_eq!(h.area_count(), 1);
        for index in 1..=h.cluster_count() {
            assert!(h.members(ClusterId(index as u32)).len() <= 16);
        }
    }

    #[test]
    fn wall_splits_then_opening_merges() {
        let mut graph = GridGraph::from_ascii(&[
            "..#..", //
            "..#..",
            "..#..",
        ]);
        let mut h = built(&mut graph, 256);
        let left = graph.node(0, 0);
        let right = graph.node(4, 0);
        assert_eq!(h.area_count(), 2);
        assert!(!h.is_reachable(&graph, left, right));

        let door = graph.node(2, 1);
        graph.set_walkable(door, true);
        h.mark_dirty(&mut graph, door);
        assert!(h.recalculate_if_necessary(&mut graph));
        h.check_consistency(&graph).unwrap();
        assert_eq!(h.area_count(), 1);
        assert!(h.is_reachable(&graph, left, right));
    }

    #[test]
    fn adding_edge_merges_partitions() {
        let mut graph = AdjacencyGraph::with_nodes(4);
        graph.add_edge(NodeId(0), NodeId(1));
        graph.add_edge(NodeId(2), NodeId(3));
        let mut h = built(&mut graph, 256);
        assert!(!h.is_reachable(&graph, NodeId(0), NodeId(3)));

        graph.add_edge(NodeId(1), NodeId(2));
        h.mark_dirty(&mut graph, NodeId(1));
        h.mark_dirty(&mut graph, NodeId(2));
        h.recalculate_if_necessary(&mut graph);
        h.check_consistency(&graph).unwrap();
        assert!(h.is_reachable(&graph, NodeId(0), NodeId(3)));
    }

    #[test]
    fn destroying_bridge_splits_components() {
        // A - B - C - D, then B is destroyed.
        let mut graph = AdjacencyGraph::with_nodes(4);
        let (a, b, c, d) = (NodeId(0), NodeId(1), NodeId(2), NodeId(3));
        graph.add_edge(a, b);
        graph.add_edge(b, c);
        graph.add_edge(c, d);
        let mut h = built(&mut graph, 256);
        assert!(h.is_reachable(&graph, a, d));

        for former in graph.destroy(b) {
            h.mark_dirty(&mut graph, former);
        }
        h.mark_dirty(&mut graph, b);
        h.recalculate_if_necessary(&mut graph);
        h.check_consistency(&graph).unwrap();

        assert!(!h.is_reachable(&graph, a, c));
        assert!(h.is_reachable(&graph, c, d));
        assert_eq!(h.area_of(&graph, b), None);
        assert!(!graph.is_dirty(b));
    }

    #[test]
    fn destroyed_node_alone_still_dirties_its_cluster() {
        // Only the destroyed node is marked; its cluster must still be
        // rebuilt so the node leaves the member list.
        let mut graph = AdjacencyGraph::with_nodes(3);
        graph.add_edge(NodeId(0), NodeId(1));
        graph.add_edge(NodeId(1), NodeId(2));
        let mut h = built(&mut graph, 256);

        graph.destroy(NodeId(2));
        h.mark_dirty(&mut graph, NodeId(2));
        h.recalculate_if_necessary(&mut graph);
        h.check_consistency(&graph).unwrap();
        assert_eq!(h.stats().last.clusters_torn_down, 1);
        assert_eq!(graph.cluster(NodeId(2)), ClusterId::UNASSIGNED);
    }

    #[test]
    fn reused_slot_is_picked_up() {
        let mut graph = AdjacencyGraph::with_nodes(2);
        graph.add_edge(NodeId(0), NodeId(1));
        let mut h = built(&mut graph, 256);

        graph.destroy(NodeId(1));
        h.mark_dirty(&mut graph, NodeId(1));
        h.recalculate_if_necessary(&mut graph);

        let reborn = graph.add_node();
        assert_eq!(reborn, NodeId(1));
        graph.add_edge(NodeId(0), reborn);
        h.mark_dirty(&mut graph, reborn);
        h.mark_dirty(&mut graph, NodeId(0));
        h.recalculate_if_necessary(&mut graph);
        h.check_consistency(&graph).unwrap();
        assert!(h.is_reachable(&graph, NodeId(0), reborn));
    }

    #[test]
    fn new_node_is_unassigned_until_recalculated() {
        let mut graph = AdjacencyGraph::with_nodes(1);
        let mut h = built(&mut graph, 256);
        let fresh = graph.add_node();
        graph.add_edge(NodeId(0), fresh);
        assert_eq!(h.area_of(&graph, fresh), None);

        h.mark_dirty(&mut graph, fresh);
        h.mark_dirty(&mut graph, NodeId(0));
        h.recalculate_if_necessary(&mut graph);
        assert!(h.is_reachable(&graph, NodeId(0), fresh));
    }

    #[test]
    fn small_clean_neighbours_cascade_one_level() {
        // 0-1-2 | 3 | 4-5-6 | 7 | 8-9-10, with 3 and 7 walls at first.
        let mut graph = AdjacencyGraph::with_nodes(11);
        for i in 0..10 {
            graph.add_edge(NodeId(i), NodeId(i + 1));
        }
        graph.set_walkable(NodeId(3), false);
        graph.set_walkable(NodeId(7), false);
        // Limit 8: clusters below 4 members cascade.
        let mut h = built(&mut graph, 8);
        assert_eq!(h.cluster_count(), 3);

        // Opening the walls adds single-node bridge clusters:
        // A - D - B - E - C.
        for wall in [3, 7] {
            graph.set_walkable(NodeId(wall), true);
            h.mark_dirty(&mut graph, NodeId(wall));
        }
        h.recalculate_if_necessary(&mut graph);
        h.check_consistency(&graph).unwrap();
        assert_eq!(h.cluster_count(), 5);
        assert_eq!(h.area_count(), 1);
        let b = graph.cluster(NodeId(5));
        let c = graph.cluster(NodeId(9));

        // Dirtying A takes the small bridge D with it, but the cascade
        // stops there: B is only a neighbour of a cascaded cluster.
        h.mark_dirty(&mut graph, NodeId(0));
        h.recalculate_if_necessary(&mut graph);
        h.check_consistency(&graph).unwrap();
        let last = &h.stats().last;
        assert_eq!(last.clusters_torn_down, 2);
        assert_eq!(last.clusters_cascaded, 1);
        assert_eq!(last.nodes_reclassified, 4);
        assert_eq!(graph.cluster(NodeId(5)), b);
        assert_eq!(graph.cluster(NodeId(9)), c);
        assert!(h.is_reachable(&graph, NodeId(0), NodeId(10)));
    }

    #[test]
    fn recalculation_stays_local() {
        let mut graph = GridGraph::new(100, 100);
        let mut h = built(&mut graph, 256);
        let clusters = h.cluster_count();
        let threshold = h.config().cascade_threshold();

        let toggled: Vec<NodeId> = (0..10)
            .map(|i| graph.node(48 + i % 5, 49 + i / 5))
            .collect();

        // Expected teardown: owners of toggled nodes plus their small,
        // clean neighbours.
        let mut dirty: Vec<ClusterId> = toggled.iter().map(|&n| graph.cluster(n)).collect();
        dirty.sort_unstable_by_key(|c| c.0);
        dirty.dedup();
        let mut expected = dirty.clone();
        for &cluster in &dirty {
            for &adjacent in h.connections(cluster) {
                if !expected.contains(&adjacent) && h.members(adjacent).len() < threshold {
                    expected.push(adjacent);
                }
            }
        }
        let expected_nodes: usize = expected.iter().map(|&c| h.members(c).len()).sum();

        for &node in &toggled {
            graph.set_walkable(node, false);
            h.mark_dirty(&mut graph, node);
        }
        assert!(h.recalculate_if_necessary(&mut graph));
        h.check_consistency(&graph).unwrap();

        let last = &h.stats().last;
        assert_eq!(last.clusters_torn_down, expected.len(), "{last:?}");
        assert_eq!(last.nodes_reclassified, expected_nodes - toggled.len());
        assert!(last.clusters_torn_down < clusters);
        assert_eq!(h.area_count(), 1);
    }

    #[test]
    fn freed_ids_are_reused() {
        let mut graph = GridGraph::new(4, 4);
        let mut h = built(&mut graph, 256);
        let arena = h.children.len();
        for _ in 0..5 {
            h.mark_dirty(&mut graph, NodeId(0));
            h.recalculate_if_necessary(&mut graph);
        }
        assert_eq!(h.children.len(), arena);
        assert_eq!(h.cluster_count(), 1);
    }

    #[test]
    fn sentinel_has_no_area() {
        let h = hierarchy(16);
        assert!(h.get_connected_component(ClusterId::UNASSIGNED).is_none());
        assert!(h.get_connected_component(ClusterId(99)).is_none());
        assert!(h.members(ClusterId(99)).is_empty());
        assert!(h.connections(ClusterId(99)).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn areas_match_flood_fill_after_edits(
            walls in proptest::collection::vec(any::<bool>(), 36),
            edits in proptest::collection::vec((0u32..36, any::<bool>()), 0..12),
            limit in 2usize..12,
        ) {
            let mut graph = GridGraph::new(6, 6);
            for (i, wall) in walls.iter().enumerate() {
                // Roughly a third walls.
                if *wall && i % 3 == 0 {
                    graph.set_walkable(NodeId(i as u32), false);
                }
            }
            let mut h = built(&mut graph, limit);
            assert_matches_flood_fill(&h, &graph);

            for (node, walkable) in edits {
                graph.set_walkable(NodeId(node), walkable);
                h.mark_dirty(&mut graph, NodeId(node));
            }
            h.recalculate_if_necessary(&mut graph);
            prop_assert!(h.check_consistency(&graph).is_ok());
            assert_matches_flood_fill(&h, &graph);
        }
    }
}
