//! Host graphs implementing [`HostGraph`] for tests and benches.

use std::collections::VecDeque;

use warren_core::{ClusterId, HostGraph, NeighbourList, NodeId};

/// Per-node bookkeeping shared by both test graphs.
#[derive(Clone, Debug, Default)]
struct NodeSlot {
    walkable: bool,
    destroyed: bool,
    cluster: ClusterId,
    dirty: bool,
}

impl NodeSlot {
    fn walkable() -> Self {
        Self {
            walkable: true,
            ..Self::default()
        }
    }
}

/// A `width * height` 4-connected grid. Node `y * width + x` is cell `(x, y)`.
#[derive(Clone, Debug)]
pub struct GridGraph {
    width: u32,
    height: u32,
    slots: Vec<NodeSlot>,
}

impl GridGraph {
    /// A fully walkable grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            slots: vec![NodeSlot::walkable(); (width * height) as usize],
        }
    }

    /// Build a grid from rows of text: `.` is walkable, anything else
    /// is a wall. All rows must have the same length.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len() as u32, width, "ragged row {y}");
            for (x, ch) in row.chars().enumerate() {
                if ch != '.' {
                    let node = grid.node(x as u32, y as u32);
                    grid.slots[node.index()].walkable = false;
                }
            }
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn node(&self, x: u32, y: u32) -> NodeId {
        assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        NodeId(y * self.width + x)
    }

    pub fn coords(&self, node: NodeId) -> (u32, u32) {
        (node.0 % self.width, node.0 / self.width)
    }

    /// Change walkability without notifying any hierarchy.
    pub fn set_walkable(&mut self, node: NodeId, walkable: bool) {
        self.slots[node.index()].walkable = walkable;
    }

    pub fn destroy(&mut self, node: NodeId) {
        self.slots[node.index()].destroyed = true;
    }
}

impl HostGraph for GridGraph {
    fn node_count(&self) -> usize {
        self.slots.len()
    }

    fn is_walkable(&self, node: NodeId) -> bool {
        self.slots[node.index()].walkable
    }

    fn is_destroyed(&self, node: NodeId) -> bool {
        self.slots[node.index()].destroyed
    }

    fn cluster(&self, node: NodeId) -> ClusterId {
        self.slots[node.index()].cluster
    }

    fn set_cluster(&mut self, node: NodeId, cluster: ClusterId) {
        self.slots[node.index()].cluster = cluster;
    }

    fn is_dirty(&self, node: NodeId) -> bool {
        self.slots[node.index()].dirty
    }

    fn set_dirty(&mut self, node: NodeId, dirty: bool) {
        self.slots[node.index()].dirty = dirty;
    }

    fn neighbours(&self, node: NodeId) -> NeighbourList {
        let (x, y) = self.coords(node);
        let mut out = NeighbourList::new();
        if x > 0 {
            out.push(NodeId(node.0 - 1));
        }
        if x + 1 < self.width {
            out.push(NodeId(node.0 + 1));
        }
        if y > 0 {
            out.push(NodeId(node.0 - self.width));
        }
        if y + 1 < self.height {
            out.push(NodeId(node.0 + self.width));
        }
        out
    }
}

/// A graph with explicit undirected edges.
///
/// Destroyed slots are reused by [`add_node`](Self::add_node), the way a
/// host recycles node storage.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
    slots: Vec<NodeSlot>,
    edges: Vec<Vec<NodeId>>,
    free: Vec<NodeId>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph with `n` walkable, unconnected nodes.
    pub fn with_nodes(n: usize) -> Self {
        let mut graph = Self::new();
        for _ in 0..n {
            graph.add_node();
        }
        graph
    }

    /// Create a walkable node, reusing a destroyed slot if one exists.
    ///
    /// A reused slot keeps its cluster back-reference and dirty flag, so
    /// a hierarchy that has not yet processed the destruction still finds
    /// the cluster that owned it.
    pub fn add_node(&mut self) -> NodeId {
        if let Some(node) = self.free.pop() {
            let slot = &mut self.slots[node.index()];
            slot.walkable = true;
            slot.destroyed = false;
            return node;
        }
        let node = NodeId(self.slots.len() as u32);
        self.slots.push(NodeSlot::walkable());
        self.edges.push(Vec::new());
        node
    }

    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.edges[a.index()].contains(&b) {
            return;
        }
        self.edges[a.index()].push(b);
        self.edges[b.index()].push(a);
    }

    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) {
        self.edges[a.index()].retain(|&n| n != b);
        self.edges[b.index()].retain(|&n| n != a);
    }

    /// Mark the node destroyed and drop its edges. The cluster
    /// back-reference is kept until the slot is reused.
    ///
    /// Returns the former neighbours, which a host would mark dirty.
    pub fn destroy(&mut self, node: NodeId) -> Vec<NodeId> {
        let former = std::mem::take(&mut self.edges[node.index()]);
        for &other in &former {
            self.edges[other.index()].retain(|&n| n != node);
        }
        self.slots[node.index()].destroyed = true;
        self.slots[node.index()].walkable = false;
        self.free.push(node);
        former
    }

    pub fn set_walkable(&mut self, node: NodeId, walkable: bool) {
        self.slots[node.index()].walkable = walkable;
    }
}

impl HostGraph for AdjacencyGraph {
    fn node_count(&self) -> usize {
        self.slots.len()
    }

    fn is_walkable(&self, node: NodeId) -> bool {
        self.slots[node.index()].walkable
    }

    fn is_destroyed(&self, node: NodeId) -> bool {
        self.slots[node.index()].destroyed
    }

    fn cluster(&self, node: NodeId) -> ClusterId {
        self.slots[node.index()].cluster
    }

    fn set_cluster(&mut self, node: NodeId, cluster: ClusterId) {
        self.slots[node.index()].cluster = cluster;
    }

    fn is_dirty(&self, node: NodeId) -> bool {
        self.slots[node.index()].dirty
    }

    fn set_dirty(&mut self, node: NodeId, dirty: bool) {
        self.slots[node.index()].dirty = dirty;
    }

    fn neighbours(&self, node: NodeId) -> NeighbourList {
        self.edges[node.index()].iter().copied().collect()
    }
}

/// Brute-force connected components over walkable, live nodes.
///
/// Returns one entry per node slot: `None` for unwalkable or destroyed
/// nodes, otherwise a component label. Labels are only meaningful for
/// equality comparison.
pub fn flood_components<G: HostGraph>(graph: &G) -> Vec<Option<u32>> {
    let n = graph.node_count();
    let usable = |node: NodeId| graph.is_walkable(node) && !graph.is_destroyed(node);
    let mut labels = vec![None; n];
    let mut next = 0;
    let mut queue = VecDeque::new();
    for start in 0..n {
        let start = NodeId(start as u32);
        if labels[start.index()].is_some() || !usable(start) {
            continue;
        }
        labels[start.index()] = Some(next);
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            for nb in graph.neighbours(node) {
                if labels[nb.index()].is_none() && usable(nb) {
                    labels[nb.index()] = Some(next);
                    queue.push_back(nb);
                }
            }
        }
        next += 1;
    }
    labels
}
