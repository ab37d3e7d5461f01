//! The [`HostGraph`] trait: what the connectivity core needs from the
//! navigation graph it summarises.

use crate::id::{ClusterId, NeighbourList, NodeId};

/// Fine-grained navigation graph as seen by the hierarchical
/// connectivity graph.
///
/// The host owns node storage, connection encoding and geometry; the
/// hierarchy only reads walkability and adjacency, and keeps two small
/// per-node slots on the host: the cluster back-reference and the
/// "pending reclassification" flag.
///
/// # Node slots
///
/// Nodes are addressed by slot index `0..node_count()`. A destroyed node
/// keeps its slot (and its back-reference) until the host reuses it, so
/// the hierarchy can still find the cluster that owned it.
pub trait HostGraph {
    /// Number of node slots, including destroyed ones.
    fn node_count(&self) -> usize;

    /// Whether agents may stand on this node.
    fn is_walkable(&self, node: NodeId) -> bool;

    /// Whether the node has been removed from the graph.
    fn is_destroyed(&self, node: NodeId) -> bool;

    /// The cluster this node currently belongs to.
    ///
    /// Freshly created nodes report [`ClusterId::UNASSIGNED`].
    fn cluster(&self, node: NodeId) -> ClusterId;

    /// Overwrite the node's cluster back-reference.
    fn set_cluster(&mut self, node: NodeId, cluster: ClusterId);

    /// Whether the node is already queued for reclassification.
    fn is_dirty(&self, node: NodeId) -> bool;

    /// Set or clear the node's "queued for reclassification" flag.
    fn set_dirty(&mut self, node: NodeId, dirty: bool);

    /// Enumerate the nodes directly connected to `node`.
    ///
    /// Connections must be reported from both endpoints: reachability is
    /// treated as symmetric.
    fn neighbours(&self, node: NodeId) -> NeighbourList;
}
