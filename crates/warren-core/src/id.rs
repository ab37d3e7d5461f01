//! Strongly-typed identifiers and the [`NeighbourList`] type alias.

use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`BufferId`] allocation.
static BUFFER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a shared buffer.
///
/// Allocated from a monotonic atomic counter via [`BufferId::next`].
/// Two distinct allocations always have different IDs, even when one is
/// dropped and the next lands at the same address. A reallocated buffer
/// is a new allocation and therefore a new identity.
///
/// Cloning a buffer handle preserves its ID, which is correct because the
/// clone shares the same backing storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Allocate a fresh, unique buffer ID.
    ///
    /// Each call returns a new ID that has never been returned before
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(BUFFER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf#{}", self.0)
    }
}

/// Identifies a fine-grained node of the host graph.
///
/// Node IDs are slot indices: they stay valid while the node is destroyed
/// (the host keeps the slot and reports it through
/// [`HostGraph::is_destroyed`](crate::HostGraph::is_destroyed)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The slot index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Index of a cluster (hierarchical node) in the hierarchy's arena.
///
/// `ClusterId(0)` is the [`UNASSIGNED`](Self::UNASSIGNED) sentinel and is
/// never handed out to a real cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub u32);

impl ClusterId {
    /// Back-reference value of a node that belongs to no cluster.
    pub const UNASSIGNED: ClusterId = ClusterId(0);

    /// Whether this is the unassigned sentinel.
    pub fn is_unassigned(self) -> bool {
        self == Self::UNASSIGNED
    }

    /// The arena index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for ClusterId {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connected-component label shared by all mutually reachable clusters.
///
/// `AreaId(0)` is reserved: it labels free cluster slots and the
/// unassigned sentinel, never a live component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaId(pub u32);

impl AreaId {
    /// Reserved label for "no area".
    pub const NONE: AreaId = AreaId(0);

    /// Whether this is the reserved label.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl Default for AreaId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Neighbour set of one host node.
///
/// Uses `SmallVec<[NodeId; 8]>` to avoid heap allocation for grid and
/// navmesh topologies (8 covers 8-connected grids and triangle meshes).
pub type NeighbourList = SmallVec<[NodeId; 8]>;
