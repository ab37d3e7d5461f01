//! Benchmark profiles for the Warren graph-update core.
//!
//! - [`reference_grid`]: 100x100 open grid (10K nodes)
//! - [`maze_grid`]: the same grid with every fourth column walled, one
//!   gap per wall
//! - [`edit_sites`]: deterministic node picks for edit benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use warren_core::{HostGraph, NodeId};
use warren_test_utils::GridGraph;

/// Side length of the reference grid.
pub const REFERENCE_SIDE: u32 = 100;

/// 100x100 fully walkable grid.
pub fn reference_grid() -> GridGraph {
    GridGraph::new(REFERENCE_SIDE, REFERENCE_SIDE)
}

/// Reference grid with a wall on every fourth column, each wall pierced
/// by a single gap at a row that varies per wall.
pub fn maze_grid() -> GridGraph {
    let mut grid = reference_grid();
    for x in (3..REFERENCE_SIDE).step_by(4) {
        let gap = (x * 7) % REFERENCE_SIDE;
        for y in 0..REFERENCE_SIDE {
            if y != gap {
                let node = grid.node(x, y);
                grid.set_walkable(node, false);
            }
        }
    }
    grid
}

/// `count` distinct walkable nodes spread over `graph`, chosen by a
/// fixed linear-congruential walk so runs are comparable.
pub fn edit_sites(graph: &GridGraph, count: usize, seed: u64) -> Vec<NodeId> {
    let n = graph.node_count() as u64;
    let mut state = seed | 1;
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count && (picked.len() as u64) < n {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let node = NodeId(((state >> 33) % n) as u32);
        if graph.is_walkable(node) && !picked.contains(&node) {
            picked.push(node);
        }
    }
    picked
}
