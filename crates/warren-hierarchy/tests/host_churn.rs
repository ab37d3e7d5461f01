//! Integration test: hierarchy stays exact under host graph churn.
//!
//! Applies random batches of host edits (edges added and removed, nodes
//! created, destroyed and toggled) to an adjacency graph, marking nodes
//! dirty the way a host's change callbacks would. After every batch the
//! cluster bookkeeping must be consistent and reachability must match a
//! brute-force flood fill.

use proptest::prelude::*;
use warren_core::{HostGraph, NodeId};
use warren_hierarchy::{HierarchicalGraph, HierarchyConfig};
use warren_test_utils::{flood_components, AdjacencyGraph};

#[derive(Clone, Debug)]
enum Edit {
    Link(u32, u32),
    Unlink(u32, u32),
    Toggle(u32),
    Destroy(u32),
    Create { link_to: u32 },
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0u32..64, 0u32..64).prop_map(|(a, b)| Edit::Link(a, b)),
        2 => (0u32..64, 0u32..64).prop_map(|(a, b)| Edit::Unlink(a, b)),
        2 => (0u32..64).prop_map(Edit::Toggle),
        1 => (0u32..64).prop_map(Edit::Destroy),
        1 => (0u32..64).prop_map(|link_to| Edit::Create { link_to }),
    ]
}

/// Apply `edit` and mark every node whose connectivity it changed.
fn apply(graph: &mut AdjacencyGraph, h: &mut HierarchicalGraph, edit: &Edit) {
    let n = graph.node_count() as u32;
    let live = |graph: &AdjacencyGraph, i: u32| i < n && !graph.is_destroyed(NodeId(i));
    match *edit {
        Edit::Link(a, b) | Edit::Unlink(a, b) => {
            if !live(graph, a) || !live(graph, b) {
                return;
            }
            if matches!(edit, Edit::Link(..)) {
                graph.add_edge(NodeId(a), NodeId(b));
            } else {
                graph.remove_edge(NodeId(a), NodeId(b));
            }
            h.mark_dirty(graph, NodeId(a));
            h.mark_dirty(graph, NodeId(b));
        }
        Edit::Toggle(a) => {
            if !live(graph, a) {
                return;
            }
            let walkable = graph.is_walkable(NodeId(a));
            graph.set_walkable(NodeId(a), !walkable);
            h.mark_dirty(graph, NodeId(a));
        }
        Edit::Destroy(a) => {
            if !live(graph, a) {
                return;
            }
            for former in graph.destroy(NodeId(a)) {
                h.mark_dirty(graph, former);
            }
            h.mark_dirty(graph, NodeId(a));
        }
        Edit::Create { link_to } => {
            let node = graph.add_node();
            h.mark_dirty(graph, node);
            if live(graph, link_to) && NodeId(link_to) != node {
                graph.add_edge(node, NodeId(link_to));
                h.mark_dirty(graph, NodeId(link_to));
            }
        }
    }
}

fn assert_exact(h: &HierarchicalGraph, graph: &AdjacencyGraph) {
    h.check_consistency(graph).unwrap();
    let truth = flood_components(graph);
    for a in 0..graph.node_count() {
        for b in 0..graph.node_count() {
            let expected = truth[a].is_some() && truth[a] == truth[b];
            assert_eq!(
                h.is_reachable(graph, NodeId(a as u32), NodeId(b as u32)),
                expected,
                "nodes {a} and {b}"
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn reachability_tracks_churn(
        limit in 2usize..24,
        seed_edges in proptest::collection::vec((0u32..48, 0u32..48), 0..80),
        batches in proptest::collection::vec(proptest::collection::vec(edit(), 1..8), 1..6),
    ) {
        let mut graph = AdjacencyGraph::with_nodes(48);
        for (a, b) in seed_edges {
            graph.add_edge(NodeId(a), NodeId(b));
        }
        let mut h = HierarchicalGraph::new(HierarchyConfig {
            max_children_per_node: limit,
        })
        .unwrap();
        h.mark_all_dirty(&mut graph);
        h.recalculate_if_necessary(&mut graph);
        assert_exact(&h, &graph);

        for batch in &batches {
            let version = h.version();
            for edit in batch {
                apply(&mut graph, &mut h, edit);
            }
            let worked = h.recalculate_if_necessary(&mut graph);
            prop_assert_eq!(worked, h.version() == version + 1);
            prop_assert!(!h.has_pending_work());
            assert_exact(&h, &graph);
        }
    }
}

#[test]
fn version_advances_once_per_pass() {
    let mut graph = AdjacencyGraph::with_nodes(3);
    let mut h = HierarchicalGraph::new(HierarchyConfig::default()).unwrap();
    h.mark_all_dirty(&mut graph);
    assert!(h.recalculate_if_necessary(&mut graph));
    assert_eq!(h.version(), 1);

    graph.add_edge(NodeId(0), NodeId(1));
    h.mark_dirty(&mut graph, NodeId(0));
    h.mark_dirty(&mut graph, NodeId(1));
    assert!(h.recalculate_if_necessary(&mut graph));
    assert!(!h.recalculate_if_necessary(&mut graph));
    assert_eq!(h.version(), 2);
    assert_eq!(h.stats().recalculations, 2);
    assert_eq!(h.area_count(), 2);
}
