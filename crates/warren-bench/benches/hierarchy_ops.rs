//! Criterion micro-benchmarks for hierarchy build and incremental repair.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use warren_bench::{edit_sites, maze_grid, reference_grid};
use warren_core::{HostGraph, NodeId};
use warren_hierarchy::{HierarchicalGraph, HierarchyConfig};

fn built(graph: &mut warren_test_utils::GridGraph) -> HierarchicalGraph {
    let mut h = HierarchicalGraph::new(HierarchyConfig::default()).unwrap();
    h.mark_all_dirty(graph);
    h.recalculate_if_necessary(graph);
    h
}

fn bench_full_build(c: &mut Criterion) {
    c.bench_function("hierarchy_full_build_10k", |b| {
        b.iter_batched(
            reference_grid,
            |mut graph| black_box(built(&mut graph)),
            BatchSize::SmallInput,
        );
    });
}

fn bench_toggle_ten(c: &mut Criterion) {
    let mut graph = maze_grid();
    let mut h = built(&mut graph);
    let sites = edit_sites(&graph, 10, 7);
    let mut walkable = true;
    c.bench_function("hierarchy_toggle_10_nodes_10k", |b| {
        b.iter(|| {
            walkable = !walkable;
            for &node in &sites {
                graph.set_walkable(node, walkable);
                h.mark_dirty(&mut graph, node);
            }
            black_box(h.recalculate_if_necessary(&mut graph));
        });
    });
}

fn bench_reachability_query(c: &mut Criterion) {
    let mut graph = maze_grid();
    let h = built(&mut graph);
    let n = graph.node_count() as u32;
    c.bench_function("hierarchy_is_reachable", |b| {
        let mut i = 0u32;
        b.iter(|| {
            i = (i + 7919) % n;
            black_box(h.is_reachable(&graph, NodeId(0), NodeId(i)))
        });
    });
}

criterion_group!(
    benches,
    bench_full_build,
    bench_toggle_ten,
    bench_reachability_query
);
criterion_main!(benches);
