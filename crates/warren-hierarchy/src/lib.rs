//! Hierarchical connectivity graph for Warren.
//!
//! Summarises a fine-grained navigation graph as clusters of nearby
//! walkable nodes, connected where any fine-grained edge crosses between
//! them. Clusters are grouped into areas by flood fill, so "can A reach
//! B?" is a comparison of two area ids.
//!
//! Updates are incremental: the host marks changed nodes dirty, and
//! [`HierarchicalGraph::recalculate_if_necessary`] rebuilds only the
//! clusters that own them (plus small clean neighbours, to stop
//! fragmentation), then re-labels areas over the cluster graph.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod graph;
pub mod stats;

pub use config::{HierarchyConfig, HierarchyError};
pub use graph::HierarchicalGraph;
pub use stats::{PassStats, RecalculationStats};
