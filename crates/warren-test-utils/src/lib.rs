//! Test graphs and fixtures for Warren development.
//!
//! Provides two [`HostGraph`](warren_core::HostGraph) implementations:
//! [`GridGraph`], a 4-connected grid with per-cell walkability, and
//! [`AdjacencyGraph`], an explicit edge list for hand-built scenarios.
//! [`flood_components`] is the brute-force reference the hierarchical
//! graph is checked against.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod graphs;

pub use graphs::{flood_components, AdjacencyGraph, GridGraph};
