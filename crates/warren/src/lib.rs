//! Warren: keeps a navigation graph queryable while it is being edited.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Warren sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use warren::prelude::*;
//! use warren_test_utils::GridGraph;
//!
//! let mut world = NavWorld::new(GridGraph::new(8, 8), WorldConfig::linear()).unwrap();
//! world.scan().unwrap();
//!
//! // Wall off column 4, one frame at a time.
//! let mut y = 0;
//! world.enqueue(FnWorkItem::<GridGraph>::new("wall", move |ctx, force| {
//!     ctx.prepare_for_update();
//!     while y < 8 {
//!         let node = ctx.graph().node(4, y);
//!         ctx.graph_mut().set_walkable(node, false);
//!         ctx.mark_dirty(node);
//!         y += 1;
//!         if !force && y % 4 == 0 && y < 8 {
//!             return Ok(Progress::Pending);
//!         }
//!     }
//!     Ok(Progress::Done)
//! }));
//!
//! while !world.process_work_items(false, true).unwrap() {}
//! assert!(!world.is_reachable(NodeId(0), NodeId(7)));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `warren-core` | Ids, error types, the `HostGraph` trait |
//! | [`jobs`] | `warren-jobs` | Dependency tracker, shared buffers, worker pool |
//! | [`hierarchy`] | `warren-hierarchy` | Cluster graph and reachability |
//! | [`engine`] | `warren-engine` | Work items, `NavWorld`, batch events |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids, error types and the [`types::HostGraph`] trait (`warren-core`).
pub use warren_core as types;

/// Hazard-tracked parallel jobs over shared buffers (`warren-jobs`).
///
/// [`jobs::JobDependencyTracker`] derives each job's dependencies from
/// its declared [`jobs::AccessSet`].
pub use warren_jobs as jobs;

/// Incrementally maintained cluster graph (`warren-hierarchy`).
pub use warren_hierarchy as hierarchy;

/// Work-item scheduler and the [`engine::NavWorld`] context object
/// (`warren-engine`).
pub use warren_engine as engine;

/// Common imports for typical Warren usage.
pub mod prelude {
    // Core types and traits
    pub use warren_core::{AreaId, BufferId, ClusterId, HostGraph, NodeId};

    // Errors
    pub use warren_core::{SchedulerError, TrackerError, WorkItemError};

    // Jobs
    pub use warren_jobs::{
        AccessSet, BufferInit, CompletionToken, FnJob, Job, JobDependencyTracker, SharedBuffer,
        TrackerConfig,
    };

    // Hierarchy
    pub use warren_hierarchy::{HierarchicalGraph, HierarchyConfig};

    // Engine
    pub use warren_engine::{
        BatchEvent, BatchMetrics, FnWorkItem, NavWorld, Progress, WorkItem, WorkItemContext,
        WorldConfig,
    };
}
