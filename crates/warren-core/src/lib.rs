//! Core types and traits for the Warren graph-update core.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions shared by the rest of the workspace: typed ids for
//! buffers, host nodes, clusters and areas, the error enums of each
//! subsystem, and the [`HostGraph`] trait through which the hierarchical
//! connectivity graph talks to the navigation graph it summarises.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;

pub use error::{SchedulerError, TrackerError, WorkItemError};
pub use id::{AreaId, BufferId, ClusterId, NeighbourList, NodeId};
pub use traits::HostGraph;
