//! Work-item scheduler for Warren.
//!
//! Graph mutations arrive as [`WorkItem`]s queued on a [`NavWorld`]. Each
//! call to [`NavWorld::process_work_items`] drives the queue forward; an
//! item may stay pending across many calls (one per frame, say). When the
//! queue drains, the world repairs connectivity once for the whole batch
//! and notifies listeners.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod events;
pub mod metrics;
pub mod processor;
pub mod work_item;
pub mod world;

pub use config::{ConfigError, WorldConfig};
pub use events::{BatchEvent, ListenerId};
pub use metrics::BatchMetrics;
pub use processor::{WorkItemContext, WorkItemProcessor};
pub use work_item::{FnWorkItem, ItemState, Progress, WorkItem};
pub use world::NavWorld;
