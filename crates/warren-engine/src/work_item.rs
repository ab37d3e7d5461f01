//! The [`WorkItem`] trait and its queue state machine.

use std::fmt;

use warren_core::{HostGraph, WorkItemError};

use crate::processor::WorkItemContext;

/// Result of one [`WorkItem::update`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Not finished; call again on a later `process`.
    Pending,
    /// Finished; the item is retired.
    Done,
}

/// A resumable graph mutation.
///
/// # Contract
///
/// - `init` runs exactly once, right before the first `update`.
/// - `update` is called until it returns [`Progress::Done`]. A call with
///   `force = true` must return `Done`; returning `Pending` is reported
///   as [`SchedulerError::ForcedItemUnfinished`](warren_core::SchedulerError::ForcedItemUnfinished).
/// - Time budgets are the item's own concern: check a clock inside
///   `update` and return `Pending` when it runs out.
pub trait WorkItem<G: HostGraph> {
    /// Human-readable name for error reporting and tracing.
    fn name(&self) -> &str {
        "work-item"
    }

    /// One-time setup before the first update.
    fn init(&mut self, _ctx: &mut WorkItemContext<'_, G>) -> Result<(), WorkItemError> {
        Ok(())
    }

    /// Advance the mutation.
    fn update(
        &mut self,
        ctx: &mut WorkItemContext<'_, G>,
        force: bool,
    ) -> Result<Progress, WorkItemError>;
}

type InitFn<G> = Box<dyn FnOnce(&mut WorkItemContext<'_, G>) -> Result<(), WorkItemError>>;
type UpdateFn<G> =
    Box<dyn FnMut(&mut WorkItemContext<'_, G>, bool) -> Result<Progress, WorkItemError>>;

/// A [`WorkItem`] built from closures.
///
/// The init closure is consumed by its first call.
pub struct FnWorkItem<G: HostGraph> {
    name: String,
    init: Option<InitFn<G>>,
    update: UpdateFn<G>,
}

impl<G: HostGraph> FnWorkItem<G> {
    /// An item running `update` until it reports done.
    pub fn new<U>(name: impl Into<String>, update: U) -> Self
    where
        U: FnMut(&mut WorkItemContext<'_, G>, bool) -> Result<Progress, WorkItemError> + 'static,
    {
        Self {
            name: name.into(),
            init: None,
            update: Box::new(update),
        }
    }

    /// An item that finishes after a single update.
    pub fn once<U>(name: impl Into<String>, mut update: U) -> Self
    where
        U: FnMut(&mut WorkItemContext<'_, G>) -> Result<(), WorkItemError> + 'static,
    {
        Self::new(name, move |ctx, _force| {
            update(ctx)?;
            Ok(Progress::Done)
        })
    }

    /// Attach a one-time init closure.
    pub fn with_init<I>(mut self, init: I) -> Self
    where
        I: FnOnce(&mut WorkItemContext<'_, G>) -> Result<(), WorkItemError> + 'static,
    {
        self.init = Some(Box::new(init));
        self
    }
}

impl<G: HostGraph> WorkItem<G> for FnWorkItem<G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: &mut WorkItemContext<'_, G>) -> Result<(), WorkItemError> {
        match self.init.take() {
            Some(init) => init(ctx),
            None => Ok(()),
        }
    }

    fn update(
        &mut self,
        ctx: &mut WorkItemContext<'_, G>,
        force: bool,
    ) -> Result<Progress, WorkItemError> {
        (self.update)(ctx, force)
    }
}

impl<G: HostGraph> fmt::Debug for FnWorkItem<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnWorkItem")
            .field("name", &self.name)
            .field("init_pending", &self.init.is_some())
            .finish()
    }
}

/// Where a queued item is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    /// `init` has not run yet.
    NotStarted,
    /// `init` ran; `update` has been called `updates` times.
    InProgress {
        /// Update calls so far.
        updates: u32,
    },
}

/// A queued item plus its lifecycle state.
pub(crate) struct QueuedItem<G: HostGraph> {
    pub(crate) item: Box<dyn WorkItem<G>>,
    pub(crate) state: ItemState,
}

impl<G: HostGraph> QueuedItem<G> {
    pub(crate) fn new(item: Box<dyn WorkItem<G>>) -> Self {
        Self {
            item,
            state: ItemState::NotStarted,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.item.name()
    }
}
