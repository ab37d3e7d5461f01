//! Batch notifications and their listeners.

use std::fmt;

/// Notification fired by the scheduler around a batch of work items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BatchEvent {
    /// The first item of a batch is about to mutate the graph. Fired at
    /// most once per batch, and not at all in full-scan mode.
    BeforeBatch,
    /// The batch drained with dirty nodes; connectivity is about to be
    /// repaired.
    BeforeAreaRecalculation,
    /// Connectivity repair finished.
    AfterUpdate,
}

/// Handle returned by [`NavWorld::subscribe`](crate::NavWorld::subscribe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(BatchEvent)>;

/// Registered listeners, called in subscription order.
#[derive(Default)]
pub(crate) struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    pub(crate) fn emit(&mut self, event: BatchEvent) {
        tracing::trace!(?event, listeners = self.listeners.len(), "batch event");
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
