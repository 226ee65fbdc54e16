//! Event source handle

use core::fmt;

use rtl_core::{Event, EventId, RtlResult, SourceId, Variant};

use crate::EventQueue;

/// Handle held by any object that raises events
///
/// Issued by [`EventBus::add_source`](crate::EventBus::add_source). The bus
/// keeps the source's binding chain; the handle is what objects store and
/// what events carry back as their origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventSource(SourceId);

impl EventSource {
    pub(crate) const fn from_id(id: SourceId) -> Self {
        EventSource(id)
    }

    /// Identifier stamped on events from this source
    pub const fn id(self) -> SourceId {
        self.0
    }

    /// Build an event stamped with this source
    pub fn event(self, id: impl Into<EventId>, payload: impl Into<Variant>) -> Event {
        Event::new(id, payload).with_source(self.0)
    }

    /// Post an event for the next dispatch pass
    pub fn queue_event<const N: usize>(
        self,
        queue: &EventQueue<N>,
        id: impl Into<EventId>,
        payload: impl Into<Variant>,
    ) -> RtlResult<()> {
        let id = id.into();
        log::trace!("{}: queue {}", self.0, id);
        queue.enqueue(self.0, id, payload)
    }

    /// Post a prepared event, overwriting its source with this one
    pub fn queue<const N: usize>(self, queue: &EventQueue<N>, event: Event) -> RtlResult<()> {
        queue.enqueue_event(event.with_source(self.0))
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventSource {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.0);
    }
}
