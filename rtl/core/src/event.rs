//! Event record and event identifiers

use core::fmt;

use crate::{EventCode, SourceCategory, Variant};

/// Opaque 16-bit event identifier
///
/// Composed as `(category << 8) | code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventId(pub u16);

impl EventId {
    /// A timer fired
    pub const TIMER_FIRED: EventId = EventId::compose(SourceCategory::TIMER, EventCode::DEFAULT);
    /// Default navigation event
    pub const NAVIGATION: EventId =
        EventId::compose(SourceCategory::NAVIGATION, EventCode::DEFAULT);
    pub const TASK_STARTED: EventId = EventId::compose(SourceCategory::TASK, EventCode::STARTED);
    pub const TASK_COMPLETE: EventId = EventId::compose(SourceCategory::TASK, EventCode::COMPLETE);
    pub const TASK_ABORTED: EventId = EventId::compose(SourceCategory::TASK, EventCode::ABORTED);
    pub const TASK_RESPONSE: EventId = EventId::compose(SourceCategory::TASK, EventCode::RESPONSE);

    /// Create an identifier from a raw value
    pub const fn new(id: u16) -> Self {
        EventId(id)
    }

    /// Build an identifier from a source category and an event code
    pub const fn compose(category: SourceCategory, code: EventCode) -> Self {
        EventId(((category.0 as u16) << 8) | code.0 as u16)
    }

    /// Category half of the identifier
    pub const fn category(self) -> SourceCategory {
        SourceCategory((self.0 >> 8) as u8)
    }

    /// Code half of the identifier
    pub const fn code(self) -> EventCode {
        EventCode((self.0 & 0x00FF) as u8)
    }

    /// Get the raw identifier value
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for EventId {
    fn from(id: u16) -> Self {
        EventId(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({:#06x})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "EventId({=u16:#x})", self.0);
    }
}

/// Index of an event source inside its bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u8);

impl SourceId {
    /// Get the raw index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SourceId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "S{=u8}", self.0);
    }
}

/// A discrete occurrence: identifier, payload and the source that raised it
///
/// Events are plain values. They are copied into a queue slot when posted
/// and copied out again when dispatched; nothing is borrowed or owned.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Event {
    pub id: EventId,
    pub payload: Variant,
    pub source: Option<SourceId>,
}

impl Event {
    /// Create an event that no source has stamped yet
    pub fn new(id: impl Into<EventId>, payload: impl Into<Variant>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
            source: None,
        }
    }

    /// Create an event carrying the default payload
    pub const fn signal(id: EventId) -> Self {
        Self {
            id,
            payload: Variant::Long(0),
            source: None,
        }
    }

    /// Return a copy stamped with `source`
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Event {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Event{{ id: {}, payload: {}, source: {} }}",
            self.id,
            self.payload,
            self.source
        );
    }
}
