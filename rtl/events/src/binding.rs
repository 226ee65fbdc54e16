//! Listener capability and binding handles
//!
//! A binding connects exactly one source to exactly one listener. The same
//! listener can sit behind bindings on many sources, which is how one
//! object observes several devices.

use core::fmt;

use rtl_core::Event;

/// An object that wants to be told about events
pub trait EventListener {
    /// Receive one event
    fn on_event(&mut self, event: &Event);
}

/// Plain function listener
pub type EventListenerFn = fn(&Event);

/// Handle of a listener object registered with a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u8);

impl ListenerId {
    /// Get the raw index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a binding in a bus's binding arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(pub(crate) u8);

impl BindingId {
    /// Get the raw index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{:02}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BindingId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "B{=u8}", self.0);
    }
}

/// What a binding forwards events to
#[derive(Clone, Copy)]
pub enum BindingTarget {
    /// Nothing yet, forwarding is a no-op
    Unbound,
    /// A registered listener object
    Listener(ListenerId),
    /// A plain function
    Function(EventListenerFn),
}

impl BindingTarget {
    /// Whether both targets name the same listener or function
    pub fn same_as(&self, other: &BindingTarget) -> bool {
        match (self, other) {
            (BindingTarget::Unbound, BindingTarget::Unbound) => true,
            (BindingTarget::Listener(a), BindingTarget::Listener(b)) => a == b,
            (BindingTarget::Function(a), BindingTarget::Function(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, BindingTarget::Unbound)
    }
}

impl Default for BindingTarget {
    fn default() -> Self {
        BindingTarget::Unbound
    }
}

impl fmt::Debug for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingTarget::Unbound => write!(f, "Unbound"),
            BindingTarget::Listener(id) => write!(f, "Listener({})", id.0),
            BindingTarget::Function(func) => write!(f, "Function({:#x})", *func as usize),
        }
    }
}

impl From<ListenerId> for BindingTarget {
    fn from(id: ListenerId) -> Self {
        BindingTarget::Listener(id)
    }
}

impl From<EventListenerFn> for BindingTarget {
    fn from(func: EventListenerFn) -> Self {
        BindingTarget::Function(func)
    }
}
