//! Multicast delivery from event sources to listeners
//!
//! The bus owns three fixed tables:
//!
//! - one chain head per registered [`EventSource`],
//! - an arena of bindings, each a link in exactly one chain at a time,
//! - the listener objects bindings can forward to.
//!
//! Chains are singly linked through binding indices. Attaching pushes at
//! the head, so the most recently attached listener hears an event first.
//! Nothing is ever freed: a detached binding keeps its slot and target.
//! Attaching the same listener or function again reuses it.

use heapless::Vec;
use rtl_core::{Event, EventId, RtlError, RtlResult, SourceId, Variant};

use crate::binding::{BindingId, BindingTarget, EventListener, EventListenerFn, ListenerId};
use crate::queue::EventDispatch;
use crate::source::EventSource;
use crate::{DEFAULT_MAX_BINDINGS, DEFAULT_MAX_LISTENERS, DEFAULT_MAX_SOURCES};

#[derive(Debug, Clone, Copy)]
struct BindingSlot {
    target: BindingTarget,
    next: Option<BindingId>,
    /// Source whose chain currently holds this binding
    source: Option<SourceId>,
}

/// Iterator over a source's bindings in notification order
pub struct Chain<'b> {
    slots: &'b [BindingSlot],
    cursor: Option<BindingId>,
}

impl Iterator for Chain<'_> {
    type Item = BindingId;

    fn next(&mut self) -> Option<BindingId> {
        let current = self.cursor?;
        self.cursor = self.slots.get(current.index()).and_then(|slot| slot.next);
        Some(current)
    }
}

/// Sources, bindings and listeners of one application
///
/// Capacities are fixed at compile time and must not exceed 256 each.
pub struct EventBus<'a, const SOURCES: usize, const BINDINGS: usize, const LISTENERS: usize> {
    sources: Vec<Option<BindingId>, SOURCES>,
    bindings: Vec<BindingSlot, BINDINGS>,
    listeners: Vec<&'a mut dyn EventListener, LISTENERS>,
}

/// Bus sized with the crate defaults
pub type DefaultEventBus<'a> =
    EventBus<'a, DEFAULT_MAX_SOURCES, DEFAULT_MAX_BINDINGS, DEFAULT_MAX_LISTENERS>;

impl<'a, const SOURCES: usize, const BINDINGS: usize, const LISTENERS: usize>
    EventBus<'a, SOURCES, BINDINGS, LISTENERS>
{
    /// Create an empty bus
    pub const fn new() -> Self {
        Self {
            sources: Vec::new(),
            bindings: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Register a new event source with an empty binding chain
    pub fn add_source(&mut self) -> RtlResult<EventSource> {
        let id = u8::try_from(self.sources.len()).map_err(|_| RtlError::CapacityExhausted)?;
        self.sources
            .push(None)
            .map_err(|_| RtlError::CapacityExhausted)?;
        Ok(EventSource::from_id(SourceId(id)))
    }

    /// Hand a listener object to the bus so bindings can target it
    pub fn register_listener(
        &mut self,
        listener: &'a mut dyn EventListener,
    ) -> RtlResult<ListenerId> {
        let id = u8::try_from(self.listeners.len()).map_err(|_| RtlError::CapacityExhausted)?;
        self.listeners
            .push(listener)
            .map_err(|_| RtlError::CapacityExhausted)?;
        Ok(ListenerId(id))
    }

    /// Take a fresh binding from the arena, not attached to any source
    pub fn create_binding(&mut self, target: BindingTarget) -> RtlResult<BindingId> {
        if let BindingTarget::Listener(listener) = target {
            self.check_listener(listener)?;
        }

        let id = u8::try_from(self.bindings.len()).map_err(|_| RtlError::CapacityExhausted)?;
        self.bindings
            .push(BindingSlot {
                target,
                next: None,
                source: None,
            })
            .map_err(|_| RtlError::CapacityExhausted)?;
        Ok(BindingId(id))
    }

    /// Push `binding` onto the head of `source`'s chain
    ///
    /// A binding already attached somewhere, including to `source` itself,
    /// is detached first, so it never sits in two chains.
    pub fn attach(&mut self, source: EventSource, binding: BindingId) -> RtlResult<()> {
        self.check_source(source)?;
        self.check_binding(binding)?;

        if let Some(owner) = self.bindings[binding.index()].source {
            self.unlink(owner, binding);
        }

        let head = &mut self.sources[source.id().index()];
        let slot = &mut self.bindings[binding.index()];
        slot.next = *head;
        slot.source = Some(source.id());
        *head = Some(binding);

        log::trace!("{}: attach {} -> {:?}", source, binding, slot.target);
        Ok(())
    }

    /// Attach a registered listener, reusing its binding if it has one here
    pub fn attach_listener(
        &mut self,
        source: EventSource,
        listener: ListenerId,
    ) -> RtlResult<BindingId> {
        self.check_listener(listener)?;
        self.attach_target(source, BindingTarget::Listener(listener))
    }

    /// Attach a plain function, reusing its binding if it has one here
    pub fn attach_fn(
        &mut self,
        source: EventSource,
        listener: EventListenerFn,
    ) -> RtlResult<BindingId> {
        self.attach_target(source, BindingTarget::Function(listener))
    }

    /// Point `binding` at `target` and attach it to `source`
    pub fn bind(
        &mut self,
        binding: BindingId,
        target: BindingTarget,
        source: EventSource,
    ) -> RtlResult<()> {
        self.check_binding(binding)?;
        if let BindingTarget::Listener(listener) = target {
            self.check_listener(listener)?;
        }

        self.bindings[binding.index()].target = target;
        self.attach(source, binding)
    }

    /// Remove `binding` from `source`'s chain
    ///
    /// Returns `false`, changing nothing, when the binding is not in that chain.
    pub fn detach(&mut self, source: EventSource, binding: BindingId) -> bool {
        let attached_here = self
            .bindings
            .get(binding.index())
            .is_some_and(|slot| slot.source == Some(source.id()));

        if !attached_here {
            log::trace!("{}: detach {} not found", source, binding);
            return false;
        }

        self.unlink(source.id(), binding)
    }

    /// Check if any binding is attached to `source`
    pub fn has_listeners(&self, source: EventSource) -> bool {
        self.head(source.id()).is_some()
    }

    /// Bindings of `source` in the order they are notified
    pub fn chain(&self, source: EventSource) -> Chain<'_> {
        Chain {
            slots: &self.bindings,
            cursor: self.head(source.id()),
        }
    }

    /// Target of a binding
    pub fn target(&self, binding: BindingId) -> Option<BindingTarget> {
        self.bindings.get(binding.index()).map(|slot| slot.target)
    }

    /// Source a binding is attached to, if any
    pub fn attached_to(&self, binding: BindingId) -> Option<EventSource> {
        self.bindings
            .get(binding.index())
            .and_then(|slot| slot.source)
            .map(EventSource::from_id)
    }

    /// Create an event from `source` and deliver it to its listeners now
    ///
    /// Bypasses the queue entirely.
    pub fn dispatch(
        &mut self,
        source: EventSource,
        id: impl Into<EventId>,
        payload: impl Into<Variant>,
    ) {
        self.multicast(&source.event(id, payload));
    }

    /// Stamp `event` with `source` and deliver it to its listeners now
    pub fn dispatch_from(&mut self, source: EventSource, event: Event) {
        self.multicast(&event.with_source(source.id()));
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn multicast(&mut self, event: &Event) {
        let Some(source) = event.source else {
            return;
        };

        let mut cursor = self.head(source);
        while let Some(binding) = cursor {
            let Some(slot) = self.bindings.get(binding.index()).copied() else {
                break;
            };
            self.forward(slot.target, event);
            cursor = slot.next;
        }
    }

    fn forward(&mut self, target: BindingTarget, event: &Event) {
        match target {
            BindingTarget::Unbound => {}
            BindingTarget::Listener(id) => {
                if let Some(listener) = self.listeners.get_mut(id.index()) {
                    listener.on_event(event);
                }
            }
            BindingTarget::Function(func) => func(event),
        }
    }

    fn attach_target(&mut self, source: EventSource, target: BindingTarget) -> RtlResult<BindingId> {
        self.check_source(source)?;

        let existing = self
            .chain(source)
            .find(|binding| self.bindings[binding.index()].target.same_as(&target));
        if let Some(binding) = existing {
            return Ok(binding);
        }

        let binding = match self.find_detached(&target) {
            Some(binding) => binding,
            None => self.create_binding(target)?,
        };
        self.attach(source, binding)?;
        Ok(binding)
    }

    /// A binding with this target that is not in any chain
    fn find_detached(&self, target: &BindingTarget) -> Option<BindingId> {
        self.bindings
            .iter()
            .position(|slot| slot.source.is_none() && slot.target.same_as(target))
            .and_then(|index| u8::try_from(index).ok())
            .map(BindingId)
    }

    fn unlink(&mut self, source: SourceId, binding: BindingId) -> bool {
        let next = self.bindings[binding.index()].next;
        let head = self.head(source);

        if head == Some(binding) {
            self.sources[source.index()] = next;
        } else {
            match self.find_prev(head, binding) {
                Some(prev) => self.bindings[prev.index()].next = next,
                None => return false,
            }
        }

        let slot = &mut self.bindings[binding.index()];
        slot.next = None;
        slot.source = None;

        log::trace!("{}: detach {}", source, binding);
        true
    }

    fn find_prev(&self, head: Option<BindingId>, binding: BindingId) -> Option<BindingId> {
        let mut cursor = head;
        while let Some(current) = cursor {
            let next = self.bindings[current.index()].next;
            if next == Some(binding) {
                return Some(current);
            }
            cursor = next;
        }
        None
    }

    fn head(&self, source: SourceId) -> Option<BindingId> {
        self.sources.get(source.index()).copied().flatten()
    }

    fn check_source(&self, source: EventSource) -> RtlResult<()> {
        if source.id().index() < self.sources.len() {
            Ok(())
        } else {
            Err(RtlError::InvalidHandle)
        }
    }

    fn check_binding(&self, binding: BindingId) -> RtlResult<()> {
        if binding.index() < self.bindings.len() {
            Ok(())
        } else {
            Err(RtlError::InvalidHandle)
        }
    }

    fn check_listener(&self, listener: ListenerId) -> RtlResult<()> {
        if listener.index() < self.listeners.len() {
            Ok(())
        } else {
            Err(RtlError::InvalidHandle)
        }
    }
}

impl<const SOURCES: usize, const BINDINGS: usize, const LISTENERS: usize> EventDispatch
    for EventBus<'_, SOURCES, BINDINGS, LISTENERS>
{
    /// Deliver a queued event to the listeners of the source that raised it
    ///
    /// Events without a source have nobody to go to and are dropped.
    fn dispatch_event(&mut self, event: &Event) {
        self.multicast(event);
    }
}

impl<const SOURCES: usize, const BINDINGS: usize, const LISTENERS: usize> Default
    for EventBus<'_, SOURCES, BINDINGS, LISTENERS>
{
    fn default() -> Self {
        Self::new()
    }
}
