//! Interrupt-safe event queue
//!
//! A fixed-capacity FIFO of [`Event`] values shared between interrupt
//! handlers (producers) and the main loop (the single consumer).
//!
//! The two ends guard the shared ring differently:
//!
//! - [`EventQueue::enqueue_event`] does the full check and the insert inside
//!   one critical section. A producer that checked for room outside it could
//!   be interrupted by another producer filling the last slot.
//! - [`EventQueue::dequeue`] reads the pending counter *before* entering the
//!   critical section. Producers only ever add, so a stale "empty" answer just
//!   defers the event to the next call, and the common empty case never masks
//!   interrupts.

use core::cell::RefCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use critical_section::Mutex;
use heapless::Deque;
use rtl_core::{Event, EventId, RtlError, RtlResult, SourceId, Variant};

use crate::DEFAULT_QUEUE_CAPACITY;

/// Receiver of dequeued events
///
/// Implemented by [`EventBus`](crate::EventBus), which multicasts to the
/// originating source's listeners, and by the task manager, which forwards
/// to its current state.
pub trait EventDispatch {
    /// Deliver one event
    fn dispatch_event(&mut self, event: &Event);
}

impl<D: EventDispatch + ?Sized> EventDispatch for &mut D {
    fn dispatch_event(&mut self, event: &Event) {
        (**self).dispatch_event(event);
    }
}

/// Bounded FIFO of events
pub struct EventQueue<const N: usize> {
    slots: Mutex<RefCell<Deque<Event, N>>>,
    /// Mirror of the number of queued events, readable without masking
    pending: AtomicUsize,
}

impl<const N: usize> EventQueue<N> {
    /// Create a new empty event queue
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Deque::new())),
            pending: AtomicUsize::new(0),
        }
    }

    /// Queue an event raised by `source`
    ///
    /// Fails with [`RtlError::QueueFull`] when every slot is taken. The event
    /// is dropped; retrying is up to the caller.
    pub fn enqueue(
        &self,
        source: SourceId,
        id: impl Into<EventId>,
        payload: impl Into<Variant>,
    ) -> RtlResult<()> {
        self.enqueue_event(Event::new(id, payload).with_source(source))
    }

    /// Queue an already built event as is
    ///
    /// Safe to call from interrupt handlers.
    pub fn enqueue_event(&self, event: Event) -> RtlResult<()> {
        let queued = critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let queued = slots.push_back(event).is_ok();
            self.pending.store(slots.len(), Ordering::Release);
            queued
        });

        if queued {
            Ok(())
        } else {
            log::warn!("event queue full, dropped {}", event.id);
            Err(RtlError::QueueFull)
        }
    }

    /// Take the oldest event, if any
    ///
    /// Main loop only: there must be a single consumer.
    pub fn dequeue(&self) -> Option<Event> {
        // Producers only add, so a zero here is safe to trust for this call.
        if self.pending.load(Ordering::Acquire) == 0 {
            return None;
        }

        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let event = slots.pop_front();
            self.pending.store(slots.len(), Ordering::Release);
            event
        })
    }

    /// Deliver the events that are queued right now, oldest first
    ///
    /// Exactly the number of events present on entry is taken. Events posted
    /// by `deliver` itself wait for the next call, so two listeners that keep
    /// triggering each other cannot starve the main loop.
    ///
    /// Returns the number of events delivered.
    pub fn drain_pending<F>(&self, mut deliver: F) -> usize
    where
        F: FnMut(Event),
    {
        let count = self.len();
        let mut delivered = 0;

        for _ in 0..count {
            match self.dequeue() {
                Some(event) => {
                    log::trace!("dispatch {} from {:?}", event.id, event.source);
                    deliver(event);
                    delivered += 1;
                }
                None => break,
            }
        }

        delivered
    }

    /// Drain the pending events into `target`
    pub fn dispatch<D>(&self, target: &mut D) -> usize
    where
        D: EventDispatch + ?Sized,
    {
        self.drain_pending(|event| target.dispatch_event(&event))
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the queue is full
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Get the maximum capacity of the queue
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide queue for interrupt handlers
static GLOBAL_QUEUE: EventQueue<DEFAULT_QUEUE_CAPACITY> = EventQueue::new();

/// Get the process-wide event queue
///
/// Firmware with a single queue can post to this one from any context and
/// drain it once per tick. Code that wants its own sizing declares its own
/// `static` [`EventQueue`] instead.
pub fn global() -> &'static EventQueue<DEFAULT_QUEUE_CAPACITY> {
    &GLOBAL_QUEUE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtl_core::{EventCode, SourceCategory};

    const SRC: SourceId = SourceId(0);

    fn id(code: u8) -> EventId {
        EventId::compose(SourceCategory::CUSTOM, EventCode(code))
    }

    #[test]
    fn test_event_queue_fifo() {
        let queue: EventQueue<4> = EventQueue::new();

        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);

        queue.enqueue(SRC, id(10), 1i32).unwrap();
        queue.enqueue(SRC, id(20), 2i32).unwrap();
        queue.enqueue(SRC, id(30), 3i32).unwrap();

        assert_eq!(queue.len(), 3);

        assert_eq!(queue.dequeue().map(|e| e.id), Some(id(10)));
        assert_eq!(queue.dequeue().map(|e| e.id), Some(id(20)));
        assert_eq!(queue.dequeue().map(|e| e.id), Some(id(30)));
        assert_eq!(queue.dequeue(), None);

        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_full() {
        let queue: EventQueue<2> = EventQueue::new();

        assert!(queue.enqueue(SRC, id(1), 0i32).is_ok());
        assert!(queue.enqueue(SRC, id(2), 0i32).is_ok());

        assert!(queue.is_full());
        assert_eq!(queue.enqueue(SRC, id(3), 0i32), Err(RtlError::QueueFull));
        assert_eq!(queue.len(), 2);

        // The rejected event never made it in
        assert_eq!(queue.dequeue().map(|e| e.id), Some(id(1)));
        assert_eq!(queue.dequeue().map(|e| e.id), Some(id(2)));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_enqueue_stamps_source() {
        let queue: EventQueue<2> = EventQueue::new();
        queue.enqueue(SourceId(7), id(1), true).unwrap();

        let event = queue.dequeue().unwrap();
        assert_eq!(event.source, Some(SourceId(7)));
        assert_eq!(event.payload, Variant::Bool(true));
    }

    #[test]
    fn test_wraparound() {
        let queue: EventQueue<3> = EventQueue::new();

        for round in 0..4u8 {
            for i in 0..3u8 {
                queue.enqueue(SRC, id(round * 10 + i), 0i32).unwrap();
            }
            for i in 0..3u8 {
                assert_eq!(queue.dequeue().map(|e| e.id), Some(id(round * 10 + i)));
            }
        }
    }

    #[test]
    fn test_drain_only_takes_pending() {
        let queue: EventQueue<4> = EventQueue::new();
        queue.enqueue(SRC, id(1), 0i32).unwrap();
        queue.enqueue(SRC, id(2), 0i32).unwrap();

        let delivered = queue.drain_pending(|event| {
            // Every delivery posts a follow-up event
            let _ = queue.enqueue(SRC, event.id.raw() + 100, 0i32);
        });

        assert_eq!(delivered, 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_global_queue_capacity() {
        assert_eq!(global().capacity(), DEFAULT_QUEUE_CAPACITY);
    }
}
