//! Multicast delivery through a bus, directly and via the queue

use core::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicUsize, Ordering};

use rtl_events::*;

/// Listener that appends its tag to a shared log
struct Recorder<'l> {
    tag: u8,
    log: &'l RefCell<heapless::Vec<u8, 16>>,
}

impl EventListener for Recorder<'_> {
    fn on_event(&mut self, _event: &Event) {
        let _ = self.log.borrow_mut().push(self.tag);
    }
}

struct Counter<'c>(&'c Cell<usize>);

impl EventListener for Counter<'_> {
    fn on_event(&mut self, _event: &Event) {
        self.0.set(self.0.get() + 1);
    }
}

/// Listener that raises a follow-up event from the same source
struct Echo<'q> {
    queue: &'q EventQueue<4>,
}

impl EventListener for Echo<'_> {
    fn on_event(&mut self, event: &Event) {
        if let Some(source) = event.source {
            let _ = self
                .queue
                .enqueue(source, event.id, event.payload.as_i32().unwrap_or(0) + 1);
        }
    }
}

type Bus<'a> = EventBus<'a, 4, 8, 4>;

#[test]
fn test_duplicate_attach_delivers_once() {
    let count = Cell::new(0);
    let mut counter = Counter(&count);
    let mut bus: Bus = EventBus::new();

    let source = bus.add_source().unwrap();
    let listener = bus.register_listener(&mut counter).unwrap();

    let first = bus.attach_listener(source, listener).unwrap();
    let second = bus.attach_listener(source, listener).unwrap();
    assert_eq!(first, second);
    assert_eq!(bus.chain(source).count(), 1);

    bus.dispatch(source, EventId::TIMER_FIRED, 0i32);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_latest_listener_hears_first() {
    let log = RefCell::new(heapless::Vec::new());
    let mut a = Recorder { tag: b'a', log: &log };
    let mut b = Recorder { tag: b'b', log: &log };
    let mut c = Recorder { tag: b'c', log: &log };
    let mut bus: Bus = EventBus::new();

    let source = bus.add_source().unwrap();
    let la = bus.register_listener(&mut a).unwrap();
    let lb = bus.register_listener(&mut b).unwrap();
    let lc = bus.register_listener(&mut c).unwrap();

    bus.attach_listener(source, la).unwrap();
    bus.attach_listener(source, lb).unwrap();
    bus.attach_listener(source, lc).unwrap();

    bus.dispatch(source, EventId::NAVIGATION, 0i32);
    assert_eq!(log.borrow().as_slice(), b"cba");
}

#[test]
fn test_detach_stops_delivery() {
    let log = RefCell::new(heapless::Vec::new());
    let mut a = Recorder { tag: b'a', log: &log };
    let mut b = Recorder { tag: b'b', log: &log };
    let mut bus: Bus = EventBus::new();

    let source = bus.add_source().unwrap();
    let la = bus.register_listener(&mut a).unwrap();
    let lb = bus.register_listener(&mut b).unwrap();
    let ba = bus.attach_listener(source, la).unwrap();
    bus.attach_listener(source, lb).unwrap();

    assert!(bus.detach(source, ba));
    assert!(!bus.detach(source, ba));

    bus.dispatch(source, EventId::NAVIGATION, 0i32);
    assert_eq!(log.borrow().as_slice(), b"b");
}

#[test]
fn test_one_listener_many_sources() {
    let log = RefCell::new(heapless::Vec::new());
    let mut a = Recorder { tag: b'a', log: &log };
    let mut bus: Bus = EventBus::new();

    let left = bus.add_source().unwrap();
    let right = bus.add_source().unwrap();
    let idle = bus.add_source().unwrap();
    let la = bus.register_listener(&mut a).unwrap();
    bus.attach_listener(left, la).unwrap();
    bus.attach_listener(right, la).unwrap();

    bus.dispatch(left, EventId::TIMER_FIRED, 0i32);
    bus.dispatch(right, EventId::TIMER_FIRED, 0i32);
    bus.dispatch(idle, EventId::TIMER_FIRED, 0i32);

    assert_eq!(log.borrow().as_slice(), b"aa");
    assert!(!bus.has_listeners(idle));
}

static FN_HITS: AtomicUsize = AtomicUsize::new(0);

fn count_hits(event: &Event) {
    FN_HITS.fetch_add(event.payload.as_i32().unwrap_or(0) as usize, Ordering::SeqCst);
}

#[test]
fn test_function_listener() {
    let mut bus: Bus = EventBus::new();
    let source = bus.add_source().unwrap();

    let first = bus.attach_fn(source, count_hits).unwrap();
    let second = bus.attach_fn(source, count_hits).unwrap();
    assert_eq!(first, second);

    bus.dispatch(source, EventId::TIMER_FIRED, 5i32);
    assert_eq!(FN_HITS.load(Ordering::SeqCst), 5);
}

#[test]
fn test_unbound_binding_is_noop() {
    let mut bus: Bus = EventBus::new();
    let source = bus.add_source().unwrap();
    let binding = bus.create_binding(BindingTarget::Unbound).unwrap();

    bus.attach(source, binding).unwrap();
    assert!(bus.has_listeners(source));

    bus.dispatch(source, EventId::TIMER_FIRED, 0i32);
    assert!(!bus.target(binding).unwrap().is_bound());
}

#[test]
fn test_bind_sets_target_and_attaches() {
    let count = Cell::new(0);
    let mut counter = Counter(&count);
    let mut bus: Bus = EventBus::new();

    let source = bus.add_source().unwrap();
    let listener = bus.register_listener(&mut counter).unwrap();
    let binding = bus.create_binding(BindingTarget::Unbound).unwrap();

    bus.bind(binding, listener.into(), source).unwrap();
    assert_eq!(bus.attached_to(binding), Some(source));

    bus.dispatch(source, EventId::TIMER_FIRED, 0i32);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_queued_dispatch_defers_new_events() {
    let queue: EventQueue<4> = EventQueue::new();
    let mut echo = Echo { queue: &queue };
    let mut bus: Bus = EventBus::new();
    let source = bus.add_source().unwrap();

    let listener = bus.register_listener(&mut echo).unwrap();
    bus.attach_listener(source, listener).unwrap();

    source.queue_event(&queue, EventId::TIMER_FIRED, 1i32).unwrap();

    assert_eq!(queue.dispatch(&mut bus), 1);
    assert_eq!(queue.len(), 1);

    let follow_up = queue.dequeue().unwrap();
    assert_eq!(follow_up.source, Some(source.id()));
    assert_eq!(follow_up.payload, Variant::Long(2));
}

#[test]
fn test_sourceless_event_is_dropped() {
    let count = Cell::new(0);
    let mut counter = Counter(&count);
    let queue: EventQueue<2> = EventQueue::new();
    let mut bus: Bus = EventBus::new();

    let source = bus.add_source().unwrap();
    let listener = bus.register_listener(&mut counter).unwrap();
    bus.attach_listener(source, listener).unwrap();

    queue.enqueue_event(Event::signal(EventId::TIMER_FIRED)).unwrap();
    assert_eq!(queue.dispatch(&mut bus), 1);
    assert_eq!(count.get(), 0);
}

#[test]
fn test_enqueue_past_capacity_fails() {
    let queue: EventQueue<3> = EventQueue::new();
    let mut bus: Bus = EventBus::new();
    let source = bus.add_source().unwrap();

    for i in 0..3i32 {
        source.queue_event(&queue, EventId::TIMER_FIRED, i).unwrap();
    }

    assert_eq!(
        source.queue_event(&queue, EventId::TIMER_FIRED, 3i32),
        Err(RtlError::QueueFull)
    );
    assert_eq!(queue.len(), 3);
}

#[test]
fn test_attach_detach_cycles_do_not_exhaust_arena() {
    let count = Cell::new(0);
    let mut counter = Counter(&count);
    let mut bus: EventBus<'_, 1, 4, 1> = EventBus::new();

    let source = bus.add_source().unwrap();
    let listener = bus.register_listener(&mut counter).unwrap();

    for _ in 0..10 {
        let binding = bus.attach_listener(source, listener).unwrap();
        bus.dispatch(source, EventId::TIMER_FIRED, 0i32);
        assert!(bus.detach(source, binding));
    }

    for _ in 0..10 {
        let binding = bus.attach_fn(source, count_hits).unwrap();
        assert!(bus.detach(source, binding));
    }

    assert_eq!(count.get(), 10);
    assert_eq!(bus.binding_count(), 2);
}
