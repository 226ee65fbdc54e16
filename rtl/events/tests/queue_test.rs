//! Queue behaviour with producers racing the consumer
//!
//! Producer threads stand in for interrupt handlers; `critical-section/std`
//! provides the masking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rtl_events::*;

const PRODUCERS: usize = 4;
const POSTS_PER_PRODUCER: usize = 2000;

static EVENTS: EventQueue<8> = EventQueue::new();

#[test]
fn test_racing_producers_never_overfill() {
    static ACCEPTED: AtomicUsize = AtomicUsize::new(0);

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            thread::spawn(move || {
                let source = SourceId(producer as u8);
                for i in 0..POSTS_PER_PRODUCER {
                    if EVENTS.enqueue(source, EventId::TIMER_FIRED, i as u32).is_ok() {
                        ACCEPTED.fetch_add(1, Ordering::SeqCst);
                    }
                    assert!(EVENTS.len() <= EVENTS.capacity());
                }
            })
        })
        .collect();

    let mut delivered = 0;
    let mut per_source = [0usize; PRODUCERS];
    let mut last_seen = [None::<u32>; PRODUCERS];

    let mut deliver = |event: Event| {
        assert!(EVENTS.len() <= EVENTS.capacity());

        // Each producer's events come out in the order they went in
        let producer = event.source.map(|source| source.index()).unwrap();
        let sequence = event.payload.as_u32().unwrap();
        if let Some(previous) = last_seen[producer] {
            assert!(sequence > previous);
        }
        last_seen[producer] = Some(sequence);
        per_source[producer] += 1;
    };

    loop {
        let finished = producers.iter().all(|handle| handle.is_finished());
        delivered += EVENTS.drain_pending(&mut deliver);
        assert!(EVENTS.len() <= EVENTS.capacity());

        if finished {
            break;
        }
    }

    for handle in producers {
        handle.join().unwrap();
    }
    delivered += EVENTS.drain_pending(&mut deliver);

    assert!(EVENTS.is_empty());
    assert_eq!(delivered, ACCEPTED.load(Ordering::SeqCst));
    assert_eq!(per_source.iter().sum::<usize>(), delivered);
}
