//! Interrupt-to-main-loop event queue.
//!
//! Events are produced by:
//! - the PIR GPIO ISR (rising edge → motion)
//! - software (tests, simulated sensors)
//!
//! Events are consumed by the cooperative loop, which handles them one at
//! a time in FIFO order.
//!
//! ```text
//! ┌─────────────┐  EventProducer  ┌──────────────┐     ┌──────────────┐
//! │ PIR ISR     │────────────────▶│  EventQueue  │────▶│  Main Loop   │
//! │ (restricted)│   push only     │  (bounded)   │     │  (consumer)  │
//! └─────────────┘                 └──────────────┘     └──────────────┘
//! ```
//!
//! The ISR side only ever holds an [`EventProducer`], which can enqueue
//! and nothing else.  A full queue drops the event and bumps an overflow
//! counter instead of blocking inside the interrupt.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Depth of the firmware-wide queue.  Several motion edges can pile up
/// while the main loop is busy with a network round trip.
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Events that cross from the restricted context into the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// PIR sensor reported a rising edge.
    MotionDetected,
}

/// Bounded, non-blocking single-consumer queue.
///
/// The queue itself exposes no way to pop.  Producers get an
/// [`EventProducer`]; the one consumer claims an [`EventConsumer`].
pub struct EventQueue<const N: usize> {
    channel: Channel<CriticalSectionRawMutex, Event, N>,
    dropped: AtomicU32,
    claimed: AtomicBool,
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
            claimed: AtomicBool::new(false),
        }
    }

    /// Handle for the restricted (interrupt) context.
    pub const fn producer(&self) -> EventProducer<'_, N> {
        EventProducer { queue: self }
    }

    /// The consuming end.  Handed out once; later calls return `None`.
    pub fn consumer(&self) -> Option<EventConsumer<'_, N>> {
        if self.claimed.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(EventConsumer { queue: self })
        }
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Push-only view of an [`EventQueue`].
///
/// This is the only thing interrupt handlers get to see.  It cannot pop,
/// cannot touch the parameter store and cannot drive actuators.
#[derive(Clone, Copy)]
pub struct EventProducer<'a, const N: usize> {
    queue: &'a EventQueue<N>,
}

impl<const N: usize> EventProducer<'_, N> {
    /// Enqueue without blocking.  Returns `false` if the event was dropped.
    pub fn push(&self, event: Event) -> bool {
        if self.queue.channel.try_send(event).is_ok() {
            true
        } else {
            self.queue.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }
}

/// The main loop's end of an [`EventQueue`].  Not `Clone`.
pub struct EventConsumer<'a, const N: usize> {
    queue: &'a EventQueue<N>,
}

impl<const N: usize> EventConsumer<'_, N> {
    /// Pop the next event, if any.
    pub fn pop(&self) -> Option<Event> {
        self.queue.channel.try_receive().ok()
    }

    /// Drain all pending events into a callback in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.channel.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.channel.len()
    }

    /// Events dropped because the queue was full, since the last call.
    pub fn take_dropped(&self) -> u32 {
        self.queue.dropped.swap(0, Ordering::AcqRel)
    }
}

/// The firmware-wide queue between the PIR ISR and the main loop.
pub(crate) static EVENTS: EventQueue<EVENT_QUEUE_DEPTH> = EventQueue::new();

/// Claim the consuming end of the firmware-wide queue.  Main loop only;
/// `None` once claimed.
pub fn main_loop_consumer() -> Option<EventConsumer<'static, EVENT_QUEUE_DEPTH>> {
    EVENTS.consumer()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let q: EventQueue<4> = EventQueue::new();
        let rx = q.consumer().unwrap();
        let p = q.producer();
        assert!(p.push(Event::MotionDetected));
        assert!(p.push(Event::MotionDetected));
        assert_eq!(rx.len(), 2);

        let mut seen = 0;
        rx.drain(|e| {
            assert_eq!(e, Event::MotionDetected);
            seen += 1;
        });
        assert_eq!(seen, 2);
        assert!(rx.is_empty());
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let q: EventQueue<2> = EventQueue::new();
        let rx = q.consumer().unwrap();
        let p = q.producer();
        assert!(p.push(Event::MotionDetected));
        assert!(p.push(Event::MotionDetected));
        assert!(!p.push(Event::MotionDetected));
        assert!(!p.push(Event::MotionDetected));
        assert_eq!(rx.take_dropped(), 2);
        assert_eq!(rx.take_dropped(), 0);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn pending_edge_survives_until_consumer_runs() {
        let q: EventQueue<1> = EventQueue::new();
        assert!(q.producer().push(Event::MotionDetected));
        // consumer stalled here
        let rx = q.consumer().unwrap();
        assert_eq!(rx.pop(), Some(Event::MotionDetected));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn consumer_is_handed_out_once() {
        let q: EventQueue<2> = EventQueue::new();
        assert!(q.consumer().is_some());
        assert!(q.consumer().is_none());
    }

    #[test]
    fn global_queue_has_a_single_consumer() {
        assert!(main_loop_consumer().is_some());
        assert!(main_loop_consumer().is_none());
    }
}
