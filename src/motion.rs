//! PIR motion monitor.
//!
//! ## Hardware
//!
//! The PIR module drives a clean digital output; its own comparator and
//! retrigger logic do the filtering, so the firmware only listens for the
//! rising edge.  The GPIO ISR calls [`pir_isr_handler`], which turns each
//! edge into exactly one [`Event::MotionDetected`] through the static
//! [`PirEdge`] and returns.  That handle is push-only: the consuming end of
//! the queue belongs to the main loop.
//!
//! Everything else (counting, lighting, timers, cloud updates) happens on
//! the main loop after it pops the event.

use crate::events::{EVENT_QUEUE_DEPTH, EVENTS, Event, EventProducer};
use crate::pins::PIR_GPIO;

/// ISR-side handle for one PIR input.
///
/// Wraps a push-only [`EventProducer`], so code holding a `PirEdge` has no
/// path to the controller, the parameter store or the actuators.
#[derive(Clone, Copy)]
pub struct PirEdge<'a, const N: usize> {
    producer: EventProducer<'a, N>,
    gpio: i32,
}

impl<'a, const N: usize> PirEdge<'a, N> {
    pub const fn new(gpio: i32, producer: EventProducer<'a, N>) -> Self {
        Self { producer, gpio }
    }

    /// GPIO pin this sensor is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Record one rising edge.  Lock-free; safe in interrupt context.
    pub fn on_rising_edge(&self) -> bool {
        self.producer.push(Event::MotionDetected)
    }
}

/// The board's PIR input, wired to the firmware-wide queue.
static PIR: PirEdge<'static, EVENT_QUEUE_DEPTH> = PirEdge::new(PIR_GPIO, EVENTS.producer());

/// ISR handler: register this on the PIR GPIO rising edge.
pub fn pir_isr_handler() {
    // A dropped edge is counted by the queue; nothing more can be done here.
    let _ = PIR.on_rising_edge();
}
