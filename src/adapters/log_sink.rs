//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC on the device).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::ParameterChanged { id, value } => {
                info!("PARAM | {} = {} (0x{:06X})", id, value, value);
            }
            AppEvent::MotionDetected { count } => {
                info!("MOTION | count={}", count);
            }
            AppEvent::MotionOverflow { dropped } => {
                warn!("MOTION | queue overflow, {} edge(s) dropped", dropped);
            }
            AppEvent::RemoteWriteRejected { error } => {
                warn!("CLOUD | write rejected: {}", error);
            }
            AppEvent::Registered => {
                info!("CLOUD | registered");
            }
            AppEvent::Unregistered => {
                warn!("CLOUD | unregistered");
            }
            AppEvent::Status(s) => {
                info!(
                    "STATUS | state={:?} | color=0x{:06X} timeout={}s permanent={:?} | \
                     motion={} latch={} timer={}",
                    s.state,
                    s.color,
                    s.timeout_secs,
                    s.permanent_status,
                    s.motion_count,
                    s.motion_latch,
                    if s.timer_armed { "armed" } else { "idle" },
                );
            }
        }
    }
}
