//! Recording adapters for integration tests.
//!
//! Every actuator write and every emitted event is kept so tests can
//! assert on the full history without touching real GPIO/PWM registers.

use embassy_time::Instant;
use lighting_system::app::events::AppEvent;
use lighting_system::app::ports::{ActuatorPort, EventSink};
use lighting_system::color::Color;

pub fn t(secs: u64) -> Instant {
    Instant::from_secs(secs)
}

// ── RecordingActuator ─────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub writes: Vec<Color>,
}

#[allow(dead_code)]
impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the light shows right now.  Dark before the first write.
    pub fn output(&self) -> Color {
        self.writes.last().copied().unwrap_or(Color::OFF)
    }

    pub fn write_count(&self) -> usize {
        self.writes.len()
    }
}

impl ActuatorPort for RecordingActuator {
    fn set_color(&mut self, color: Color) {
        self.writes.push(color);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
