//! Cooperative runtime: the single path that touches the controller.
//!
//! [`Runtime::step`] is called once per main-loop iteration.  It fires an
//! auto-off deadline that has already passed, then drains queued motion
//! edges and cloud notices (registration, remote writes), then sends a
//! keep-alive when one is due.  An edge that arrived after the deadline
//! therefore finds the lamp dark and relights it.
//! Nothing else holds `&mut LightController`, so inputs are handled one at
//! a time no matter which context produced them.
//!
//! ```text
//!  timer deadline ───┐
//!  PIR ISR queue ────┼──▶ Runtime::step ──▶ LightController ──▶ ActuatorPort
//!  CLOUD_INBOX ──────┘                              │
//!                                        Mirror ◀───┘ AppEvent
//!                                   (EventSink + CloudPort::write)
//! ```

use embassy_time::{Duration, Instant};
use log::{debug, info, warn};

use crate::app::commands::AppCommand;
use crate::app::controller::LightController;
use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, CloudError, CloudEvent, CloudPort, EventSink};
use crate::config::SystemConfig;
use crate::drivers::status_led::StatusLed;
use crate::error::Result;
use crate::events::{Event, EventConsumer};
use crate::params::ResourceId;

/// Forwards every event to the sink and mirrors parameter changes to the
/// cloud so remote observers are notified.
struct Mirror<'a, S, C> {
    sink: &'a mut S,
    cloud: &'a mut C,
}

impl<S: EventSink, C: CloudPort> EventSink for Mirror<'_, S, C> {
    fn emit(&mut self, event: &AppEvent) {
        self.sink.emit(event);
        if let AppEvent::ParameterChanged { id, value } = *event {
            match self.cloud.write(id, value) {
                Ok(()) => {}
                // Bridge is behind; the registry still holds the value.
                Err(CloudError::QueueFull) => debug!("Cloud: outbox full, {} not pushed", id),
                Err(e) => warn!("Cloud: mirroring {} failed: {}", id, e),
            }
        }
    }
}

pub struct Runtime<A, S, C> {
    controller: LightController,
    actuator: A,
    sink: S,
    cloud: C,
    status_led: StatusLed,
    keep_alive_every: Duration,
    next_keep_alive: Option<Instant>,
}

impl<A, S, C> Runtime<A, S, C>
where
    A: ActuatorPort,
    S: EventSink,
    C: CloudPort,
{
    pub fn new(config: &SystemConfig, actuator: A, sink: S, cloud: C) -> Self {
        Self {
            controller: LightController::new(config.parameter_defaults()),
            actuator,
            sink,
            cloud,
            status_led: StatusLed::default(),
            keep_alive_every: Duration::from_secs(u64::from(config.keep_alive_interval_secs)),
            next_keep_alive: None,
        }
    }

    /// Publish the resources and enter the initial state.  The actuator is
    /// dark when this returns.  Any cloud refusal is fatal.
    pub fn start(&mut self, now: Instant) -> Result<()> {
        for id in ResourceId::ALL {
            self.cloud.define_resource(id, self.controller.read(id))?;
        }

        let mut mirror = Mirror {
            sink: &mut self.sink,
            cloud: &mut self.cloud,
        };
        self.controller.start(now, &mut self.actuator, &mut mirror);
        self.next_keep_alive = Some(now + self.keep_alive_every);
        info!("Runtime: {} resources published", ResourceId::COUNT);
        Ok(())
    }

    /// One pass of the cooperative loop.
    pub fn step<const N: usize>(&mut self, events: &EventConsumer<'_, N>, now: Instant) {
        let mut mirror = Mirror {
            sink: &mut self.sink,
            cloud: &mut self.cloud,
        };
        self.controller.poll_timer(now, &mut self.actuator, &mut mirror);

        self.drain_motion(events, now);
        self.drain_cloud(now);
        self.service_keep_alive(now);
    }

    fn drain_motion<const N: usize>(&mut self, events: &EventConsumer<'_, N>, now: Instant) {
        let Self {
            controller,
            actuator,
            sink,
            cloud,
            ..
        } = self;
        let mut mirror = Mirror { sink, cloud };

        events.drain(|event| match event {
            Event::MotionDetected => controller.on_motion(now, &mut *actuator, &mut mirror),
        });

        let dropped = events.take_dropped();
        if dropped > 0 {
            mirror.emit(&AppEvent::MotionOverflow { dropped });
        }
    }

    fn drain_cloud(&mut self, now: Instant) {
        while let Some(event) = self.cloud.poll() {
            match event {
                CloudEvent::Registered => {
                    self.status_led.set(true);
                    self.sink.emit(&AppEvent::Registered);
                }
                CloudEvent::Unregistered => {
                    self.status_led.set(false);
                    self.sink.emit(&AppEvent::Unregistered);
                }
                CloudEvent::RemoteWrite { path, value } => {
                    let mut mirror = Mirror {
                        sink: &mut self.sink,
                        cloud: &mut self.cloud,
                    };
                    // Rejections are logged and emitted by the controller.
                    let _ = self.controller.handle_command(
                        AppCommand::RemoteWrite { path, value },
                        now,
                        &mut self.actuator,
                        &mut mirror,
                    );
                }
            }
        }
    }

    fn service_keep_alive(&mut self, now: Instant) {
        let Some(due) = self.next_keep_alive else {
            return;
        };
        if now < due {
            return;
        }
        if self.cloud.is_registered() {
            if let Err(e) = self.cloud.keep_alive() {
                warn!("Cloud: keep-alive failed: {}", e);
            }
        }
        self.sink.emit(&AppEvent::Status(self.controller.status()));
        self.next_keep_alive = Some(now + self.keep_alive_every);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn controller(&self) -> &LightController {
        &self.controller
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn cloud(&self) -> &C {
        &self.cloud
    }

    pub fn status_led(&self) -> &StatusLed {
        &self.status_led
    }

    /// When the next keep-alive is due, once started.
    pub fn next_keep_alive(&self) -> Option<Instant> {
        self.next_keep_alive
    }
}
