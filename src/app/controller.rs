//! Light controller: the hexagonal core.
//!
//! [`LightController`] owns the FSM, its context, the parameter store and
//! the auto-off timer.  Every input (motion edge, parameter write, timer
//! expiry) goes through one `&mut self` method, so transitions run one at
//! a time and a write plus its change notification is never interleaved
//! with anything else.
//!
//! ```text
//!   motion ───────┐
//!   param write ──┼──▶ ┌──────────────────────────┐ ──▶ EventSink
//!   timer poll ───┘    │     LightController      │
//!                      │ FSM · store · scheduler  │ ──▶ ActuatorPort
//!                      └──────────────────────────┘
//! ```

use embassy_time::Instant;
use log::{info, warn};

use crate::fsm::context::{LightContext, ParameterSnapshot, TimerCommand};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, LightEvent, StateId};
use crate::params::{
    Access, ParameterDefaults, ParameterError, ParameterStore, ResourceId,
};
use crate::scheduler::TimeoutScheduler;

use super::commands::AppCommand;
use super::events::{AppEvent, LightStatus};
use super::ports::{ActuatorPort, EventSink};

// ───────────────────────────────────────────────────────────────
// LightController
// ───────────────────────────────────────────────────────────────

/// The light controller orchestrates all domain logic.
pub struct LightController {
    fsm: Fsm,
    ctx: LightContext,
    store: ParameterStore,
    timer: TimeoutScheduler,
}

impl LightController {
    /// Construct the controller with the given parameter defaults.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(defaults: ParameterDefaults) -> Self {
        let mut store = ParameterStore::new(defaults);
        store.watch(ResourceId::Color);
        store.watch(ResourceId::PermanentStatus);

        let ctx = LightContext::new(ParameterSnapshot::from_store(&store));
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Self {
            fsm,
            ctx,
            store,
            timer: TimeoutScheduler::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter the initial state.  Drives the actuator dark.
    pub fn start(&mut self, now: Instant, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.refresh_snapshot();
        self.fsm.start(&mut self.ctx);
        self.apply_commands(now, hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("LightController started in {:?}", self.fsm.current_state());
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Handle one motion edge.
    ///
    /// The counter moves in every state; only the sensor-driven states
    /// react visibly.
    pub fn on_motion(
        &mut self,
        now: Instant,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let count = self.store.motion_count().saturating_add(1);
        self.commit(
            ResourceId::MotionCount,
            i64::try_from(count).unwrap_or(i64::MAX),
            now,
            hw,
            sink,
        );
        sink.emit(&AppEvent::MotionDetected { count });
        self.dispatch(LightEvent::Motion, now, hw, sink);
    }

    /// Check the auto-off timer.  Returns `true` if it fired.
    pub fn poll_timer(
        &mut self,
        now: Instant,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        self.dispatch(LightEvent::TimeoutExpired, now, hw, sink);
        true
    }

    /// Device-local write.  Skips the network access check, but the motion
    /// counter only ever moves through [`on_motion`](Self::on_motion).
    pub fn write_parameter(
        &mut self,
        id: ResourceId,
        value: i64,
        now: Instant,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<(), ParameterError> {
        if id == ResourceId::MotionCount {
            warn!("Local write to {} refused", id);
            return Err(ParameterError::ReadOnly(id));
        }
        self.commit(id, value, now, hw, sink);
        Ok(())
    }

    /// Network write by path.  Read-only and unknown resources are refused
    /// without touching any state.
    pub fn remote_write(
        &mut self,
        path: &str,
        value: i64,
        now: Instant,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<(), ParameterError> {
        let result = ResourceId::from_path(path)
            .ok_or(ParameterError::UnknownResource)
            .and_then(|id| match id.access() {
                Access::ReadWrite => Ok(id),
                Access::ReadOnly => Err(ParameterError::ReadOnly(id)),
            });

        match result {
            Ok(id) => {
                self.commit(id, value, now, hw, sink);
                Ok(())
            }
            Err(error) => {
                warn!("Remote write to '{}' rejected: {}", path, error);
                sink.emit(&AppEvent::RemoteWriteRejected { error });
                Err(error)
            }
        }
    }

    /// Network read by path.
    pub fn remote_read(&self, path: &str) -> Result<i64, ParameterError> {
        ResourceId::from_path(path)
            .map(|id| self.store.read(id))
            .ok_or(ParameterError::UnknownResource)
    }

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now: Instant,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<(), ParameterError> {
        match cmd {
            AppCommand::RemoteWrite { path, value } => {
                self.remote_write(&path, value, now, hw, sink)
            }
            AppCommand::LocalWrite { id, value } => {
                self.write_parameter(id, value, now, hw, sink)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn read(&self, id: ResourceId) -> i64 {
        self.store.read(id)
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.store
    }

    pub fn motion_latch(&self) -> bool {
        self.ctx.motion_latch
    }

    /// When the auto-off timer will fire, if armed.
    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn status(&self) -> LightStatus {
        LightStatus {
            state: self.fsm.current_state(),
            color: self.store.read(ResourceId::Color),
            timeout_secs: self.store.timeout_secs(),
            permanent_status: self.store.permanent_status(),
            motion_count: self.store.motion_count(),
            motion_latch: self.ctx.motion_latch,
            timer_armed: self.timer.is_armed(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Commit a value and run its change notification to completion.
    fn commit(
        &mut self,
        id: ResourceId,
        value: i64,
        now: Instant,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let change = self.store.write(id, value);
        sink.emit(&AppEvent::ParameterChanged { id, value });

        let Some(change) = change else {
            return;
        };
        let event = match change.id {
            ResourceId::Color => LightEvent::ColorWritten,
            ResourceId::PermanentStatus => LightEvent::StatusWritten,
            ResourceId::Timeout | ResourceId::MotionCount => return,
        };
        self.dispatch(event, now, hw, sink);
    }

    fn dispatch(
        &mut self,
        event: LightEvent,
        now: Instant,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let prev = self.fsm.current_state();
        self.refresh_snapshot();
        let next = self.fsm.dispatch(event, &mut self.ctx);
        self.apply_commands(now, hw);

        if next != prev {
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: next,
            });
        }
    }

    fn refresh_snapshot(&mut self) {
        self.ctx.params = ParameterSnapshot::from_store(&self.store);
    }

    /// Translate FSM commands into scheduler and port calls.
    fn apply_commands(&mut self, now: Instant, hw: &mut impl ActuatorPort) {
        let cmds = self.ctx.take_commands();

        match cmds.timer {
            Some(TimerCommand::Arm(after)) => self.timer.arm(after, now),
            Some(TimerCommand::Cancel) => self.timer.cancel(),
            None => {}
        }

        if let Some(color) = cmds.apply {
            hw.set_color(color);
        }
    }
}

impl Default for LightController {
    fn default() -> Self {
        Self::new(ParameterDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::params::PermanentStatus;

    #[derive(Default)]
    struct LastColor(Option<Color>);

    impl ActuatorPort for LastColor {
        fn set_color(&mut self, color: Color) {
            self.0 = Some(color);
        }
    }

    #[derive(Default)]
    struct Events(Vec<AppEvent>);

    impl EventSink for Events {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    fn t(secs: u64) -> Instant {
        Instant::from_secs(secs)
    }

    fn started() -> (LightController, LastColor, Events) {
        let mut ctl = LightController::default();
        let mut hw = LastColor::default();
        let mut sink = Events::default();
        ctl.start(t(0), &mut hw, &mut sink);
        (ctl, hw, sink)
    }

    #[test]
    fn start_drives_actuator_dark() {
        let (ctl, hw, sink) = started();
        assert_eq!(ctl.state(), StateId::Idle);
        assert_eq!(hw.0, Some(Color::OFF));
        assert_eq!(sink.0, vec![AppEvent::Started(StateId::Idle)]);
    }

    #[test]
    fn motion_count_moves_in_forced_off() {
        let (mut ctl, mut hw, mut sink) = started();
        ctl.write_parameter(
            ResourceId::PermanentStatus,
            PermanentStatus::Off.as_raw(),
            t(0),
            &mut hw,
            &mut sink,
        )
        .unwrap();
        ctl.on_motion(t(1), &mut hw, &mut sink);
        assert_eq!(ctl.parameters().motion_count(), 1);
        assert_eq!(hw.0, Some(Color::OFF));
        assert_eq!(ctl.timer_deadline(), None);
    }

    #[test]
    fn remote_write_to_counter_is_refused() {
        let (mut ctl, mut hw, mut sink) = started();
        ctl.on_motion(t(0), &mut hw, &mut sink);
        let r = ctl.remote_write("pir/0/count", 0, t(1), &mut hw, &mut sink);
        assert_eq!(r, Err(ParameterError::ReadOnly(ResourceId::MotionCount)));
        assert_eq!(ctl.read(ResourceId::MotionCount), 1);
    }

    #[test]
    fn remote_write_to_unknown_path_is_refused() {
        let (mut ctl, mut hw, mut sink) = started();
        let r = ctl.remote_write("led/9/color", 1, t(0), &mut hw, &mut sink);
        assert_eq!(r, Err(ParameterError::UnknownResource));
        assert!(sink
            .0
            .contains(&AppEvent::RemoteWriteRejected {
                error: ParameterError::UnknownResource
            }));
    }

    #[test]
    fn remote_read_resolves_aliases() {
        let (ctl, _, _) = started();
        assert_eq!(ctl.remote_read("3311/0/5853"), Ok(5));
        assert_eq!(ctl.remote_read("nope"), Err(ParameterError::UnknownResource));
    }

    #[test]
    fn timeout_write_takes_effect_on_next_arm() {
        let (mut ctl, mut hw, mut sink) = started();
        ctl.on_motion(t(0), &mut hw, &mut sink);
        ctl.write_parameter(ResourceId::Timeout, 10, t(1), &mut hw, &mut sink)
            .unwrap();
        assert_eq!(ctl.timer_deadline(), Some(t(5)), "pending expiry unchanged");

        ctl.on_motion(t(2), &mut hw, &mut sink);
        assert_eq!(ctl.timer_deadline(), Some(t(12)));
    }

    #[test]
    fn state_change_is_emitted_once_per_move() {
        let (mut ctl, mut hw, mut sink) = started();
        ctl.on_motion(t(0), &mut hw, &mut sink);
        ctl.on_motion(t(1), &mut hw, &mut sink);
        let changes = sink
            .0
            .iter()
            .filter(|e| matches!(e, AppEvent::StateChanged { .. }))
            .count();
        assert_eq!(changes, 1);
    }
}
