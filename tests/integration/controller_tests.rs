//! LightController end-to-end behaviour: motion, timer, overrides and
//! colour writes, observed only through the actuator and event sink.

use lighting_system::app::controller::LightController;
use lighting_system::app::events::AppEvent;
use lighting_system::color::Color;
use lighting_system::fsm::StateId;
use lighting_system::params::{ParameterError, PermanentStatus, ResourceId};

use crate::mock_hw::{RecordingActuator, RecordingSink, t};

fn started() -> (LightController, RecordingActuator, RecordingSink) {
    let mut ctl = LightController::default();
    let mut hw = RecordingActuator::new();
    let mut sink = RecordingSink::new();
    ctl.start(t(0), &mut hw, &mut sink);
    (ctl, hw, sink)
}

fn set_status(
    ctl: &mut LightController,
    status: PermanentStatus,
    at: u64,
    hw: &mut RecordingActuator,
    sink: &mut RecordingSink,
) {
    ctl.write_parameter(ResourceId::PermanentStatus, status.as_raw(), t(at), hw, sink).unwrap();
}

// ── Scenarios ─────────────────────────────────────────────────

#[test]
fn motion_in_idle_lights_with_stored_color() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.write_parameter(ResourceId::Color, 0x00FF00, t(0), &mut hw, &mut sink).unwrap();
    ctl.write_parameter(ResourceId::Timeout, 5, t(0), &mut hw, &mut sink).unwrap();

    ctl.on_motion(t(0), &mut hw, &mut sink);

    assert_eq!(hw.output(), Color::new(0.0, 1.0, 0.0));
    assert_eq!(ctl.read(ResourceId::MotionCount), 1);
    assert_eq!(ctl.state(), StateId::MotionLit);
    assert_eq!(ctl.timer_deadline(), Some(t(5)));
    assert!(ctl.motion_latch());
}

#[test]
fn forced_off_mid_timeout_darkens_and_expiry_is_silent() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.on_motion(t(0), &mut hw, &mut sink);

    set_status(&mut ctl, PermanentStatus::Off, 2, &mut hw, &mut sink);
    assert_eq!(hw.output(), Color::OFF);
    assert_eq!(ctl.state(), StateId::ForcedOff);

    let writes = hw.write_count();
    assert!(ctl.poll_timer(t(5), &mut hw, &mut sink), "pending expiry still fires");
    assert_eq!(hw.write_count(), writes, "expiry has no visible effect");
    assert_eq!(ctl.state(), StateId::ForcedOff);
    assert!(!ctl.motion_latch());
}

#[test]
fn color_write_in_idle_is_stored_only() {
    let (mut ctl, mut hw, mut sink) = started();
    let writes = hw.write_count();

    ctl.write_parameter(ResourceId::Color, 0xFF0000, t(1), &mut hw, &mut sink).unwrap();

    assert_eq!(ctl.read(ResourceId::Color), 0xFF0000);
    assert_eq!(hw.write_count(), writes);
    assert_eq!(hw.output(), Color::OFF);
    assert_eq!(ctl.state(), StateId::Idle);
}

#[test]
fn motion_in_forced_off_counts_but_stays_dark() {
    let (mut ctl, mut hw, mut sink) = started();
    set_status(&mut ctl, PermanentStatus::Off, 0, &mut hw, &mut sink);

    ctl.on_motion(t(1), &mut hw, &mut sink);

    assert_eq!(ctl.read(ResourceId::MotionCount), 1);
    assert_eq!(hw.output(), Color::OFF);
    assert_eq!(ctl.timer_deadline(), None);
    assert!(sink.contains(&AppEvent::MotionDetected { count: 1 }));
}

// ── Timer ─────────────────────────────────────────────────────

#[test]
fn second_motion_extends_the_light() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.on_motion(t(0), &mut hw, &mut sink);
    ctl.on_motion(t(3), &mut hw, &mut sink);

    assert!(!ctl.poll_timer(t(5), &mut hw, &mut sink));
    assert_eq!(hw.output(), Color::GREEN, "still lit at t=5");

    assert!(!ctl.poll_timer(t(7), &mut hw, &mut sink));
    assert!(ctl.poll_timer(t(8), &mut hw, &mut sink));
    assert_eq!(hw.output(), Color::OFF);
    assert_eq!(ctl.state(), StateId::Idle);
    assert!(!ctl.motion_latch());
}

#[test]
fn expiry_turns_light_off_and_is_one_shot() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.on_motion(t(0), &mut hw, &mut sink);

    assert!(ctl.poll_timer(t(5), &mut hw, &mut sink));
    assert!(!ctl.poll_timer(t(6), &mut hw, &mut sink));
    assert_eq!(hw.output(), Color::OFF);
    assert!(sink.contains(&AppEvent::StateChanged {
        from: StateId::MotionLit,
        to: StateId::Idle
    }));
}

#[test]
fn negative_timeout_expires_on_next_poll() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.write_parameter(ResourceId::Timeout, -3, t(0), &mut hw, &mut sink).unwrap();
    ctl.on_motion(t(10), &mut hw, &mut sink);
    assert_eq!(hw.output(), Color::GREEN);
    assert!(ctl.poll_timer(t(10), &mut hw, &mut sink));
    assert_eq!(hw.output(), Color::OFF);
}

// ── Overrides ─────────────────────────────────────────────────

#[test]
fn forced_on_tracks_every_color_write() {
    let (mut ctl, mut hw, mut sink) = started();
    set_status(&mut ctl, PermanentStatus::On, 0, &mut hw, &mut sink);
    assert_eq!(hw.output(), Color::GREEN);

    for (i, packed) in [0xFF0000, 0x0000FF, 0x123456, 0xFFFFFF].into_iter().enumerate() {
        ctl.write_parameter(ResourceId::Color, packed, t(i as u64), &mut hw, &mut sink).unwrap();
        assert_eq!(hw.output(), Color::from_packed(packed));
    }
}

#[test]
fn repeated_color_write_in_forced_on_is_idempotent() {
    let (mut ctl, mut hw, mut sink) = started();
    set_status(&mut ctl, PermanentStatus::On, 0, &mut hw, &mut sink);

    ctl.write_parameter(ResourceId::Color, 0x336699, t(1), &mut hw, &mut sink).unwrap();
    let once = hw.output();
    ctl.write_parameter(ResourceId::Color, 0x336699, t(2), &mut hw, &mut sink).unwrap();

    assert_eq!(hw.output(), once);
    assert_eq!(ctl.state(), StateId::ForcedOn);
}

#[test]
fn forced_on_ignores_motion_and_timer() {
    let (mut ctl, mut hw, mut sink) = started();
    set_status(&mut ctl, PermanentStatus::On, 0, &mut hw, &mut sink);
    let writes = hw.write_count();

    ctl.on_motion(t(1), &mut hw, &mut sink);
    assert_eq!(hw.write_count(), writes);
    assert_eq!(ctl.timer_deadline(), None);
    assert_eq!(ctl.read(ResourceId::MotionCount), 1);
}

#[test]
fn forced_on_outlives_pending_expiry() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.write_parameter(ResourceId::Color, 0x336699, t(0), &mut hw, &mut sink).unwrap();
    ctl.on_motion(t(0), &mut hw, &mut sink);
    assert_eq!(ctl.timer_deadline(), Some(t(5)));

    set_status(&mut ctl, PermanentStatus::On, 2, &mut hw, &mut sink);
    let writes = hw.write_count();

    ctl.poll_timer(t(5), &mut hw, &mut sink);
    assert_eq!(ctl.state(), StateId::ForcedOn);
    assert_eq!(hw.output(), Color::from_packed(0x336699));
    assert_eq!(hw.write_count(), writes, "expiry must not touch the light");
    assert_eq!(ctl.timer_deadline(), None);
}

#[test]
fn releasing_override_returns_to_idle_dark() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.on_motion(t(0), &mut hw, &mut sink);
    set_status(&mut ctl, PermanentStatus::On, 1, &mut hw, &mut sink);
    set_status(&mut ctl, PermanentStatus::None, 2, &mut hw, &mut sink);

    assert_eq!(ctl.state(), StateId::Idle);
    assert_eq!(hw.output(), Color::OFF);
    assert!(!ctl.motion_latch());
    assert_eq!(ctl.timer_deadline(), None);
}

#[test]
fn unknown_status_code_defers_to_motion() {
    let (mut ctl, mut hw, mut sink) = started();
    set_status(&mut ctl, PermanentStatus::Off, 0, &mut hw, &mut sink);
    ctl.write_parameter(ResourceId::PermanentStatus, 7, t(1), &mut hw, &mut sink).unwrap();

    assert_eq!(ctl.state(), StateId::Idle);
    assert_eq!(ctl.read(ResourceId::PermanentStatus), 7, "stored as written");
}

#[test]
fn color_write_while_motion_lit_recolors_without_rearming() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.on_motion(t(0), &mut hw, &mut sink);
    ctl.write_parameter(ResourceId::Color, 0x0000FF, t(2), &mut hw, &mut sink).unwrap();

    assert_eq!(hw.output(), Color::new(0.0, 0.0, 1.0));
    assert_eq!(ctl.timer_deadline(), Some(t(5)));
}

// ── Remote writes ─────────────────────────────────────────────

#[test]
fn remote_write_by_alias_matches_named_path() {
    let (mut ctl, mut hw, mut sink) = started();
    set_status(&mut ctl, PermanentStatus::On, 0, &mut hw, &mut sink);

    ctl.remote_write("3311/0/5706", 0xFF0000, t(1), &mut hw, &mut sink)
        .unwrap();
    assert_eq!(hw.output(), Color::new(1.0, 0.0, 0.0));

    ctl.remote_write("/led/0/color", 0x00FF00, t(2), &mut hw, &mut sink)
        .unwrap();
    assert_eq!(hw.output(), Color::GREEN);
}

#[test]
fn remote_write_to_motion_count_changes_nothing() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.on_motion(t(0), &mut hw, &mut sink);
    let state = ctl.state();
    let writes = hw.write_count();

    let err = ctl
        .remote_write("3201/0/5700", 0, t(1), &mut hw, &mut sink)
        .unwrap_err();

    assert_eq!(err, ParameterError::ReadOnly(ResourceId::MotionCount));
    assert_eq!(ctl.read(ResourceId::MotionCount), 1);
    assert_eq!(ctl.state(), state);
    assert_eq!(hw.write_count(), writes);
}

#[test]
fn every_commit_is_reported() {
    let (mut ctl, mut hw, mut sink) = started();
    sink.clear();
    ctl.write_parameter(ResourceId::Timeout, 30, t(0), &mut hw, &mut sink).unwrap();
    ctl.on_motion(t(1), &mut hw, &mut sink);

    assert!(sink.contains(&AppEvent::ParameterChanged {
        id: ResourceId::Timeout,
        value: 30
    }));
    assert!(sink.contains(&AppEvent::ParameterChanged {
        id: ResourceId::MotionCount,
        value: 1
    }));
    assert_eq!(ctl.timer_deadline(), Some(t(31)));
}

#[test]
fn status_snapshot_reflects_controller() {
    let (mut ctl, mut hw, mut sink) = started();
    ctl.on_motion(t(0), &mut hw, &mut sink);
    let status = ctl.status();

    assert_eq!(status.state, StateId::MotionLit);
    assert_eq!(status.color, 0x00FF00);
    assert_eq!(status.timeout_secs, 5);
    assert_eq!(status.permanent_status, PermanentStatus::None);
    assert_eq!(status.motion_count, 1);
    assert!(status.motion_latch);
    assert!(status.timer_armed);
}

#[test]
fn local_writes_never_lower_the_counter() {
    use lighting_system::app::commands::AppCommand;

    let (mut ctl, mut hw, mut sink) = started();
    for at in 0..3 {
        ctl.on_motion(t(at), &mut hw, &mut sink);
    }

    for value in [-7, 0, 1_000] {
        let r = ctl.handle_command(
            AppCommand::LocalWrite { id: ResourceId::MotionCount, value },
            t(3),
            &mut hw,
            &mut sink,
        );
        assert_eq!(r, Err(ParameterError::ReadOnly(ResourceId::MotionCount)));
        assert_eq!(ctl.read(ResourceId::MotionCount), 3);
    }

    ctl.on_motion(t(4), &mut hw, &mut sink);
    assert_eq!(ctl.read(ResourceId::MotionCount), 4);
    assert_eq!(ctl.state(), StateId::MotionLit);
}
