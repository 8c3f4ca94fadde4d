//! Runtime loop: motion queue, cloud inbox, mirroring and keep-alive,
//! wired to the real `CloudAdapter` over test-local channels.

use lighting_system::adapters::cloud::{CloudAdapter, CloudInbox, CloudLink, CloudOutbox, Outbound};
use lighting_system::app::events::AppEvent;
use lighting_system::app::ports::{CloudError, CloudPort};
use lighting_system::color::Color;
use lighting_system::config::SystemConfig;
use lighting_system::error::Error;
use lighting_system::events::{Event, EventConsumer, EventQueue};
use lighting_system::fsm::StateId;
use lighting_system::params::{ParameterError, ResourceId};
use lighting_system::runtime::Runtime;

use crate::mock_hw::{RecordingActuator, RecordingSink, t};

type TestRuntime<'a> = Runtime<RecordingActuator, RecordingSink, CloudAdapter<'a>>;

struct Rig {
    inbox: CloudInbox,
    outbox: CloudOutbox,
    events: EventQueue<4>,
}

impl Rig {
    fn new() -> Self {
        Self {
            inbox: CloudInbox::new(),
            outbox: CloudOutbox::new(),
            events: EventQueue::new(),
        }
    }

    fn link(&self) -> CloudLink<'_> {
        CloudLink::new(&self.inbox, &self.outbox)
    }

    fn runtime(&self) -> TestRuntime<'_> {
        let config = SystemConfig::default();
        let cloud = CloudAdapter::new(&config.endpoint_name, &self.inbox, &self.outbox);
        let mut rt = Runtime::new(&config, RecordingActuator::new(), RecordingSink::new(), cloud);
        rt.start(t(0)).unwrap();
        rt
    }

    fn consumer(&self) -> EventConsumer<'_, 4> {
        self.events.consumer().unwrap()
    }

    fn motion(&self) -> bool {
        self.events.producer().push(Event::MotionDetected)
    }

    fn drain_outbound(&self) -> Vec<Outbound> {
        std::iter::from_fn(|| self.link().next_outbound()).collect()
    }
}

#[test]
fn start_publishes_all_resources_and_clears_light() {
    let rig = Rig::new();
    let rt = rig.runtime();

    for id in ResourceId::ALL {
        assert_eq!(rt.cloud().read(id), Some(rt.controller().read(id)));
    }
    assert_eq!(rt.actuator().output(), Color::OFF);
    assert_eq!(rt.controller().state(), StateId::Idle);
    assert!(!rt.status_led().is_lit());
}

#[test]
fn start_fails_when_resource_cannot_be_defined() {
    let rig = Rig::new();
    let config = SystemConfig::default();
    let mut cloud = CloudAdapter::new("dup", &rig.inbox, &rig.outbox);
    cloud.define_resource(ResourceId::Color, 0).unwrap();

    let mut rt = Runtime::new(&config, RecordingActuator::new(), RecordingSink::new(), cloud);
    assert_eq!(
        rt.start(t(0)),
        Err(Error::Cloud(CloudError::DuplicateResource(ResourceId::Color)))
    );
}

#[test]
fn queued_motion_lights_and_is_mirrored() {
    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();

    assert!(rig.motion());
    rt.step(&rx, t(1));

    assert_eq!(rt.actuator().output(), Color::GREEN);
    assert_eq!(rt.cloud().read(ResourceId::MotionCount), Some(1));
    assert!(rig.drain_outbound().contains(&Outbound::Update {
        id: ResourceId::MotionCount,
        value: 1
    }));

    rt.step(&rx, t(6));
    assert_eq!(rt.actuator().output(), Color::OFF);
}

#[test]
fn edge_after_missed_deadline_relights_dark_lamp() {
    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();

    assert!(rig.motion());
    rt.step(&rx, t(1));
    assert_eq!(rt.controller().timer_deadline(), Some(t(6)));

    // Loop stalled past the deadline while another edge queued up.
    assert!(rig.motion());
    rt.step(&rx, t(9));

    let writes = &rt.actuator().writes;
    assert_eq!(&writes[writes.len() - 2..], &[Color::OFF, Color::GREEN]);
    assert!(rt.sink().contains(&AppEvent::StateChanged {
        from: StateId::MotionLit,
        to: StateId::Idle
    }));
    assert_eq!(rt.controller().state(), StateId::MotionLit);
    assert_eq!(rt.controller().timer_deadline(), Some(t(14)));
}

#[test]
fn overflowed_edges_are_reported() {
    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();

    let pushed = (0..6).filter(|_| rig.motion()).count();
    assert_eq!(pushed, 4);
    rt.step(&rx, t(1));

    assert_eq!(rt.controller().read(ResourceId::MotionCount), 4);
    assert!(rt.sink().contains(&AppEvent::MotionOverflow { dropped: 2 }));
}

#[test]
fn registration_lights_status_led() {
    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();

    rig.link().notify_registered();
    rt.step(&rx, t(1));
    assert!(rt.status_led().is_lit());
    assert!(rt.cloud().is_registered());
    assert!(rt.sink().contains(&AppEvent::Registered));

    rig.link().notify_unregistered();
    rt.step(&rx, t(2));
    assert!(!rt.status_led().is_lit());
}

#[test]
fn remote_put_goes_through_controller() {
    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();

    rig.link().deliver_put("led/0/permanent_status", 1);
    rig.link().deliver_put("3311/0/5706", 0xFF0000);
    rt.step(&rx, t(1));

    assert_eq!(rt.controller().state(), StateId::ForcedOn);
    assert_eq!(rt.actuator().output(), Color::new(1.0, 0.0, 0.0));
    assert_eq!(rt.cloud().read(ResourceId::Color), Some(0xFF0000));
}

#[test]
fn remote_put_to_read_only_counter_is_rejected() {
    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();

    rig.link().deliver_put("pir/0/count", 42);
    rt.step(&rx, t(1));

    assert_eq!(rt.controller().read(ResourceId::MotionCount), 0);
    assert_eq!(rt.cloud().read(ResourceId::MotionCount), Some(0));
    assert!(rt.sink().contains(&AppEvent::RemoteWriteRejected {
        error: ParameterError::ReadOnly(ResourceId::MotionCount)
    }));
}

#[test]
fn keep_alive_and_status_follow_interval() {
    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();
    rig.link().notify_registered();

    rt.step(&rx, t(24));
    assert!(!rig.drain_outbound().contains(&Outbound::KeepAlive));

    rt.step(&rx, t(25));
    assert!(rig.drain_outbound().contains(&Outbound::KeepAlive));
    assert_eq!(
        rt.sink().count(|e| matches!(e, AppEvent::Status(_))),
        1
    );
    assert_eq!(rt.next_keep_alive(), Some(t(50)));
}

#[test]
fn unregistered_device_skips_keep_alive_but_reports_status() {
    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();

    rt.step(&rx, t(25));
    assert!(rig.drain_outbound().is_empty());
    assert_eq!(
        rt.sink().count(|e| matches!(e, AppEvent::Status(_))),
        1
    );
}

#[test]
fn bridge_carries_puts_in_and_updates_out() {
    use lighting_system::adapters::cloud_task::CloudBridge;

    let rig = Rig::new();
    let mut rt = rig.runtime();
    let rx = rig.consumer();
    let document = rt.cloud().registration_document().unwrap();
    let mut bridge = CloudBridge::new(rig.link(), document);
    let mut wire = Vec::new();

    bridge.on_connect(&mut wire).unwrap();
    bridge
        .receive(
            b"{\"type\":\"registered\"}\n{\"type\":\"put\",\"path\":\"led/0/permanent_status\",\"value\":1}\n",
            &mut wire,
        )
        .unwrap();
    rt.step(&rx, t(1));
    assert!(rt.status_led().is_lit());
    assert_eq!(rt.controller().state(), StateId::ForcedOn);

    wire.clear();
    bridge.flush(&mut wire).unwrap();
    let text = String::from_utf8(wire).unwrap();
    assert!(text.contains(r#""path":"led/0/permanent_status","value":1"#), "{text}");
}
