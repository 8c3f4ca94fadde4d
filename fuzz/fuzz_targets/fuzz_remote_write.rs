//! Fuzz target: remote PUTs through the cloud inbox into the controller.
//!
//! Each record is `[len, path bytes.., value (8 bytes LE)]`.  Paths are
//! arbitrary bytes, lossily decoded, so both well-formed aliases and junk
//! reach `ResourceId::from_path`.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - The read-only motion counter is never changed by a remote write
//! - ForcedOff always leaves the light dark
//!
//! cargo fuzz run fuzz_remote_write

#![no_main]

use embassy_time::Instant;
use libfuzzer_sys::fuzz_target;
use lighting_system::adapters::cloud::{CloudAdapter, CloudInbox, CloudLink, CloudOutbox};
use lighting_system::app::events::AppEvent;
use lighting_system::app::ports::{ActuatorPort, EventSink};
use lighting_system::color::Color;
use lighting_system::config::SystemConfig;
use lighting_system::events::EventQueue;
use lighting_system::fsm::StateId;
use lighting_system::params::ResourceId;
use lighting_system::runtime::Runtime;

struct Output(Color);

impl ActuatorPort for Output {
    fn set_color(&mut self, color: Color) {
        self.0 = color;
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let inbox = CloudInbox::new();
    let outbox = CloudOutbox::new();
    let events: EventQueue<1> = EventQueue::new();
    let Some(rx) = events.consumer() else {
        return;
    };
    let link = CloudLink::new(&inbox, &outbox);

    let config = SystemConfig::default();
    let cloud = CloudAdapter::new(&config.endpoint_name, &inbox, &outbox);
    let mut rt = Runtime::new(&config, Output(Color::OFF), Discard, cloud);
    if rt.start(Instant::from_secs(0)).is_err() {
        return;
    }

    let mut rest = data;
    let mut tick = 1u64;
    while let Some((&len, tail)) = rest.split_first() {
        let len = usize::from(len).min(tail.len());
        let (path, tail) = tail.split_at(len);
        let Some((value, tail)) = tail.split_first_chunk::<8>() else {
            break;
        };
        rest = tail;

        link.deliver_put(&String::from_utf8_lossy(path), i64::from_le_bytes(*value));
        rt.step(&rx, Instant::from_secs(tick));
        tick += 1;
        while link.next_outbound().is_some() {}

        assert_eq!(rt.controller().read(ResourceId::MotionCount), 0);
        if rt.controller().state() == StateId::ForcedOff {
            assert!(rt.actuator().0.is_off());
        }
    }
});
