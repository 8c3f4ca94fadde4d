//! Cloud I/O task: the network end of [`CloudLink`].
//!
//! Runs on its own thread and bridges the device-management server to the
//! cooperative loop.  The wire format is one JSON object per line over TCP:
//!
//! ```text
//!  device ─▶ server   {"type":"register","endpoint":..,"resources":[..]}
//!                     {"type":"update","path":"led/0/color","value":65280}
//!                     {"type":"keep_alive"}
//!  server ─▶ device   {"type":"registered"}
//!                     {"type":"unregistered"}
//!                     {"type":"put","path":"3311/0/5706","value":16711680}
//! ```
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────┐
//!  │  cloud thread                                            │
//!  │   TcpStream ──read──▶ CloudBridge::receive ──▶ CLOUD_INBOX│
//!  │   TcpStream ◀─write── CloudBridge::flush  ◀── CLOUD_OUTBOX│
//!  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The outbox is drained even while offline so the device side never
//! backs up; the newest value of every resource is kept and replayed once
//! the server confirms registration.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::cloud::{CloudLink, Outbound};
use crate::params::ResourceId;

/// Longest accepted line from the server, newline excluded.
pub const LINE_MAX: usize = 256;

/// Socket read timeout, which is also the outbox polling period.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

const INITIAL_RETRY: Duration = Duration::from_secs(2);
const MAX_RETRY: Duration = Duration::from_secs(60);

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Uplink {
    Update { path: &'static str, value: i64 },
    KeepAlive,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Downlink {
    Registered,
    Unregistered,
    Put { path: String, value: i64 },
}

fn write_line(out: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    out.write_all(bytes)?;
    out.write_all(b"\n")
}

fn send(out: &mut impl Write, msg: &Uplink) -> io::Result<()> {
    let bytes = serde_json::to_vec(msg).map_err(|e| io::Error::other(e.to_string()))?;
    write_line(out, &bytes)
}

// ───────────────────────────────────────────────────────────────
// CloudBridge
// ───────────────────────────────────────────────────────────────

/// Protocol state for one server, independent of the socket.
pub struct CloudBridge<'a> {
    link: CloudLink<'a>,
    registration: String,
    latest: heapless::Vec<(ResourceId, i64), { ResourceId::COUNT }>,
    line: Vec<u8>,
    overlong: bool,
    registered: bool,
}

impl<'a> CloudBridge<'a> {
    /// `registration` is the document from
    /// [`CloudAdapter::registration_document`](super::cloud::CloudAdapter::registration_document).
    pub fn new(link: CloudLink<'a>, registration: String) -> Self {
        Self {
            link,
            registration,
            latest: heapless::Vec::new(),
            line: Vec::with_capacity(LINE_MAX),
            overlong: false,
            registered: false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Newest value seen for `id` on the way out.
    pub fn latest(&self, id: ResourceId) -> Option<i64> {
        self.latest
            .iter()
            .find(|(seen, _)| *seen == id)
            .map(|&(_, value)| value)
    }

    /// A connection is up: announce the endpoint.
    pub fn on_connect(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.line.clear();
        self.overlong = false;
        write_line(out, self.registration.as_bytes())
    }

    /// The connection is gone.  A held registration lapses with it.
    pub fn on_disconnect(&mut self) {
        self.line.clear();
        self.overlong = false;
        if core::mem::take(&mut self.registered) {
            self.link.notify_unregistered();
        }
    }

    /// Feed bytes read from the server.  Each complete line is handled in
    /// order; malformed and overlong lines are logged and skipped.
    pub fn receive(&mut self, bytes: &[u8], out: &mut impl Write) -> io::Result<()> {
        for &byte in bytes {
            if byte != b'\n' {
                if self.line.len() < LINE_MAX {
                    self.line.push(byte);
                } else {
                    self.overlong = true;
                }
                continue;
            }

            let line = core::mem::take(&mut self.line);
            if core::mem::take(&mut self.overlong) {
                warn!("Cloud I/O: line over {} bytes dropped", LINE_MAX);
            } else if !line.is_empty() {
                self.handle_line(&line, out)?;
            }
            self.line = line;
            self.line.clear();
        }
        Ok(())
    }

    /// Forward everything the device has queued.  Updates are held back
    /// until the server has confirmed registration.
    pub fn flush(&mut self, out: &mut impl Write) -> io::Result<()> {
        while let Some(msg) = self.link.next_outbound() {
            match msg {
                Outbound::Update { id, value } => {
                    self.remember(id, value);
                    if self.registered {
                        send(out, &Uplink::Update { path: id.path(), value })?;
                    }
                }
                Outbound::KeepAlive if self.registered => send(out, &Uplink::KeepAlive)?,
                Outbound::KeepAlive => {}
            }
        }
        Ok(())
    }

    /// Empty the outbox without a connection, keeping the newest values.
    pub fn absorb_offline(&mut self) {
        while let Some(msg) = self.link.next_outbound() {
            if let Outbound::Update { id, value } = msg {
                self.remember(id, value);
            }
        }
    }

    fn remember(&mut self, id: ResourceId, value: i64) {
        if let Some(slot) = self.latest.iter_mut().find(|(seen, _)| *seen == id) {
            slot.1 = value;
        } else {
            // One slot per resource; cannot overflow.
            let _ = self.latest.push((id, value));
        }
    }

    fn handle_line(&mut self, line: &[u8], out: &mut impl Write) -> io::Result<()> {
        let msg = match serde_json::from_slice::<Downlink>(line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Cloud I/O: bad message ({})", e);
                return Ok(());
            }
        };
        match msg {
            Downlink::Registered => {
                self.registered = true;
                self.link.notify_registered();
                for &(id, value) in &self.latest {
                    send(out, &Uplink::Update { path: id.path(), value })?;
                }
            }
            Downlink::Unregistered => {
                self.registered = false;
                self.link.notify_unregistered();
            }
            Downlink::Put { path, value } => {
                self.link.deliver_put(&path, value);
            }
        }
        Ok(())
    }

    // ── Socket loop ───────────────────────────────────────────

    /// Serve one server forever, reconnecting with exponential backoff.
    pub fn run(mut self, server: &str) {
        let mut retry = INITIAL_RETRY;
        loop {
            match TcpStream::connect(server) {
                Ok(stream) => {
                    info!("Cloud I/O: connected to {}", server);
                    retry = INITIAL_RETRY;
                    if let Err(e) = self.serve(stream) {
                        warn!("Cloud I/O: connection lost: {}", e);
                    }
                    self.on_disconnect();
                }
                Err(e) => warn!("Cloud I/O: connect to {} failed: {}", server, e),
            }

            info!("Cloud I/O: retry in {}s", retry.as_secs());
            let until = Instant::now() + retry;
            while Instant::now() < until {
                self.absorb_offline();
                std::thread::sleep(POLL_INTERVAL);
            }
            retry = (retry * 2).min(MAX_RETRY);
        }
    }

    fn serve(&mut self, mut stream: TcpStream) -> io::Result<()> {
        stream.set_read_timeout(Some(POLL_INTERVAL))?;
        stream.set_nodelay(true)?;
        self.on_connect(&mut stream)?;

        let mut buf = [0u8; 128];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => self.receive(&buf[..n], &mut stream)?,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
                Err(e) => return Err(e),
            }
            self.flush(&mut stream)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cloud::{CLOUD_OUTBOX_DEPTH, CloudInbox, CloudOutbox};
    use crate::app::ports::CloudEvent;

    fn lines(out: &[u8]) -> Vec<serde_json::Value> {
        out.split(|&b| b == b'\n')
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_slice(l).unwrap())
            .collect()
    }

    fn bridge<'a>(inbox: &'a CloudInbox, outbox: &'a CloudOutbox) -> CloudBridge<'a> {
        CloudBridge::new(
            CloudLink::new(inbox, outbox),
            r#"{"type":"register","endpoint":"light-test"}"#.into(),
        )
    }

    #[test]
    fn connect_sends_registration_line() {
        let (inbox, outbox) = (CloudInbox::new(), CloudOutbox::new());
        let mut b = bridge(&inbox, &outbox);
        let mut out = Vec::new();
        b.on_connect(&mut out).unwrap();
        assert!(out.ends_with(b"\n"));
        assert_eq!(lines(&out)[0]["type"], "register");
    }

    #[test]
    fn put_reaches_the_inbox() {
        let (inbox, outbox) = (CloudInbox::new(), CloudOutbox::new());
        let mut b = bridge(&inbox, &outbox);
        let mut out = Vec::new();
        // Split across reads.
        b.receive(br#"{"type":"put","path":"3311/0/"#, &mut out).unwrap();
        b.receive(b"5706\",\"value\":255}\n", &mut out).unwrap();

        match inbox.try_receive() {
            Ok(CloudEvent::RemoteWrite { path, value }) => {
                assert_eq!(path.as_str(), "3311/0/5706");
                assert_eq!(value, 255);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn updates_wait_for_registration_then_replay() {
        let (inbox, outbox) = (CloudInbox::new(), CloudOutbox::new());
        let mut b = bridge(&inbox, &outbox);
        let mut out = Vec::new();

        outbox.try_send(Outbound::Update { id: ResourceId::MotionCount, value: 1 }).unwrap();
        outbox.try_send(Outbound::Update { id: ResourceId::MotionCount, value: 2 }).unwrap();
        outbox.try_send(Outbound::KeepAlive).unwrap();
        b.flush(&mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(b.latest(ResourceId::MotionCount), Some(2));

        b.receive(b"{\"type\":\"registered\"}\n", &mut out).unwrap();
        assert!(b.is_registered());
        assert_eq!(inbox.try_receive().ok(), Some(CloudEvent::Registered));
        let sent = lines(&out);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["type"], "update");
        assert_eq!(sent[0]["path"], "pir/0/count");
        assert_eq!(sent[0]["value"], 2);

        out.clear();
        outbox.try_send(Outbound::KeepAlive).unwrap();
        b.flush(&mut out).unwrap();
        assert_eq!(lines(&out)[0]["type"], "keep_alive");
    }

    #[test]
    fn offline_bridge_keeps_outbox_empty() {
        let (inbox, outbox) = (CloudInbox::new(), CloudOutbox::new());
        let mut b = bridge(&inbox, &outbox);
        for round in 0..3 {
            for n in 0..CLOUD_OUTBOX_DEPTH as i64 {
                outbox
                    .try_send(Outbound::Update { id: ResourceId::Color, value: round * 100 + n })
                    .unwrap();
            }
            b.absorb_offline();
            assert!(outbox.is_empty());
        }
        assert_eq!(b.latest(ResourceId::Color), Some(200 + CLOUD_OUTBOX_DEPTH as i64 - 1));
    }

    #[test]
    fn junk_lines_are_skipped() {
        let (inbox, outbox) = (CloudInbox::new(), CloudOutbox::new());
        let mut b = bridge(&inbox, &outbox);
        let mut out = Vec::new();
        b.receive(b"not json\n", &mut out).unwrap();
        b.receive(&[b'x'; LINE_MAX + 10], &mut out).unwrap();
        b.receive(b"\n{\"type\":\"registered\"}\n", &mut out).unwrap();
        assert_eq!(inbox.try_receive().ok(), Some(CloudEvent::Registered));
        assert!(inbox.try_receive().is_err());
    }

    #[test]
    fn disconnect_lapses_registration() {
        let (inbox, outbox) = (CloudInbox::new(), CloudOutbox::new());
        let mut b = bridge(&inbox, &outbox);
        let mut out = Vec::new();
        b.on_disconnect();
        assert!(inbox.try_receive().is_err(), "nothing held, nothing lost");

        b.receive(b"{\"type\":\"registered\"}\n", &mut out).unwrap();
        let _ = inbox.try_receive();
        b.on_disconnect();
        assert!(!b.is_registered());
        assert_eq!(inbox.try_receive().ok(), Some(CloudEvent::Unregistered));
    }
}
