//! Cloud client adapter.
//!
//! Implements [`CloudPort`] over two bounded channels shared with the
//! network task that speaks the device-management protocol:
//!
//! ```text
//!  CloudBridge ──CloudLink──▶ CLOUD_INBOX  ──▶ CloudAdapter::poll()
//!  CloudBridge ◀─CloudLink─── CLOUD_OUTBOX ◀── CloudAdapter::write()
//! ```
//!
//! Remote PUTs and registration notices therefore reach the controller on
//! the cooperative path only.  The adapter also keeps the last value of
//! every defined resource so remote reads never touch the controller.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{CLOUD_PATH_MAX, CloudError, CloudEvent, CloudPort};
use crate::config::{DEVICE_TYPE, EndpointName, truncated};
use crate::params::{Access, ResourceId};

pub const CLOUD_INBOX_DEPTH: usize = 8;
pub const CLOUD_OUTBOX_DEPTH: usize = 16;

/// Device → network traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Push a new resource value to observers.
    Update { id: ResourceId, value: i64 },
    /// Registration update.
    KeepAlive,
}

pub type CloudInbox = Channel<CriticalSectionRawMutex, CloudEvent, CLOUD_INBOX_DEPTH>;
pub type CloudOutbox = Channel<CriticalSectionRawMutex, Outbound, CLOUD_OUTBOX_DEPTH>;

pub static CLOUD_INBOX: CloudInbox = Channel::new();
pub static CLOUD_OUTBOX: CloudOutbox = Channel::new();

// ───────────────────────────────────────────────────────────────
// Registration document
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Registration<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    endpoint: &'a str,
    device_type: &'a str,
    resources: heapless::Vec<ResourceEntry, { ResourceId::COUNT }>,
}

#[derive(Serialize)]
struct ResourceEntry {
    path: &'static str,
    alias: &'static str,
    access: Access,
    value: i64,
}

// ───────────────────────────────────────────────────────────────
// CloudAdapter (device side)
// ───────────────────────────────────────────────────────────────

pub struct CloudAdapter<'a> {
    endpoint: EndpointName,
    registry: heapless::Vec<(ResourceId, i64), { ResourceId::COUNT }>,
    inbox: &'a CloudInbox,
    outbox: &'a CloudOutbox,
    registered: bool,
}

impl CloudAdapter<'static> {
    /// Adapter bound to the firmware-wide channels.
    pub fn global(endpoint: &str) -> Self {
        Self::new(endpoint, &CLOUD_INBOX, &CLOUD_OUTBOX)
    }
}

impl<'a> CloudAdapter<'a> {
    pub fn new(endpoint: &str, inbox: &'a CloudInbox, outbox: &'a CloudOutbox) -> Self {
        Self {
            endpoint: truncated(endpoint),
            registry: heapless::Vec::new(),
            inbox,
            outbox,
            registered: false,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// JSON document announcing the endpoint and its resources.
    pub fn registration_document(&self) -> Result<String, serde_json::Error> {
        let resources = self
            .registry
            .iter()
            .map(|&(id, value)| ResourceEntry {
                path: id.path(),
                alias: id.alias(),
                access: id.access(),
                value,
            })
            .collect();
        serde_json::to_string(&Registration {
            kind: "register",
            endpoint: &self.endpoint,
            device_type: DEVICE_TYPE,
            resources,
        })
    }

    fn slot(&mut self, id: ResourceId) -> Option<&mut i64> {
        self.registry
            .iter_mut()
            .find(|(defined, _)| *defined == id)
            .map(|(_, value)| value)
    }
}

impl CloudPort for CloudAdapter<'_> {
    fn define_resource(&mut self, id: ResourceId, value: i64) -> Result<(), CloudError> {
        if self.slot(id).is_some() {
            return Err(CloudError::DuplicateResource(id));
        }
        self.registry
            .push((id, value))
            .map_err(|_| CloudError::RegistryFull)?;
        debug!("Cloud: defined {} = {}", id, value);
        Ok(())
    }

    fn read(&self, id: ResourceId) -> Option<i64> {
        self.registry
            .iter()
            .find(|(defined, _)| *defined == id)
            .map(|&(_, value)| value)
    }

    fn write(&mut self, id: ResourceId, value: i64) -> Result<(), CloudError> {
        let slot = self.slot(id).ok_or(CloudError::UndefinedResource(id))?;
        *slot = value;
        self.outbox
            .try_send(Outbound::Update { id, value })
            .map_err(|_| CloudError::QueueFull)
    }

    fn poll(&mut self) -> Option<CloudEvent> {
        let event = self.inbox.try_receive().ok()?;
        match event {
            CloudEvent::Registered => {
                self.registered = true;
                info!("Cloud: registered as '{}'", self.endpoint);
            }
            CloudEvent::Unregistered => {
                self.registered = false;
                warn!("Cloud: registration lost");
            }
            CloudEvent::RemoteWrite { .. } => {}
        }
        Some(event)
    }

    fn keep_alive(&mut self) -> Result<(), CloudError> {
        if !self.registered {
            return Err(CloudError::NotRegistered);
        }
        self.outbox
            .try_send(Outbound::KeepAlive)
            .map_err(|_| CloudError::QueueFull)
    }

    fn is_registered(&self) -> bool {
        self.registered
    }
}

// ───────────────────────────────────────────────────────────────
// CloudLink (network side)
// ───────────────────────────────────────────────────────────────

/// The network task's end of the channels.
#[derive(Clone, Copy)]
pub struct CloudLink<'a> {
    inbox: &'a CloudInbox,
    outbox: &'a CloudOutbox,
}

impl CloudLink<'static> {
    pub fn global() -> Self {
        Self::new(&CLOUD_INBOX, &CLOUD_OUTBOX)
    }
}

impl<'a> CloudLink<'a> {
    pub fn new(inbox: &'a CloudInbox, outbox: &'a CloudOutbox) -> Self {
        Self { inbox, outbox }
    }

    /// Hand a remote PUT to the device.  Paths longer than
    /// [`CLOUD_PATH_MAX`] are cut and will not resolve.
    pub fn deliver_put(&self, path: &str, value: i64) -> bool {
        let path: heapless::String<CLOUD_PATH_MAX> = truncated(path);
        self.deliver(CloudEvent::RemoteWrite { path, value })
    }

    pub fn notify_registered(&self) -> bool {
        self.deliver(CloudEvent::Registered)
    }

    pub fn notify_unregistered(&self) -> bool {
        self.deliver(CloudEvent::Unregistered)
    }

    /// Next message for the server, if any.
    pub fn next_outbound(&self) -> Option<Outbound> {
        self.outbox.try_receive().ok()
    }

    fn deliver(&self, event: CloudEvent) -> bool {
        let ok = self.inbox.try_send(event).is_ok();
        if !ok {
            warn!("Cloud: inbox full, notice dropped");
        }
        ok
    }
}
