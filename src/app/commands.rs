//! Inbound commands to the light controller.
//!
//! These represent requests from the outside world (cloud client, local
//! console, tests) that the
//! [`LightController`](super::controller::LightController) interprets and
//! acts upon.

use crate::app::ports::CLOUD_PATH_MAX;
use crate::params::ResourceId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Remote PUT by path.  Subject to access checks.
    RemoteWrite {
        path: heapless::String<CLOUD_PATH_MAX>,
        value: i64,
    },

    /// Device-local write.  Not subject to the network access check; the
    /// motion counter is still refused.
    LocalWrite { id: ResourceId, value: i64 },
}
