//! Unified error type for the light firmware.
//!
//! Every subsystem error converts into [`Error`] so `main` and the runtime
//! can propagate with `?`.  All variants are `Copy`.

use core::fmt;

use crate::adapters::wifi::ConnectivityError;
use crate::app::ports::{CloudError, ConfigError};
use crate::drivers::hw_init::HwInitError;
use crate::params::ParameterError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Peripheral initialisation failed.
    Init(HwInitError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The cloud client refused a request.
    Cloud(CloudError),
    /// Network bring-up failed.
    Network(ConnectivityError),
    /// A parameter write was rejected.
    Parameter(ParameterError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Cloud(e) => write!(f, "cloud: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Parameter(e) => write!(f, "parameter: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CloudError> for Error {
    fn from(e: CloudError) -> Self {
        Self::Cloud(e)
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Network(e)
    }
}

impl From<ParameterError> for Error {
    fn from(e: ParameterError) -> Self {
        Self::Parameter(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ResourceId;

    fn define() -> Result<()> {
        Err::<(), _>(CloudError::DuplicateResource(ResourceId::Color))?;
        Ok(())
    }

    #[test]
    fn question_mark_converts_and_displays() {
        let err = define().unwrap_err();
        assert_eq!(err, Error::Cloud(CloudError::DuplicateResource(ResourceId::Color)));
        assert_eq!(err.to_string(), "cloud: led/0/color defined twice");
    }
}
