//! Motion-activated RGB light firmware library.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, with simulation stubs on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod motion;
pub mod params;
pub mod runtime;
pub mod scheduler;

mod pins;

pub mod adapters;
pub mod drivers;
