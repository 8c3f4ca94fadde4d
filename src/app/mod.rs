//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the light policy: the controller that ties the
//! FSM, the parameter store and the auto-off timer together.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
