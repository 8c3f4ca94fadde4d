//! Registration indicator LED.
//!
//! A single active-low GPIO: driven high (dark) at boot, pulled low once
//! the cloud client reports registration.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the pin via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct StatusLed {
    pin: i32,
    lit: bool,
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new(pins::STATUS_LED_GPIO)
    }
}

impl StatusLed {
    /// Take the pin and drive it dark.
    pub fn new(pin: i32) -> Self {
        hw_init::gpio_write(pin, true);
        Self { pin, lit: false }
    }

    pub fn set(&mut self, lit: bool) {
        // Active-low.
        hw_init::gpio_write(self.pin, !lit);
        self.lit = lit;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
