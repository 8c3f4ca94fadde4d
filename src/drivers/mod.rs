//! Light drivers, hardware initialisation, and peripheral helpers.

pub mod chainable;
pub mod hw_init;
pub mod led_bar;
pub mod rgb_pwm;
pub mod status_led;
pub mod watchdog;
