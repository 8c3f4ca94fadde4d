//! Hardware adapter: picks the light driver described by the configuration.
//!
//! This is the only place that knows which [`LedKind`] is soldered on.  The
//! rest of the firmware sees a `Box<dyn ActuatorPort>`.  On non-espidf
//! targets the underlying handles are cfg-gated simulation stubs.

use log::info;

use crate::app::ports::ActuatorPort;
use crate::config::{LedKind, SystemConfig};
use crate::drivers::chainable::ChainableLed;
use crate::drivers::hw_init::{
    GpioOutput, LEDC_CH_LED_B, LEDC_CH_LED_G, LEDC_CH_LED_R, LedcChannel, RomDelay,
};
use crate::drivers::led_bar::LedBar;
use crate::drivers::rgb_pwm::RgbPwm;
use crate::pins;

pub type BoxedActuator = Box<dyn ActuatorPort>;

/// Build the actuator for `config.led`.  Peripherals must already be
/// configured by [`init_peripherals`](crate::drivers::hw_init::init_peripherals).
pub fn build_actuator(config: &SystemConfig) -> BoxedActuator {
    let clock = GpioOutput::new(pins::GROVE_CLOCK_GPIO);
    let data = GpioOutput::new(pins::GROVE_DATA_GPIO);

    match config.led {
        LedKind::Tricolor { polarity } => {
            info!("hardware: tricolor LED on LEDC ({:?})", polarity);
            Box::new(RgbPwm::new(
                LedcChannel::new(LEDC_CH_LED_R),
                LedcChannel::new(LEDC_CH_LED_G),
                LedcChannel::new(LEDC_CH_LED_B),
                polarity,
            ))
        }
        LedKind::Chainable => {
            info!("hardware: chainable RGB module on Grove");
            Box::new(ChainableLed::new(clock, data, RomDelay))
        }
        LedKind::LedBar => {
            info!("hardware: LED bar on Grove");
            Box::new(LedBar::new(clock, data, RomDelay))
        }
    }
}
