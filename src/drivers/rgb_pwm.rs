//! Tricolor LED on three independent PWM channels.
//!
//! Channel outputs are anything implementing
//! [`embedded_hal::pwm::SetDutyCycle`]; on the board these are the LEDC
//! channels from [`hw_init`](super::hw_init).
//!
//! ## Polarity
//!
//! | wiring          | duty           |
//! |-----------------|----------------|
//! | common cathode  | `value`        |
//! | common anode    | `1 - value`    |

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::ActuatorPort;
use crate::color::Color;
use crate::config::Polarity;

pub struct RgbPwm<R, G, B> {
    red: R,
    green: G,
    blue: B,
    polarity: Polarity,
    current: Color,
}

impl<R, G, B> RgbPwm<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    pub fn new(red: R, green: G, blue: B, polarity: Polarity) -> Self {
        Self {
            red,
            green,
            blue,
            polarity,
            current: Color::OFF,
        }
    }

    /// Last colour written, after clamping.
    pub fn current_color(&self) -> Color {
        self.current
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Give the channels back (tests, reconfiguration).
    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

/// Map a clamped intensity to a duty value for `max`.
pub fn duty_for(value: f32, polarity: Polarity, max: u16) -> u16 {
    let level = match polarity {
        Polarity::CommonCathode => value,
        Polarity::CommonAnode => 1.0 - value,
    };
    (level * f32::from(max) + 0.5) as u16
}

fn write_channel<P: SetDutyCycle>(pwm: &mut P, name: &str, value: f32, polarity: Polarity) {
    let duty = duty_for(value, polarity, pwm.max_duty_cycle());
    if let Err(e) = pwm.set_duty_cycle(duty) {
        warn!("RGB PWM: {} channel write failed: {:?}", name, e);
    }
}

impl<R, G, B> ActuatorPort for RgbPwm<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    fn set_color(&mut self, color: Color) {
        let c = color.clamped();
        write_channel(&mut self.red, "red", c.r, self.polarity);
        write_channel(&mut self.green, "green", c.g, self.polarity);
        write_channel(&mut self.blue, "blue", c.b, self.polarity);
        self.current = c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct Channel {
        max: u16,
        duty: u16,
    }

    impl embedded_hal::pwm::ErrorType for Channel {
        type Error = Infallible;
    }

    impl SetDutyCycle for Channel {
        fn max_duty_cycle(&self) -> u16 {
            self.max
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    fn ch() -> Channel {
        Channel { max: 255, duty: 0 }
    }

    fn duties(led: RgbPwm<Channel, Channel, Channel>) -> (u16, u16, u16) {
        let (r, g, b) = led.release();
        (r.duty, g.duty, b.duty)
    }

    #[test]
    fn common_cathode_writes_value() {
        let mut led = RgbPwm::new(ch(), ch(), ch(), Polarity::CommonCathode);
        led.set_color(Color::from_packed(0xFF8000));
        assert_eq!(duties(led), (255, 128, 0));
    }

    #[test]
    fn common_anode_inverts() {
        let mut led = RgbPwm::new(ch(), ch(), ch(), Polarity::CommonAnode);
        led.set_color(Color::from_packed(0xFF0000));
        assert_eq!(duties(led), (0, 255, 255));
    }

    #[test]
    fn off_on_anode_drives_channels_high() {
        let mut led = RgbPwm::new(ch(), ch(), ch(), Polarity::CommonAnode);
        led.off();
        assert_eq!(duties(led), (255, 255, 255));
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        let mut led = RgbPwm::new(ch(), ch(), ch(), Polarity::CommonCathode);
        led.set_color(Color::new(2.0, -1.0, 0.5));
        assert_eq!(led.current_color(), Color::new(1.0, 0.0, 0.5));
        assert_eq!(duties(led), (255, 0, 128));
    }

    #[test]
    fn scales_to_channel_resolution() {
        assert_eq!(duty_for(1.0, Polarity::CommonCathode, 1023), 1023);
        assert_eq!(duty_for(0.5, Polarity::CommonCathode, 1000), 500);
        assert_eq!(duty_for(0.0, Polarity::CommonAnode, 8191), 8191);
    }
}
