//! Grove chainable RGB LED (P9813), bit-banged over clock + data.
//!
//! ## Frame format
//!
//! ```text
//!  32 × 0        start frame
//!  flag B G R    one 32-bit word per module, MSB first
//!  32 × 0        end frame
//! ```
//!
//! The flag byte is `0b11` followed by the inverted top two bits of blue,
//! green and red, which the chip uses as a checksum.  Data is sampled on
//! the rising clock edge.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::ActuatorPort;
use crate::color::Color;

/// Half clock period.  The P9813 tolerates far faster clocks; the Grove
/// cable does not.
const HALF_PERIOD_US: u32 = 20;

pub struct ChainableLed<CLK, DATA, D> {
    clock: CLK,
    data: DATA,
    delay: D,
    current: (u8, u8, u8),
}

/// Flag byte for one colour word.
pub fn flag_byte(r: u8, g: u8, b: u8) -> u8 {
    0b1100_0000 | ((!b & 0xC0) >> 2) | ((!g & 0xC0) >> 4) | ((!r & 0xC0) >> 6)
}

/// Full 32-bit word for one module: flag, blue, green, red.
pub fn color_word(r: u8, g: u8, b: u8) -> u32 {
    u32::from_be_bytes([flag_byte(r, g, b), b, g, r])
}

impl<CLK, DATA, D> ChainableLed<CLK, DATA, D>
where
    CLK: OutputPin,
    DATA: OutputPin,
    D: DelayNs,
{
    pub fn new(clock: CLK, data: DATA, delay: D) -> Self {
        Self {
            clock,
            data,
            delay,
            current: (0, 0, 0),
        }
    }

    /// Last bytes sent.
    pub fn current_rgb8(&self) -> (u8, u8, u8) {
        self.current
    }

    pub fn release(self) -> (CLK, DATA, D) {
        (self.clock, self.data, self.delay)
    }

    fn send_word(&mut self, word: u32) -> Result<(), &'static str> {
        for i in (0..32).rev() {
            let bit = (word >> i) & 1 == 1;
            self.clock.set_low().map_err(|_| "clock")?;
            self.delay.delay_us(HALF_PERIOD_US);
            if bit {
                self.data.set_high().map_err(|_| "data")?;
            } else {
                self.data.set_low().map_err(|_| "data")?;
            }
            self.clock.set_high().map_err(|_| "clock")?;
            self.delay.delay_us(HALF_PERIOD_US);
        }
        Ok(())
    }

    fn send_frame(&mut self, r: u8, g: u8, b: u8) -> Result<(), &'static str> {
        self.send_word(0)?;
        self.send_word(color_word(r, g, b))?;
        self.send_word(0)
    }
}

impl<CLK, DATA, D> ActuatorPort for ChainableLed<CLK, DATA, D>
where
    CLK: OutputPin,
    DATA: OutputPin,
    D: DelayNs,
{
    fn set_color(&mut self, color: Color) {
        let (r, g, b) = color.to_rgb8();
        match self.send_frame(r, g, b) {
            Ok(()) => self.current = (r, g, b),
            Err(line) => warn!("P9813: {} line write failed, frame aborted", line),
        }
    }
}
