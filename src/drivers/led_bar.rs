//! Grove 10-segment LED bar (MY9221).
//!
//! The bar has no colour; the red channel picks how many segments light:
//! `level = floor(red * 10)`.  Green and blue are ignored.
//!
//! ## Wire protocol
//!
//! One 16-bit command word, then twelve 16-bit grey-scale words (ten
//! segments, two unused), MSB first.  The chip samples data on *both*
//! clock edges, so the clock toggles once per bit.  Four data pulses with
//! the clock held still latch the frame.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::ActuatorPort;
use crate::color::Color;

pub const SEGMENTS: u8 = 10;
const CHANNELS: usize = 12;
const CMD_MODE: u16 = 0x0000;
const SEGMENT_ON: u16 = 0x00FF;

/// Segments lit for a colour.
pub fn level_for(color: Color) -> u8 {
    let red = color.clamped().r;
    (red * f32::from(SEGMENTS)) as u8
}

pub struct LedBar<CLK, DATA, D> {
    clock: CLK,
    data: DATA,
    delay: D,
    clock_high: bool,
    level: u8,
}

impl<CLK, DATA, D> LedBar<CLK, DATA, D>
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
            clock_high: false,
            level: 0,
        }
    }

    /// Segments currently lit.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn release(self) -> (CLK, DATA, D) {
        (self.clock, self.data, self.delay)
    }

    /// Light the first `level` segments.  Values above 10 light all.
    pub fn set_level(&mut self, level: u8) {
        let level = level.min(SEGMENTS);
        match self.send_frame(level) {
            Ok(()) => self.level = level,
            Err(line) => warn!("MY9221: {} line write failed, frame aborted", line),
        }
    }

    fn set_data(&mut self, high: bool) -> Result<(), &'static str> {
        if high {
            self.data.set_high().map_err(|_| "data")
        } else {
            self.data.set_low().map_err(|_| "data")
        }
    }

    fn send_word(&mut self, word: u16) -> Result<(), &'static str> {
        for i in (0..16).rev() {
            self.set_data((word >> i) & 1 == 1)?;
            self.clock_high = !self.clock_high;
            if self.clock_high {
                self.clock.set_high().map_err(|_| "clock")?;
            } else {
                self.clock.set_low().map_err(|_| "clock")?;
            }
        }
        Ok(())
    }

    fn latch(&mut self) -> Result<(), &'static str> {
        self.set_data(false)?;
        self.delay.delay_us(220);
        for _ in 0..4 {
            self.set_data(true)?;
            self.set_data(false)?;
        }
        self.delay.delay_us(1);
        Ok(())
    }

    fn send_frame(&mut self, level: u8) -> Result<(), &'static str> {
        self.send_word(CMD_MODE)?;
        for ch in 0..CHANNELS {
            let on = ch < usize::from(level);
            self.send_word(if on { SEGMENT_ON } else { 0 })?;
        }
        self.latch()
    }
}

impl<CLK, DATA, D> ActuatorPort for LedBar<CLK, DATA, D>
where
    CLK: OutputPin,
    DATA: OutputPin,
    D: DelayNs,
{
    fn set_color(&mut self, color: Color) {
        self.set_level(level_for(color));
    }
}
