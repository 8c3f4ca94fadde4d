//! Normalized RGB colour and its packed 0xRRGGBB transport form.
//!
//! The parameter protocol carries colour as a single integer with one byte
//! per channel.  Everything inside the firmware works with [`Color`], three
//! intensities in `0.0..=1.0`, and only the actuator drivers convert back
//! to whatever their hardware wants (duty cycle, 8-bit bytes, bar level).

use serde::{Deserialize, Serialize};

/// Three independent channel intensities, each nominally in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// All channels off.
    pub const OFF: Self = Self::new(0.0, 0.0, 0.0);

    /// Factory default colour (pure green, 0x00FF00).
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channel values.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        )
    }

    /// Unpack a 0xRRGGBB integer.
    ///
    /// Each channel is masked to its byte, so bits above the low 24 (and the
    /// sign of a negative value) never leak into the result.
    pub fn from_packed(packed: i64) -> Self {
        let r = ((packed >> 16) & 0xff) as u8;
        let g = ((packed >> 8) & 0xff) as u8;
        let b = (packed & 0xff) as u8;
        Self::from_rgb8(r, g, b)
    }

    /// Quantize to 8-bit channels, saturating anything outside `0.0..=1.0`.
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        (to_byte(self.r), to_byte(self.g), to_byte(self.b))
    }

    /// Pack into 0xRRGGBB.
    pub fn to_packed(self) -> i64 {
        let (r, g, b) = self.to_rgb8();
        (i64::from(r) << 16) | (i64::from(g) << 8) | i64::from(b)
    }

    /// Copy with every channel clamped into `0.0..=1.0`.
    pub fn clamped(self) -> Self {
        Self::new(clamp_unit(self.r), clamp_unit(self.g), clamp_unit(self.b))
    }

    pub fn is_off(&self) -> bool {
        self.r <= 0.0 && self.g <= 0.0 && self.b <= 0.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::OFF
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn to_byte(v: f32) -> u8 {
    // +0.5 so that from_rgb8 → to_rgb8 is exact despite f32 rounding.
    (clamp_unit(v) * 255.0 + 0.5) as u8
}
