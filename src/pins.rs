//! GPIO / peripheral pin assignments for the light board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Motion sensor
// ---------------------------------------------------------------------------

/// PIR module output.  Rising edge = motion.
pub const PIR_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Tricolor LED (LEDC PWM)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 5;
pub const LED_G_GPIO: i32 = 6;
pub const LED_B_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Grove connector (chainable RGB module or LED bar)
// ---------------------------------------------------------------------------

pub const GROVE_CLOCK_GPIO: i32 = 8;
pub const GROVE_DATA_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Registration indicator (active-low)
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 - 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
