//! GPIO / peripheral pin assignments for the Airmon board (ESP32-H2).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

#![allow(dead_code)] // Only the espidf build touches every pin.

// ---------------------------------------------------------------------------
// Indicator LEDs (discrete, active HIGH)
// ---------------------------------------------------------------------------

/// Blue LED: network/pairing state and calibration busy indication.
pub const LED_STATUS_GPIO: i32 = 10;
/// Red LED: identify blink.
pub const LED_IDENTIFY_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// CO2 colour LED (common-cathode RGB on three LEDC channels)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 0;
pub const LED_G_GPIO: i32 = 1;
pub const LED_B_GPIO: i32 = 2;

/// LEDC frequency for the colour LED (1 kHz).
pub const LED_PWM_FREQ_HZ: u32 = 1_000;

// ---------------------------------------------------------------------------
// I²C bus (SCD4x CO2 / temperature / humidity sensor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 12;
pub const I2C_SCL_GPIO: i32 = 22;
/// SCD4x supports standard and fast mode; 100 kHz is enough.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Buttons (active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// Pairing / identify button (long hold = factory reset).
pub const BUTTON_PAIR_GPIO: i32 = 9;
/// Calibration button (long press = forced recalibration).
pub const BUTTON_CALIBRATE_GPIO: i32 = 8;

/// Button scan period for the debouncer (ms).
pub const BUTTON_SCAN_PERIOD_MS: u32 = 10;
