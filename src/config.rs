//! Device configuration parameters
//!
//! All tunable constants consumed by the operational controller. Values
//! can be overridden by a config blob persisted in NVS (see
//! [`NvsAdapter`](crate::adapters::nvs::NvsAdapter)); anything missing or
//! invalid falls back to [`DeviceConfig::default()`].

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::app::encoder::ValidRanges;
use crate::app::feedback::Co2Thresholds;
use crate::app::ports::ConfigError;

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Measurement cycle ---
    /// Steady-state period between measurement cycles (seconds)
    pub measurement_period_secs: u32,
    /// Delay before the first cycle after the stack starts (seconds)
    pub initial_delay_secs: u32,

    // --- Buttons ---
    /// Hold time separating a short press from a long press (ms)
    pub long_press_ms: u32,
    /// Hold time on the pairing button that triggers a factory reset (ms)
    pub factory_reset_hold_ms: u32,
    /// Stable time before a raw level change is accepted (ms)
    pub button_debounce_ms: u32,

    // --- Feedback ---
    /// CO2 below this is green (ppm)
    pub co2_green_below_ppm: u16,
    /// CO2 above this is red (ppm)
    pub co2_red_above_ppm: u16,
    /// Identify LED toggle interval (ms)
    pub identify_blink_ms: u32,

    // --- Calibration ---
    /// Reference concentration for forced recalibration (ppm, fresh air)
    pub frc_reference_ppm: u16,

    // --- Valid measurement ranges ---
    pub temperature_min_c: f32,
    pub temperature_max_c: f32,
    pub humidity_min_pct: f32,
    pub humidity_max_pct: f32,
    pub co2_min_ppm: f32,
    pub co2_max_ppm: f32,

    // --- Power ---
    /// Run as a sleepy end device (radio off when idle)
    pub sleepy_end_device: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // Measurement cycle
            measurement_period_secs: 60,
            initial_delay_secs: 5,

            // Buttons
            long_press_ms: 1000,
            factory_reset_hold_ms: 5000,
            button_debounce_ms: 50,

            // Feedback
            co2_green_below_ppm: 1000,
            co2_red_above_ppm: 1600,
            identify_blink_ms: 100,

            // Calibration
            frc_reference_ppm: 420,

            // Ranges (ZCL min/max measured value attributes)
            temperature_min_c: -40.0,
            temperature_max_c: 85.0,
            humidity_min_pct: 0.0,
            humidity_max_pct: 100.0,
            co2_min_ppm: 0.0,
            co2_max_ppm: 10_000.0,

            // Power
            sleepy_end_device: true,
        }
    }
}

impl DeviceConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measurement_period_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "measurement_period_secs must be non-zero",
            ));
        }
        if self.initial_delay_secs > self.measurement_period_secs {
            return Err(ConfigError::ValidationFailed(
                "initial_delay_secs must not exceed measurement_period_secs",
            ));
        }
        if !(100..=10_000).contains(&self.long_press_ms) {
            return Err(ConfigError::ValidationFailed(
                "long_press_ms must be 100–10000",
            ));
        }
        if self.factory_reset_hold_ms <= self.long_press_ms {
            return Err(ConfigError::ValidationFailed(
                "factory_reset_hold_ms must exceed long_press_ms",
            ));
        }
        if self.button_debounce_ms >= self.long_press_ms {
            return Err(ConfigError::ValidationFailed(
                "button_debounce_ms must be below long_press_ms",
            ));
        }
        if self.co2_green_below_ppm > self.co2_red_above_ppm {
            return Err(ConfigError::ValidationFailed(
                "co2_green_below_ppm must not exceed co2_red_above_ppm",
            ));
        }
        if !(50..=1000).contains(&self.identify_blink_ms) {
            return Err(ConfigError::ValidationFailed(
                "identify_blink_ms must be 50–1000",
            ));
        }
        if !(400..=2000).contains(&self.frc_reference_ppm) {
            return Err(ConfigError::ValidationFailed(
                "frc_reference_ppm must be 400–2000",
            ));
        }
        let ranges = [
            (self.temperature_min_c, self.temperature_max_c),
            (self.humidity_min_pct, self.humidity_max_pct),
            (self.co2_min_ppm, self.co2_max_ppm),
        ];
        if ranges.iter().any(|(lo, hi)| !(lo.is_finite() && hi.is_finite() && lo < hi)) {
            return Err(ConfigError::ValidationFailed(
                "measurement ranges must be finite with min < max",
            ));
        }
        // Scaled ×100 into an i16 attribute.
        if self.temperature_min_c < -327.0 || self.temperature_max_c > 327.0 {
            return Err(ConfigError::ValidationFailed(
                "temperature range exceeds attribute width",
            ));
        }
        if self.humidity_min_pct < 0.0 || self.humidity_max_pct > 100.0 {
            return Err(ConfigError::ValidationFailed(
                "humidity range must lie within 0–100 %",
            ));
        }
        if self.co2_min_ppm < 0.0 {
            return Err(ConfigError::ValidationFailed("co2_min_ppm must be >= 0"));
        }
        Ok(())
    }

    pub fn measurement_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.measurement_period_secs))
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.initial_delay_secs))
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(u64::from(self.long_press_ms))
    }

    pub fn factory_reset_hold(&self) -> Duration {
        Duration::from_millis(u64::from(self.factory_reset_hold_ms))
    }

    pub fn identify_blink_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.identify_blink_ms))
    }

    pub fn co2_thresholds(&self) -> Co2Thresholds {
        Co2Thresholds {
            green_below_ppm: f32::from(self.co2_green_below_ppm),
            red_above_ppm: f32::from(self.co2_red_above_ppm),
        }
    }

    pub fn valid_ranges(&self) -> ValidRanges {
        ValidRanges {
            temperature_c: (self.temperature_min_c, self.temperature_max_c),
            humidity_pct: (self.humidity_min_pct, self.humidity_max_pct),
            co2_ppm: (self.co2_min_ppm, self.co2_max_ppm),
        }
    }
}
