//! CO2 colour feedback on the RGB LED.
//!
//! The LED is rewritten only when the target colour differs from the one
//! last applied, so a steady reading costs no LED traffic.

use log::{debug, warn};

use super::ports::{PixelPort, Rgb};

/// Colour shown for a CO2 band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorState {
    Green,
    Orange,
    Red,
    /// Nothing applied yet, or the display is blanked.
    Unknown,
}

impl ColorState {
    pub const fn rgb(self) -> Rgb {
        match self {
            Self::Green => Rgb::new(0, 255, 0),
            Self::Orange => Rgb::new(255, 128, 0),
            Self::Red => Rgb::new(255, 0, 0),
            Self::Unknown => Rgb::OFF,
        }
    }
}

/// Band edges in ppm. Green strictly below `green_below_ppm`, red strictly
/// above `red_above_ppm`, orange in between (both edges inclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Co2Thresholds {
    pub green_below_ppm: f32,
    pub red_above_ppm: f32,
}

impl Default for Co2Thresholds {
    fn default() -> Self {
        Self {
            green_below_ppm: 1000.0,
            red_above_ppm: 1600.0,
        }
    }
}

impl Co2Thresholds {
    pub fn classify(&self, co2_ppm: f32) -> ColorState {
        if co2_ppm < self.green_below_ppm {
            ColorState::Green
        } else if co2_ppm > self.red_above_ppm {
            ColorState::Red
        } else {
            ColorState::Orange
        }
    }
}

/// Classify against the stock 1000 / 1600 ppm bands.
pub fn classify(co2_ppm: f32) -> ColorState {
    Co2Thresholds::default().classify(co2_ppm)
}

#[derive(Debug)]
pub struct LedFeedback {
    thresholds: Co2Thresholds,
    /// Colour physically on the LED.
    applied: ColorState,
    /// Colour for the latest reading, kept while the display is off.
    latest: ColorState,
    enabled: bool,
}

impl LedFeedback {
    pub fn new(thresholds: Co2Thresholds) -> Self {
        Self {
            thresholds,
            applied: ColorState::Unknown,
            latest: ColorState::Unknown,
            enabled: true,
        }
    }

    pub fn applied(&self) -> ColorState {
        self.applied
    }

    pub fn latest(&self) -> ColorState {
        self.latest
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Show `color`. Returns `true` if the LED was written.
    pub fn apply(&mut self, color: ColorState, pixels: &mut impl PixelPort) -> bool {
        self.latest = color;
        if !self.enabled || color == self.applied {
            return false;
        }
        self.write(color, pixels);
        true
    }

    /// Classify a CO2 reading and show it.
    pub fn show_co2(&mut self, co2_ppm: f32, pixels: &mut impl PixelPort) -> ColorState {
        let color = self.thresholds.classify(co2_ppm);
        self.apply(color, pixels);
        color
    }

    /// Blank or restore the LED. Returns the new enabled state.
    pub fn toggle_display(&mut self, pixels: &mut impl PixelPort) -> bool {
        self.enabled = !self.enabled;
        if self.enabled {
            let latest = self.latest;
            if latest != self.applied {
                self.write(latest, pixels);
            }
        } else if self.applied != ColorState::Unknown {
            self.write(ColorState::Unknown, pixels);
        }
        debug!("CO2 display {}", if self.enabled { "on" } else { "off" });
        self.enabled
    }

    fn write(&mut self, color: ColorState, pixels: &mut impl PixelPort) {
        // Recorded even on failure; the next distinct colour retries.
        self.applied = color;
        if let Err(rc) = pixels.update_pixels(&[color.rgb()]) {
            warn!("LED update to {:?} failed (rc={})", color, rc);
        }
    }
}
