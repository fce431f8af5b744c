//! CO2 colour LED driver.
//!
//! Three LEDC PWM channels drive a common-cathode RGB LED. The board has
//! a single pixel; extra entries in a pixel slice are ignored and an
//! empty slice turns the LED off.

use crate::app::ports::{PixelPort, Rgb};
use crate::drivers::hw_init;
use crate::error::InitError;

#[derive(Debug, Default)]
pub struct ColorLed {
    current: Rgb,
}

impl ColorLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) -> Result<(), InitError> {
        hw_init::init_color_ledc()?;
        self.current = Rgb::OFF;
        Ok(())
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }
}

impl PixelPort for ColorLed {
    fn update_pixels(&mut self, pixels: &[Rgb]) -> Result<(), i32> {
        let colour = pixels.first().copied().unwrap_or(Rgb::OFF);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_R, colour.r)?;
        hw_init::ledc_set(hw_init::LEDC_CH_LED_G, colour.g)?;
        hw_init::ledc_set(hw_init::LEDC_CH_LED_B, colour.b)?;
        self.current = colour;
        Ok(())
    }
}
