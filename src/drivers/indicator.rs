//! Discrete indicator LEDs (status and identify).
//!
//! On ESP-IDF each LED is a plain GPIO output. On host the driver only
//! tracks state, which the simulation and tests read back.

use crate::app::ports::Indicator;
use crate::drivers::hw_init;
use crate::error::InitError;
use crate::pins;

#[derive(Debug, Default)]
pub struct IndicatorLeds {
    status: bool,
    identify: bool,
}

impl IndicatorLeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) -> Result<(), InitError> {
        hw_init::init_indicator_outputs()?;
        self.status = false;
        self.identify = false;
        Ok(())
    }

    pub fn set(&mut self, led: Indicator, on: bool) {
        let (pin, state) = match led {
            Indicator::Status => (pins::LED_STATUS_GPIO, &mut self.status),
            Indicator::Identify => (pins::LED_IDENTIFY_GPIO, &mut self.identify),
        };
        hw_init::gpio_write(pin, on);
        *state = on;
    }

    pub fn toggle(&mut self, led: Indicator) {
        let on = !self.is_on(led);
        self.set(led, on);
    }

    pub fn is_on(&self, led: Indicator) -> bool {
        match led {
            Indicator::Status => self.status,
            Indicator::Identify => self.identify,
        }
    }
}
