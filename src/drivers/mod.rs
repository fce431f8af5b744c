//! Peripheral drivers: GPIO / LEDC bring-up, indicator LEDs, the CO2
//! colour LED and the button debouncer.

pub mod button;
pub mod color_led;
pub mod hw_init;
pub mod indicator;
