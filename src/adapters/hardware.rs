//! Hardware adapter: bridges the concrete drivers to the domain ports.
//!
//! Owns the sensor, both LED drivers and the Zigbee stack, and exposes
//! them through the device-side port traits so the controller sees a
//! single [`DevicePorts`](crate::app::ports::DevicePorts) value. Every
//! method is a plain delegation.

use crate::adapters::zigbee::ZigbeeStack;
use crate::app::ports::{
    AttributeStore, Indicator, IndicatorPort, NetworkPort, PixelPort, Quantity, Rgb, SensorPort,
};
use crate::drivers::color_led::ColorLed;
use crate::drivers::indicator::IndicatorLeds;
use crate::error::{InitError, NetworkError, SensorError};
use crate::events::{NetworkSignal, SignalBuffer};

pub struct HardwareAdapter<S> {
    sensor: S,
    indicators: IndicatorLeds,
    color: ColorLed,
    zigbee: ZigbeeStack,
}

impl<S: SensorPort> HardwareAdapter<S> {
    pub fn new(sensor: S, zigbee: ZigbeeStack) -> Self {
        Self {
            sensor,
            indicators: IndicatorLeds::new(),
            color: ColorLed::new(),
            zigbee,
        }
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn zigbee(&self) -> &ZigbeeStack {
        &self.zigbee
    }

    pub fn zigbee_mut(&mut self) -> &mut ZigbeeStack {
        &mut self.zigbee
    }

    pub fn indicator(&self, led: Indicator) -> bool {
        self.indicators.is_on(led)
    }

    pub fn colour(&self) -> Rgb {
        self.color.current_colour()
    }
}

// ── SensorPort ────────────────────────────────────────────────

impl<S: SensorPort> SensorPort for HardwareAdapter<S> {
    fn init(&mut self) -> Result<(), SensorError> {
        self.sensor.init()
    }

    fn fetch_sample(&mut self) -> Result<(), SensorError> {
        self.sensor.fetch_sample()
    }

    fn read(&mut self, quantity: Quantity) -> Result<f32, SensorError> {
        self.sensor.read(quantity)
    }

    fn start_periodic(&mut self) -> Result<(), SensorError> {
        self.sensor.start_periodic()
    }

    fn stop_periodic(&mut self) -> Result<(), SensorError> {
        self.sensor.stop_periodic()
    }

    fn forced_recalibration(&mut self, reference_ppm: u16) -> Result<i16, SensorError> {
        self.sensor.forced_recalibration(reference_ppm)
    }
}

// ── LEDs ──────────────────────────────────────────────────────

impl<S> IndicatorPort for HardwareAdapter<S> {
    fn init_leds(&mut self) -> Result<(), InitError> {
        self.indicators.init()?;
        self.color.init()
    }

    fn set_indicator(&mut self, led: Indicator, on: bool) {
        self.indicators.set(led, on);
    }

    fn toggle_indicator(&mut self, led: Indicator) {
        self.indicators.toggle(led);
    }
}

impl<S> PixelPort for HardwareAdapter<S> {
    fn update_pixels(&mut self, pixels: &[Rgb]) -> Result<(), i32> {
        self.color.update_pixels(pixels)
    }
}

// ── Zigbee ────────────────────────────────────────────────────

impl<S> AttributeStore for HardwareAdapter<S> {
    fn register_device(&mut self) -> Result<(), InitError> {
        self.zigbee.register_device()
    }

    fn set_attribute(&mut self, cluster: u16, attribute: u16, value: &[u8]) -> u8 {
        self.zigbee.set_attribute(cluster, attribute, value)
    }
}

impl<S> NetworkPort for HardwareAdapter<S> {
    fn is_joined(&self) -> bool {
        self.zigbee.is_joined()
    }

    fn enable(&mut self) -> Result<(), InitError> {
        self.zigbee.enable()
    }

    fn register_identify_handler(&mut self) -> Result<(), InitError> {
        self.zigbee.register_identify_handler()
    }

    fn set_rx_on_when_idle(&mut self, on: bool) {
        self.zigbee.set_rx_on_when_idle(on);
    }

    fn start_steering(&mut self) -> Result<(), NetworkError> {
        self.zigbee.start_steering()
    }

    fn start_identify(&mut self) -> Result<(), NetworkError> {
        self.zigbee.start_identify()
    }

    fn cancel_identify(&mut self) -> Result<(), NetworkError> {
        self.zigbee.cancel_identify()
    }

    fn factory_reset(&mut self) {
        self.zigbee.factory_reset();
    }

    fn default_signal_handler(&mut self, signal: &NetworkSignal) {
        self.zigbee.default_signal_handler(signal);
    }

    fn release_buffer(&mut self, buffer: SignalBuffer) {
        self.zigbee.release_buffer(buffer);
    }
}
